//! Directory change feeds.
//!
//! Feed callbacks never touch index state. They send what they saw through
//! a [`ChangeSink`] to the control thread, which resolves paths against the
//! watch set and decides what to rescan.

use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{QuicksearchError, Result};
use crate::pool::TaskMessage;

/// What a feed reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FeedEvent {
    /// A watched directory's contents changed.
    DirectoryChanged(PathBuf),
    /// Raw changed paths, resolved to watched directories by the index.
    PathsChanged(Vec<PathBuf>),
    /// The feed lost events; everything must be rescanned.
    RescanRequired,
    Error(String),
}

/// A source of directory-changed notifications.
///
/// The index subscribes one directory at a time, non-recursively.
pub trait ChangeFeed: Send {
    fn watch(&mut self, dir: &Path) -> Result<()>;
    fn unwatch(&mut self, dir: &Path) -> Result<()>;
}

/// The sending half handed to a feed when the index is built.
#[derive(Debug, Clone)]
pub struct ChangeSink {
    sender: Sender<TaskMessage>,
}

impl ChangeSink {
    pub(crate) fn new(sender: Sender<TaskMessage>) -> Self {
        Self { sender }
    }

    /// Reports that the contents of the watched directory `dir` changed.
    pub fn directory_changed(&self, dir: PathBuf) {
        self.send(FeedEvent::DirectoryChanged(dir));
    }

    /// Reports changed paths: entries inside watched directories, or the
    /// watched directories themselves.
    pub fn paths_changed(&self, paths: Vec<PathBuf>) {
        if !paths.is_empty() {
            self.send(FeedEvent::PathsChanged(paths));
        }
    }

    pub fn rescan_required(&self) {
        self.send(FeedEvent::RescanRequired);
    }

    pub fn error(&self, message: String) {
        self.send(FeedEvent::Error(message));
    }

    fn send(&self, event: FeedEvent) {
        // The index is gone once the receiver is dropped.
        let _ = self.sender.send(TaskMessage::Feed(event));
    }
}

/// Change feed backed by the platform's `notify` watcher.
pub struct NotifyFeed {
    watcher: RecommendedWatcher,
}

impl NotifyFeed {
    pub fn new(sink: ChangeSink) -> Result<Self> {
        let watcher = recommended_watcher(move |event_result: notify::Result<Event>| {
            match event_result {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    if event.need_rescan() || event.paths.is_empty() {
                        sink.rescan_required();
                    } else {
                        sink.paths_changed(event.paths);
                    }
                }
                Err(error) => sink.error(error.to_string()),
            }
        })
        .map_err(|error| {
            QuicksearchError::Watch(format!("failed to create change watcher: {error}"))
        })?;
        Ok(Self { watcher })
    }
}

impl ChangeFeed for NotifyFeed {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|error| {
                QuicksearchError::Watch(format!("failed to watch {}: {error}", dir.display()))
            })
    }

    fn unwatch(&mut self, dir: &Path) -> Result<()> {
        self.watcher.unwatch(dir).map_err(|error| {
            QuicksearchError::Watch(format!("failed to unwatch {}: {error}", dir.display()))
        })
    }
}

impl std::fmt::Debug for NotifyFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyFeed").finish_non_exhaustive()
    }
}
