#![allow(dead_code)]

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quicksearch::watcher::{ChangeFeed, ChangeSink};
use quicksearch::{EngineOptions, IndexConfig, IndexEvent, LiveIndex, Result};
use tempfile::TempDir;
use tokio::sync::broadcast;

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Default)]
struct FeedState {
    watched: BTreeSet<PathBuf>,
    sink: Option<ChangeSink>,
}

/// A change feed that records subscriptions and lets tests inject changes.
#[derive(Clone, Default)]
pub struct RecordingFeed {
    state: Arc<Mutex<FeedState>>,
}

impl RecordingFeed {
    pub fn watched(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().watched.iter().cloned().collect()
    }

    pub fn sink(&self) -> ChangeSink {
        self.state
            .lock()
            .unwrap()
            .sink
            .clone()
            .expect("feed not connected")
    }

    fn connect(&self, sink: ChangeSink) {
        self.state.lock().unwrap().sink = Some(sink);
    }
}

impl ChangeFeed for RecordingFeed {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        self.state.lock().unwrap().watched.insert(dir.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) -> Result<()> {
        self.state.lock().unwrap().watched.remove(dir);
        Ok(())
    }
}

pub struct Harness {
    pub index: LiveIndex,
    pub feed: RecordingFeed,
    pub events: broadcast::Receiver<IndexEvent>,
    cache: TempDir,
}

impl Harness {
    pub fn new(config: IndexConfig) -> Self {
        Self::with_builder(config, |builder| builder)
    }

    pub fn with_builder(
        config: IndexConfig,
        customize: impl FnOnce(quicksearch::LiveIndexBuilder) -> quicksearch::LiveIndexBuilder,
    ) -> Self {
        let cache = TempDir::new().unwrap();
        let feed = RecordingFeed::default();
        let connected = feed.clone();
        let builder = LiveIndex::builder()
            .config(config)
            .options(EngineOptions {
                worker_threads: 2,
                thumbnail_dir: cache.path().to_path_buf(),
                ..EngineOptions::default()
            })
            .change_feed(move |sink| {
                connected.connect(sink);
                Ok(Box::new(connected) as Box<dyn ChangeFeed>)
            });
        let index = customize(builder).build().unwrap();
        let events = index.subscribe();
        Self {
            index,
            feed,
            events,
            cache,
        }
    }

    pub fn settle(&mut self) {
        assert!(self.index.wait_idle(IDLE_TIMEOUT), "index did not go idle");
    }

    pub fn names(&self) -> Vec<String> {
        self.index
            .entries()
            .iter()
            .map(|entry| entry.relative_path().to_string())
            .collect()
    }

    pub fn take_events(&mut self) -> Vec<IndexEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"x").unwrap();
}

pub fn write_app(dir: &Path, file: &str, name: &str, extra: &str) {
    fs::create_dir_all(dir).unwrap();
    let content = format!("[Desktop Entry]\nType=Application\nName={name}\nExec={name}\n{extra}");
    fs::write(dir.join(file), content).unwrap();
}

pub fn config_for(root: &Path) -> IndexConfig {
    IndexConfig {
        path: root.to_path_buf(),
        ..IndexConfig::default()
    }
}
