//! The live index.
//!
//! [`LiveIndex`] is owned by one control thread, which is the only place its
//! state changes. Scans run on the task pool and come back as messages; the
//! control thread picks them up in [`LiveIndex::pump`] or
//! [`LiveIndex::wait_idle`], drops any result whose generation is stale and
//! applies the rest as diffs against the live list.
//!
//! ```text
//! setter -> bump generation -> reset watches -> launch scan
//!                                                    |
//!   pump <- completion (generation checked) <--------+
//!     |
//!     +-> diff against live scope -> OrderedEntries::apply -> IndexEvent
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::bus::{EventBus, IndexEvent};
use crate::cancel::{CancellationToken, GenerationController};
use crate::config::{EngineOptions, IndexConfig};
use crate::diff::ScanOutcome;
use crate::error::{QuicksearchError, Result};
use crate::model::{
    AttributeCache, Entry, ListEvent, MediaKind, OrderedEntries, ScoreCache, SortSpec,
    ThumbnailLookup,
};
use crate::pool::{ScanKey, TaskCompletion, TaskMessage, TaskPool, TaskResult};
use crate::scan::{self, ApplicationRegistry, ScanRequest, ScanSet, XdgRegistry};
use crate::thumbnail::{ImageThumbnailer, Thumbnailer};
use crate::types::{FilterKind, SortKey};
use crate::watcher::{
    coalesce_event_paths, dedup_paths, path_in_scope, ChangeFeed, ChangeSink, FeedEvent,
    NotifyFeed, WatchCoordinator,
};

/// Creates the change feed once the index's sink exists.
pub type FeedFactory = Box<dyn FnOnce(ChangeSink) -> Result<Box<dyn ChangeFeed>> + Send>;

/// Directories reported changed since the last dispatch.
#[derive(Debug, Default)]
struct ChangeBatch {
    dirs: Vec<PathBuf>,
    rescan: bool,
}

impl ChangeBatch {
    fn is_empty(&self) -> bool {
        self.dirs.is_empty() && !self.rescan
    }
}

pub struct LiveIndexBuilder {
    config: IndexConfig,
    options: EngineOptions,
    registry: Arc<dyn ApplicationRegistry>,
    thumbnailer: Option<Arc<dyn Thumbnailer>>,
    feed: Option<FeedFactory>,
}

impl Default for LiveIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveIndexBuilder {
    pub fn new() -> Self {
        Self {
            config: IndexConfig::default(),
            options: EngineOptions::default(),
            registry: Arc::new(XdgRegistry),
            thumbnailer: None,
            feed: None,
        }
    }

    pub fn config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(mut self, registry: impl ApplicationRegistry + 'static) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn thumbnailer(mut self, thumbnailer: impl Thumbnailer + 'static) -> Self {
        self.thumbnailer = Some(Arc::new(thumbnailer));
        self
    }

    /// Replaces the default `notify` feed.
    pub fn change_feed<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(ChangeSink) -> Result<Box<dyn ChangeFeed>> + Send + 'static,
    {
        self.feed = Some(Box::new(factory));
        self
    }

    /// Builds the index and launches its first scan.
    pub fn build(self) -> Result<LiveIndex> {
        let tasks = TaskPool::new(self.options.worker_threads)?;
        let sink = tasks.sink();
        let feed: Box<dyn ChangeFeed> = match self.feed {
            Some(factory) => factory(sink)?,
            None => Box::new(NotifyFeed::new(sink)?),
        };
        let thumbnailer: Arc<dyn Thumbnailer> = match self.thumbnailer {
            Some(thumbnailer) => thumbnailer,
            None => Arc::new(ImageThumbnailer::new(self.options.thumbnail_dir.clone())),
        };

        let mut index = LiveIndex {
            scores: ScoreCache::new(&self.config.query),
            config: self.config,
            generations: GenerationController::new(),
            entries: OrderedEntries::new(),
            attributes: AttributeCache::new(),
            watches: WatchCoordinator::new(feed),
            tasks,
            bus: EventBus::new(self.options.event_capacity),
            registry: self.registry,
            thumbnailer,
        };
        index.restart();
        Ok(index)
    }
}

/// A live, ranked list of the entries matching an [`IndexConfig`].
pub struct LiveIndex {
    config: IndexConfig,
    generations: GenerationController,
    entries: OrderedEntries,
    scores: ScoreCache,
    attributes: AttributeCache,
    watches: WatchCoordinator,
    tasks: TaskPool,
    bus: EventBus,
    registry: Arc<dyn ApplicationRegistry>,
    thumbnailer: Arc<dyn Thumbnailer>,
}

impl LiveIndex {
    /// Builds an index with the default registry, thumbnailer and feed.
    pub fn new(config: IndexConfig) -> Result<Self> {
        LiveIndexBuilder::new().config(config).build()
    }

    pub fn builder() -> LiveIndexBuilder {
        LiveIndexBuilder::new()
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generations.current()
    }

    pub fn entries(&self) -> &[Entry] {
        self.entries.as_slice()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn slice(&self, start: usize, count: usize) -> &[Entry] {
        self.entries.slice(start, count)
    }

    /// Directories currently subscribed for change notification, sorted.
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.watches.watched()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IndexEvent> {
        self.bus.subscribe()
    }

    // Configuration

    /// Replaces the whole configuration, reacting to what changed.
    pub fn set_configuration(&mut self, config: IndexConfig) {
        if config == self.config {
            return;
        }
        let previous = std::mem::replace(&mut self.config, config);
        self.reconfigure(previous);
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.update(|config| config.path = path);
    }

    pub fn set_recursive(&mut self, recursive: bool) {
        self.update(|config| config.recursive = recursive);
    }

    pub fn set_watch_changes(&mut self, watch_changes: bool) {
        self.update(|config| config.watch_changes = watch_changes);
    }

    pub fn set_show_hidden(&mut self, show_hidden: bool) {
        self.update(|config| config.show_hidden = show_hidden);
    }

    pub fn set_sort(&mut self, sort: bool) {
        self.update(|config| config.sort = sort);
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        self.update(|config| config.sort_key = sort_key);
    }

    pub fn set_sort_reverse(&mut self, sort_reverse: bool) {
        self.update(|config| config.sort_reverse = sort_reverse);
    }

    pub fn set_filter(&mut self, filter: FilterKind) {
        self.update(|config| config.filter = filter);
    }

    pub fn set_name_filters(&mut self, name_filters: Vec<String>) {
        self.update(|config| config.name_filters = name_filters);
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.update(|config| config.query = query);
    }

    pub fn set_min_score(&mut self, min_score: f64) {
        self.update(|config| config.min_score = min_score);
    }

    /// Negative means unbounded.
    pub fn set_max_depth(&mut self, max_depth: i32) {
        self.update(|config| config.max_depth = max_depth);
    }

    /// Zero or negative means unbounded.
    pub fn set_max_results(&mut self, max_results: i32) {
        self.update(|config| config.max_results = max_results);
    }

    fn update(&mut self, change: impl FnOnce(&mut IndexConfig)) {
        let mut config = self.config.clone();
        change(&mut config);
        self.set_configuration(config);
    }

    fn reconfigure(&mut self, previous: IndexConfig) {
        let query_changed = previous.query != self.config.query;
        let root_changed = entry_root(&previous) != entry_root(&self.config);
        let sort_changed = SortSpec::from_config(&previous) != self.sort_spec();

        if query_changed || self.is_rootless() {
            self.scores.set_query(&self.config.query);
            self.clear_entries();
        }

        if root_changed {
            let root = entry_root(&self.config).to_path_buf();
            if let Some(event) = self.entries.rebase(&root) {
                self.publish(vec![event], self.entries.len());
            }
        }

        let relative_order_changed = root_changed && self.config.sort_key == SortKey::RelativePath;
        if sort_changed || relative_order_changed {
            let spec = self.sort_spec();
            if let Some(event) = self.entries.resort(&spec, &mut self.scores) {
                self.publish(vec![event], self.entries.len());
            }
        }

        if scan_inputs_changed(&previous, &self.config) {
            self.restart();
        }
    }

    /// Invalidates in-flight work and starts over under a new generation.
    fn restart(&mut self) {
        let generation = self.generations.bump();
        self.tasks.cancel_all();

        if self.config.is_applications() {
            if !self.config.watch_changes {
                self.watches.clear();
            }
            log::info!("generation {generation}: scanning applications");
            self.launch_applications_scan();
            return;
        }

        if self.is_rootless() {
            log::info!("generation {generation}: no root, clearing index");
            self.watches.clear();
            self.clear_entries();
            return;
        }

        if self.config.filter != FilterKind::Images {
            if let Err(error) = scan::check_name_filters(&self.config.name_filters) {
                self.warn(error.to_string());
            }
        }
        log::info!(
            "generation {generation}: scanning {} ({} filter{})",
            self.config.path.display(),
            self.config.filter.as_str(),
            if self.config.recursive { ", recursive" } else { "" }
        );
        self.reset_watches();
        self.launch_root_scan();
    }

    fn reset_watches(&mut self) {
        if !self.config.watch_changes {
            self.watches.clear();
            return;
        }
        let root = self.config.path.clone();
        if self.config.recursive {
            // Known subdirectories stay watched until the root's subtree is
            // re-derived.
            let mut dirs: Vec<PathBuf> = self
                .watches
                .watched()
                .into_iter()
                .filter(|dir| path_in_scope(&root, dir))
                .collect();
            dirs.push(root.clone());
            self.watches.reset(dirs);
            self.launch_subdirectories(root);
        } else {
            self.watches.reset([root]);
        }
    }

    /// A path-based filter without a root has nothing to show.
    fn is_rootless(&self) -> bool {
        !self.config.is_applications() && self.config.path.as_os_str().is_empty()
    }

    fn sort_spec(&self) -> SortSpec {
        SortSpec::from_config(&self.config)
    }

    // Background work

    fn launch_root_scan(&mut self) {
        let request = ScanRequest::from_config(&self.config);
        self.launch_scan(ScanKey::Root, request);
    }

    fn launch_directory_scan(&mut self, dir: PathBuf) {
        let request = ScanRequest::from_config(&self.config).scoped_to(dir.clone());
        self.launch_scan(ScanKey::Directory(dir), request);
    }

    fn launch_scan(&mut self, key: ScanKey, request: ScanRequest) {
        log::debug!("launching {key:?} scan of {}", request.dir.display());
        let registry = Arc::clone(&self.registry);
        self.tasks.spawn(key, self.generations.token(), move |token| {
            TaskResult::Scan(scan::enumerate(&request, registry.as_ref(), token))
        });
    }

    fn launch_applications_scan(&mut self) {
        let request = ScanRequest::from_config(&self.config);
        let registry = Arc::clone(&self.registry);
        self.tasks
            .spawn(ScanKey::Applications, self.generations.token(), move |token| {
                let roots = registry
                    .search_roots()
                    .into_iter()
                    .filter(|root| root.is_dir())
                    .collect();
                let scan = scan::enumerate(&request, registry.as_ref(), token);
                TaskResult::Applications { scan, roots }
            });
    }

    fn launch_subdirectories(&mut self, dir: PathBuf) {
        let show_hidden = self.config.show_hidden;
        let key = ScanKey::Subdirectories(dir.clone());
        self.tasks.spawn(key, self.generations.token(), move |token| {
            let subdirs = scan::collect_subdirectories(&dir, show_hidden, token);
            TaskResult::Subdirectories { dir, subdirs }
        });
    }

    fn launch_thumbnail(&mut self, path: PathBuf, kind: MediaKind) {
        let thumbnailer = Arc::clone(&self.thumbnailer);
        let key = ScanKey::Thumbnail(path.clone());
        self.tasks.spawn(key, CancellationToken::new(), move |token| {
            let thumbnail = token
                .is_cancelled()
                .map(|()| thumbnailer.thumbnail(&path, kind));
            TaskResult::Thumbnail { path, thumbnail }
        });
    }

    // Control loop

    /// Applies every result and notification that has arrived, then
    /// dispatches rescans for the changes seen. Never blocks.
    ///
    /// Returns the number of messages handled.
    pub fn pump(&mut self) -> usize {
        let mut batch = ChangeBatch::default();
        let handled = self.drain(&mut batch);
        self.dispatch_changes(batch);
        handled
    }

    /// Pumps until no background task is outstanding or `timeout` elapses.
    /// Returns true if the index went idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.tasks.outstanding() == 0 {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            if let Some(message) = self.tasks.recv_timeout(remaining) {
                let mut batch = ChangeBatch::default();
                self.handle(message, &mut batch);
                self.drain(&mut batch);
                self.dispatch_changes(batch);
            }
        }
    }

    /// Reports that the contents of watched directory `dir` changed, for
    /// embedders that observe the filesystem themselves.
    pub fn notify_directory_changed(&mut self, dir: &Path) {
        let mut batch = ChangeBatch::default();
        if self.watches.is_watched(dir) {
            batch.dirs.push(dir.to_path_buf());
        }
        self.dispatch_changes(batch);
    }

    fn drain(&mut self, batch: &mut ChangeBatch) -> usize {
        let mut handled = 0;
        while let Some(message) = self.tasks.try_recv() {
            self.handle(message, batch);
            handled += 1;
        }
        handled
    }

    fn handle(&mut self, message: TaskMessage, batch: &mut ChangeBatch) {
        match message {
            TaskMessage::Completed(completion) => self.complete(completion),
            TaskMessage::Feed(FeedEvent::DirectoryChanged(dir)) => {
                if self.watches.is_watched(&dir) {
                    batch.dirs.push(dir);
                }
            }
            TaskMessage::Feed(FeedEvent::PathsChanged(paths)) => {
                batch
                    .dirs
                    .extend(paths.iter().filter_map(|path| self.watches.resolve(path)));
            }
            TaskMessage::Feed(FeedEvent::RescanRequired) => batch.rescan = true,
            TaskMessage::Feed(FeedEvent::Error(message)) => {
                self.warn(format!("change feed error: {message}"));
            }
        }
    }

    fn complete(&mut self, completion: TaskCompletion) {
        let current = self.tasks.finish(&completion);
        let TaskCompletion {
            key,
            generation,
            elapsed,
            result,
            ..
        } = completion;

        // Thumbnails depend on the file alone, not on the configuration.
        if let TaskResult::Thumbnail { path, thumbnail } = result {
            match thumbnail {
                Some(thumbnail) if current => self.store_thumbnail(path, thumbnail),
                _ => self.attributes.abandon_thumbnail(&path),
            }
            return;
        }

        if self.generations.is_stale(generation) {
            log::debug!(
                "discarding {key:?} result from generation {generation} (current {})",
                self.generations.current()
            );
            return;
        }
        if !current {
            log::debug!("discarding superseded {key:?} result");
            return;
        }

        match result {
            TaskResult::Scan(Some(scan)) => self.apply_scan(&key, scan, elapsed),
            TaskResult::Applications { scan, roots } => {
                if self.config.watch_changes {
                    self.watches.reset(roots);
                }
                match scan {
                    Some(scan) => self.apply_scan(&key, scan, elapsed),
                    None => log::debug!("{key:?} task cancelled"),
                }
            }
            TaskResult::Subdirectories {
                dir,
                subdirs: Some(subdirs),
            } => {
                if self.config.watch_changes && self.config.recursive {
                    let count = subdirs.len();
                    if self.watches.merge_subtree(&dir, subdirs) {
                        log::debug!("watching {count} directories below {}", dir.display());
                    }
                }
            }
            TaskResult::Scan(None) | TaskResult::Subdirectories { subdirs: None, .. } => {
                log::debug!("{key:?} task cancelled");
            }
            TaskResult::Thumbnail { .. } => {}
        }
    }

    fn store_thumbnail(&mut self, path: PathBuf, thumbnail: Option<PathBuf>) {
        let Some(index) = self.entries.iter().position(|entry| entry.path() == path) else {
            self.attributes.evict(&path);
            return;
        };
        if self.attributes.finish_thumbnail(&path, thumbnail) {
            self.publish(vec![ListEvent::Updated { index, count: 1 }], self.entries.len());
        }
    }

    /// Diffs a scan against the live entries of its scope and applies it.
    fn apply_scan(&mut self, key: &ScanKey, scan: ScanSet, elapsed: Duration) {
        let previous = match key {
            ScanKey::Directory(dir) => self.entries.paths_within(dir, self.config.recursive),
            _ => self.entries.paths(),
        };
        let found = scan.len();

        match ScanOutcome::from_scan(&previous, scan) {
            ScanOutcome::Unchanged => {
                log::debug!(
                    "{key:?} scan unchanged: {found} entries in {} ms",
                    elapsed.as_millis()
                );
            }
            ScanOutcome::Changed { removed, added } => {
                let before = self.entries.len();
                for path in &removed {
                    self.attributes.evict(path);
                }
                let (removed_count, added_count) = (removed.len(), added.len());
                let spec = self.sort_spec();
                let root = entry_root(&self.config).to_path_buf();
                let events = self
                    .entries
                    .apply(&removed, added, &root, &spec, &mut self.scores);
                self.publish(events, before);
                log::info!(
                    "applied {key:?} scan: -{removed_count} +{added_count}, {} entries, {} ms",
                    self.entries.len(),
                    elapsed.as_millis()
                );
            }
        }
    }

    fn dispatch_changes(&mut self, batch: ChangeBatch) {
        if batch.is_empty() || !self.config.watch_changes || self.watches.is_empty() {
            return;
        }

        if self.config.is_applications() {
            self.launch_applications_scan();
            return;
        }

        let root = self.config.path.clone();
        let full_rescan = batch.rescan
            || self.config.results_cap().is_some()
            || batch.dirs.iter().any(|dir| *dir == root);
        if full_rescan {
            log::debug!("rescanning {}", root.display());
            self.launch_root_scan();
            if self.config.recursive {
                self.launch_subdirectories(root);
            }
            return;
        }

        let dirs = if self.config.recursive {
            coalesce_event_paths(batch.dirs)
        } else {
            dedup_paths(batch.dirs)
        };
        for dir in dirs {
            if self.config.recursive {
                self.launch_subdirectories(dir.clone());
            }
            self.launch_directory_scan(dir);
        }
    }

    // Entries and attributes

    /// Launches the application entry at `index`.
    ///
    /// Failures are also published as [`IndexEvent::Warning`]; the index
    /// itself is unaffected.
    pub fn execute(&self, index: usize) -> Result<u32> {
        let entry = self.entries.get(index).ok_or_else(|| {
            QuicksearchError::InvalidInput(format!("no entry at index {index}"))
        })?;
        let Some(app) = entry.application() else {
            let message = format!("{} is not an application", entry.path().display());
            self.warn(message.clone());
            return Err(QuicksearchError::InvalidInput(message));
        };
        app.launch().map_err(|error| {
            self.warn(format!("failed to launch {}: {error}", app.name));
            QuicksearchError::from(error)
        })
    }

    pub fn mime_type(&mut self, index: usize) -> Option<String> {
        let entry = self.entries.get(index)?;
        Some(self.attributes.mime_type(entry).to_string())
    }

    pub fn media_kind(&mut self, index: usize) -> Option<MediaKind> {
        let entry = self.entries.get(index)?;
        Some(self.attributes.media_kind(entry))
    }

    /// Thumbnail for the media entry at `index`, if it has been generated.
    ///
    /// The first request starts generation on the worker pool and returns
    /// `None`; a [`ListEvent::Updated`] for the entry follows once it is done.
    pub fn thumbnail(&mut self, index: usize) -> Option<PathBuf> {
        let entry = self.entries.get(index)?;
        let path = entry.path().to_path_buf();
        match self.attributes.thumbnail(entry) {
            ThumbnailLookup::Ready(thumbnail) => thumbnail,
            ThumbnailLookup::Pending => None,
            ThumbnailLookup::Generate(kind) => {
                self.launch_thumbnail(path, kind);
                None
            }
        }
    }

    fn clear_entries(&mut self) {
        let before = self.entries.len();
        self.attributes.clear();
        if let Some(event) = self.entries.clear() {
            self.publish(vec![event], before);
        }
    }

    fn publish(&self, events: Vec<ListEvent>, previous_len: usize) {
        for event in events {
            self.bus.publish(IndexEvent::List(event));
        }
        if self.entries.len() != previous_len {
            self.bus.publish(IndexEvent::LengthChanged(self.entries.len()));
        }
    }

    fn warn(&self, message: String) {
        log::warn!("{message}");
        self.bus.publish(IndexEvent::Warning(message));
    }
}

impl Drop for LiveIndex {
    fn drop(&mut self) {
        self.tasks.cancel_all();
    }
}

impl std::fmt::Debug for LiveIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveIndex")
            .field("config", &self.config)
            .field("generation", &self.generations.current())
            .field("entries", &self.entries.len())
            .field("watches", &self.watches)
            .finish_non_exhaustive()
    }
}

/// The directory relative paths are computed against. Applications have
/// none and show absolute paths.
fn entry_root(config: &IndexConfig) -> &Path {
    if config.is_applications() {
        Path::new("")
    } else {
        &config.path
    }
}

/// True if anything but ordering differs.
fn scan_inputs_changed(previous: &IndexConfig, current: &IndexConfig) -> bool {
    let mut previous = previous.clone();
    previous.sort = current.sort;
    previous.sort_key = current.sort_key;
    previous.sort_reverse = current.sort_reverse;
    previous != *current
}
