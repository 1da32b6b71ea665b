//! The watched-directory set.

use std::path::{Path, PathBuf};

use fnv::FnvHashSet;

use super::feed::ChangeFeed;

/// Keeps a [`ChangeFeed`] subscribed to exactly the watched-directory set.
///
/// Directories that cannot be watched are logged and left out of the set,
/// so the set always reflects live subscriptions.
pub struct WatchCoordinator {
    feed: Box<dyn ChangeFeed>,
    watched: FnvHashSet<PathBuf>,
}

impl WatchCoordinator {
    pub fn new(feed: Box<dyn ChangeFeed>) -> Self {
        Self {
            feed,
            watched: FnvHashSet::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }

    /// The watched directories, sorted.
    pub fn watched(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.watched.iter().cloned().collect();
        dirs.sort();
        dirs
    }

    /// Replaces the watched set with `dirs`, touching only the difference.
    pub fn reset(&mut self, dirs: impl IntoIterator<Item = PathBuf>) {
        let desired: FnvHashSet<PathBuf> = dirs.into_iter().collect();
        let stale: Vec<PathBuf> = self.watched.difference(&desired).cloned().collect();
        for dir in stale {
            self.unwatch(&dir);
        }
        for dir in desired {
            if !self.watched.contains(&dir) {
                self.watch(dir);
            }
        }
    }

    pub fn clear(&mut self) {
        self.reset(std::iter::empty());
    }

    /// Replaces the watched subtree below `dir` with `subdirs`.
    ///
    /// Discarded, returning false, when `dir` itself is no longer watched.
    pub fn merge_subtree(&mut self, dir: &Path, subdirs: Vec<PathBuf>) -> bool {
        if !self.watched.contains(dir) {
            return false;
        }
        let desired: FnvHashSet<PathBuf> = subdirs
            .into_iter()
            .filter(|subdir| subdir.starts_with(dir) && subdir != dir)
            .collect();
        let stale: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|watched| watched.starts_with(dir) && *watched != dir && !desired.contains(*watched))
            .cloned()
            .collect();
        for stale_dir in stale {
            self.unwatch(&stale_dir);
        }
        for subdir in desired {
            if !self.watched.contains(&subdir) {
                self.watch(subdir);
            }
        }
        true
    }

    /// Maps a changed path to the watched directory whose contents changed:
    /// its parent when watched, otherwise the path itself when watched.
    pub fn resolve(&self, changed: &Path) -> Option<PathBuf> {
        if let Some(parent) = changed.parent() {
            if self.watched.contains(parent) {
                return Some(parent.to_path_buf());
            }
        }
        self.watched.contains(changed).then(|| changed.to_path_buf())
    }

    fn watch(&mut self, dir: PathBuf) {
        match self.feed.watch(&dir) {
            Ok(()) => {
                self.watched.insert(dir);
            }
            Err(error) => log::warn!("{error}"),
        }
    }

    fn unwatch(&mut self, dir: &Path) {
        self.watched.remove(dir);
        if let Err(error) = self.feed.unwatch(dir) {
            log::debug!("{error}");
        }
    }
}

impl std::fmt::Debug for WatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchCoordinator")
            .field("watched", &self.watched)
            .finish_non_exhaustive()
    }
}
