//! Path-set differences between consecutive scans.

use std::path::PathBuf;

use fnv::FnvHashSet;

use crate::scan::{EntrySeed, ScanSet};

/// `(old - new, new - old)` for two path sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathDiff {
    pub removed: FnvHashSet<PathBuf>,
    pub added: FnvHashSet<PathBuf>,
}

impl PathDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

pub fn diff(old: &FnvHashSet<PathBuf>, new: &FnvHashSet<PathBuf>) -> PathDiff {
    PathDiff {
        removed: old.difference(new).cloned().collect(),
        added: new.difference(old).cloned().collect(),
    }
}

/// What a finished scan asks the live index to do.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// The scan found exactly the previous path set.
    Unchanged,
    Changed {
        removed: FnvHashSet<PathBuf>,
        /// Seeds for the paths in `new - old`.
        added: Vec<EntrySeed>,
    },
}

impl ScanOutcome {
    /// Compares a scan against the paths the index held for the same scope
    /// when the scan was launched.
    pub fn from_scan(previous: &FnvHashSet<PathBuf>, scan: ScanSet) -> Self {
        let current = scan.paths();
        if current == *previous {
            return Self::Unchanged;
        }

        let PathDiff { removed, added } = diff(previous, &current);
        let added = scan
            .into_entries()
            .into_iter()
            .filter(|seed| added.contains(&seed.path))
            .collect();
        Self::Changed { removed, added }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}
