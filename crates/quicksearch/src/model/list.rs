//! The ordered live entry list.
//!
//! Diffs are applied as batched contiguous-range updates so a view layer
//! can replay one event per run instead of one per entry:
//!
//! - removals are coalesced into maximal contiguous index runs and removed
//!   from the back of the list towards the front
//! - unsorted insertions are appended as one range
//! - sorted insertions binary-search each new entry's upper bound and insert
//!   entries sharing an insertion point as one range
//! - when a batch is larger than the list itself, entries are appended and
//!   the whole list is re-sorted instead
//!
//! Both insertion strategies produce the same order because new entries are
//! stably sorted first and land after existing entries that compare equal.

use std::path::{Path, PathBuf};

use fnv::FnvHashSet;

use super::compare::{compare_entries, ScoreCache, SortSpec};
use super::entry::Entry;
use super::events::ListEvent;
use crate::scan::EntrySeed;

#[derive(Debug, Clone, Default)]
pub struct OrderedEntries {
    entries: Vec<Entry>,
    paths: FnvHashSet<PathBuf>,
}

impl OrderedEntries {
    pub fn new() -> Self {
        Self::default()
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

    pub fn as_slice(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Up to `count` entries starting at `start`; empty when `start` is out
    /// of range.
    pub fn slice(&self, start: usize, count: usize) -> &[Entry] {
        if start >= self.entries.len() {
            return &[];
        }
        let end = start.saturating_add(count).min(self.entries.len());
        &self.entries[start..end]
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn paths(&self) -> FnvHashSet<PathBuf> {
        self.paths.clone()
    }

    /// Paths of entries below `dir`: every descendant when `recursive`,
    /// otherwise direct children only.
    pub fn paths_within(&self, dir: &Path, recursive: bool) -> FnvHashSet<PathBuf> {
        self.paths
            .iter()
            .filter(|path| {
                if recursive {
                    path.starts_with(dir) && path.as_path() != dir
                } else {
                    path.parent() == Some(dir)
                }
            })
            .cloned()
            .collect()
    }

    /// Applies one scan diff.
    pub fn apply(
        &mut self,
        removed: &FnvHashSet<PathBuf>,
        added: Vec<EntrySeed>,
        root: &Path,
        spec: &SortSpec,
        scores: &mut ScoreCache,
    ) -> Vec<ListEvent> {
        let mut events = self.remove_paths(removed);
        let entries = added
            .into_iter()
            .map(|seed| Entry::from_seed(seed, root))
            .collect();
        events.extend(self.insert(entries, spec, scores));
        events
    }

    /// Removes every entry whose path is in `removed`, one event per
    /// contiguous run, back to front.
    pub fn remove_paths(&mut self, removed: &FnvHashSet<PathBuf>) -> Vec<ListEvent> {
        if removed.is_empty() || self.entries.is_empty() {
            return Vec::new();
        }

        let indices: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| removed.contains(entry.path()))
            .map(|(index, _)| index)
            .collect();

        let mut events = Vec::new();
        let mut runs = indices.into_iter().rev().peekable();
        while let Some(high) = runs.next() {
            let mut low = high;
            while runs.peek().is_some_and(|next| *next + 1 == low) {
                low -= 1;
                runs.next();
            }
            for entry in self.entries.drain(low..=high) {
                self.paths.remove(entry.path());
            }
            events.push(ListEvent::Removed {
                index: low,
                count: high - low + 1,
            });
        }
        events
    }

    /// Inserts entries not already present.
    pub fn insert(
        &mut self,
        entries: Vec<Entry>,
        spec: &SortSpec,
        scores: &mut ScoreCache,
    ) -> Vec<ListEvent> {
        let mut fresh = Vec::with_capacity(entries.len());
        for entry in entries {
            if self.paths.insert(entry.path().to_path_buf()) {
                fresh.push(entry);
            }
        }
        if fresh.is_empty() {
            return Vec::new();
        }

        if !spec.enabled {
            let index = self.entries.len();
            let count = fresh.len();
            self.entries.extend(fresh);
            return vec![ListEvent::Inserted { index, count }];
        }

        scores.prime(self.entries.iter().chain(fresh.iter()));
        let scores: &ScoreCache = scores;

        if fresh.len() > self.entries.len() {
            let was_empty = self.entries.is_empty();
            let count = fresh.len();
            self.entries.extend(fresh);
            self.entries
                .sort_by(|a, b| compare_entries(spec, scores, a, b));
            return if was_empty {
                vec![ListEvent::Inserted { index: 0, count }]
            } else {
                vec![ListEvent::Reset]
            };
        }

        fresh.sort_by(|a, b| compare_entries(spec, scores, a, b));

        let mut groups: Vec<(usize, Vec<Entry>)> = Vec::new();
        for entry in fresh {
            let at = self
                .entries
                .partition_point(|existing| compare_entries(spec, scores, existing, &entry).is_le());
            match groups.last_mut() {
                Some((index, group)) if *index == at => group.push(entry),
                _ => groups.push((at, vec![entry])),
            }
        }

        let mut events = Vec::with_capacity(groups.len());
        for (index, group) in groups.into_iter().rev() {
            let count = group.len();
            self.entries.splice(index..index, group);
            events.push(ListEvent::Inserted { index, count });
        }
        events
    }

    /// Re-sorts the whole list under a changed comparator.
    pub fn resort(&mut self, spec: &SortSpec, scores: &mut ScoreCache) -> Option<ListEvent> {
        if !spec.enabled || self.entries.is_empty() {
            return None;
        }
        scores.prime(self.entries.iter());
        let scores: &ScoreCache = scores;
        self.entries
            .sort_by(|a, b| compare_entries(spec, scores, a, b));
        Some(ListEvent::Reset)
    }

    /// Recomputes relative paths against a new root.
    pub fn rebase(&mut self, root: &Path) -> Option<ListEvent> {
        let mut changed = false;
        for entry in &mut self.entries {
            changed |= entry.rebase(root);
        }
        changed.then_some(ListEvent::Updated {
            index: 0,
            count: self.entries.len(),
        })
    }

    pub fn clear(&mut self) -> Option<ListEvent> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries.clear();
        self.paths.clear();
        Some(ListEvent::Reset)
    }
}
