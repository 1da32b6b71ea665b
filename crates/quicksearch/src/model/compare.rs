//! Entry ordering.
//!
//! With sorting enabled entries are ordered by, in turn:
//! 1. relevance score, highest first, while a query is active
//! 2. directories before files
//! 3. the configured sort attribute, case-folded first
//!
//! `reverse` flips each of these steps.

use std::cmp::Ordering;

use fnv::FnvHashMap;

use super::entry::Entry;
use crate::config::IndexConfig;
use crate::fuzzy::fuzzy_score;
use crate::types::SortKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub enabled: bool,
    pub key: SortKey,
    pub reverse: bool,
}

impl SortSpec {
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            enabled: config.sort,
            key: config.sort_key,
            reverse: config.sort_reverse,
        }
    }
}

/// Relevance scores for the current query, keyed by [`Entry::score_key`].
#[derive(Debug, Clone, Default)]
pub struct ScoreCache {
    query: String,
    scores: FnvHashMap<String, f64>,
}

impl ScoreCache {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            scores: FnvHashMap::default(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// True when a query is set and scores take part in ordering.
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// Switches to a new query. Scores never survive a query change.
    pub fn set_query(&mut self, query: &str) {
        if self.query != query {
            self.query = query.to_string();
            self.scores.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Returns the entry's score, computing and caching it on a miss.
    pub fn score(&mut self, entry: &Entry) -> f64 {
        let key = entry.score_key();
        if let Some(score) = self.scores.get(key.as_ref()) {
            return *score;
        }
        let score = fuzzy_score(&self.query, &entry.search_text());
        self.scores.insert(key.into_owned(), score);
        score
    }

    /// Scores every entry not yet cached.
    pub fn prime<'a>(&mut self, entries: impl IntoIterator<Item = &'a Entry>) {
        if !self.is_active() {
            return;
        }
        for entry in entries {
            self.score(entry);
        }
    }

    /// Cached score, or a fresh one that is not stored.
    fn lookup(&self, entry: &Entry) -> f64 {
        self.scores
            .get(entry.score_key().as_ref())
            .copied()
            .unwrap_or_else(|| fuzzy_score(&self.query, &entry.search_text()))
    }
}

/// Orders two entries under `spec`.
pub fn compare_entries(spec: &SortSpec, scores: &ScoreCache, a: &Entry, b: &Entry) -> Ordering {
    if !spec.enabled {
        return Ordering::Equal;
    }

    let directed = |ordering: Ordering| {
        if spec.reverse {
            ordering.reverse()
        } else {
            ordering
        }
    };

    if scores.is_active() {
        let by_score = scores.lookup(b).total_cmp(&scores.lookup(a));
        if by_score != Ordering::Equal {
            return directed(by_score);
        }
    }

    let dirs_first = b.is_dir().cmp(&a.is_dir());
    if dirs_first != Ordering::Equal {
        return directed(dirs_first);
    }

    directed(compare_attribute(spec.key, a, b))
}

fn compare_attribute(key: SortKey, a: &Entry, b: &Entry) -> Ordering {
    match key {
        SortKey::Path => collate(&a.path().to_string_lossy(), &b.path().to_string_lossy()),
        SortKey::RelativePath => collate(a.relative_path(), b.relative_path()),
        SortKey::FileName => collate(a.file_name(), b.file_name()),
        SortKey::BaseName => collate(a.base_name(), b.base_name()),
        SortKey::Suffix => collate(a.suffix(), b.suffix()),
        SortKey::ParentDir => collate(
            &a.parent_dir().to_string_lossy(),
            &b.parent_dir().to_string_lossy(),
        ),
        SortKey::Size => a.size().cmp(&b.size()),
        SortKey::Name => collate(a.name(), b.name()),
    }
}

/// Case-folded comparison, with a raw comparison breaking ties so the
/// order stays total.
fn collate(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::EntrySeed;
    use std::path::{Path, PathBuf};

    fn file(name: &str, size: u64) -> Entry {
        Entry::from_seed(
            EntrySeed::file(PathBuf::from(format!("/r/{name}")), size),
            Path::new("/r"),
        )
    }

    fn dir(name: &str) -> Entry {
        Entry::from_seed(EntrySeed::dir(PathBuf::from(format!("/r/{name}"))), Path::new("/r"))
    }

    fn sorted(mut entries: Vec<Entry>, spec: &SortSpec, scores: &mut ScoreCache) -> Vec<String> {
        scores.prime(entries.iter());
        let scores: &ScoreCache = scores;
        entries.sort_by(|a, b| compare_entries(spec, scores, a, b));
        entries.iter().map(|e| e.file_name().to_string()).collect()
    }

    fn spec() -> SortSpec {
        SortSpec {
            enabled: true,
            key: SortKey::RelativePath,
            reverse: false,
        }
    }

    #[test]
    fn disabled_sort_keeps_order() {
        let spec = SortSpec::default();
        let names = sorted(
            vec![file("b", 0), dir("z"), file("a", 0)],
            &spec,
            &mut ScoreCache::default(),
        );
        assert_eq!(names, vec!["b", "z", "a"]);
    }

    #[test]
    fn directories_first_then_collated_names() {
        let names = sorted(
            vec![file("beta", 0), file("Alpha", 0), dir("zeta"), file("alpha", 0)],
            &spec(),
            &mut ScoreCache::default(),
        );
        assert_eq!(names, vec!["zeta", "Alpha", "alpha", "beta"]);
    }

    #[test]
    fn reverse_flips_every_step() {
        let reverse = SortSpec {
            reverse: true,
            ..spec()
        };
        let names = sorted(
            vec![file("a", 0), dir("d"), file("b", 0)],
            &reverse,
            &mut ScoreCache::default(),
        );
        assert_eq!(names, vec!["b", "a", "d"]);
    }

    #[test]
    fn score_dominates_when_query_active() {
        let mut scores = ScoreCache::new("ap");
        let names = sorted(
            vec![dir("xyap"), file("zap", 0), file("apple", 0)],
            &spec(),
            &mut scores,
        );
        assert_eq!(names, vec!["apple", "zap", "xyap"]);
        assert_eq!(scores.len(), 3);
    }

    #[test]
    fn size_sorts_numerically() {
        let by_size = SortSpec {
            key: SortKey::Size,
            ..spec()
        };
        let names = sorted(
            vec![file("big", 100), file("small", 9), file("mid", 10)],
            &by_size,
            &mut ScoreCache::default(),
        );
        assert_eq!(names, vec!["small", "mid", "big"]);
    }

    #[test]
    fn query_change_clears_scores() {
        let mut scores = ScoreCache::new("a");
        scores.score(&file("apple", 0));
        assert_eq!(scores.len(), 1);

        scores.set_query("a");
        assert_eq!(scores.len(), 1);
        scores.set_query("b");
        assert!(scores.is_empty());
        assert_eq!(scores.query(), "b");
    }

    #[test]
    fn collate_is_case_folded_then_raw() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("B", "b"), Ordering::Less);
        assert_eq!(collate("same", "same"), Ordering::Equal);
    }
}
