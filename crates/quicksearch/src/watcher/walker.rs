//! Path utilities for change handling.

use std::path::{Path, PathBuf};

use fnv::FnvHashSet;

/// Checks if `candidate` is `root` or lies below it.
pub fn path_in_scope(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

/// Reduces a burst of changed directories to the minimal set whose rescans
/// cover every change.
///
/// Paths are visited shallowest first, so an ancestor is always selected
/// before any of its descendants can be:
///
/// ```text
/// Input:  ["/a/b/c", "/a/b", "/a/b/d", "/x/y"]
/// Output: ["/a/b", "/x/y"]
/// ```
///
/// Only valid when a rescan of a directory covers its whole subtree, that
/// is, in recursive mode.
pub fn coalesce_event_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    if paths.len() <= 1 {
        return paths;
    }

    let mut candidates: Vec<(PathBuf, usize)> = paths
        .into_iter()
        .map(|path| {
            let depth = path_depth(&path);
            (path, depth)
        })
        .collect();
    candidates.sort_unstable_by(|(path_a, depth_a), (path_b, depth_b)| {
        depth_a.cmp(depth_b).then_with(|| path_a.cmp(path_b))
    });
    candidates.dedup_by(|(path_a, _), (path_b, _)| path_a == path_b);

    let mut selected = Vec::with_capacity(candidates.len());
    let mut selected_set = FnvHashSet::default();
    for (path, _) in candidates {
        if has_selected_ancestor(&path, &selected_set) {
            continue;
        }
        selected_set.insert(path.clone());
        selected.push(path);
    }
    selected
}

/// Removes duplicates while keeping the first occurrence's position.
pub fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = FnvHashSet::default();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

#[inline]
fn path_depth(path: &Path) -> usize {
    path.components().count()
}

/// Walks the parent chain of `path`, including `path` itself.
fn has_selected_ancestor(path: &Path, selected: &FnvHashSet<PathBuf>) -> bool {
    if selected.is_empty() {
        return false;
    }
    path.ancestors().any(|ancestor| selected.contains(ancestor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn coalesce_trivial_inputs() {
        assert!(coalesce_event_paths(Vec::new()).is_empty());
        assert_eq!(coalesce_event_paths(paths(&["/a/b"])), paths(&["/a/b"]));
    }

    #[test]
    fn coalesce_removes_covered_descendants() {
        let result = coalesce_event_paths(paths(&["/a/b/c/d", "/a/b/c/e", "/x/y", "/a/b", "/a/b"]));
        assert_eq!(result, paths(&["/a/b", "/x/y"]));
    }

    #[test]
    fn coalesce_keeps_siblings_and_similar_prefixes() {
        let result = coalesce_event_paths(paths(&["/foo/barista", "/foo/bar", "/foo/baz"]));
        assert_eq!(result, paths(&["/foo/bar", "/foo/barista", "/foo/baz"]));
    }

    #[test]
    fn dedup_keeps_first_position() {
        let result = dedup_paths(paths(&["/b", "/a", "/b", "/c", "/a"]));
        assert_eq!(result, paths(&["/b", "/a", "/c"]));
    }

    #[test]
    fn ancestor_lookup() {
        let selected: FnvHashSet<PathBuf> = paths(&["/a/b"]).into_iter().collect();
        assert!(has_selected_ancestor(Path::new("/a/b"), &selected));
        assert!(has_selected_ancestor(Path::new("/a/b/c/d"), &selected));
        assert!(!has_selected_ancestor(Path::new("/a/bc"), &selected));
        assert!(!has_selected_ancestor(Path::new("/a"), &FnvHashSet::default()));
    }

    #[test]
    fn scope() {
        assert!(path_in_scope(Path::new("/r"), Path::new("/r")));
        assert!(path_in_scope(Path::new("/r"), Path::new("/r/a/b")));
        assert!(!path_in_scope(Path::new("/r"), Path::new("/rx")));
    }

    #[test]
    fn depth_counts_components() {
        assert_eq!(path_depth(Path::new("/")), 1);
        assert_eq!(path_depth(Path::new("/a/b")), 3);
    }
}
