//! Directory walks for file-like filters.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use super::images::{has_image_extension, is_decodable_image};
use super::{EntrySeed, ScanRequest, ScanSet};
use crate::cancel::CancellationToken;
use crate::error::{QuicksearchError, Result};
use crate::types::FilterKind;

pub(super) fn enumerate_paths(request: &ScanRequest, token: &CancellationToken) -> Option<ScanSet> {
    // Images mode replaces caller filters with the image extension list.
    let name_filter = match request.filter {
        FilterKind::Images => None,
        _ => build_name_filter(&request.name_filters),
    };

    let mut builder = walk_builder(&request.dir, request.show_hidden);
    if !request.recursive {
        builder.max_depth(Some(1));
    } else if let Some(limit) = request.max_depth {
        // An entry at walk depth d sits at root depth offset + d - 1.
        let offset = depth_below(&request.root, &request.dir);
        match (limit + 1).checked_sub(offset) {
            Some(walk_depth) if walk_depth > 0 => {
                builder.max_depth(Some(walk_depth));
            }
            _ => return Some(ScanSet::default()),
        }
    }

    let mut entries = Vec::new();
    for result in builder.build() {
        token.is_cancelled()?;
        if request.is_full(entries.len()) {
            break;
        }

        let dent = match result {
            Ok(dent) => dent,
            Err(error) => {
                log::debug!("skipping unreadable path: {error}");
                continue;
            }
        };
        if dent.depth() == 0 {
            continue;
        }

        let path = dent.path();
        let Some(seed) = classify(path, request.filter) else {
            continue;
        };

        let file_name = dent.file_name().to_string_lossy();
        if let Some(filter) = &name_filter {
            if !filter.is_match(file_name.as_ref()) {
                continue;
            }
        }
        if request.filter == FilterKind::Images
            && !(has_image_extension(path) && is_decodable_image(path))
        {
            continue;
        }
        if !request.accepts_text(&file_name) {
            continue;
        }

        entries.push(seed);
    }

    token.is_cancelled()?;
    Some(ScanSet::new(entries))
}

/// Collects every directory below `dir`, excluding `dir` itself.
///
/// Returns `None` if cancelled.
pub fn collect_subdirectories(
    dir: &Path,
    show_hidden: bool,
    token: &CancellationToken,
) -> Option<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for result in walk_builder(dir, show_hidden).build() {
        token.is_cancelled()?;
        let Ok(dent) = result else {
            continue;
        };
        if dent.depth() > 0 && dent.file_type().is_some_and(|kind| kind.is_dir()) {
            dirs.push(dent.into_path());
        }
    }
    Some(dirs)
}

fn walk_builder(dir: &Path, show_hidden: bool) -> WalkBuilder {
    let mut builder = WalkBuilder::new(dir);
    builder
        .standard_filters(false)
        .hidden(!show_hidden)
        .follow_links(false);
    builder
}

/// Resolves what `path` is, following symlinks. Broken links and special
/// files yield `None`.
fn classify(path: &Path, filter: FilterKind) -> Option<EntrySeed> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(error) => {
            log::debug!("skipping {}: {error}", path.display());
            return None;
        }
    };

    if metadata.is_dir() {
        filter
            .includes_dirs()
            .then(|| EntrySeed::dir(path.to_path_buf()))
    } else if metadata.is_file() {
        filter
            .includes_files()
            .then(|| EntrySeed::file(path.to_path_buf(), metadata.len()))
    } else {
        None
    }
}

/// Checks that every non-empty name filter compiles.
pub fn check_name_filters(patterns: &[String]) -> Result<()> {
    for pattern in patterns.iter().filter(|pattern| !pattern.is_empty()) {
        compile_glob(pattern)?;
    }
    Ok(())
}

fn compile_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(true)
        .build()
        .map_err(|error| QuicksearchError::Pattern(format!("{pattern:?}: {error}")))
}

/// Builds a case-insensitive matcher over file names. Invalid patterns are
/// skipped; `None` means no name filtering.
fn build_name_filter(patterns: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut added = 0usize;
    for pattern in patterns.iter().filter(|pattern| !pattern.is_empty()) {
        match compile_glob(pattern) {
            Ok(glob) => {
                builder.add(glob);
                added += 1;
            }
            Err(error) => log::debug!("skipping name filter: {error}"),
        }
    }
    if added == 0 {
        return None;
    }

    match builder.build() {
        Ok(set) => Some(set),
        Err(error) => {
            log::warn!("ignoring name filters: {error}");
            None
        }
    }
}

/// Number of components `dir` sits below `root`.
fn depth_below(root: &Path, dir: &Path) -> usize {
    dir.strip_prefix(root)
        .map(|relative| relative.components().count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn request(root: &Path, filter: FilterKind) -> ScanRequest {
        ScanRequest {
            root: root.to_path_buf(),
            dir: root.to_path_buf(),
            recursive: false,
            show_hidden: false,
            filter,
            name_filters: Vec::new(),
            query: String::new(),
            min_score: 0.3,
            max_depth: None,
            max_results: None,
        }
    }

    fn names(set: ScanSet, root: &Path) -> Vec<String> {
        let mut names: Vec<String> = set
            .into_entries()
            .into_iter()
            .map(|seed| {
                seed.path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join("apple.txt")).unwrap();
        File::create(temp.path().join("banana.txt")).unwrap();
        File::create(temp.path().join(".hidden")).unwrap();
        fs::create_dir_all(temp.path().join("sub/deeper")).unwrap();
        File::create(temp.path().join("sub/cherry.md")).unwrap();
        File::create(temp.path().join("sub/deeper/date.txt")).unwrap();
        temp
    }

    #[test]
    fn flat_walk_lists_direct_children() {
        let temp = fixture();
        let set = enumerate_paths(&request(temp.path(), FilterKind::None), &CancellationToken::new())
            .unwrap();
        assert_eq!(names(set, temp.path()), vec!["apple.txt", "banana.txt", "sub"]);
    }

    #[test]
    fn files_and_dirs_filters() {
        let temp = fixture();
        let token = CancellationToken::new();
        let mut files = request(temp.path(), FilterKind::Files);
        files.recursive = true;
        let set = enumerate_paths(&files, &token).unwrap();
        assert_eq!(
            names(set, temp.path()),
            vec!["apple.txt", "banana.txt", "sub/cherry.md", "sub/deeper/date.txt"]
        );

        let mut dirs = request(temp.path(), FilterKind::Dirs);
        dirs.recursive = true;
        let set = enumerate_paths(&dirs, &token).unwrap();
        assert_eq!(names(set, temp.path()), vec!["sub", "sub/deeper"]);
    }

    #[test]
    fn hidden_entries_need_show_hidden() {
        let temp = fixture();
        let mut req = request(temp.path(), FilterKind::Files);
        req.show_hidden = true;
        let set = enumerate_paths(&req, &CancellationToken::new()).unwrap();
        assert!(names(set, temp.path()).contains(&".hidden".to_string()));
    }

    #[test]
    fn depth_limit_counts_from_root() {
        let temp = fixture();
        let mut req = request(temp.path(), FilterKind::Files);
        req.recursive = true;
        req.max_depth = Some(1);
        let set = enumerate_paths(&req, &CancellationToken::new()).unwrap();
        assert_eq!(
            names(set, temp.path()),
            vec!["apple.txt", "banana.txt", "sub/cherry.md"]
        );

        // Scoped to sub/, depth is still measured from the root.
        let scoped = req.clone().scoped_to(temp.path().join("sub"));
        let set = enumerate_paths(&scoped, &CancellationToken::new()).unwrap();
        assert_eq!(names(set, temp.path()), vec!["sub/cherry.md"]);

        let mut shallow = req.scoped_to(temp.path().join("sub/deeper"));
        shallow.max_depth = Some(0);
        let set = enumerate_paths(&shallow, &CancellationToken::new()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn name_filters_match_file_names_case_insensitively() {
        let temp = fixture();
        let mut req = request(temp.path(), FilterKind::Files);
        req.recursive = true;
        req.name_filters = vec!["*.TXT".to_string(), "[".to_string()];
        let set = enumerate_paths(&req, &CancellationToken::new()).unwrap();
        assert_eq!(
            names(set, temp.path()),
            vec!["apple.txt", "banana.txt", "sub/deeper/date.txt"]
        );
    }

    #[test]
    fn invalid_name_filters_are_reported() {
        assert!(check_name_filters(&["*.txt".to_string(), String::new()]).is_ok());
        let error = check_name_filters(&["*.txt".to_string(), "a[".to_string()]).unwrap_err();
        assert!(matches!(&error, QuicksearchError::Pattern(message) if message.contains("a[")));
    }

    #[test]
    fn images_need_a_decodable_image_and_ignore_name_filters() {
        let temp = TempDir::new().unwrap();
        image::RgbImage::new(4, 3)
            .save(temp.path().join("real.png"))
            .unwrap();
        fs::write(temp.path().join("fake.png"), b"nope").unwrap();
        File::create(temp.path().join("notes.txt")).unwrap();
        fs::create_dir(temp.path().join("dir.png")).unwrap();

        let mut req = request(temp.path(), FilterKind::Images);
        req.name_filters = vec!["*.txt".to_string()];
        let set = enumerate_paths(&req, &CancellationToken::new()).unwrap();
        assert_eq!(names(set, temp.path()), vec!["real.png"]);
    }

    #[test]
    fn query_filters_by_file_name() {
        let temp = fixture();
        let mut req = request(temp.path(), FilterKind::Files);
        req.query = "ap".to_string();
        let set = enumerate_paths(&req, &CancellationToken::new()).unwrap();
        assert_eq!(names(set, temp.path()), vec!["apple.txt"]);
    }

    #[test]
    fn results_cap_stops_early() {
        let temp = fixture();
        let mut req = request(temp.path(), FilterKind::Files);
        req.recursive = true;
        req.max_results = Some(2);
        let set = enumerate_paths(&req, &CancellationToken::new()).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn cancelled_walk_returns_none() {
        let temp = fixture();
        let token = CancellationToken::new();
        token.cancel();
        assert!(enumerate_paths(&request(temp.path(), FilterKind::None), &token).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlinks_are_skipped() {
        let temp = fixture();
        std::os::unix::fs::symlink(temp.path().join("missing"), temp.path().join("dangling"))
            .unwrap();
        std::os::unix::fs::symlink(temp.path().join("apple.txt"), temp.path().join("link.txt"))
            .unwrap();
        let set = enumerate_paths(&request(temp.path(), FilterKind::Files), &CancellationToken::new())
            .unwrap();
        assert_eq!(
            names(set, temp.path()),
            vec!["apple.txt", "banana.txt", "link.txt"]
        );
    }

    #[test]
    fn subdirectories_exclude_start() {
        let temp = fixture();
        fs::create_dir(temp.path().join(".git")).unwrap();
        let token = CancellationToken::new();

        let mut dirs = collect_subdirectories(temp.path(), false, &token).unwrap();
        dirs.sort();
        assert_eq!(dirs, vec![temp.path().join("sub"), temp.path().join("sub/deeper")]);

        let dirs = collect_subdirectories(temp.path(), true, &token).unwrap();
        assert_eq!(dirs.len(), 3);
    }
}
