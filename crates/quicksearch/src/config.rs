use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QuicksearchError, Result};
use crate::types::{FilterKind, SortKey};

pub const DEFAULT_MIN_SCORE: f64 = 0.3;
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;
pub const THUMBNAIL_CACHE_DIR_NAME: &str = "quicksearch/image-thumbnails";

/// Everything that determines what an index contains and how it is ordered.
///
/// `max_depth < 0` and `max_results <= 0` mean unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexConfig {
    pub path: PathBuf,
    pub recursive: bool,
    pub watch_changes: bool,
    pub show_hidden: bool,
    pub sort: bool,
    pub sort_key: SortKey,
    pub sort_reverse: bool,
    pub filter: FilterKind,
    pub name_filters: Vec<String>,
    pub query: String,
    pub min_score: f64,
    pub max_depth: i32,
    pub max_results: i32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            recursive: false,
            watch_changes: true,
            show_hidden: false,
            sort: true,
            sort_key: SortKey::RelativePath,
            sort_reverse: false,
            filter: FilterKind::None,
            name_filters: Vec::new(),
            query: String::new(),
            min_score: DEFAULT_MIN_SCORE,
            max_depth: -1,
            max_results: -1,
        }
    }
}

impl IndexConfig {
    pub fn from_json_str(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map_err(|error| QuicksearchError::Config(format!("failed to parse index config: {error}")))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|error| {
            QuicksearchError::Config(format!(
                "failed to read index config {}: {error}",
                path.display()
            ))
        })?;
        serde_json::from_str(&data).map_err(|error| {
            QuicksearchError::Config(format!(
                "failed to parse index config {}: {error}",
                path.display()
            ))
        })
    }

    /// The depth limit, if one is in effect.
    pub fn depth_limit(&self) -> Option<usize> {
        usize::try_from(self.max_depth).ok()
    }

    /// The result cap, if one is in effect.
    pub fn results_cap(&self) -> Option<usize> {
        usize::try_from(self.max_results).ok().filter(|cap| *cap > 0)
    }

    pub fn is_applications(&self) -> bool {
        self.filter == FilterKind::Applications
    }
}

/// Settings for the engine itself rather than for one request.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Background worker threads. 0 lets rayon choose.
    pub worker_threads: usize,
    /// Capacity of the consumer event channel.
    pub event_capacity: usize,
    /// Where image thumbnails are written.
    pub thumbnail_dir: PathBuf,
}

impl Default for EngineOptions {
    fn default() -> Self {
        let cache_root = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            worker_threads: 0,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            thumbnail_dir: cache_root.join(THUMBNAIL_CACHE_DIR_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let config = IndexConfig::default();
        assert!(config.watch_changes);
        assert!(config.sort);
        assert_eq!(config.sort_key, SortKey::RelativePath);
        assert_eq!(config.min_score, 0.3);
        assert_eq!(config.depth_limit(), None);
        assert_eq!(config.results_cap(), None);
    }

    #[test]
    fn sentinels_are_unbounded() {
        let config = IndexConfig {
            max_depth: 0,
            max_results: 0,
            ..IndexConfig::default()
        };
        assert_eq!(config.depth_limit(), Some(0));
        assert_eq!(config.results_cap(), None);

        let config = IndexConfig {
            max_results: 25,
            ..IndexConfig::default()
        };
        assert_eq!(config.results_cap(), Some(25));
    }

    #[test]
    fn parses_partial_camel_case_json() {
        let config = IndexConfig::from_json_str(
            r#"{"path": "/tmp/x", "filter": "files", "sortKey": "fileName", "maxResults": 10}"#,
        )
        .unwrap();
        assert_eq!(config.path, PathBuf::from("/tmp/x"));
        assert_eq!(config.filter, FilterKind::Files);
        assert_eq!(config.sort_key, SortKey::FileName);
        assert_eq!(config.max_results, 10);
        assert!(config.watch_changes);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("index.json");
        std::fs::write(&path, r#"{"recursive": true, "query": "ap"}"#).expect("write");

        let config = IndexConfig::from_json_file(&path).expect("load");
        assert!(config.recursive);
        assert_eq!(config.query, "ap");
    }

    #[test]
    fn reports_bad_config() {
        let err = IndexConfig::from_json_str(r#"{"filter": "everything"}"#).expect_err("bad filter");
        assert!(matches!(err, QuicksearchError::Config(_)));

        let dir = tempdir().expect("tempdir");
        let err = IndexConfig::from_json_file(&dir.path().join("missing.json")).expect_err("missing");
        assert!(matches!(err, QuicksearchError::Config(_)));
    }
}
