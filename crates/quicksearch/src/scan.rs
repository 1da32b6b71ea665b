//! Cancellable enumeration of directory trees and application registries.
//!
//! A scan turns one [`ScanRequest`] into the complete set of matching
//! entries for its directory (or for the whole registry). Scans run on
//! worker threads and poll their [`CancellationToken`] once per candidate;
//! a cancelled scan yields `None` and never a partial set.
//!
//! ## Module Structure
//!
//! - `walk` - Files / Dirs / Images / no-filter directory walks
//! - `images` - Image extension list and decode check
//! - `applications` - Registry enumeration with basename deduplication
//! - `registry` - The application registry collaborator

mod applications;
mod images;
mod registry;
mod walk;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use desktop_entry::DesktopEntry;
use fnv::FnvHashSet;

use crate::cancel::CancellationToken;
use crate::config::IndexConfig;
use crate::fuzzy::fuzzy_match;
use crate::types::FilterKind;

pub use images::{has_image_extension, is_decodable_image, IMAGE_EXTENSIONS};
pub use registry::{ApplicationRegistry, DirectoryRegistry, XdgRegistry};
pub use walk::{check_name_filters, collect_subdirectories};

/// Snapshot of the configuration a single scan runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    /// The configured index root. Depth is measured from here.
    pub root: PathBuf,
    /// Where the walk starts: the root, or a changed subdirectory.
    pub dir: PathBuf,
    pub recursive: bool,
    pub show_hidden: bool,
    pub filter: FilterKind,
    pub name_filters: Vec<String>,
    pub query: String,
    pub min_score: f64,
    /// Deepest accepted entry depth; direct children of the root are depth 0.
    pub max_depth: Option<usize>,
    pub max_results: Option<usize>,
}

impl ScanRequest {
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            root: config.path.clone(),
            dir: config.path.clone(),
            recursive: config.recursive,
            show_hidden: config.show_hidden,
            filter: config.filter,
            name_filters: config.name_filters.clone(),
            query: config.query.clone(),
            min_score: config.min_score,
            max_depth: config.depth_limit(),
            max_results: config.results_cap(),
        }
    }

    /// Restricts the walk to `dir`, keeping depth relative to the root.
    pub fn scoped_to(mut self, dir: PathBuf) -> Self {
        self.dir = dir;
        self
    }

    /// True if `text` passes the query, or there is no query.
    pub fn accepts_text(&self, text: &str) -> bool {
        self.query.is_empty() || fuzzy_match(&self.query, text).accepts(self.min_score)
    }

    fn is_full(&self, accepted: usize) -> bool {
        self.max_results.is_some_and(|cap| accepted >= cap)
    }
}

/// What a scan learned about one accepted path.
///
/// Seeds carry everything needed to build an [`Entry`](crate::model::Entry)
/// so applying a scan never touches the filesystem.
#[derive(Debug, Clone)]
pub struct EntrySeed {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub application: Option<Arc<DesktopEntry>>,
}

impl EntrySeed {
    pub fn file(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            is_dir: false,
            size,
            application: None,
        }
    }

    pub fn dir(path: PathBuf) -> Self {
        Self {
            path,
            is_dir: true,
            size: 0,
            application: None,
        }
    }

    pub fn application(path: PathBuf, size: u64, entry: DesktopEntry) -> Self {
        Self {
            path,
            is_dir: false,
            size,
            application: Some(Arc::new(entry)),
        }
    }
}

/// The complete result of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSet {
    entries: Vec<EntrySeed>,
}

impl ScanSet {
    pub fn new(entries: Vec<EntrySeed>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> FnvHashSet<PathBuf> {
        self.entries.iter().map(|seed| seed.path.clone()).collect()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|seed| seed.path == path)
    }

    pub fn into_entries(self) -> Vec<EntrySeed> {
        self.entries
    }
}

/// Runs one scan.
///
/// Returns `None` if the token was cancelled before the scan finished.
pub fn enumerate(
    request: &ScanRequest,
    registry: &dyn ApplicationRegistry,
    token: &CancellationToken,
) -> Option<ScanSet> {
    match request.filter {
        FilterKind::Applications => applications::enumerate_applications(request, registry, token),
        _ => walk::enumerate_paths(request, token),
    }
}
