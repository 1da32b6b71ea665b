//! Application registry enumeration.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use desktop_entry::DESKTOP_ENTRY_EXTENSION;
use fnv::FnvHashSet;

use super::registry::ApplicationRegistry;
use super::{EntrySeed, ScanRequest, ScanSet};
use crate::cancel::CancellationToken;

/// Enumerates applications across the registry's roots in priority order.
///
/// The first entry seen for a basename shadows every later one, even when
/// it fails to parse or is hidden.
pub(super) fn enumerate_applications(
    request: &ScanRequest,
    registry: &dyn ApplicationRegistry,
    token: &CancellationToken,
) -> Option<ScanSet> {
    let mut seen: FnvHashSet<OsString> = FnvHashSet::default();
    let mut entries = Vec::new();

    'roots: for root in registry.search_roots() {
        for path in desktop_files(&root) {
            token.is_cancelled()?;

            let Some(basename) = path.file_name() else {
                continue;
            };
            if !seen.insert(basename.to_os_string()) {
                continue;
            }

            let Some(app) = registry.parse(&path) else {
                continue;
            };
            if app.no_display && !request.show_hidden {
                continue;
            }
            if !request.accepts_text(&app.search_text()) {
                continue;
            }

            let size = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
            entries.push(EntrySeed::application(path, size, app));
            if request.is_full(entries.len()) {
                break 'roots;
            }
        }
    }

    token.is_cancelled()?;
    Some(ScanSet::new(entries))
}

/// Lists the `.desktop` files directly inside `dir`, sorted by name.
fn desktop_files(dir: &Path) -> Vec<PathBuf> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(error) => {
            log::debug!("skipping application dir {}: {error}", dir.display());
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = read_dir
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext == DESKTOP_ENTRY_EXTENSION)
                && path.is_file()
        })
        .collect();
    files.sort();
    files
}
