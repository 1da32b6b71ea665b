//! XDG application directory resolution.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

const DEFAULT_DATA_DIRS: &str = "/usr/local/share:/usr/share";

/// Returns the application directories to search, highest priority first.
///
/// Only directories that exist are returned.
pub fn application_dirs() -> Vec<PathBuf> {
    candidate_application_dirs(
        env::var_os("XDG_DATA_HOME"),
        env::var_os("XDG_DATA_DIRS"),
        dirs::home_dir(),
    )
    .into_iter()
    .filter(|dir| dir.is_dir())
    .collect()
}

/// Builds the ordered candidate list without touching the filesystem.
///
/// `$XDG_DATA_HOME/applications` (default `~/.local/share/applications`) comes
/// first, followed by `applications` under each `$XDG_DATA_DIRS` entry
/// (default `/usr/local/share:/usr/share`). Empty variables count as unset.
pub fn candidate_application_dirs(
    data_home: Option<OsString>,
    data_dirs: Option<OsString>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    let data_home = data_home
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|home| home.join(".local/share")));
    if let Some(data_home) = data_home {
        dirs.push(data_home.join("applications"));
    }

    let data_dirs = data_dirs
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| OsString::from(DEFAULT_DATA_DIRS));
    for dir in env::split_paths(&data_dirs) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let apps = dir.join("applications");
        if !dirs.contains(&apps) {
            dirs.push(apps);
        }
    }

    dirs
}
