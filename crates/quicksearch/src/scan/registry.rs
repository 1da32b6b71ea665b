//! The application registry collaborator.

use std::path::{Path, PathBuf};

use desktop_entry::DesktopEntry;

/// Source of desktop application records.
pub trait ApplicationRegistry: Send + Sync {
    /// Directories holding `.desktop` files, highest priority first.
    fn search_roots(&self) -> Vec<PathBuf>;

    /// Parses one entry. `None` for unreadable or non-application entries.
    fn parse(&self, path: &Path) -> Option<DesktopEntry>;
}

/// The registry of the current user's XDG data directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct XdgRegistry;

impl ApplicationRegistry for XdgRegistry {
    fn search_roots(&self) -> Vec<PathBuf> {
        desktop_entry::application_dirs()
    }

    fn parse(&self, path: &Path) -> Option<DesktopEntry> {
        desktop_entry::parse_file(path)
    }
}

/// A registry over a fixed list of directories.
#[derive(Debug, Clone, Default)]
pub struct DirectoryRegistry {
    roots: Vec<PathBuf>,
}

impl DirectoryRegistry {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl ApplicationRegistry for DirectoryRegistry {
    fn search_roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }

    fn parse(&self, path: &Path) -> Option<DesktopEntry> {
        desktop_entry::parse_file(path)
    }
}
