//! Live index entries.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use desktop_entry::DesktopEntry;

use crate::scan::EntrySeed;

/// One discovered path or application in the live index.
///
/// The absolute path is the entry's identity. Only the relative path changes
/// over an entry's lifetime, when the index root moves.
#[derive(Debug, Clone)]
pub struct Entry {
    path: PathBuf,
    relative_path: String,
    file_name: String,
    is_dir: bool,
    size: u64,
    application: Option<Arc<DesktopEntry>>,
}

impl Entry {
    pub fn from_seed(seed: EntrySeed, root: &Path) -> Self {
        let file_name = seed
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            relative_path: relative_path(root, &seed.path),
            file_name,
            path: seed.path,
            is_dir: seed.is_dir,
            size: seed.size,
            application: seed.application,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Recomputes the relative path against a new root. Returns true if it changed.
    pub(crate) fn rebase(&mut self, root: &Path) -> bool {
        let relative = relative_path(root, &self.path);
        if relative == self.relative_path {
            return false;
        }
        self.relative_path = relative;
        true
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name up to the first dot. Empty for dotfiles.
    pub fn base_name(&self) -> &str {
        match self.file_name.split_once('.') {
            Some((base, _)) => base,
            None => &self.file_name,
        }
    }

    /// Everything after the first dot of the file name.
    pub fn suffix(&self) -> &str {
        match self.file_name.split_once('.') {
            Some((_, suffix)) => suffix,
            None => "",
        }
    }

    pub fn parent_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn application(&self) -> Option<&DesktopEntry> {
        self.application.as_deref()
    }

    /// Display name: the application name, or the file name.
    pub fn name(&self) -> &str {
        match &self.application {
            Some(app) if !app.name.is_empty() => &app.name,
            _ => &self.file_name,
        }
    }

    /// Text the query is matched against.
    pub fn search_text(&self) -> Cow<'_, str> {
        match &self.application {
            Some(app) => Cow::Owned(app.search_text()),
            None => Cow::Borrowed(&self.file_name),
        }
    }

    /// Key under which this entry's relevance score is cached.
    ///
    /// Applications are keyed by path since their text is composite; files
    /// share scores by name.
    pub fn score_key(&self) -> Cow<'_, str> {
        match &self.application {
            Some(_) => self.path.to_string_lossy(),
            None => Cow::Borrowed(&self.file_name),
        }
    }
}

/// Renders `path` relative to `root`, or absolute when outside it.
pub fn relative_path(root: &Path, path: &Path) -> String {
    if root.as_os_str().is_empty() {
        return path.to_string_lossy().into_owned();
    }
    match path.strip_prefix(root) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}
