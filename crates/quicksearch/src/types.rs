//! Shared enums for index configuration.

use serde::{Deserialize, Serialize};

/// Which kinds of entries an index collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    /// Files and directories.
    #[default]
    None,
    Files,
    Dirs,
    /// Decodable image files. Caller name filters are ignored in this mode.
    Images,
    /// Installed desktop applications. The root path is ignored.
    Applications,
}

impl FilterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Files => "files",
            Self::Dirs => "dirs",
            Self::Images => "images",
            Self::Applications => "applications",
        }
    }

    pub fn includes_files(self) -> bool {
        matches!(self, Self::None | Self::Files | Self::Images)
    }

    pub fn includes_dirs(self) -> bool {
        matches!(self, Self::None | Self::Dirs)
    }
}

/// Entry attribute used as the final sort tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Path,
    #[default]
    RelativePath,
    FileName,
    /// File name up to the first dot.
    BaseName,
    /// Everything after the first dot of the file name.
    Suffix,
    ParentDir,
    Size,
    /// Application display name; the file name for non-application entries.
    Name,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::RelativePath => "relativePath",
            Self::FileName => "fileName",
            Self::BaseName => "baseName",
            Self::Suffix => "suffix",
            Self::ParentDir => "parentDir",
            Self::Size => "size",
            Self::Name => "name",
        }
    }
}
