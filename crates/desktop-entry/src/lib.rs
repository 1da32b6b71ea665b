//! Freedesktop desktop-entry support for application pickers.
//!
//! This crate provides the pieces an application search needs from the
//! XDG desktop-entry world:
//! - Key-file parsing with localized key lookup
//! - `Exec` tokenizing (quotes, escapes, field codes)
//! - XDG application directory resolution
//! - Detached launching of a resolved command

pub mod entry;
pub mod error;
pub mod exec;
pub mod keyfile;
pub mod launch;
pub mod locale;
pub mod xdg;

pub use entry::{parse_file, parse_str, DesktopAction, DesktopEntry, DESKTOP_ENTRY_EXTENSION};
pub use error::{DesktopEntryError, Result};
pub use exec::parse_exec;
pub use keyfile::KeyFile;
pub use launch::launch;
pub use locale::Locale;
pub use xdg::{application_dirs, candidate_application_dirs};
