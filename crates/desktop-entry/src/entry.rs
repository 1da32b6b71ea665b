//! Desktop entry records.

use std::fs;
use std::path::Path;

use crate::exec::parse_exec;
use crate::keyfile::{split_list, KeyFile};
use crate::locale::Locale;

pub const DESKTOP_ENTRY_EXTENSION: &str = "desktop";

const MAIN_GROUP: &str = "Desktop Entry";

/// An additional launch action declared by an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopAction {
    pub id: String,
    pub name: String,
    pub exec: String,
    pub icon: String,
    pub command: Vec<String>,
}

/// A parsed `Type=Application` desktop entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopEntry {
    /// The entry's file name, e.g. `firefox.desktop`.
    pub id: String,
    pub name: String,
    pub generic_name: String,
    pub comment: String,
    pub icon: String,
    /// The raw `Exec` value.
    pub exec: String,
    /// `Exec` split into argv with field codes removed.
    pub command: Vec<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub actions: Vec<DesktopAction>,
    pub no_display: bool,
    pub terminal: bool,
    pub working_directory: String,
    pub startup_class: String,
}

impl DesktopEntry {
    /// Text used for fuzzy matching: name, generic name, comment and keywords.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name,
            self.generic_name,
            self.comment,
            self.keywords.join(" ")
        )
    }
}

/// Reads and parses a desktop entry file using the process locale.
///
/// Returns `None` for unreadable files and entries that are not applications.
pub fn parse_file(path: &Path) -> Option<DesktopEntry> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => {
            log::debug!("skipping desktop entry {}: {error}", path.display());
            return None;
        }
    };
    let id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_str(&content, &id, Locale::from_env().as_ref())
}

/// Parses desktop entry content.
pub fn parse_str(content: &str, id: &str, locale: Option<&Locale>) -> Option<DesktopEntry> {
    let file = KeyFile::parse(content);
    if file.get(MAIN_GROUP, "Type") != Some("Application") {
        return None;
    }

    let localized = |key: &str| {
        file.get_localized(MAIN_GROUP, key, locale)
            .unwrap_or_default()
            .to_string()
    };
    let raw = |key: &str| file.get(MAIN_GROUP, key).unwrap_or_default().to_string();

    let exec = raw("Exec");
    let actions = split_list(&raw("Actions"))
        .into_iter()
        .filter_map(|action_id| parse_action(&file, action_id, locale))
        .collect();

    Some(DesktopEntry {
        id: id.to_string(),
        name: localized("Name"),
        generic_name: localized("GenericName"),
        comment: localized("Comment"),
        icon: raw("Icon"),
        command: parse_exec(&exec),
        exec,
        categories: split_list(&raw("Categories")),
        keywords: split_list(&localized("Keywords")),
        actions,
        no_display: file.get_bool(MAIN_GROUP, "NoDisplay").unwrap_or(false),
        terminal: file.get_bool(MAIN_GROUP, "Terminal").unwrap_or(false),
        working_directory: raw("Path"),
        startup_class: raw("StartupWMClass"),
    })
}

fn parse_action(file: &KeyFile, id: String, locale: Option<&Locale>) -> Option<DesktopAction> {
    let group = format!("Desktop Action {id}");
    if !file.has_group(&group) {
        return None;
    }

    let exec = file.get(&group, "Exec").unwrap_or_default().to_string();
    Some(DesktopAction {
        name: file
            .get_localized(&group, "Name", locale)
            .unwrap_or_default()
            .to_string(),
        icon: file.get(&group, "Icon").unwrap_or_default().to_string(),
        command: parse_exec(&exec),
        exec,
        id,
    })
}
