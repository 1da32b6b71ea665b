//! Minimal key-file reader for `.desktop` files.
//!
//! Groups keep their file order. Within a group the first occurrence of a key
//! wins; later duplicates are ignored. String escapes (`\s`, `\n`, `\t`, `\r`,
//! `\\`) are decoded, any other backslash sequence is kept verbatim so that
//! `Exec` quoting can still see it.

use std::collections::HashMap;

use crate::locale::Locale;

#[derive(Debug, Clone, Default)]
struct Group {
    name: String,
    entries: HashMap<String, String>,
}

/// A parsed key file.
#[derive(Debug, Clone, Default)]
pub struct KeyFile {
    groups: Vec<Group>,
}

impl KeyFile {
    /// Parses key-file content. Malformed lines are skipped.
    pub fn parse(content: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                groups.push(Group {
                    name: name.to_string(),
                    entries: HashMap::new(),
                });
                continue;
            }

            // Keys before the first group header are not valid.
            let Some(group) = groups.last_mut() else {
                continue;
            };
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            group
                .entries
                .entry(key.trim_end().to_string())
                .or_insert_with(|| unescape_value(value.trim_start()));
        }

        Self { groups }
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.name == group)
    }

    /// Returns the raw (unlocalized) value of `key` in `group`.
    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.name == group)
            .and_then(|g| g.entries.get(key))
            .map(String::as_str)
    }

    /// Returns the value of `key` for the given locale.
    ///
    /// Lookup order is `key[lang_COUNTRY]`, `key[lang]`, then `key`. Empty
    /// localized values fall through to the next candidate.
    pub fn get_localized(&self, group: &str, key: &str, locale: Option<&Locale>) -> Option<&str> {
        if let Some(locale) = locale {
            for candidate in locale.lookup_keys(key) {
                if let Some(value) = self.get(group, &candidate) {
                    if !value.is_empty() {
                        return Some(value);
                    }
                }
            }
        }
        self.get(group, key)
    }

    /// Returns a boolean value. Accepts `true`/`1` and `false`/`0`.
    pub fn get_bool(&self, group: &str, key: &str) -> Option<bool> {
        match self.get(group, key)?.trim() {
            value if value.eq_ignore_ascii_case("true") || value == "1" => Some(true),
            value if value.eq_ignore_ascii_case("false") || value == "0" => Some(false),
            _ => None,
        }
    }
}

/// Splits a `;`-separated list value. `\;` is a literal semicolon; empty
/// items are dropped.
pub fn split_list(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&';') => {
                current.push(';');
                chars.next();
            }
            ';' => {
                if !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        items.push(current);
    }
    items
}

fn unescape_value(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => value.push(' '),
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some('\\') => value.push('\\'),
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
            None => value.push('\\'),
        }
    }
    value
}
