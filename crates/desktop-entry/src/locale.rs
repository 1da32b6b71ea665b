//! Locale detection for localized desktop-entry keys.

use std::env;

/// A POSIX-style message locale, reduced to what key lookup needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub lang: String,
    pub country: Option<String>,
}

impl Locale {
    /// Parses a locale string such as `en_US.UTF-8@euro`.
    ///
    /// Returns `None` for the `C`/`POSIX` locales and empty input.
    pub fn parse(raw: &str) -> Option<Self> {
        let without_modifier = raw.split('@').next().unwrap_or_default();
        let without_encoding = without_modifier.split('.').next().unwrap_or_default();
        if without_encoding.is_empty() || without_encoding == "C" || without_encoding == "POSIX" {
            return None;
        }

        let (lang, country) = match without_encoding.split_once('_') {
            Some((lang, country)) if !country.is_empty() => (lang, Some(country.to_string())),
            Some((lang, _)) => (lang, None),
            None => (without_encoding, None),
        };
        if lang.is_empty() {
            return None;
        }

        Some(Self {
            lang: lang.to_string(),
            country,
        })
    }

    /// Reads the message locale from `LC_ALL`, `LC_MESSAGES` or `LANG`.
    pub fn from_env() -> Option<Self> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|name| env::var(name).ok())
            .find(|value| !value.is_empty())
            .and_then(|value| Self::parse(&value))
    }

    /// Localized key candidates, most specific first.
    pub fn lookup_keys(&self, key: &str) -> Vec<String> {
        let mut keys = Vec::with_capacity(2);
        if let Some(country) = &self.country {
            keys.push(format!("{key}[{}_{country}]", self.lang));
        }
        keys.push(format!("{key}[{}]", self.lang));
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_locale() {
        let locale = Locale::parse("pt_BR.UTF-8@latin").unwrap();
        assert_eq!(locale.lang, "pt");
        assert_eq!(locale.country.as_deref(), Some("BR"));
        assert_eq!(locale.lookup_keys("Name"), vec!["Name[pt_BR]", "Name[pt]"]);
    }

    #[test]
    fn parses_language_only() {
        let locale = Locale::parse("de").unwrap();
        assert_eq!(locale.country, None);
        assert_eq!(locale.lookup_keys("Comment"), vec!["Comment[de]"]);
    }

    #[test]
    fn rejects_c_locale() {
        assert!(Locale::parse("C").is_none());
        assert!(Locale::parse("POSIX").is_none());
        assert!(Locale::parse("C.UTF-8").is_none());
        assert!(Locale::parse("").is_none());
    }
}
