//! Locale prefix handling for request paths
//!
//! Paths carry an optional leading locale segment (`/en/articles`). The default
//! locale is never written into URLs this crate produces; every other locale is.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the supported UI locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Ko,
    En,
    Ja,
}

impl Locale {
    /// Locale used when a path carries no recognizable prefix
    pub const DEFAULT: Locale = Locale::Ko;

    pub const ALL: [Locale; 3] = [Locale::Ko, Locale::En, Locale::Ja];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Ko => "ko",
            Locale::En => "en",
            Locale::Ja => "ja",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported locale: {0}")]
pub struct UnsupportedLocale(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| UnsupportedLocale(s.to_string()))
    }
}

/// A request path split into its locale and the locale-free remainder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedPath {
    /// Locale that applies to the request (detected or default)
    pub locale: Locale,
    /// Whether the locale segment was actually present in the path
    pub explicit: bool,
    /// Path with the locale segment removed, always starting with `/`
    pub path_without_locale: String,
}

impl LocalizedPath {
    pub fn parse(pathname: &str) -> Self {
        match detect_prefix(pathname) {
            Some((locale, rest)) => Self {
                locale,
                explicit: true,
                path_without_locale: if rest.is_empty() {
                    "/".to_string()
                } else {
                    rest.to_string()
                },
            },
            None => Self {
                locale: Locale::DEFAULT,
                explicit: false,
                path_without_locale: pathname.to_string(),
            },
        }
    }
}

// A prefix counts only as a whole segment: `/en` and `/en/...`, never `/english`.
fn detect_prefix(pathname: &str) -> Option<(Locale, &str)> {
    let rest = pathname.strip_prefix('/')?;
    Locale::ALL.into_iter().find_map(|locale| {
        let after = rest.strip_prefix(locale.as_str())?;
        if after.is_empty() || after.starts_with('/') {
            Some((locale, after))
        } else {
            None
        }
    })
}

/// Returns true if `pathname` starts with any supported locale segment
pub fn has_locale_prefix(pathname: &str) -> bool {
    detect_prefix(pathname).is_some()
}

/// Strip a leading locale segment, yielding `/` for a bare locale path
pub fn strip_locale(pathname: &str) -> String {
    LocalizedPath::parse(pathname).path_without_locale
}

/// Qualify a locale-free path for `locale`.
///
/// The default locale yields the path unchanged; any other locale gets a
/// `/<tag>` prefix. `/` under a non-default locale becomes `/<tag>`.
pub fn localize(path: &str, locale: Locale) -> String {
    if locale.is_default() {
        return path.to_string();
    }
    with_locale_segment(path, locale)
}

/// Prefix `path` with `/<tag>` regardless of which locale it is
pub fn with_locale_segment(path: &str, locale: Locale) -> String {
    if path == "/" || path.is_empty() {
        format!("/{}", locale.as_str())
    } else {
        format!("/{}{}", locale.as_str(), path)
    }
}
