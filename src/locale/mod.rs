//! Locale classification module for Locale Spider
//!
//! Turns URLs into locale verdicts, decides whether a link crosses a locale
//! boundary, and recognises anchor text that is itself a language switcher.

mod classifier;
mod switcher;

pub use classifier::{is_cross_locale, LocaleClassifier, LocaleScope};
pub use switcher::is_locale_switcher_text;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Locale codes recognised out of the box as a first path segment
pub const DEFAULT_KNOWN_LOCALES: &[&str] = &[
    "en", "de", "fr", "es", "it", "pt", "nl", "pl", "ru", "ja", "ko", "zh", "ar", "hi", "tr", "sv",
    "da", "no", "fi", "en-us", "en-gb", "pt-br", "zh-cn", "zh-tw",
];

/// The locale verdict for a page or link target
///
/// Persisted as a nullable string: a code such as `"de"`, the literal
/// `"default"` for unprefixed pages, and `null` for targets on another host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Locale {
    /// A locale-prefixed page (`/de/...`)
    Code(String),
    /// A page without a locale prefix
    Default,
    /// A link leaving the site; it has no locale
    External,
}

impl Locale {
    /// The locale code, if the page carries a prefix
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External)
    }

    /// Display label: the code, `"default"`, or `"external"`
    pub fn label(&self) -> &str {
        match self {
            Self::Code(code) => code,
            Self::Default => "default",
            Self::External => "external",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Option<String>> for Locale {
    fn from(value: Option<String>) -> Self {
        match value {
            None => Self::External,
            Some(s) if s.is_empty() || s.eq_ignore_ascii_case("default") => Self::Default,
            Some(code) => Self::Code(code.to_lowercase()),
        }
    }
}

impl From<Locale> for Option<String> {
    fn from(value: Locale) -> Self {
        match value {
            Locale::Code(code) => Some(code),
            Locale::Default => Some("default".to_string()),
            Locale::External => None,
        }
    }
}
