//! Language-switcher detection for anchor text
//!
//! A precision filter: it only needs to catch the common shapes (a language
//! name, an ISO code, a flag) so that "Deutsch" in a site header is not
//! reported as a cross-locale finding on every page. Misses are acceptable.

use std::collections::HashSet;
use std::sync::OnceLock;

const SWITCHER_TEXTS: &[&str] = &[
    // English names
    "english", "german", "french", "spanish", "italian", "portuguese", "dutch", "polish",
    "russian", "japanese", "korean", "chinese", "arabic", "hindi", "turkish", "swedish",
    "danish", "norwegian", "finnish", "czech", "hungarian", "romanian", "bulgarian", "croatian",
    "serbian", "slovenian", "slovak", "ukrainian", "greek", "hebrew", "thai", "vietnamese",
    "indonesian", "malay", "filipino", "bengali", "catalan", "latvian", "lithuanian", "estonian",
    "icelandic", "persian", "farsi", "urdu", "swahili", "afrikaans", "welsh", "irish", "scottish",
    "basque", "galician",
    // Native names
    "deutsch", "français", "español", "italiano", "português", "nederlands", "polski", "русский",
    "日本語", "한국어", "中文", "简体中文", "繁體中文", "العربية", "हिन्दी", "türkçe", "svenska",
    "dansk", "norsk", "suomi", "čeština", "magyar", "română", "български", "hrvatski", "српски",
    "slovenščina", "slovenčina", "українська", "ελληνικά", "עברית", "ไทย", "tiếng việt",
    "bahasa indonesia", "melayu", "বাংলা", "català", "latviešu", "lietuvių", "eesti",
    "íslenska", "فارسی", "اردو", "kiswahili", "cymraeg", "gaeilge", "euskara", "galego",
    // ISO 639-1 codes
    "en", "de", "fr", "es", "it", "pt", "nl", "pl", "ru", "ja", "ko", "zh", "ar", "hi", "tr", "sv",
    "da", "no", "fi", "cs", "hu", "ro", "bg", "hr", "sr", "sl", "sk", "uk", "el", "he", "th", "vi",
    "id", "ms", "tl", "bn", "ca", "lv", "lt", "et", "is", "fa", "ur", "sw", "af", "cy", "ga", "eu",
    "gl", "mt", "lb", "mk", "sq", "bs", "hy", "ka", "az", "kk", "uz", "tg", "mn", "ne", "si", "km",
    "lo", "my",
    // Language-region codes
    "en-us", "en-gb", "en-au", "en-ca", "en-nz", "en-ie", "en-za", "en-in", "en-sg", "pt-br",
    "pt-pt", "zh-cn", "zh-tw", "zh-hk", "zh-sg", "es-es", "es-mx", "es-ar", "es-co", "es-cl",
    "es-pe", "fr-fr", "fr-ca", "fr-be", "fr-ch", "de-de", "de-at", "de-ch", "nl-nl", "nl-be",
    "it-it", "it-ch",
    // Three-letter abbreviations
    "eng", "ger", "deu", "fra", "fre", "spa", "ita", "por", "dut", "nld", "pol", "rus", "jpn",
    "kor", "chn", "chi", "ara", "hin", "tur", "swe", "dan", "nor", "fin",
];

fn switcher_texts() -> &'static HashSet<&'static str> {
    static TEXTS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    TEXTS.get_or_init(|| SWITCHER_TEXTS.iter().copied().collect())
}

/// Returns true if anchor text looks like a language-switcher control
///
/// Matches, after trimming and lowercasing:
/// - a language name or code from the built-in table, also with any
///   parenthetical removed (`"English (US)"`)
/// - an ISO-shaped code (`"de"`, `"en-US"`)
/// - a lone flag emoji, or a flag followed by a short label (`"🇩🇪 DE"`)
/// - a short label written mostly in CJK script (`"中文"`)
///
/// # Examples
///
/// ```
/// use locale_spider::locale::is_locale_switcher_text;
///
/// assert!(is_locale_switcher_text("Deutsch"));
/// assert!(is_locale_switcher_text("🇫🇷 Français"));
/// assert!(!is_locale_switcher_text("Contact us"));
/// ```
pub fn is_locale_switcher_text(text: &str) -> bool {
    let raw = text.trim();
    if raw.is_empty() {
        return false;
    }

    let texts = switcher_texts();
    let lower = raw.to_lowercase();
    let base = strip_parentheticals(&lower);
    if texts.contains(lower.as_str()) || texts.contains(base.as_str()) {
        return true;
    }

    if looks_like_iso_code(&lower) {
        return true;
    }

    let flag_count = raw.chars().take_while(|c| is_regional_indicator(*c)).count();
    if flag_count >= 2 {
        let rest: String = raw.chars().filter(|c| !is_regional_indicator(*c)).collect();
        let rest = rest.trim().to_lowercase();
        if rest.is_empty() {
            return true;
        }
        if flag_count == 2 && rest.chars().count() <= 15 {
            return texts.contains(rest.as_str()) || rest.chars().count() <= 3;
        }
    }

    is_short_cjk_label(raw)
}

/// Removes `(...)` groups and the whitespace around them
fn strip_parentheticals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `xx` or `xx-yy`
fn looks_like_iso_code(text: &str) -> bool {
    let bytes = text.as_bytes();
    let letters = |s: &[u8]| s.iter().all(u8::is_ascii_lowercase);
    match bytes.len() {
        2 => letters(bytes),
        5 => letters(&bytes[..2]) && bytes[2] == b'-' && letters(&bytes[3..]),
        _ => false,
    }
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3040}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{AC00}'..='\u{D7AF}')
}

/// Up to 30 characters of CJK script, optionally with ASCII letters,
/// whitespace, hyphens and parentheses around it
fn is_short_cjk_label(text: &str) -> bool {
    text.chars().count() <= 30
        && text.chars().any(is_cjk)
        && text.chars().all(|c| {
            is_cjk(c) || c.is_whitespace() || c.is_ascii_alphabetic() || matches!(c, '(' | ')' | '-')
        })
}
