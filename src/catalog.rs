//! Language catalog: static mapping from language code to display name.
//!
//! Codes are the ISO 639-1 style identifiers the recognition engines emit,
//! plus the few regional variants the toolkit distinguishes (`zh-cn`,
//! `zh-tw`, `pt-br`). The table is immutable and built once on first use.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Catalog entries in display order.
const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("pt-br", "Portuguese (Brazil)"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("da", "Danish"),
    ("no", "Norwegian"),
    ("fi", "Finnish"),
    ("pl", "Polish"),
    ("cs", "Czech"),
    ("hu", "Hungarian"),
    ("ro", "Romanian"),
    ("tr", "Turkish"),
    ("el", "Greek"),
    ("ru", "Russian"),
    ("uk", "Ukrainian"),
    ("bg", "Bulgarian"),
    ("sr", "Serbian"),
    ("ar", "Arabic"),
    ("fa", "Persian"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("bn", "Bengali"),
    ("ta", "Tamil"),
    ("th", "Thai"),
    ("vi", "Vietnamese"),
    ("id", "Indonesian"),
    ("ms", "Malay"),
    ("zh", "Chinese"),
    ("zh-cn", "Chinese (Simplified)"),
    ("zh-tw", "Chinese (Traditional)"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
];

static BY_CODE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| LANGUAGES.iter().copied().collect());

/// Canonical form of a language code: trimmed, lower-cased, `_` → `-`.
pub(crate) fn normalise(code: &str) -> String {
    code.trim().to_ascii_lowercase().replace('_', "-")
}

/// Display name for `code`, or the upper-cased code when it is unknown.
///
/// Total over all strings: never fails and never panics.
///
/// ```
/// use ocr_langdetect::catalog::name_of;
/// assert_eq!(name_of("fr"), "French");
/// assert_eq!(name_of("zh_CN"), "Chinese (Simplified)");
/// assert_eq!(name_of("xx"), "XX");
/// ```
pub fn name_of(code: &str) -> String {
    match BY_CODE.get(normalise(code).as_str()) {
        Some(name) => (*name).to_string(),
        None => code.to_uppercase(),
    }
}

/// Whether `code` has a catalog entry.
pub fn is_known(code: &str) -> bool {
    BY_CODE.contains_key(normalise(code).as_str())
}

/// All catalog entries as `(code, name)` pairs, in display order.
pub fn languages() -> &'static [(&'static str, &'static str)] {
    LANGUAGES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve() {
        assert_eq!(name_of("en"), "English");
        assert_eq!(name_of("ja"), "Japanese");
        assert_eq!(name_of("pt-br"), "Portuguese (Brazil)");
    }

    #[test]
    fn lookup_ignores_case_and_separator() {
        assert_eq!(name_of("EN"), "English");
        assert_eq!(name_of(" de "), "German");
        assert_eq!(name_of("zh_TW"), "Chinese (Traditional)");
    }

    #[test]
    fn unknown_code_falls_back_to_upper_case() {
        assert_eq!(name_of("xx"), "XX");
        assert_eq!(name_of("klingon"), "KLINGON");
        assert_eq!(name_of(""), "");
    }

    #[test]
    fn catalog_has_unique_codes() {
        assert_eq!(BY_CODE.len(), LANGUAGES.len());
        assert!(languages().iter().all(|(code, _)| is_known(code)));
        assert!(!is_known("xx"));
    }
}
