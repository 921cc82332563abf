/// Source-language value that asks the provider to guess.
pub const AUTO: &str = "auto";

/// Languages offered for translation, `(code, display name)`.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("auto", "Auto detect"),
    ("zh", "Chinese"),
    ("en", "English"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("it", "Italian"),
    ("th", "Thai"),
    ("vi", "Vietnamese"),
];

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

pub fn display_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// True if any code point falls in the CJK Unified Ideographs block (U+4E00..=U+9FFF).
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c))
}

/// Concrete `(source, target)` pair sent to the provider.
///
/// With `auto`, text containing CJK ideographs is treated as Chinese (and a Chinese target is
/// switched to English); anything else is treated as English.
pub fn resolve_pair(text: &str, source: &str, target: &str) -> (String, String) {
    if source != AUTO {
        return (source.to_string(), target.to_string());
    }
    if contains_cjk(text) {
        if target == "zh" {
            ("zh".to_string(), "en".to_string())
        } else {
            ("zh".to_string(), target.to_string())
        }
    } else {
        ("en".to_string(), target.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_pairs() {
        assert_eq!(resolve_pair("你好世界", "auto", "zh"), ("zh".into(), "en".into()));
        assert_eq!(resolve_pair("你好", "auto", "ja"), ("zh".into(), "ja".into()));
        assert_eq!(resolve_pair("hello", "auto", "zh"), ("en".into(), "zh".into()));
        assert_eq!(resolve_pair("hello", "fr", "de"), ("fr".into(), "de".into()));
    }

    #[test]
    fn cjk_detection_bounds() {
        assert!(contains_cjk("a\u{4E00}"));
        assert!(contains_cjk("\u{9FFF}"));
        // Hiragana and Hangul are outside the block.
        assert!(!contains_cjk("ひらがな"));
        assert!(!contains_cjk("한국어"));
    }

    #[test]
    fn language_table() {
        assert_eq!(SUPPORTED_LANGUAGES.len(), 14);
        assert!(is_supported("vi"));
        assert!(!is_supported("xx"));
        assert_eq!(display_name("ja"), Some("Japanese"));
    }
}
