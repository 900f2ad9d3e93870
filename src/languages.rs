//! Locale codes accepted by the remote store for version localizations.

pub const AVAILABLE_LANGUAGES: &[&str] = &[
    "ar-SA", "ca", "cs", "da", "de-DE", "el", "en-AU", "en-CA", "en-GB", "en-US", "es-ES", "es-MX",
    "fi", "fr-CA", "fr-FR", "he", "hi", "hr", "hu", "id", "it", "ja", "ko", "ms", "nl-NL", "no",
    "pl", "pt-BR", "pt-PT", "ro", "ru", "sk", "sv", "th", "tr", "uk", "vi", "zh-Hans", "zh-Hant",
];

/// Maps a folder name to the canonical casing of an available locale
pub fn canonical_language(name: &str) -> Option<&'static str> {
    AVAILABLE_LANGUAGES
        .iter()
        .copied()
        .find(|language| language.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_language() {
        assert_eq!(canonical_language("en-us"), Some("en-US"));
        assert_eq!(canonical_language("ZH-HANS"), Some("zh-Hans"));
        assert_eq!(canonical_language("en-US"), Some("en-US"));
        assert_eq!(canonical_language("klingon"), None);
    }
}
