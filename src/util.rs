use unicode_normalization::UnicodeNormalization;

/// Collapse a label to a comparison key: accents stripped, lowercase,
/// ASCII alphanumerics only.
///
/// Example: "Follow-Up Automático" → "followupautomatico"
pub fn normalize_match_key(value: &str) -> String {
    value
        .nfd()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Trim a string, returning `None` when nothing is left.
pub fn non_empty_trimmed(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_accents_and_punctuation() {
        assert_eq!(normalize_match_key("Follow-Up Automático"), "followupautomatico");
        assert_eq!(normalize_match_key("Em Negociação"), "emnegociacao");
        assert_eq!(normalize_match_key("Em Negociacao"), "emnegociacao");
    }

    #[test]
    fn test_normalize_is_case_insensitive() {
        assert_eq!(normalize_match_key("NEW LEAD"), normalize_match_key("new lead"));
    }

    #[test]
    fn test_non_empty_trimmed() {
        assert_eq!(non_empty_trimmed("  Acme "), Some("Acme"));
        assert_eq!(non_empty_trimmed("   "), None);
        assert_eq!(non_empty_trimmed(""), None);
    }
}
