//! Length normalization for outgoing posts
//!
//! Lengths are counted in Unicode scalar values (`char`s), never bytes.
//! Platforms that weight some characters differently (emoji, URLs) can
//! still reject a trimmed post; see the `weighted_length_is_not_modelled`
//! test.

/// Appended in place of the content removed by [`trim`]
pub const TRUNCATION_MARKER: char = '…';

/// Default platform limit
pub const DEFAULT_MAX_LENGTH: usize = 280;

/// Length of `text` in characters
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Trim `text` so it fits in `limit` characters.
///
/// Text that already fits is returned unchanged. Otherwise the first
/// `limit - 1` characters are kept, trailing whitespace is dropped and
/// [`TRUNCATION_MARKER`] is appended. A `limit` of zero yields an empty string.
pub fn trim(text: &str, limit: usize) -> String {
    if char_len(text) <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }

    let head: String = text.chars().take(limit - 1).collect();
    let mut trimmed = head.trim_end().to_string();
    trimmed.push(TRUNCATION_MARKER);
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(trim("hello", 280), "hello");
        assert_eq!(trim("", 280), "");
    }

    #[test]
    fn test_exact_limit_unchanged() {
        let text = "a".repeat(280);
        assert_eq!(trim(&text, 280), text);
    }

    #[test]
    fn test_long_text_trimmed_to_limit_with_marker() {
        let text = "a".repeat(300);
        let trimmed = trim(&text, 280);
        assert_eq!(char_len(&trimmed), 280);
        assert!(trimmed.ends_with(TRUNCATION_MARKER));
        assert!(trimmed.starts_with(&"a".repeat(279)));
    }

    #[test]
    fn test_trailing_whitespace_removed_before_marker() {
        // The cut lands right after "hello   ".
        let trimmed = trim("hello    world", 9);
        assert_eq!(trimmed, "hello…");
        assert!(char_len(&trimmed) <= 9);
    }

    #[test]
    fn test_multibyte_counted_as_characters() {
        let text = "é".repeat(10);
        let trimmed = trim(&text, 5);
        assert_eq!(trimmed, "éééé…");
        assert_eq!(char_len(&trimmed), 5);
        assert!(trimmed.len() > 5);
    }

    #[test]
    fn test_limit_one_is_only_marker() {
        assert_eq!(trim("ab", 1), "…");
    }

    #[test]
    fn test_limit_zero_is_empty() {
        assert_eq!(trim("ab", 0), "");
    }

    #[test]
    fn test_never_exceeds_limit() {
        let samples = [
            "",
            "x",
            "two words",
            "trailing space          then more",
            "emoji 😀😀😀😀😀 and text",
            "日本語のテキストです",
        ];
        for text in samples {
            for limit in 0..40 {
                let trimmed = trim(text, limit);
                assert!(
                    char_len(&trimmed) <= limit,
                    "trim({:?}, {}) = {:?}",
                    text,
                    limit,
                    trimmed
                );
                if char_len(text) <= limit {
                    assert_eq!(trimmed, text);
                }
            }
        }
    }

    #[test]
    fn test_weighted_length_is_not_modelled() {
        // Known gap: platforms may count an emoji as two units. Plain
        // character trimming lets 280 emoji through untouched.
        let text = "😀".repeat(280);
        assert_eq!(trim(&text, 280), text);
    }
}
