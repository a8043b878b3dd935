//! Cleanup for generated text before it is posted or remembered.

use std::sync::LazyLock;

use regex::Regex;

/// Anything that is not a word character, whitespace or plain punctuation.
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,!?'()]").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Sanitize generated text.
///
/// Removes control characters and any punctuation outside `. , ! ? ' ( )`,
/// then collapses runs of whitespace (including newlines) into single spaces.
/// Word characters are Unicode-aware, so Hangul and other scripts survive.
///
/// # Examples
///
/// ```
/// # use board_persona_bot::text::sanitize_text;
/// assert_eq!(sanitize_text("  Hello,\n\n \"world\"!  "), "Hello, world!");
/// assert_eq!(sanitize_text("오늘 #러스트 공부"), "오늘 러스트 공부");
/// ```
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    let stripped = DISALLOWED.replace_all(text, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_plain_punctuation() {
        assert_eq!(
            sanitize_text("Is it (really) done? Yes, it's done!"),
            "Is it (really) done? Yes, it's done!"
        );
    }

    #[test]
    fn test_sanitize_strips_markup_and_quotes() {
        assert_eq!(sanitize_text("**bold** <b>tag</b> \"quoted\""), "bold btagb quoted");
        assert_eq!(sanitize_text("a: b; c"), "a b c");
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_text("bell\u{7}here\u{0}"), "bellhere");
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_text("line one\n\n\tline two  "), "line one line two");
    }

    #[test]
    fn test_sanitize_unicode_words() {
        assert_eq!(sanitize_text("제목은 “러스트” 입니다"), "제목은 러스트 입니다");
    }

    #[test]
    fn test_sanitize_empty() {
        assert_eq!(sanitize_text(""), "");
        assert_eq!(sanitize_text(" ### "), "");
    }
}
