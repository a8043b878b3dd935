//! Labeled-field extraction from generated responses.
//!
//! A field starts with a label and a colon at the beginning of a line, e.g.
//! `Title: ...` or `제목: ...`. Light markdown decoration around the label
//! (`**Title:**`, `## Title:`) is tolerated.

use std::sync::LazyLock;

use regex::Regex;

use super::PipelineError;
use crate::text::sanitize_text;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t#>*_-]*(제목|title|내용|content|댓글|comment)[ \t*_]*[:：][ \t*_]*")
        .expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Content,
    Comment,
}

impl Field {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
            Self::Comment => "comment",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "제목" | "title" => Some(Self::Title),
            "내용" | "content" => Some(Self::Content),
            "댓글" | "comment" => Some(Self::Comment),
            _ => None,
        }
    }

    /// Titles end at the line break; bodies run until the next marker.
    fn single_line(self) -> bool {
        matches!(self, Self::Title)
    }
}

/// A validated article ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub body: String,
}

/// Raw text of the first occurrence of `field`, if present.
#[must_use]
pub fn extract_field(response: &str, field: Field) -> Option<&str> {
    let markers: Vec<_> = MARKER.captures_iter(response).collect();

    for (i, caps) in markers.iter().enumerate() {
        let label = caps.get(1)?;
        if Field::from_label(label.as_str()) != Some(field) {
            continue;
        }
        let start = caps.get(0)?.end();
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(response.len(), |m| m.start());
        let value = &response[start..end];

        return Some(if field.single_line() {
            value.lines().next().unwrap_or("")
        } else {
            value
        });
    }

    None
}

fn required_field(response: &str, field: Field) -> Result<String, PipelineError> {
    let raw = extract_field(response, field).ok_or(PipelineError::MalformedResponse {
        field: field.as_str(),
    })?;
    let cleaned = sanitize_text(raw);
    if cleaned.is_empty() {
        return Err(PipelineError::MalformedResponse {
            field: field.as_str(),
        });
    }
    Ok(cleaned)
}

/// Parse an article response carrying title and content fields.
///
/// # Errors
///
/// Returns [`PipelineError::MalformedResponse`] if either field is missing or
/// empty after sanitizing.
pub fn parse_article(response: &str) -> Result<ArticleDraft, PipelineError> {
    Ok(ArticleDraft {
        title: required_field(response, Field::Title)?,
        body: required_field(response, Field::Content)?,
    })
}

/// Parse a comment response carrying a single comment field.
///
/// # Errors
///
/// Returns [`PipelineError::MalformedResponse`] if the field is missing or
/// empty after sanitizing.
pub fn parse_comment(response: &str) -> Result<String, PipelineError> {
    required_field(response, Field::Comment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_article_english() {
        let draft = parse_article("Title: Lifetimes explained\nContent: They are\nnot scary.")
            .expect("well-formed");
        assert_eq!(draft.title, "Lifetimes explained");
        assert_eq!(draft.body, "They are not scary.");
    }

    #[test]
    fn test_parse_article_korean_markers() {
        let draft = parse_article("제목: 러스트 질문\n내용: 빌림 검사기가 어렵네요").unwrap();
        assert_eq!(draft.title, "러스트 질문");
        assert_eq!(draft.body, "빌림 검사기가 어렵네요");
    }

    #[test]
    fn test_parse_article_with_preamble_and_markdown() {
        let response = "Sure! Here you go.\n\n**Title:** Weekly thread\n**Content:** Post your wins.";
        let draft = parse_article(response).unwrap();
        assert_eq!(draft.title, "Weekly thread");
        assert_eq!(draft.body, "Post your wins.");
    }

    #[test]
    fn test_body_stops_at_next_marker() {
        let response = "Content: body first\nTitle: then title";
        let draft = parse_article(response).unwrap();
        assert_eq!(draft.title, "then title");
        assert_eq!(draft.body, "body first");
    }

    #[test]
    fn test_missing_content_is_malformed() {
        let err = parse_article("Title: only a title").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedResponse { field: "content" }
        ));
    }

    #[test]
    fn test_empty_field_is_malformed() {
        let err = parse_article("Title: ###\nContent: fine").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedResponse { field: "title" }));
    }

    #[test]
    fn test_marker_must_start_a_line() {
        assert!(extract_field("the title: is inline", Field::Title).is_none());
    }

    #[test]
    fn test_parse_comment() {
        assert_eq!(parse_comment("댓글: 좋은 글이네요!").unwrap(), "좋은 글이네요!");
        assert_eq!(
            parse_comment("comment: Nice\nwork there").unwrap(),
            "Nice work there"
        );
        assert!(parse_comment("Title: not a comment").is_err());
    }
}
