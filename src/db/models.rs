use serde::{Deserialize, Serialize};

/// Kind of generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Comment,
}

impl ContentType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Comment => "comment",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "article" => Some(Self::Article),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }
}

/// An item snapshot as stored in `crawled_data`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CrawledItem {
    pub id: i64,
    pub board_id: String,
    pub article_title: String,
    pub author_id: Option<String>,
    pub created_at: String,
}

/// Data for inserting a crawl snapshot row.
#[derive(Debug, Clone)]
pub struct NewCrawledItem {
    pub board_id: String,
    pub article_title: String,
    pub author_id: Option<String>,
}

/// One accepted generation, as stored in `generated_content`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GeneratedContent {
    pub id: i64,
    pub content_type: String,
    /// Post the content was written to (the new post for articles).
    pub doc_id: Option<String>,
    pub content: String,
    pub board_id: String,
    pub created_at: String,
}

impl GeneratedContent {
    #[must_use]
    pub fn kind(&self) -> Option<ContentType> {
        ContentType::from_str(&self.content_type)
    }
}

/// Data for inserting a generated content row.
#[derive(Debug, Clone)]
pub struct NewGeneratedContent {
    pub content_type: ContentType,
    pub doc_id: Option<String>,
    pub content: String,
    pub board_id: String,
}

/// A condensed summary of board activity.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemoryRecord {
    pub id: i64,
    pub board_id: String,
    #[sqlx(rename = "memory_content")]
    pub content: String,
    pub created_at: String,
}
