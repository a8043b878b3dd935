//! The discussion board the bot reads from and writes to.

pub mod discourse;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::constants::RANDOM_ITEM_POOL;

pub use discourse::DiscourseClient;

/// One forum entry as observed on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: None,
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Read/write access to a board.
#[async_trait]
pub trait ForumClient: Send + Sync {
    /// The `count` most recent items on the board, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be read.
    async fn recent_items(&self, board_id: &str, count: usize) -> Result<Vec<Item>>;

    /// A random item among the most recent ones, or `None` if the board is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be read.
    async fn random_item(&self, board_id: &str) -> Result<Option<Item>> {
        let items = self.recent_items(board_id, RANDOM_ITEM_POOL).await?;
        Ok(items.choose(&mut rand::thread_rng()).cloned())
    }

    /// Create a new post, returning its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the board rejects the post.
    async fn create_post(&self, board_id: &str, title: &str, content: &str) -> Result<String>;

    /// Reply to an existing post, returning the new comment's id.
    ///
    /// # Errors
    ///
    /// Returns an error if the board rejects the comment.
    async fn create_comment(&self, board_id: &str, post_id: &str, content: &str) -> Result<String>;

    /// Release the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session could not be closed cleanly.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
