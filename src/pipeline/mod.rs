//! Generate, validate and publish posts and comments.
//!
//! Both operations retry until they succeed. Every failure is logged and
//! followed by a sleep; the sleep is the only place cancellation is observed.

pub mod parse;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::BotSettings;
use crate::constants::COMMENT_RETRY_DELAY;
use crate::db::{ContentType, NewGeneratedContent, Store};
use crate::forum::ForumClient;
use crate::generator::ContentGenerator;
use crate::trends::TrendSnapshot;

pub use parse::{parse_article, parse_comment, ArticleDraft, Field};

/// Why a single generation attempt was rejected.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("generator returned no content: {reason}")]
    EmptyGeneration { reason: String },
    #[error("response is missing the {field} field")]
    MalformedResponse { field: &'static str },
    #[error("forum rejected the write: {0:#}")]
    UpstreamWriteFailure(anyhow::Error),
}

/// An article that made it onto the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArticle {
    pub post_id: String,
    pub title: String,
}

pub struct ContentPipeline {
    generator: Arc<dyn ContentGenerator>,
    forum: Arc<dyn ForumClient>,
    content_log: Store,
    settings: Arc<BotSettings>,
    cancel: CancellationToken,
}

impl ContentPipeline {
    #[must_use]
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        forum: Arc<dyn ForumClient>,
        content_log: Store,
        settings: Arc<BotSettings>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generator,
            forum,
            content_log,
            settings,
            cancel,
        }
    }

    /// Generate and publish an article, retrying every `article_interval` until
    /// one is accepted.
    ///
    /// Returns `None` only if cancelled before an article was published.
    pub async fn produce_article(
        &self,
        trends: &TrendSnapshot,
        memory: &str,
    ) -> Option<PublishedArticle> {
        let prompt = prompt::article_prompt(
            &self.settings.persona,
            &self.settings.board_id,
            trends,
            memory,
        );

        let mut attempt: u32 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            attempt += 1;

            match self.try_article(&prompt).await {
                Ok(article) => return Some(article),
                Err(e) => warn!(
                    operation = "produce_article",
                    board_id = %self.settings.board_id,
                    attempt,
                    "Article attempt failed, retrying: {e}"
                ),
            }

            if !self.pause(self.settings.article_interval).await {
                return None;
            }
        }
    }

    /// Generate and publish a comment on `target_id`, retrying after a short
    /// fixed delay until one is accepted.
    ///
    /// Returns `false` only if cancelled before a comment was published.
    pub async fn produce_comment(&self, target_id: &str, target_title: &str) -> bool {
        let prompt = prompt::comment_prompt(&self.settings.persona, target_title);

        let mut attempt: u32 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            attempt += 1;

            match self.try_comment(&prompt, target_id).await {
                Ok(()) => return true,
                Err(e) => warn!(
                    operation = "produce_comment",
                    board_id = %self.settings.board_id,
                    target_id,
                    attempt,
                    "Comment attempt failed, retrying: {e}"
                ),
            }

            if !self.pause(COMMENT_RETRY_DELAY).await {
                return false;
            }
        }
    }

    async fn try_article(&self, prompt: &str) -> Result<PublishedArticle, PipelineError> {
        let response = self.generate(prompt).await?;
        let draft = parse_article(&response)?;

        let post_id = self
            .forum
            .create_post(&self.settings.board_id, &draft.title, &draft.body)
            .await
            .map_err(PipelineError::UpstreamWriteFailure)?;

        self.record(ContentType::Article, &post_id, &draft.title)
            .await;
        info!(
            board_id = %self.settings.board_id,
            post_id = %post_id,
            title = %draft.title,
            "Article published"
        );

        Ok(PublishedArticle {
            post_id,
            title: draft.title,
        })
    }

    async fn try_comment(&self, prompt: &str, target_id: &str) -> Result<(), PipelineError> {
        let response = self.generate(prompt).await?;
        let comment = parse_comment(&response)?;

        let comment_id = self
            .forum
            .create_comment(&self.settings.board_id, target_id, &comment)
            .await
            .map_err(PipelineError::UpstreamWriteFailure)?;

        self.record(ContentType::Comment, target_id, &comment).await;
        info!(
            board_id = %self.settings.board_id,
            target_id,
            comment_id = %comment_id,
            "Comment published"
        );

        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let response = self
            .generator
            .generate(prompt)
            .await
            .map_err(|e| PipelineError::EmptyGeneration {
                reason: e.to_string(),
            })?;

        if response.trim().is_empty() {
            return Err(PipelineError::EmptyGeneration {
                reason: format!("{} returned an empty response", self.generator.name()),
            });
        }
        Ok(response)
    }

    async fn record(&self, content_type: ContentType, doc_id: &str, content: &str) {
        self.content_log
            .save_generated_content(&NewGeneratedContent {
                content_type,
                doc_id: Some(doc_id.to_string()),
                content: content.to_string(),
                board_id: self.settings.board_id.clone(),
            })
            .await;
    }

    /// Sleep for `duration`; `false` if cancelled first.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}
