//! Condensed summaries of board activity, fed back into later prompts.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::BotSettings;
use crate::db::{NewCrawledItem, Stores};
use crate::forum::Item;
use crate::generator::ContentGenerator;
use crate::text::sanitize_text;

/// What one recording pass managed to persist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    pub memory_saved: bool,
    pub items_saved: usize,
}

pub struct MemorySynthesizer {
    generator: Arc<dyn ContentGenerator>,
}

impl MemorySynthesizer {
    #[must_use]
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }

    /// Summarize `items` in the voice of `persona`.
    ///
    /// Best-effort: a failed or empty generation yields an empty string.
    pub async fn synthesize(&self, items: &[Item], persona: &str) -> String {
        if items.is_empty() {
            debug!("No items to summarize");
            return String::new();
        }

        let prompt = build_memory_prompt(items, persona);
        match self.generator.generate(&prompt).await {
            Ok(text) => sanitize_text(&text),
            Err(e) => {
                error!(
                    operation = "synthesize_memory",
                    generator = self.generator.name(),
                    "Memory generation failed: {e}"
                );
                String::new()
            }
        }
    }

    /// Persist what was observed: crawl snapshot rows and a fresh memory record,
    /// each according to its toggle.
    pub async fn record(
        &self,
        items: &[Item],
        settings: &BotSettings,
        stores: &Stores,
    ) -> RecordOutcome {
        let mut outcome = RecordOutcome::default();

        if settings.record_data_enabled {
            for item in items {
                let row = NewCrawledItem {
                    board_id: settings.board_id.clone(),
                    article_title: item.title.clone(),
                    author_id: item.author.clone(),
                };
                if stores.crawl.save_crawled_item(&row).await {
                    outcome.items_saved += 1;
                }
            }
        }

        if settings.record_memory_enabled {
            let memory = self.synthesize(items, &settings.persona).await;
            if memory.is_empty() {
                warn!(board_id = %settings.board_id, "Memory synthesis produced nothing, skipping");
            } else {
                outcome.memory_saved = stores.memory.save_memory(&settings.board_id, &memory).await;
            }
        }

        info!(
            board_id = %settings.board_id,
            items = outcome.items_saved,
            memory = outcome.memory_saved,
            "Board activity recorded"
        );
        outcome
    }
}

fn build_memory_prompt(items: &[Item], persona: &str) -> String {
    let mut observed = String::new();
    for item in items {
        let _ = writeln!(
            observed,
            "Title: {}, Author: {}",
            item.title,
            item.author.as_deref().unwrap_or("unknown")
        );
    }

    format!(
        "{persona}\n\n\
         Based on the following posts collected from the board, write a short memory \
         in the voice of the persona above. Describe who is posting and which topics \
         keep coming up.\n\n\
         Collected posts:\n{observed}"
    )
}
