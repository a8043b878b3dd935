//! Discourse JSON API client.
//!
//! A board is a Discourse category; items are its topics. Articles become new
//! topics and comments become replies to a topic.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{ForumClient, Item};
use crate::config::ForumConfig;
use crate::constants::BOT_USER_AGENT;

#[derive(Debug, Deserialize)]
struct CategoryResponse {
    #[serde(default)]
    users: Vec<DiscourseUser>,
    topic_list: TopicList,
}

#[derive(Debug, Deserialize)]
struct DiscourseUser {
    id: i64,
    username: String,
}

#[derive(Debug, Deserialize)]
struct TopicList {
    #[serde(default)]
    topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    id: i64,
    title: String,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    posters: Vec<Poster>,
}

#[derive(Debug, Deserialize)]
struct Poster {
    user_id: i64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: i64,
    topic_id: i64,
}

/// [`ForumClient`] backed by a Discourse instance.
#[derive(Debug, Clone)]
pub struct DiscourseClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    api_key: String,
}

impl DiscourseClient {
    /// Create a client for the configured forum.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ForumConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(BOT_USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn fetch_page(&self, board_id: &str, page: usize) -> Result<CategoryResponse> {
        let response = self
            .client
            .get(self.url(&format!("c/{board_id}.json")))
            .query(&[("page", page)])
            .header("Api-Key", &self.api_key)
            .header("Api-Username", &self.username)
            .send()
            .await
            .context("Failed to fetch board listing")?;

        if !response.status().is_success() {
            anyhow::bail!("Board listing failed with status {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse board listing")
    }

    async fn submit(&self, body: serde_json::Value) -> Result<CreatedPost> {
        let response = self
            .client
            .post(self.url("posts.json"))
            .header("Api-Key", &self.api_key)
            .header("Api-Username", &self.username)
            .json(&body)
            .send()
            .await
            .context("Failed to submit post")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Post submission failed with status {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse post submission response")
    }
}

/// Category ids are numeric in Discourse; fall back to the raw string for slugs.
fn id_value(id: &str) -> serde_json::Value {
    id.parse::<i64>().map_or_else(|_| json!(id), |n| json!(n))
}

fn topic_to_item(topic: Topic, usernames: &HashMap<i64, String>) -> Item {
    let author = topic
        .posters
        .iter()
        .find(|p| p.description.contains("Original Poster"))
        .or_else(|| topic.posters.first())
        .and_then(|p| usernames.get(&p.user_id).cloned());

    Item {
        id: topic.id.to_string(),
        title: topic.title,
        author,
        created_at: topic.created_at,
    }
}

#[async_trait]
impl ForumClient for DiscourseClient {
    async fn recent_items(&self, board_id: &str, count: usize) -> Result<Vec<Item>> {
        let mut items = Vec::with_capacity(count);
        let mut page = 0;

        while items.len() < count {
            let listing = self.fetch_page(board_id, page).await?;
            if listing.topic_list.topics.is_empty() {
                break;
            }

            let usernames: HashMap<i64, String> = listing
                .users
                .into_iter()
                .map(|u| (u.id, u.username))
                .collect();

            let remaining = count - items.len();
            items.extend(
                listing
                    .topic_list
                    .topics
                    .into_iter()
                    .take(remaining)
                    .map(|t| topic_to_item(t, &usernames)),
            );
            page += 1;
        }

        debug!(board_id, fetched = items.len(), "Fetched recent items");
        Ok(items)
    }

    async fn create_post(&self, board_id: &str, title: &str, content: &str) -> Result<String> {
        let created = self
            .submit(json!({
                "title": title,
                "raw": content,
                "category": id_value(board_id),
            }))
            .await?;

        info!(board_id, topic_id = created.topic_id, title, "Post created");
        Ok(created.topic_id.to_string())
    }

    async fn create_comment(&self, board_id: &str, post_id: &str, content: &str) -> Result<String> {
        let created = self
            .submit(json!({
                "topic_id": id_value(post_id),
                "raw": content,
            }))
            .await?;

        info!(board_id, topic_id = post_id, comment_id = created.id, "Comment created");
        Ok(created.id.to_string())
    }
}
