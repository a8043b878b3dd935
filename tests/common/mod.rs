//! Stub collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use board_persona_bot::config::{Config, StorePaths};
use board_persona_bot::forum::{ForumClient, Item};
use board_persona_bot::generator::{ContentGenerator, GenerationError};
use board_persona_bot::scheduler::{Backends, Credential};

/// A response carrying every field the pipeline looks for.
pub const WELL_FORMED: &str =
    "Title: Borrowing made simple\nContent: Lifetimes are just scopes.\nComment: Great write up!";

/// Generator that replays a script, then repeats a fallback forever.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    fallback: String,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, GenerationError>>, fallback: &str) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: fallback.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(text: &str) -> Self {
        Self::new(Vec::new(), text)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

pub fn request_failed() -> GenerationError {
    GenerationError::RequestFailed {
        provider: "scripted".to_string(),
        reason: "connection reset".to_string(),
    }
}

/// In-memory board that records every write.
#[derive(Default)]
pub struct RecordingForum {
    items: Vec<Item>,
    post_failures: AtomicUsize,
    panic_on_read: bool,
    next_id: AtomicUsize,
    pub posts: Mutex<Vec<(String, String)>>,
    pub comments: Mutex<Vec<(String, String)>>,
    pub closed: AtomicBool,
}

impl RecordingForum {
    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items,
            next_id: AtomicUsize::new(1000),
            ..Self::default()
        }
    }

    /// Reject the next `n` post submissions.
    pub fn failing_posts(self, n: usize) -> Self {
        self.post_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Panic whenever the board is read.
    pub fn exploding(mut self) -> Self {
        self.panic_on_read = true;
        self
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.lock().unwrap().len()
    }
}

#[async_trait]
impl ForumClient for RecordingForum {
    async fn recent_items(&self, _board_id: &str, count: usize) -> Result<Vec<Item>> {
        assert!(!self.panic_on_read, "board exploded");
        Ok(self.items.iter().take(count).cloned().collect())
    }

    async fn create_post(&self, _board_id: &str, title: &str, content: &str) -> Result<String> {
        if self
            .post_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            bail!("Post submission failed with status 503");
        }
        self.posts
            .lock()
            .unwrap()
            .push((title.to_string(), content.to_string()));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst).to_string())
    }

    async fn create_comment(&self, _board_id: &str, post_id: &str, content: &str) -> Result<String> {
        self.comments
            .lock()
            .unwrap()
            .push((post_id.to_string(), content.to_string()));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst).to_string())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out the same stub clients every run and remembers which credentials
/// were used.
pub struct StubBackends {
    pub generator: Arc<ScriptedGenerator>,
    pub forum: Arc<RecordingForum>,
    pub fail_generator: bool,
    pub credentials_seen: Mutex<Vec<usize>>,
}

impl StubBackends {
    pub fn new(generator: ScriptedGenerator, forum: RecordingForum) -> Self {
        Self {
            generator: Arc::new(generator),
            forum: Arc::new(forum),
            fail_generator: false,
            credentials_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<usize> {
        self.credentials_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backends for StubBackends {
    async fn generator(&self, credential: &Credential) -> Result<Arc<dyn ContentGenerator>> {
        self.credentials_seen.lock().unwrap().push(credential.index());
        if self.fail_generator {
            bail!("generator rejected credential {}", credential.index());
        }
        Ok(self.generator.clone())
    }

    async fn forum(&self) -> Result<Arc<dyn ForumClient>> {
        Ok(self.forum.clone())
    }
}

pub fn sample_items() -> Vec<Item> {
    vec![
        Item::new("1", "Async traits").with_author("ferris"),
        Item::new("2", "Borrow checker woes").with_author("crab"),
        Item::new("3", "Async traits").with_author("ferris"),
    ]
}

/// Test configuration with stores under `dir` and millisecond timings.
pub fn fast_config(dir: &Path) -> Config {
    let mut config = Config::for_testing();
    config.stores = StorePaths {
        crawl: dir.join("crawling.sqlite"),
        content: dir.join("data.sqlite"),
        memory: dir.join("memory.sqlite"),
    };
    config.bot.article_interval = Duration::from_millis(40);
    config.bot.comment_interval = Duration::from_millis(30);
    config.bot.memory_record_interval = Duration::from_secs(3600);
    config.bot.max_run_time = Duration::from_millis(400);
    config.bot.use_time_limit = true;
    config
}
