mod migrations;
mod models;
mod queries;

pub use models::*;
pub use queries::*;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, error, info, warn};

use crate::config::StorePaths;

/// Which of the three logical stores a connection serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Crawl,
    Content,
    Memory,
}

impl StoreKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crawl => "crawl",
            Self::Content => "content",
            Self::Memory => "memory",
        }
    }
}

/// One append-only store backed by its own SQLite file.
///
/// A store whose connection or a write failed stays usable in degraded mode:
/// saves report failure and loads come back empty, but nothing returns an
/// error. Clones share the degraded flag.
#[derive(Debug, Clone)]
pub struct Store {
    kind: StoreKind,
    pool: Option<SqlitePool>,
    failed: Arc<AtomicBool>,
}

impl Store {
    /// Connect to the store, running migrations if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or migrations fail.
    pub async fn connect(kind: StoreKind, path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            // Both loops write concurrently; let SQLite wait instead of failing fast.
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to {} store", kind.as_str()))?;

        migrations::run(&pool, kind).await?;
        debug!(store = kind.as_str(), path = %path.display(), "Store ready");

        Ok(Self {
            kind,
            pool: Some(pool),
            failed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Connect to the store, degrading to a no-op store on failure.
    pub async fn open(kind: StoreKind, path: &Path) -> Self {
        match Self::connect(kind, path).await {
            Ok(store) => store,
            Err(e) => {
                error!(
                    store = kind.as_str(),
                    path = %path.display(),
                    "Store unavailable, continuing without it: {e:#}"
                );
                Self::degraded(kind)
            }
        }
    }

    /// A store with no connection behind it.
    #[must_use]
    pub fn degraded(kind: StoreKind) -> Self {
        Self {
            kind,
            pool: None,
            failed: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.pool.is_none() || self.failed.load(Ordering::Acquire)
    }

    /// The underlying connection pool, if one was opened. Still returned after
    /// a write failure degraded the store.
    #[must_use]
    pub fn pool(&self) -> Option<&SqlitePool> {
        self.pool.as_ref()
    }

    /// Append a crawl snapshot row. Returns whether it was written.
    pub async fn save_crawled_item(&self, item: &NewCrawledItem) -> bool {
        let Some(pool) = self.connected("save_crawled_item") else {
            return false;
        };
        match insert_crawled_item(pool, item).await {
            Ok(_) => true,
            Err(e) => {
                error!(board_id = %item.board_id, "Failed to save crawled item: {e:#}");
                self.degrade();
                false
            }
        }
    }

    /// Append a generated content record. Returns whether it was written.
    pub async fn save_generated_content(&self, content: &NewGeneratedContent) -> bool {
        let Some(pool) = self.connected("save_generated_content") else {
            return false;
        };
        match insert_generated_content(pool, content).await {
            Ok(id) => {
                debug!(
                    id,
                    content_type = content.content_type.as_str(),
                    doc_id = ?content.doc_id,
                    "Generated content recorded"
                );
                true
            }
            Err(e) => {
                error!(
                    content_type = content.content_type.as_str(),
                    doc_id = ?content.doc_id,
                    "Failed to save generated content: {e:#}"
                );
                self.degrade();
                false
            }
        }
    }

    /// Append a memory record. Returns whether it was written.
    pub async fn save_memory(&self, board_id: &str, content: &str) -> bool {
        let Some(pool) = self.connected("save_memory") else {
            return false;
        };
        match insert_memory(pool, board_id, content).await {
            Ok(id) => {
                debug!(id, board_id, "Memory recorded");
                true
            }
            Err(e) => {
                error!(board_id, "Failed to save memory: {e:#}");
                self.degrade();
                false
            }
        }
    }

    /// Content of the most recent memory record for a board, or empty.
    pub async fn load_latest_memory(&self, board_id: &str) -> String {
        let Some(pool) = self.connected("load_latest_memory") else {
            return String::new();
        };
        match get_latest_memory(pool, board_id).await {
            Ok(record) => record.map(|r| r.content).unwrap_or_default(),
            Err(e) => {
                error!(board_id, "Failed to load memory: {e:#}");
                String::new()
            }
        }
    }

    /// Every memory record for a board, oldest first.
    pub async fn memory_history(&self, board_id: &str) -> Vec<MemoryRecord> {
        let Some(pool) = self.connected("memory_history") else {
            return Vec::new();
        };
        get_memory_history(pool, board_id)
            .await
            .unwrap_or_else(|e| {
                error!(board_id, "Failed to scan memory: {e:#}");
                Vec::new()
            })
    }

    /// Every generated content record for a board, oldest first.
    pub async fn generated_content(&self, board_id: &str) -> Vec<GeneratedContent> {
        let Some(pool) = self.connected("generated_content") else {
            return Vec::new();
        };
        get_generated_content(pool, board_id)
            .await
            .unwrap_or_else(|e| {
                error!(board_id, "Failed to scan generated content: {e:#}");
                Vec::new()
            })
    }

    /// Close the connection pool. Safe to call on a degraded store.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            debug!(store = self.kind.as_str(), "Store closed");
        }
    }

    fn connected(&self, operation: &str) -> Option<&SqlitePool> {
        if self.is_degraded() {
            warn!(store = self.kind.as_str(), operation, "Store unavailable, skipping");
            return None;
        }
        self.pool.as_ref()
    }

    /// Stop using this store for the rest of the run.
    fn degrade(&self) {
        if !self.failed.swap(true, Ordering::AcqRel) {
            error!(
                store = self.kind.as_str(),
                "Write failed, store degraded for the rest of the run"
            );
        }
    }
}

/// The three stores used by one scheduler run.
#[derive(Debug, Clone)]
pub struct Stores {
    pub crawl: Store,
    pub content: Store,
    pub memory: Store,
}

impl Stores {
    /// Open all three stores concurrently. Never fails; unavailable stores degrade.
    pub async fn open(paths: &StorePaths) -> Self {
        let (crawl, content, memory) = tokio::join!(
            Store::open(StoreKind::Crawl, &paths.crawl),
            Store::open(StoreKind::Content, &paths.content),
            Store::open(StoreKind::Memory, &paths.memory),
        );

        let degraded = [&crawl, &content, &memory]
            .iter()
            .filter(|s| s.is_degraded())
            .count();
        info!(degraded, "Stores opened");

        Self {
            crawl,
            content,
            memory,
        }
    }

    pub async fn close(&self) {
        tokio::join!(self.crawl.close(), self.content.close(), self.memory.close());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_round_trip() {
        assert_eq!(ContentType::from_str("article"), Some(ContentType::Article));
        assert_eq!(ContentType::from_str("comment"), Some(ContentType::Comment));
        assert_eq!(ContentType::from_str("post"), None);
        assert_eq!(ContentType::Comment.as_str(), "comment");
    }

    #[tokio::test]
    async fn test_degraded_store_is_silent() {
        let store = Store::degraded(StoreKind::Memory);
        assert!(store.is_degraded());
        assert!(!store.save_memory("board", "text").await);
        assert_eq!(store.load_latest_memory("board").await, "");
        assert!(store.memory_history("board").await.is_empty());
        store.close().await;
    }

    #[tokio::test]
    async fn test_open_degrades_on_bad_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        // A regular file where a directory is expected.
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let store = Store::open(StoreKind::Content, &blocker.join("data.sqlite")).await;
        assert!(store.is_degraded());
        assert_eq!(store.kind(), StoreKind::Content);
    }
}
