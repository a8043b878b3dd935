use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{
    CrawledItem, GeneratedContent, MemoryRecord, NewCrawledItem, NewGeneratedContent,
};

// ========== Crawl snapshots ==========

/// Insert a crawl snapshot row, returning its ID.
pub async fn insert_crawled_item(pool: &SqlitePool, item: &NewCrawledItem) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO crawled_data (board_id, article_title, author_id)
        VALUES (?, ?, ?)
        ",
    )
    .bind(&item.board_id)
    .bind(&item.article_title)
    .bind(&item.author_id)
    .execute(pool)
    .await
    .context("Failed to insert crawled item")?;

    Ok(result.last_insert_rowid())
}

/// Get all crawl snapshot rows for a board, oldest first.
pub async fn get_crawled_items(pool: &SqlitePool, board_id: &str) -> Result<Vec<CrawledItem>> {
    sqlx::query_as("SELECT * FROM crawled_data WHERE board_id = ? ORDER BY id ASC")
        .bind(board_id)
        .fetch_all(pool)
        .await
        .context("Failed to fetch crawled items")
}

// ========== Generated content ==========

/// Insert a generated content row, returning its ID.
pub async fn insert_generated_content(
    pool: &SqlitePool,
    content: &NewGeneratedContent,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO generated_content (content_type, doc_id, content, board_id)
        VALUES (?, ?, ?, ?)
        ",
    )
    .bind(content.content_type.as_str())
    .bind(&content.doc_id)
    .bind(&content.content)
    .bind(&content.board_id)
    .execute(pool)
    .await
    .context("Failed to insert generated content")?;

    Ok(result.last_insert_rowid())
}

/// Get all generated content for a board, oldest first.
pub async fn get_generated_content(
    pool: &SqlitePool,
    board_id: &str,
) -> Result<Vec<GeneratedContent>> {
    sqlx::query_as("SELECT * FROM generated_content WHERE board_id = ? ORDER BY id ASC")
        .bind(board_id)
        .fetch_all(pool)
        .await
        .context("Failed to fetch generated content")
}

// ========== Memory ==========

/// Append a memory record, returning its ID.
pub async fn insert_memory(pool: &SqlitePool, board_id: &str, content: &str) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO gallery_memory (board_id, memory_content)
        VALUES (?, ?)
        ",
    )
    .bind(board_id)
    .bind(content)
    .execute(pool)
    .await
    .context("Failed to insert memory")?;

    Ok(result.last_insert_rowid())
}

/// Get the most recent memory record for a board.
///
/// Ordered by row id rather than `created_at`, which only has second resolution.
pub async fn get_latest_memory(pool: &SqlitePool, board_id: &str) -> Result<Option<MemoryRecord>> {
    sqlx::query_as(
        r"
        SELECT * FROM gallery_memory
        WHERE board_id = ?
        ORDER BY id DESC
        LIMIT 1
        ",
    )
    .bind(board_id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch latest memory")
}

/// Get every memory record for a board, oldest first.
pub async fn get_memory_history(pool: &SqlitePool, board_id: &str) -> Result<Vec<MemoryRecord>> {
    sqlx::query_as("SELECT * FROM gallery_memory WHERE board_id = ? ORDER BY id ASC")
        .bind(board_id)
        .fetch_all(pool)
        .await
        .context("Failed to fetch memory history")
}
