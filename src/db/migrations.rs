use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

use super::StoreKind;

/// Run all pending migrations for the table owned by `kind`.
pub async fn run(pool: &SqlitePool, kind: StoreKind) -> Result<()> {
    create_migration_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version < 1 {
        debug!(store = kind.as_str(), "Running migration v1");
        match kind {
            StoreKind::Crawl => create_crawled_data(pool).await?,
            StoreKind::Content => create_generated_content(pool).await?,
            StoreKind::Memory => create_gallery_memory(pool).await?,
        }
        set_schema_version(pool, 1).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("DELETE FROM _schema_version")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_crawled_data(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS crawled_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            board_id TEXT NOT NULL,
            article_title TEXT NOT NULL,
            author_id TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create crawled_data table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_crawled_data_board ON crawled_data(board_id)")
        .execute(pool)
        .await
        .context("Failed to create crawled_data index")?;

    Ok(())
}

async fn create_generated_content(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS generated_content (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_type TEXT NOT NULL,
            doc_id TEXT,
            content TEXT NOT NULL,
            board_id TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create generated_content table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_generated_content_board ON generated_content(board_id)",
    )
    .execute(pool)
    .await
    .context("Failed to create generated_content index")?;

    Ok(())
}

async fn create_gallery_memory(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS gallery_memory (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            board_id TEXT NOT NULL,
            memory_content TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create gallery_memory table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_gallery_memory_board ON gallery_memory(board_id)")
        .execute(pool)
        .await
        .context("Failed to create gallery_memory index")?;

    Ok(())
}
