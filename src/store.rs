//! Snapshot persistence.
//!
//! Snapshots are append-only: each ingestion run writes a fresh batch of
//! chunk rows per title inside one transaction, so a title either gets all
//! of its chunk rows for a run or none. Reads expose the latest snapshot
//! set (all chunk rows sharing the title's most recent `retrieved_at`) and
//! the full history.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::metrics::ChunkMetrics;
use crate::models::Snapshot;

/// One chunk ready for persistence: text plus derived metrics.
#[derive(Debug, Clone)]
pub struct ChunkSnapshot {
    pub text: String,
    pub metrics: ChunkMetrics,
    pub checksum: String,
}

/// Inserts one document's chunk batch atomically.
///
/// All rows share `retrieved_at`, which identifies the run's snapshot set.
pub async fn insert_snapshots(
    pool: &SqlitePool,
    title_id: i64,
    retrieved_at: &str,
    chunks: &[ChunkSnapshot],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    for chunk in chunks {
        sqlx::query(
            r#"
            INSERT INTO snapshots
                (title_id, retrieved_at, raw_text, word_count, sentence_count,
                 avg_sentence_length, checksum, lexical_density)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(title_id)
        .bind(retrieved_at)
        .bind(&chunk.text)
        .bind(chunk.metrics.word_count)
        .bind(chunk.metrics.sentence_count)
        .bind(chunk.metrics.avg_sentence_length)
        .bind(&chunk.checksum)
        .bind(chunk.metrics.lexical_density)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Returns the latest snapshot set for a title, in chunk order.
///
/// Empty if the title has never been snapshotted.
pub async fn latest_set(pool: &SqlitePool, title_id: i64) -> Result<Vec<Snapshot>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title_id, retrieved_at, raw_text, word_count, sentence_count,
               avg_sentence_length, checksum, lexical_density
        FROM snapshots
        WHERE title_id = ?
          AND retrieved_at = (SELECT MAX(retrieved_at) FROM snapshots WHERE title_id = ?)
        ORDER BY id ASC
        "#,
    )
    .bind(title_id)
    .bind(title_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(snapshot_from_row).collect())
}

/// Returns every snapshot row for a title, oldest run first.
pub async fn history(pool: &SqlitePool, title_id: i64) -> Result<Vec<Snapshot>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title_id, retrieved_at, raw_text, word_count, sentence_count,
               avg_sentence_length, checksum, lexical_density
        FROM snapshots
        WHERE title_id = ?
        ORDER BY retrieved_at ASC, id ASC
        "#,
    )
    .bind(title_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(snapshot_from_row).collect())
}

/// Concatenated raw text of the latest snapshot set, or `None` if absent.
///
/// Chunk boundaries are positional, so straight concatenation reproduces
/// the flattened document text.
pub async fn latest_raw_text(pool: &SqlitePool, title_id: i64) -> Result<Option<String>> {
    let set = latest_set(pool, title_id).await?;
    if set.is_empty() {
        return Ok(None);
    }
    let mut out = String::new();
    for snapshot in &set {
        out.push_str(&snapshot.raw_text);
    }
    Ok(Some(out))
}

fn snapshot_from_row(row: &sqlx::sqlite::SqliteRow) -> Snapshot {
    Snapshot {
        id: row.get("id"),
        title_id: row.get("title_id"),
        retrieved_at: row.get("retrieved_at"),
        raw_text: row.get("raw_text"),
        word_count: row.get("word_count"),
        sentence_count: row.get("sentence_count"),
        avg_sentence_length: row.get("avg_sentence_length"),
        checksum: row.get("checksum"),
        lexical_density: row.get("lexical_density"),
    }
}
