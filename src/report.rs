//! Title metric reports for the CLI.
//!
//! Fetches a title's latest aggregate or full snapshot history and prints
//! it. The same data backs the HTTP API in [`crate::server`].

use anyhow::{bail, Result};
use sqlx::SqlitePool;

use crate::aggregate;
use crate::config::Config;
use crate::db;
use crate::store;

/// Prints the latest-run aggregate for a title number.
pub async fn run_metrics(config: &Config, number: i64) -> Result<()> {
    let pool = db::connect(config).await?;

    let aggregate = match aggregate::title_aggregate_by_number(&pool, number).await? {
        Some(a) => a,
        None => {
            pool.close().await;
            bail!("no snapshot found for title {}", number);
        }
    };

    println!("--- Title {} ---", aggregate.number);
    println!("name:                {}", aggregate.name);
    println!("retrieved_at:        {}", aggregate.retrieved_at);
    println!("chunks:              {}", aggregate.chunk_count);
    println!("word_count:          {}", aggregate.word_count);
    println!("sentence_count:      {}", aggregate.sentence_count);
    println!("avg_sentence_length: {:.2}", aggregate.avg_sentence_length);
    println!("lexical_density:     {:.4}", aggregate.lexical_density);

    pool.close().await;
    Ok(())
}

/// Prints the full snapshot history for a title number.
pub async fn run_history(config: &Config, number: i64) -> Result<()> {
    let pool = db::connect(config).await?;

    let title_id = match lookup_title_id(&pool, number).await? {
        Some(id) => id,
        None => {
            pool.close().await;
            bail!("title not found: {}", number);
        }
    };

    let history = store::history(&pool, title_id).await?;
    if history.is_empty() {
        println!("No snapshots for title {}", number);
        pool.close().await;
        return Ok(());
    }

    println!(
        "{:<26} {:>9} {:>10} {:>9} {:>9}  {}",
        "RETRIEVED AT", "WORDS", "SENTENCES", "AVG LEN", "DENSITY", "CHECKSUM"
    );
    for snapshot in &history {
        println!(
            "{:<26} {:>9} {:>10} {:>9.2} {:>9.4}  {}",
            snapshot.retrieved_at,
            snapshot.word_count,
            snapshot.sentence_count,
            snapshot.avg_sentence_length,
            snapshot.lexical_density,
            &snapshot.checksum[..12.min(snapshot.checksum.len())]
        );
    }

    pool.close().await;
    Ok(())
}

pub(crate) async fn lookup_title_id(pool: &SqlitePool, number: i64) -> Result<Option<i64>> {
    let id = sqlx::query_scalar("SELECT id FROM titles WHERE number = ?")
        .bind(number)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}
