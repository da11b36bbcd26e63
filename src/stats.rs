//! Database statistics and health overview.
//!
//! A quick summary of what's ingested: agency, title, link, and snapshot
//! counts plus the most recent run. Used by `regs stats` to give confidence
//! that ingestion runs are landing as expected.

use anyhow::Result;

use crate::config::Config;
use crate::db;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let agencies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agencies")
        .fetch_one(&pool)
        .await?;
    let titles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM titles")
        .fetch_one(&pool)
        .await?;
    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM title_agency")
        .fetch_one(&pool)
        .await?;
    let snapshots: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snapshots")
        .fetch_one(&pool)
        .await?;
    let snapshotted_titles: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT title_id) FROM snapshots")
            .fetch_one(&pool)
            .await?;
    let last_run: Option<String> = sqlx::query_scalar("SELECT MAX(retrieved_at) FROM snapshots")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("regscope — Database Stats");
    println!("=========================");
    println!();
    println!("  Database:   {}", config.db.path.display());
    println!("  Size:       {}", format_bytes(db_size));
    println!();
    println!("  Agencies:   {}", agencies);
    println!("  Titles:     {} ({} snapshotted)", titles, snapshotted_titles);
    println!("  Links:      {}", links);
    println!("  Snapshots:  {}", snapshots);
    println!(
        "  Last run:   {}",
        last_run.as_deref().unwrap_or("never")
    );
    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
