use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create agencies table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS agencies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            short_name TEXT,
            slug TEXT NOT NULL UNIQUE,
            parent_id INTEGER,
            FOREIGN KEY (parent_id) REFERENCES agencies(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create titles table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS titles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            number INTEGER NOT NULL UNIQUE,
            name TEXT NOT NULL,
            latest_amended_on TEXT,
            latest_issue_date TEXT,
            up_to_date_as_of TEXT,
            reserved INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create the title <-> agency association table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS title_agency (
            title_id INTEGER NOT NULL,
            agency_id INTEGER NOT NULL,
            PRIMARY KEY (title_id, agency_id),
            FOREIGN KEY (title_id) REFERENCES titles(id),
            FOREIGN KEY (agency_id) REFERENCES agencies(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create snapshots table (append-only chunk metrics)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title_id INTEGER NOT NULL,
            retrieved_at TEXT NOT NULL,
            raw_text TEXT NOT NULL,
            word_count INTEGER NOT NULL,
            sentence_count INTEGER NOT NULL,
            avg_sentence_length REAL NOT NULL,
            checksum TEXT NOT NULL,
            lexical_density REAL NOT NULL,
            FOREIGN KEY (title_id) REFERENCES titles(id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_snapshots_title_id ON snapshots(title_id)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_retrieved_at ON snapshots(title_id, retrieved_at DESC)",
    )
    .execute(&pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_agencies_parent_id ON agencies(parent_id)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_title_agency_agency ON title_agency(agency_id)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
