//! Ingestion run orchestration.
//!
//! Drives one full pipeline run: fetch catalogs → upsert titles → build the
//! agency hierarchy → then, in catalog order and in small concurrent
//! batches, fetch each title's full XML, flatten it, chunk it, compute
//! metrics, and persist the chunk batch atomically.
//!
//! Concurrency is bounded per batch: every task in a batch settles before
//! the next batch starts, capping both in-flight memory (each task holds
//! one full document before chunking) and load on the rate-sensitive
//! remote source. A single title's failure is captured and reported; it
//! never aborts the batch or the run.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::db;
use crate::flatten::{flatten, parse_xml};
use crate::hierarchy;
use crate::metrics::{checksum, compute_metrics, DocumentAccumulator};
use crate::models::TitleRecord;
use crate::source::CorpusSource;
use crate::store::{self, ChunkSnapshot};

/// Outcome of one ingestion run.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub titles_total: u64,
    pub titles_ok: u64,
    pub titles_failed: u64,
    pub snapshots_written: u64,
    pub agencies_upserted: u64,
    pub links_created: u64,
    pub dropped_refs: u64,
    /// Per-title failures: (title number, reason).
    pub failures: Vec<(i64, String)>,
}

/// Work item for one title in the processing phase.
#[derive(Debug, Clone)]
struct TitleJob {
    title_id: i64,
    number: i64,
    issue_date: String,
}

/// Runs a full ingestion: catalogs, hierarchy, then all title texts.
///
/// `limit` caps the number of titles processed (catalog order), for
/// partial runs during development.
pub async fn run_ingest(
    config: &Config,
    source: Arc<dyn CorpusSource>,
    limit: Option<usize>,
) -> Result<RunSummary> {
    let pool = db::connect(config).await?;
    let mut summary = RunSummary::default();

    println!("Fetching titles catalog...");
    let titles = source.titles().await.context("titles catalog fetch failed")?;
    upsert_titles(&pool, &titles).await?;
    println!("  {} titles stored", titles.len());

    println!("Fetching agencies catalog...");
    let forest = source
        .agencies()
        .await
        .context("agencies catalog fetch failed")?;
    let report = hierarchy::build_hierarchy(&pool, &forest).await?;
    summary.agencies_upserted = report.agencies_upserted;
    summary.links_created = report.links_created;
    summary.dropped_refs = report.dropped_refs;
    println!(
        "  {} agencies upserted, {} title links ({} dropped references)",
        report.agencies_upserted, report.links_created, report.dropped_refs
    );

    // The association set is persisted before document processing begins,
    // so aggregation reads it from the store rather than run-local state.
    let mut jobs = load_jobs(&pool).await?;
    if let Some(limit) = limit {
        jobs.truncate(limit);
    }
    summary.titles_total = jobs.len() as u64;

    let batch_size = config.ingest.batch_size;
    let chunk_chars = config.ingest.chunk_chars;
    println!(
        "Processing {} titles in batches of {}...",
        jobs.len(),
        batch_size
    );

    let mut done = 0u64;
    for batch in jobs.chunks(batch_size) {
        let mut tasks = JoinSet::new();
        for job in batch {
            let job = job.clone();
            let source = Arc::clone(&source);
            let pool = pool.clone();
            tasks.spawn(async move {
                let outcome = process_title(&pool, source.as_ref(), &job, chunk_chars).await;
                (job.number, outcome)
            });
        }

        // Settle the whole batch before advancing; every outcome is
        // observed and reported against its title number.
        while let Some(joined) = tasks.join_next().await {
            done += 1;
            match joined {
                Ok((number, Ok(outcome))) => {
                    summary.titles_ok += 1;
                    summary.snapshots_written += outcome.chunks;
                    println!(
                        "[{}/{}] title {}: {} chunks, {} words, density {:.3}",
                        done,
                        summary.titles_total,
                        number,
                        outcome.chunks,
                        outcome.words,
                        outcome.density
                    );
                }
                Ok((number, Err(e))) => {
                    summary.titles_failed += 1;
                    eprintln!(
                        "[{}/{}] title {} failed: {:#}",
                        done, summary.titles_total, number, e
                    );
                    summary.failures.push((number, format!("{:#}", e)));
                }
                Err(e) => {
                    // Task panic or cancellation; the title number is lost
                    // with the task, so report it generically.
                    summary.titles_failed += 1;
                    eprintln!("[{}/{}] task failed: {}", done, summary.titles_total, e);
                    summary.failures.push((-1, e.to_string()));
                }
            }
        }
    }

    println!("ingest complete");
    println!("  titles processed: {}", summary.titles_ok);
    println!("  titles failed:    {}", summary.titles_failed);
    println!("  snapshots written: {}", summary.snapshots_written);

    pool.close().await;
    Ok(summary)
}

/// Per-title outcome used for progress reporting.
struct TitleOutcome {
    chunks: u64,
    words: i64,
    density: f64,
}

/// Fetches, flattens, chunks, measures, and persists one title.
///
/// The chunk batch is built fully before persistence, so a title either
/// gets all of its chunk rows for this run or none. The flattened text is
/// dropped as soon as its chunks are measured.
async fn process_title(
    pool: &SqlitePool,
    source: &dyn CorpusSource,
    job: &TitleJob,
    chunk_chars: usize,
) -> Result<TitleOutcome> {
    let xml = source.title_xml(&job.issue_date, job.number).await?;
    let tree = parse_xml(&xml).map_err(|e| anyhow::anyhow!("{}", e))?;
    drop(xml);
    let text = flatten(&tree).map_err(|e| anyhow::anyhow!("{}", e))?;
    drop(tree);

    let mut accumulator = DocumentAccumulator::new();
    let mut chunks = Vec::new();
    for piece in chunk_text(&text, chunk_chars) {
        let metrics = compute_metrics(piece);
        accumulator.observe(piece, &metrics);
        chunks.push(ChunkSnapshot {
            text: piece.to_string(),
            metrics,
            checksum: checksum(piece),
        });
    }
    drop(text);

    let retrieved_at = chrono::Utc::now().to_rfc3339();
    store::insert_snapshots(pool, job.title_id, &retrieved_at, &chunks).await?;

    let doc = accumulator.finish();
    Ok(TitleOutcome {
        chunks: chunks.len() as u64,
        words: doc.word_count,
        density: doc.lexical_density,
    })
}

async fn upsert_titles(pool: &SqlitePool, titles: &[TitleRecord]) -> Result<()> {
    for title in titles {
        sqlx::query(
            r#"
            INSERT INTO titles
                (number, name, latest_amended_on, latest_issue_date, up_to_date_as_of, reserved)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(number) DO UPDATE SET
                name = excluded.name,
                latest_amended_on = excluded.latest_amended_on,
                latest_issue_date = excluded.latest_issue_date,
                up_to_date_as_of = excluded.up_to_date_as_of,
                reserved = excluded.reserved
            "#,
        )
        .bind(title.number)
        .bind(&title.name)
        .bind(&title.latest_amended_on)
        .bind(&title.latest_issue_date)
        .bind(&title.up_to_date_as_of)
        .bind(title.reserved as i64)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Loads the processing queue in catalog (title number) order.
///
/// Titles without an issue date (reserved placeholders) have no full-text
/// endpoint to hit and are skipped up front with a note.
async fn load_jobs(pool: &SqlitePool) -> Result<Vec<TitleJob>> {
    let rows = sqlx::query_as::<_, (i64, i64, Option<String>)>(
        "SELECT id, number, latest_issue_date FROM titles ORDER BY number ASC",
    )
    .fetch_all(pool)
    .await?;

    let mut jobs = Vec::new();
    for (title_id, number, issue_date) in rows {
        match issue_date {
            Some(issue_date) if !issue_date.is_empty() => jobs.push(TitleJob {
                title_id,
                number,
                issue_date,
            }),
            _ => {
                eprintln!("Warning: title {} has no issue date, skipping", number);
            }
        }
    }
    Ok(jobs)
}
