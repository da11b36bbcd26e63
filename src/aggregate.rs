//! Read-time metric aggregation over persisted snapshots.
//!
//! Pure computation over the snapshots, title_agency, and agencies tables;
//! nothing here writes. Per-title aggregates come from each title's latest
//! snapshot set; per-agency aggregates combine the titles linked to that
//! agency.
//!
//! Two deliberate, documented simplifications:
//! - Agency-level average sentence length and lexical density are means of
//!   per-title values (mean of means), not word-weighted, unless the
//!   `word-weighted` density policy is configured.
//! - A title's read-time lexical density is the mean of its chunk
//!   densities. The exact cross-chunk density needs the distinct word-form
//!   set, which exists only during ingestion (see
//!   [`crate::metrics::DocumentAccumulator`]).
//!
//! Parent agencies report only their directly linked titles by default;
//! `rollup_descendants` folds each subtree's titles into its root instead.

use anyhow::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::AggregateConfig;

/// How per-agency lexical density is averaged across titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityMean {
    /// Simple mean of per-title values. Matches the observed behavior of
    /// the reference system.
    DocumentMean,
    /// Mean weighted by per-title word counts.
    WordWeighted,
}

impl DensityMean {
    /// Parses the validated config string.
    pub fn from_config(config: &AggregateConfig) -> Self {
        match config.density_mean.as_str() {
            "word-weighted" => DensityMean::WordWeighted,
            _ => DensityMean::DocumentMean,
        }
    }
}

/// Latest-run aggregate for one title.
#[derive(Debug, Clone, Serialize)]
pub struct TitleAggregate {
    pub title_id: i64,
    pub number: i64,
    pub name: String,
    pub retrieved_at: String,
    pub chunk_count: i64,
    pub word_count: i64,
    pub sentence_count: i64,
    pub avg_sentence_length: f64,
    pub lexical_density: f64,
}

/// Aggregate view of one agency, with nested titles and children.
#[derive(Debug, Clone, Serialize)]
pub struct AgencyAggregate {
    pub agency_id: i64,
    pub name: String,
    pub short_name: Option<String>,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub total_words: i64,
    pub total_sentences: i64,
    pub avg_sentence_length: f64,
    pub lexical_density: f64,
    pub titles: Vec<TitleSummary>,
    pub children: Vec<AgencyAggregate>,
}

/// Minimal per-title detail nested under an agency.
#[derive(Debug, Clone, Serialize)]
pub struct TitleSummary {
    pub number: i64,
    pub name: String,
    pub word_count: i64,
}

/// Latest-run aggregates for every snapshotted title, keyed by title id.
pub async fn title_aggregates(pool: &SqlitePool) -> Result<HashMap<i64, TitleAggregate>> {
    let rows = sqlx::query(
        r#"
        SELECT s.title_id, t.number, t.name, s.retrieved_at,
               COUNT(*) AS chunk_count,
               SUM(s.word_count) AS total_words,
               SUM(s.sentence_count) AS total_sentences,
               AVG(s.lexical_density) AS mean_density
        FROM snapshots s
        JOIN titles t ON t.id = s.title_id
        JOIN (
            SELECT title_id, MAX(retrieved_at) AS latest
            FROM snapshots
            GROUP BY title_id
        ) latest ON latest.title_id = s.title_id AND latest.latest = s.retrieved_at
        GROUP BY s.title_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut out = HashMap::new();
    for row in &rows {
        let title_id: i64 = row.get("title_id");
        let total_words: i64 = row.get("total_words");
        let total_sentences: i64 = row.get("total_sentences");
        out.insert(
            title_id,
            TitleAggregate {
                title_id,
                number: row.get("number"),
                name: row.get("name"),
                retrieved_at: row.get("retrieved_at"),
                chunk_count: row.get("chunk_count"),
                word_count: total_words,
                sentence_count: total_sentences,
                avg_sentence_length: ratio(total_words, total_sentences),
                lexical_density: row.get("mean_density"),
            },
        );
    }
    Ok(out)
}

/// Latest-run aggregate for a single title by its external number.
pub async fn title_aggregate_by_number(
    pool: &SqlitePool,
    number: i64,
) -> Result<Option<TitleAggregate>> {
    let all = title_aggregates(pool).await?;
    Ok(all.into_values().find(|t| t.number == number))
}

/// Builds the full agency metric forest: root agencies with nested children.
pub async fn agency_metrics(
    pool: &SqlitePool,
    config: &AggregateConfig,
) -> Result<Vec<AgencyAggregate>> {
    let policy = DensityMean::from_config(config);
    let titles = title_aggregates(pool).await?;

    let agency_rows = sqlx::query(
        "SELECT id, name, short_name, slug, parent_id FROM agencies ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    let link_rows = sqlx::query("SELECT agency_id, title_id FROM title_agency")
        .fetch_all(pool)
        .await?;

    let mut links: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in &link_rows {
        links
            .entry(row.get("agency_id"))
            .or_default()
            .push(row.get("title_id"));
    }

    // BTreeMap keeps child ordering deterministic by insertion of sorted rows.
    let mut children_of: BTreeMap<Option<i64>, Vec<usize>> = BTreeMap::new();
    for (idx, row) in agency_rows.iter().enumerate() {
        children_of
            .entry(row.get("parent_id"))
            .or_default()
            .push(idx);
    }

    let mut roots = Vec::new();
    for &idx in children_of.get(&None).unwrap_or(&Vec::new()) {
        let (aggregate, _) = build_subtree(
            idx,
            &agency_rows,
            &children_of,
            &links,
            &titles,
            policy,
            config.rollup_descendants,
        );
        roots.push(aggregate);
    }
    Ok(roots)
}

/// Recursively builds one agency's aggregate and returns the title ids its
/// subtree covers (used by the descendant rollup).
fn build_subtree(
    idx: usize,
    rows: &[sqlx::sqlite::SqliteRow],
    children_of: &BTreeMap<Option<i64>, Vec<usize>>,
    links: &HashMap<i64, Vec<i64>>,
    titles: &HashMap<i64, TitleAggregate>,
    policy: DensityMean,
    rollup: bool,
) -> (AgencyAggregate, HashSet<i64>) {
    let row = &rows[idx];
    let agency_id: i64 = row.get("id");

    let own_title_ids: HashSet<i64> = links
        .get(&agency_id)
        .map(|ids| ids.iter().copied().collect())
        .unwrap_or_default();

    let mut children = Vec::new();
    let mut subtree_title_ids = own_title_ids.clone();
    for &child_idx in children_of.get(&Some(agency_id)).unwrap_or(&Vec::new()) {
        let (child, child_titles) =
            build_subtree(child_idx, rows, children_of, links, titles, policy, rollup);
        subtree_title_ids.extend(child_titles);
        children.push(child);
    }

    // Parent totals reflect only directly linked titles unless the summed
    // rollup is configured; a title linked at several levels counts once.
    let scope = if rollup {
        &subtree_title_ids
    } else {
        &own_title_ids
    };
    let mut docs: Vec<&TitleAggregate> = scope.iter().filter_map(|id| titles.get(id)).collect();
    docs.sort_by_key(|t| t.number);

    let summary = summarize(&docs, policy);

    let aggregate = AgencyAggregate {
        agency_id,
        name: row.get("name"),
        short_name: row.get("short_name"),
        slug: row.get("slug"),
        parent_id: row.get("parent_id"),
        total_words: summary.total_words,
        total_sentences: summary.total_sentences,
        avg_sentence_length: summary.avg_sentence_length,
        lexical_density: summary.lexical_density,
        titles: docs
            .iter()
            .map(|t| TitleSummary {
                number: t.number,
                name: t.name.clone(),
                word_count: t.word_count,
            })
            .collect(),
        children,
    };
    (aggregate, subtree_title_ids)
}

struct AgencySummary {
    total_words: i64,
    total_sentences: i64,
    avg_sentence_length: f64,
    lexical_density: f64,
}

/// Combines per-title aggregates into one agency summary.
///
/// Counts sum; averages are means across titles (the density mean obeys
/// the configured policy). No titles yields a zeroed summary, not an error.
fn summarize(docs: &[&TitleAggregate], policy: DensityMean) -> AgencySummary {
    if docs.is_empty() {
        return AgencySummary {
            total_words: 0,
            total_sentences: 0,
            avg_sentence_length: 0.0,
            lexical_density: 0.0,
        };
    }

    let total_words: i64 = docs.iter().map(|d| d.word_count).sum();
    let total_sentences: i64 = docs.iter().map(|d| d.sentence_count).sum();
    let n = docs.len() as f64;

    let avg_sentence_length = docs.iter().map(|d| d.avg_sentence_length).sum::<f64>() / n;
    let lexical_density = match policy {
        DensityMean::DocumentMean => docs.iter().map(|d| d.lexical_density).sum::<f64>() / n,
        DensityMean::WordWeighted => {
            if total_words > 0 {
                docs.iter()
                    .map(|d| d.lexical_density * d.word_count as f64)
                    .sum::<f64>()
                    / total_words as f64
            } else {
                0.0
            }
        }
    };

    AgencySummary {
        total_words,
        total_sentences,
        avg_sentence_length,
        lexical_density,
    }
}

fn ratio(num: i64, den: i64) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}
