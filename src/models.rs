//! Core data models used throughout regscope.
//!
//! These types represent the agencies, titles, and snapshots that flow
//! through the ingestion pipeline, plus the raw catalog payloads returned
//! by the remote corpus API.

use serde::{Deserialize, Serialize};

/// An organizational entity, possibly nested under a parent agency.
///
/// Agencies are upserted by slug on every ingestion run; the slug is the
/// stable external key, the row id is internal.
#[derive(Debug, Clone, Serialize)]
pub struct Agency {
    pub id: i64,
    pub name: String,
    pub short_name: Option<String>,
    pub slug: String,
    pub parent_id: Option<i64>,
}

/// One unit of the regulatory corpus ("title"), identified by a stable number.
///
/// The freshness markers are opaque strings from the catalog; they are not
/// parsed as dates here, only passed through (and `latest_issue_date` is fed
/// back into the full-text fetch URL).
#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub id: i64,
    pub number: i64,
    pub name: String,
    pub latest_amended_on: Option<String>,
    pub latest_issue_date: Option<String>,
    pub up_to_date_as_of: Option<String>,
    pub reserved: bool,
}

/// One persisted chunk of a title's flattened text plus its computed metrics.
///
/// Snapshots are append-only: each ingestion run adds a fresh batch of chunk
/// rows per title, all sharing one `retrieved_at` timestamp, so a title
/// accumulates a time series across runs.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub id: i64,
    pub title_id: i64,
    pub retrieved_at: String,
    pub raw_text: String,
    pub word_count: i64,
    pub sentence_count: i64,
    pub avg_sentence_length: f64,
    pub checksum: String,
    pub lexical_density: f64,
}

// ============ Remote catalog payloads ============

/// Envelope of the titles catalog endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TitlesCatalog {
    pub titles: Vec<TitleRecord>,
}

/// One entry of the titles catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct TitleRecord {
    pub number: i64,
    pub name: String,
    pub latest_amended_on: Option<String>,
    pub latest_issue_date: Option<String>,
    pub up_to_date_as_of: Option<String>,
    #[serde(default)]
    pub reserved: bool,
}

/// Envelope of the agencies catalog endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AgenciesCatalog {
    pub agencies: Vec<AgencyNode>,
}

/// One node of the agency forest as delivered by the catalog.
///
/// `slug` is optional at this layer so that malformed nodes deserialize and
/// can be skipped with a diagnostic instead of failing the whole catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct AgencyNode {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub cfr_references: Vec<CfrReference>,
    #[serde(default)]
    pub children: Vec<AgencyNode>,
}

/// A cross-reference from an agency to a title number.
#[derive(Debug, Clone, Deserialize)]
pub struct CfrReference {
    pub title: i64,
}
