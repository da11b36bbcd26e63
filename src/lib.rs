//! # regscope
//!
//! A regulatory corpus ingestion and linguistic metrics pipeline.
//!
//! regscope pulls the eCFR-style corpus from its public API, flattens each
//! title's deeply nested XML into plain text, computes reproducible surface
//! metrics (word/sentence counts, average sentence length, lexical density,
//! SHA-256 fingerprints) over bounded chunks, and persists append-only
//! snapshot batches in SQLite, linked to a many-to-many agency hierarchy.
//! A read-only HTTP API serves per-title and per-agency aggregates.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────────────────────┐   ┌──────────┐
//! │ Corpus    │──▶│  Pipeline                 │──▶│  SQLite  │
//! │ API       │   │ Flatten→Chunk→Metrics     │   │ snapshots│
//! └───────────┘   └───────────────────────────┘   └────┬─────┘
//!       │                                              │
//!       └──▶ agencies/titles catalogs ──▶ hierarchy    │
//!                                                      ▼
//!                                          ┌──────────┐ ┌──────────┐
//!                                          │   CLI    │ │   HTTP   │
//!                                          │  (regs)  │ │  (read)  │
//!                                          └──────────┘ └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! regs init                 # create database
//! regs ingest               # full corpus run
//! regs metrics 5            # latest aggregate for title 5
//! regs history 5            # snapshot time series
//! regs stats                # database overview
//! regs serve                # start the read-only API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and catalog payloads |
//! | [`source`] | Remote corpus API client |
//! | [`flatten`] | Nested document tree flattening |
//! | [`chunk`] | Positional text chunking |
//! | [`metrics`] | Linguistic metrics and fingerprints |
//! | [`hierarchy`] | Agency forest and title associations |
//! | [`store`] | Append-only snapshot persistence |
//! | [`aggregate`] | Per-agency read-time aggregation |
//! | [`ingest`] | Batched ingestion orchestration |
//! | [`server`] | Read-only HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod aggregate;
pub mod chunk;
pub mod config;
pub mod db;
pub mod flatten;
pub mod hierarchy;
pub mod ingest;
pub mod metrics;
pub mod migrate;
pub mod models;
pub mod report;
pub mod server;
pub mod source;
pub mod stats;
pub mod store;
