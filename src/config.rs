use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub aggregate: AggregateConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.ecfr.gov".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Maximum characters per snapshot chunk.
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    /// Titles fetched concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_chars: default_chunk_chars(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_chunk_chars() -> usize {
    50_000
}
fn default_batch_size() -> usize {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct AggregateConfig {
    /// How per-agency lexical density is averaged across documents:
    /// `document-mean` (simple mean of per-document values) or
    /// `word-weighted` (weighted by document word counts).
    #[serde(default = "default_density_mean")]
    pub density_mean: String,
    /// Fold descendant agency totals into each parent's view.
    #[serde(default)]
    pub rollup_descendants: bool,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            density_mean: default_density_mean(),
            rollup_descendants: false,
        }
    }
}

fn default_density_mean() -> String {
    "document-mean".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.ingest.chunk_chars == 0 {
        anyhow::bail!("ingest.chunk_chars must be > 0");
    }
    if config.ingest.batch_size == 0 {
        anyhow::bail!("ingest.batch_size must be > 0");
    }
    if config.source.base_url.is_empty() {
        anyhow::bail!("source.base_url must not be empty");
    }

    match config.aggregate.density_mean.as_str() {
        "document-mean" | "word-weighted" => {}
        other => anyhow::bail!(
            "Unknown aggregate.density_mean: '{}'. Must be document-mean or word-weighted.",
            other
        ),
    }

    Ok(config)
}
