//! Remote corpus API client.
//!
//! The [`CorpusSource`] trait is the seam between the ingestion pipeline
//! and the remote service: the orchestrator only ever talks to the trait,
//! so tests can drive a full ingestion run against an in-memory fake.
//!
//! [`EcfrClient`] is the production implementation over the eCFR-style
//! HTTP API: a titles catalog, an agencies catalog, and a full-text
//! endpoint keyed by issue date and title number.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::SourceConfig;
use crate::models::{AgenciesCatalog, AgencyNode, TitleRecord, TitlesCatalog};

/// A remote source of catalogs and full document text.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Fetches the ordered titles catalog.
    async fn titles(&self) -> Result<Vec<TitleRecord>>;

    /// Fetches the agency forest.
    async fn agencies(&self) -> Result<Vec<AgencyNode>>;

    /// Fetches one title's full nested XML document for an issue date.
    async fn title_xml(&self, issue_date: &str, number: i64) -> Result<String>;
}

/// HTTP client for the eCFR versioner/admin API.
pub struct EcfrClient {
    base_url: String,
    client: reqwest::Client,
}

impl EcfrClient {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl CorpusSource for EcfrClient {
    async fn titles(&self) -> Result<Vec<TitleRecord>> {
        let url = format!("{}/api/versioner/v1/titles.json", self.base_url);
        let catalog: TitlesCatalog = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch titles catalog from {}", url))?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse titles catalog")?;
        Ok(catalog.titles)
    }

    async fn agencies(&self) -> Result<Vec<AgencyNode>> {
        let url = format!("{}/api/admin/v1/agencies.json", self.base_url);
        let catalog: AgenciesCatalog = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch agencies catalog from {}", url))?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse agencies catalog")?;
        Ok(catalog.agencies)
    }

    async fn title_xml(&self, issue_date: &str, number: i64) -> Result<String> {
        let url = format!(
            "{}/api/versioner/v1/full/{}/title-{}.xml",
            self.base_url, issue_date, number
        );
        let body = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch full text from {}", url))?
            .error_for_status()?
            .text()
            .await
            .with_context(|| format!("Failed to read full text body for title {}", number))?;
        Ok(body)
    }
}
