//! HTTP client for the NCBI E-utilities `esearch` and `efetch` endpoints.
//!
//! The client owns its per-process search quota. Both public operations are
//! soft-failing: transport errors, non-success statuses and an exhausted
//! quota are logged here and surface to the caller only as `None`.

use super::query::SearchFilters;
use crate::config::PubmedConfig;
use itertools::Itertools;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Errors raised inside the client before they are collapsed to `None`.
#[derive(Debug, Error)]
pub enum PubmedError {
    #[error("daily search quota of {limit} reached")]
    QuotaExceeded { limit: usize },

    #[error("no identifiers to fetch")]
    NoIdentifiers,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(StatusCode),
}

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: ESearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// Search and fetch client with a bounded number of searches per instance.
#[derive(Debug)]
pub struct PubmedClient {
    http: reqwest::Client,
    base_url: String,
    filters: SearchFilters,
    max_results: usize,
    max_searches: usize,
    searches_issued: AtomicUsize,
    api_key: Option<String>,
}

impl PubmedClient {
    /// Build a client from configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoint base URL, optional API key, result cap, search
    ///   quota and filters. `timeout_secs` applies to every request.
    ///
    /// # Returns
    ///
    /// A client with its search counter at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built (for
    /// example when the TLS backend fails to initialize).
    pub fn new(config: &PubmedConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            filters: SearchFilters::from(config),
            max_results: config.max_results,
            max_searches: config.max_searches,
            searches_issued: AtomicUsize::new(0),
            api_key: config.api_key.clone(),
        })
    }

    /// Number of searches issued so far by this instance.
    pub fn searches_issued(&self) -> usize {
        self.searches_issued.load(Ordering::SeqCst)
    }

    /// Searches left before the quota is exhausted.
    ///
    /// # Returns
    ///
    /// `max_searches - searches_issued()`, saturating at zero. Failed searches
    /// count against the quota too.
    pub fn remaining_searches(&self) -> usize {
        self.max_searches.saturating_sub(self.searches_issued())
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// Claim one slot of the quota, or fail without touching the network.
    fn reserve_search(&self) -> Result<(), PubmedError> {
        self.searches_issued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |issued| {
                (issued < self.max_searches).then_some(issued + 1)
            })
            .map(|_| ())
            .map_err(|_| PubmedError::QuotaExceeded {
                limit: self.max_searches,
            })
    }

    /// Search for meta-analyses on `topic`, returning identifiers in
    /// relevance order.
    pub async fn try_search(&self, topic: &str) -> Result<Vec<String>, PubmedError> {
        self.reserve_search()?;

        let term = self.filters.term(topic);
        let retmax = self.max_results.to_string();
        let mut params = vec![
            ("db", "pubmed"),
            ("term", term.as_str()),
            ("retmax", retmax.as_str()),
            ("retmode", "json"),
            ("sort", "relevance"),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.as_str()));
        }
        debug!(%term, "Issuing esearch");

        let response = self
            .http
            .get(self.endpoint("esearch.fcgi"))
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PubmedError::Status(status));
        }

        let payload: ESearchResponse = response.json().await?;
        let mut ids = payload.esearchresult.idlist;
        ids.truncate(self.max_results);
        Ok(ids)
    }

    /// Soft-failing search: `None` on no results, quota exhaustion or any
    /// transport failure.
    #[instrument(level = "info", skip_all, fields(%topic))]
    pub async fn search(&self, topic: &str) -> Option<Vec<String>> {
        match self.try_search(topic).await {
            Ok(ids) if ids.is_empty() => {
                info!("No meta-analyses found");
                None
            }
            Ok(ids) => {
                info!(count = ids.len(), remaining = self.remaining_searches(), "Found articles");
                Some(ids)
            }
            Err(e @ PubmedError::QuotaExceeded { .. }) => {
                warn!(error = %e, "Skipping search");
                None
            }
            Err(e) => {
                error!(error = %e, "PubMed search failed");
                None
            }
        }
    }

    /// Fetch the full XML records for `ids` in a single batched request.
    pub async fn try_fetch(&self, ids: &[String]) -> Result<String, PubmedError> {
        if ids.is_empty() {
            return Err(PubmedError::NoIdentifiers);
        }

        let joined = ids.iter().join(",");
        let mut params = vec![("db", "pubmed"), ("id", joined.as_str()), ("retmode", "xml")];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.as_str()));
        }

        let response = self
            .http
            .get(self.endpoint("efetch.fcgi"))
            .query(&params)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PubmedError::Status(status));
        }
        Ok(response.text().await?)
    }

    /// Soft-failing fetch: `None` on empty input or any failure.
    #[instrument(level = "info", skip_all, fields(count = ids.len()))]
    pub async fn fetch(&self, ids: &[String]) -> Option<String> {
        match self.try_fetch(ids).await {
            Ok(xml) => {
                info!(bytes = xml.len(), "Fetched article details");
                Some(xml)
            }
            Err(e @ PubmedError::NoIdentifiers) => {
                debug!(error = %e, "Nothing to fetch");
                None
            }
            Err(e) => {
                error!(error = %e, "Fetching article details failed");
                None
            }
        }
    }
}
