//! PubMed retrieval: search, batched fetch and record parsing.
//!
//! Retrieval follows a fixed three-step pattern:
//!
//! 1. **Search**: `esearch` for meta-analyses on a topic, bounded by a
//!    per-client quota ([`client::PubmedClient::search`])
//! 2. **Fetch**: one batched `efetch` for all returned identifiers
//!    ([`client::PubmedClient::fetch`])
//! 3. **Parse**: XML → [`ArticleRecord`]s with sentinel defaults and the
//!    minimum-abstract filter ([`parser::RecordParser::parse`])
//!
//! Each step fails softly. A failure anywhere shows up as an empty record
//! list, and callers cannot tell a failed fetch from an empty search.

pub mod client;
pub mod document;
pub mod parser;
pub mod query;

use crate::models::ArticleRecord;
use client::PubmedClient;
use parser::RecordParser;
use tracing::{info, instrument};

/// Run search → fetch → parse for one topic.
#[instrument(level = "info", skip(client, parser))]
pub async fn retrieve(client: &PubmedClient, parser: &RecordParser, topic: &str) -> Vec<ArticleRecord> {
    let Some(ids) = client.search(topic).await else {
        return Vec::new();
    };
    let Some(payload) = client.fetch(&ids).await else {
        return Vec::new();
    };
    let records = parser.parse(&payload);
    info!(requested = ids.len(), usable = records.len(), "Retrieved records");
    records
}
