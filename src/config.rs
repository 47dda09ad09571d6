//! Runtime configuration loaded from an optional YAML file.
//!
//! Every section carries `#[serde(default)]`, so a config file only needs the
//! keys it wants to change. Command-line flags and environment variables are
//! applied on top by [`AppConfig::apply_cli`].

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const DEFAULT_EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/";

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Directory for batch JSON files and weekly reports.
    pub output_dir: PathBuf,
    /// Where the HTML dashboard is written.
    pub dashboard_path: PathBuf,
    pub pubmed: PubmedConfig,
    pub parser: ParserConfig,
    pub website: WebsiteConfig,
    pub topics: Vec<TopicConfig>,
}

/// Settings for the E-utilities search and fetch calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubmedConfig {
    pub base_url: String,
    /// `retmax` for each search.
    pub max_results: usize,
    /// Searches allowed per process before the client short-circuits.
    pub max_searches: usize,
    pub timeout_secs: u64,
    /// Restrict to publications from the last N years.
    pub recent_years: Option<u32>,
    /// Add the `hasabstract` filter to the search term.
    pub require_abstract: bool,
    pub api_key: Option<String>,
}

/// Record parser thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub max_authors: usize,
    /// Records with a shorter abstract (in characters) are dropped.
    pub min_abstract_chars: usize,
}

/// Target site for the website poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiteConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Pause between consecutive posts.
    pub delay_secs: u64,
    /// Pause used when posting is simulated.
    pub simulate_delay_secs: u64,
}

/// A topic to search and the category its article is filed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicConfig {
    pub topic: String,
    pub category: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("medical_content.db"),
            output_dir: PathBuf::from("output"),
            dashboard_path: PathBuf::from("index.html"),
            pubmed: PubmedConfig::default(),
            parser: ParserConfig::default(),
            website: WebsiteConfig::default(),
            topics: default_topics(),
        }
    }
}

impl Default for PubmedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EUTILS_BASE.to_string(),
            max_results: 3,
            max_searches: 10,
            timeout_secs: 30,
            recent_years: Some(10),
            require_abstract: true,
            api_key: None,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_authors: 3,
            min_abstract_chars: 100,
        }
    }
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: 30,
            delay_secs: 2,
            simulate_delay_secs: 1,
        }
    }
}

fn default_topics() -> Vec<TopicConfig> {
    [
        ("diabetes treatment", "دیابت"),
        ("hypertension", "قلب و عروق"),
        ("liver health", "کبد و گوارش"),
    ]
    .into_iter()
    .map(|(topic, category)| TopicConfig {
        topic: topic.to_string(),
        category: category.to_string(),
    })
    .collect()
}

impl AppConfig {
    /// Load configuration from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_yaml::from_str(&raw)?;
        info!(topics = config.topics.len(), "Loaded configuration");
        Ok(config)
    }

    /// Load from `path` if given, otherwise start from defaults, then apply
    /// command-line overrides.
    pub fn resolve(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    /// Overlay values given on the command line or through the environment.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(db) = &cli.database {
            self.database_path = db.clone();
        }
        if let Some(dir) = &cli.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(key) = &cli.ncbi_api_key {
            self.pubmed.api_key = Some(key.clone());
        }
        if let Some(url) = &cli.website_url {
            self.website.url = Some(url.clone());
        }
        if let Some(key) = &cli.website_api_key {
            self.website.api_key = Some(key.clone());
        }
    }

    /// Look up the category configured for a topic, falling back to a
    /// general category for ad-hoc topics.
    pub fn category_for(&self, topic: &str) -> String {
        self.topics
            .iter()
            .find(|t| t.topic.eq_ignore_ascii_case(topic))
            .map(|t| t.category.clone())
            .unwrap_or_else(|| GENERAL_CATEGORY.to_string())
    }
}

/// Category for topics passed on the command line without a configured entry.
pub const GENERAL_CATEGORY: &str = "سلامت عمومی";
