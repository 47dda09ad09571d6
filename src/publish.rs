//! Posting generated articles to a WordPress-style website.
//!
//! [`WebsitePoster`] sends each article to `{url}/wp-json/wp/v2/posts` with a
//! bearer token. When either the site URL or the API key is not configured,
//! posting is simulated: a warning is logged, the configured simulation delay
//! elapses, and the post counts as successful. This keeps `generate --publish`
//! usable on machines without site credentials.
//!
//! # Usage
//!
//! ```ignore
//! let poster = WebsitePoster::new(&config.website)?;
//! let outcomes = poster.post_articles(&articles).await;
//! ```

use crate::config::WebsiteConfig;
use crate::models::GeneratedArticle;
use crate::utils::truncate_for_log;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

pub const POSTS_PATH: &str = "wp-json/wp/v2/posts";
const BASE_TAGS: [&str; 2] = ["پزشکی", "سلامت"];

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid website URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// JSON body sent for each post.
#[derive(Debug, Serialize)]
struct PostPayload<'a> {
    title: &'a str,
    content: &'a str,
    category: &'a str,
    meta_description: String,
    tags: Vec<&'a str>,
    status: &'static str,
}

impl<'a> PostPayload<'a> {
    fn from_article(article: &'a GeneratedArticle) -> Self {
        let mut tags: Vec<&'a str> = BASE_TAGS.to_vec();
        tags.push(article.category.as_str());
        Self {
            title: &article.title,
            content: &article.content,
            category: &article.category,
            meta_description: format!("مقاله پزشکی درباره {}", article.title),
            tags,
            status: "publish",
        }
    }
}

/// Result of posting one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostOutcome {
    pub title: String,
    pub success: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
struct Target {
    endpoint: Url,
    api_key: String,
}

/// Website client; see the module docs for the simulation rule.
#[derive(Debug)]
pub struct WebsitePoster {
    http: reqwest::Client,
    target: Option<Target>,
    delay: Duration,
    simulate_delay: Duration,
}

impl WebsitePoster {
    /// Build a poster from website configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Site URL, API key, request timeout and the two delays.
    ///   A missing or blank URL or key makes the poster simulated.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the site URL
    /// does not parse.
    pub fn new(config: &WebsiteConfig) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let target = match (&config.url, &config.api_key) {
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                let base = Url::parse(&format!("{}/", url.trim().trim_end_matches('/')))?;
                Some(Target {
                    endpoint: base.join(POSTS_PATH)?,
                    api_key: key.clone(),
                })
            }
            _ => None,
        };
        Ok(Self {
            http,
            target,
            delay: Duration::from_secs(config.delay_secs),
            simulate_delay: Duration::from_secs(config.simulate_delay_secs),
        })
    }

    /// `true` when posts are only simulated.
    pub fn is_simulated(&self) -> bool {
        self.target.is_none()
    }

    async fn try_post(&self, target: &Target, article: &GeneratedArticle) -> Result<(), PublishError> {
        let response = self
            .http
            .post(target.endpoint.clone())
            .bearer_auth(&target.api_key)
            .json(&PostPayload::from_article(article))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::CREATED {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(PublishError::Status {
            status,
            body: truncate_for_log(&body, 300),
        })
    }

    /// Post one article.
    ///
    /// # Returns
    ///
    /// `true` on HTTP 201 or when simulated. Any other status and any
    /// transport error is logged and gives `false`.
    #[instrument(level = "info", skip_all, fields(title = %article.title))]
    pub async fn post_article(&self, article: &GeneratedArticle) -> bool {
        let Some(target) = &self.target else {
            warn!("Website credentials not configured; simulating post");
            sleep(self.simulate_delay).await;
            return true;
        };

        match self.try_post(target, article).await {
            Ok(()) => {
                info!("Article published");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to publish article");
                false
            }
        }
    }

    /// Post articles one at a time, pausing `delay_secs` between posts.
    ///
    /// # Returns
    ///
    /// One [`PostOutcome`] per article, in input order. Failures do not stop
    /// the remaining posts.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn post_articles(&self, articles: &[GeneratedArticle]) -> Vec<PostOutcome> {
        let mut outcomes = Vec::with_capacity(articles.len());
        for (i, article) in articles.iter().enumerate() {
            if i > 0 {
                sleep(self.delay).await;
            }
            info!(index = i + 1, total = articles.len(), "Posting article");
            let success = self.post_article(article).await;
            outcomes.push(PostOutcome {
                title: article.title.clone(),
                success,
                timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            });
        }
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        info!(succeeded, total = outcomes.len(), "Posting finished");
        outcomes
    }
}
