//! # Medical Digest
//!
//! Turns PubMed meta-analyses into short Persian-language health articles,
//! keeps them in a local SQLite database, and optionally posts them to a
//! website.
//!
//! ## Features
//!
//! - Searches PubMed for meta-analyses and systematic reviews on each topic
//! - Fetches and parses the PubMed XML records into structured summaries
//! - Composes four-section articles with an enumerated reference list
//! - Writes a JSON batch per run, an HTML dashboard and weekly reports
//! - Posts articles to a WordPress-compatible API (simulated without credentials)
//!
//! ## Usage
//!
//! ```sh
//! medical_digest generate --publish
//! medical_digest search "diabetes treatment"
//! ```
//!
//! ## Architecture
//!
//! `generate` runs a sequential pipeline:
//! 1. **Retrieval**: search → fetch → parse for each topic ([`pubmed`])
//! 2. **Synthesis**: compose one article per topic with results ([`synth`])
//! 3. **Output**: JSON batch file and database rows ([`outputs`], [`storage`])
//! 4. **Publishing**: optional website posts ([`publish`])
//! 5. **Reporting**: daily stats row and dashboard refresh

use chrono::Local;
use clap::Parser;
use futures::future;
use futures::stream::{self, StreamExt};
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod models;
mod outputs;
mod publish;
mod pubmed;
mod storage;
mod synth;
mod utils;

use cli::{Cli, Command};
use config::AppConfig;
use models::{ArticleBatch, GeneratedArticle};
use outputs::{dashboard, json, report};
use publish::WebsitePoster;
use pubmed::client::PubmedClient;
use pubmed::parser::RecordParser;
use storage::MedicalDatabase;
use synth::Synthesizer;
use utils::{ensure_writable_dir, local_now};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "medical_digest starting up");

    let args = Cli::parse();
    debug!(command = ?args.command, "Parsed CLI arguments");

    let config = AppConfig::resolve(&args).inspect_err(|e| {
        error!(error = %e, "Failed to load configuration");
    })?;

    match args.command() {
        Command::Generate {
            topics,
            publish,
            no_dashboard,
        } => generate(&config, &topics, publish, !no_dashboard).await?,
        Command::Search { topic } => search(&config, &topic).await?,
        Command::Dashboard { output } => {
            let db = MedicalDatabase::open(&config.database_path).await?;
            let path = output.as_deref().unwrap_or(config.dashboard_path.as_path());
            dashboard::write_dashboard(&db, path, local_now()).await?;
        }
        Command::Report => {
            let db = MedicalDatabase::open(&config.database_path).await?;
            if report::generate_weekly_report(&db, &config.output_dir, local_now())
                .await
                .is_none()
            {
                warn!("No weekly report produced");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Topics and categories for this run: command-line topics override the
/// configured list.
fn run_topics(config: &AppConfig, overrides: &[String]) -> Vec<(String, String)> {
    if overrides.is_empty() {
        config
            .topics
            .iter()
            .map(|t| (t.topic.clone(), t.category.clone()))
            .collect()
    } else {
        overrides
            .iter()
            .map(|topic| (topic.clone(), config.category_for(topic)))
            .collect()
    }
}

/// Retrieve and synthesize one article per topic. Topics without usable
/// records are skipped.
async fn compose_articles(
    client: &PubmedClient,
    parser: &RecordParser,
    topics: &[(String, String)],
) -> Vec<GeneratedArticle> {
    let mut synthesizer = Synthesizer::from_thread_rng();

    // Topics run strictly one after another; no buffering.
    stream::iter(topics.iter().enumerate())
        .then(|(i, (topic, category))| async move {
            info!(index = i + 1, total = topics.len(), %topic, "Processing topic");
            let records = pubmed::retrieve(client, parser, topic).await;
            (topic, category, records)
        })
        .filter_map(|(topic, category, records)| {
            let generated = match synthesizer.synthesize(topic, &records) {
                Some(article) => {
                    let generated = synth::to_generated(&article, category);
                    info!(
                        title = %generated.title,
                        words = generated.word_count,
                        quality = generated.quality_score,
                        "Article composed"
                    );
                    Some(generated)
                }
                None => {
                    warn!(%topic, "No usable records; skipping topic");
                    None
                }
            };
            future::ready(generated)
        })
        .collect()
        .await
}

#[instrument(level = "info", skip(config, topic_overrides))]
async fn generate(
    config: &AppConfig,
    topic_overrides: &[String],
    publish: bool,
    render_dashboard: bool,
) -> Result<(), Box<dyn Error>> {
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let db = MedicalDatabase::open(&config.database_path).await?;
    let client = PubmedClient::new(&config.pubmed)?;
    let parser = RecordParser::new(&config.parser);

    let topics = run_topics(config, topic_overrides);
    let articles = compose_articles(&client, &parser, &topics).await;
    info!(
        composed = articles.len(),
        topics = topics.len(),
        searches = client.searches_issued(),
        "Finished composing"
    );

    if articles.is_empty() {
        warn!("No articles generated; nothing written");
        return Ok(());
    }

    let now = Local::now();
    let batch = ArticleBatch::new(articles, now.format("%Y-%m-%dT%H:%M:%S").to_string());
    if let Err(e) = json::write_batch(&batch, &config.output_dir, now.naive_local()).await {
        error!(error = %e, "Failed to write article batch");
    }

    let ids = db.save_articles(&batch.articles, now.naive_local()).await?;

    if publish {
        let poster = WebsitePoster::new(&config.website)?;
        publish_articles(&db, &poster, &batch.articles, &ids).await;
    }

    db.record_daily_stats(now.date_naive()).await?;

    if render_dashboard {
        refresh_dashboard(&db, &config.dashboard_path).await;
    }
    Ok(())
}

/// Post the saved articles and flag each successfully posted row.
///
/// `ids` are the row ids returned by `save_articles`, in article order.
/// Simulated posts never touch the database.
async fn publish_articles(
    db: &MedicalDatabase,
    poster: &WebsitePoster,
    articles: &[GeneratedArticle],
    ids: &[i64],
) -> usize {
    let outcomes = poster.post_articles(articles).await;
    if poster.is_simulated() {
        warn!("WEBSITE_URL or WEBSITE_API_KEY missing; posts were simulated and nothing is marked published");
        return 0;
    }

    let mut marked = 0;
    for (id, outcome) in ids.iter().zip(outcomes) {
        if !outcome.success {
            continue;
        }
        match db.mark_published(*id).await {
            Ok(true) => marked += 1,
            Ok(false) => warn!(id, title = %outcome.title, "Published article row not found"),
            Err(e) => error!(id, title = %outcome.title, error = %e, "Failed to mark article as published"),
        }
    }
    marked
}

async fn refresh_dashboard(db: &MedicalDatabase, path: &Path) {
    if let Err(e) = dashboard::write_dashboard(db, path, local_now()).await {
        error!(path = %path.display(), error = %e, "Failed to write dashboard");
    }
}

#[instrument(level = "info", skip(config))]
async fn search(config: &AppConfig, topic: &str) -> Result<(), Box<dyn Error>> {
    let client = PubmedClient::new(&config.pubmed)?;
    let parser = RecordParser::new(&config.parser);
    let records = pubmed::retrieve(&client, &parser, topic).await;

    match synth::summary::summarize(topic, &records) {
        Some(summary) => println!("{summary}"),
        None => println!("هیچ مطالعه‌ای درباره «{}» یافت نشد.", topic.trim()),
    }
    Ok(())
}
