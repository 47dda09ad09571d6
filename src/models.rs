//! Data models for retrieved evidence and the articles composed from it.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticleRecord`]: One PubMed record as extracted by the parser
//! - [`SynthesizedArticle`]: Sectioned narrative composed from a set of records
//! - [`GeneratedArticle`]: The storage/publishing shape of a finished article
//! - [`ArticleBatch`]: The JSON artifact written once per run
//!
//! Missing upstream fields are represented by the named sentinel constants
//! below rather than by empty strings, so filtering stays well-defined.

use serde::{Deserialize, Serialize};

/// Title used when a record carries no `ArticleTitle`.
pub const NO_TITLE: &str = "بدون عنوان";
/// Abstract used when a record carries no `AbstractText`.
pub const NO_ABSTRACT: &str = "چکیده موجود نیست";
/// Generic "unknown" value for year, PMID and author lists.
pub const UNKNOWN: &str = "نامشخص";
/// Journal used when the record names none.
pub const NO_JOURNAL: &str = "مجله نامشخص";
/// DOI used when the record has no DOI identifier.
pub const NO_DOI: &str = "ندارد";

/// A single article record extracted from an `efetch` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// PubMed identifier, or [`UNKNOWN`].
    pub pmid: String,
    /// Article title, or [`NO_TITLE`].
    pub title: String,
    /// Space-joined abstract fragments, or [`NO_ABSTRACT`].
    pub abstract_text: String,
    /// Display names in "Given Family" form, capped by the parser.
    pub authors: Vec<String>,
    /// Four-character year, or [`UNKNOWN`].
    pub year: String,
    /// Journal title, or [`NO_JOURNAL`].
    pub journal: String,
    /// DOI, or [`NO_DOI`].
    pub doi: String,
}

impl ArticleRecord {
    /// Authors joined for display, or [`UNKNOWN`] when the list is empty.
    pub fn author_line(&self) -> String {
        if self.authors.is_empty() {
            UNKNOWN.to_string()
        } else {
            self.authors.join(", ")
        }
    }

    /// Length of the abstract in characters (not bytes).
    pub fn abstract_len(&self) -> usize {
        self.abstract_text.chars().count()
    }
}

/// One headed section of a synthesized article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: String,
}

/// A narrative article composed from one or more [`ArticleRecord`]s.
///
/// Sections always appear in the fixed order introduction, methodology,
/// results, discussion. `references` holds one enumerated line per source
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedArticle {
    pub topic: String,
    pub title: String,
    pub sections: Vec<Section>,
    pub references: String,
    pub source_count: usize,
}

/// Heading placed above the references block in rendered output.
pub const REFERENCES_HEADING: &str = "منابع";

impl SynthesizedArticle {
    /// Render the article as a Markdown document.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str("## ");
            out.push_str(&section.heading);
            out.push_str("\n\n");
            out.push_str(&section.body);
            out.push_str("\n\n");
        }
        out.push_str("## ");
        out.push_str(REFERENCES_HEADING);
        out.push_str("\n\n");
        out.push_str(&self.references);
        out.push('\n');
        out
    }
}

/// A finished article in the shape expected by storage and the website poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub content: String,
    pub category: String,
    pub topic: String,
    pub word_count: usize,
    /// Human-readable reading time, e.g. "3 دقیقه".
    pub reading_time: String,
    /// Heuristic score in `1..=10`.
    pub quality_score: u8,
    pub source_count: usize,
}

/// Summary block written at the top of each batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMeta {
    pub total_articles: usize,
    pub total_words: usize,
    pub average_quality: f64,
    pub topics: Vec<String>,
    pub generated_at: String,
}

/// All articles produced by one `generate` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleBatch {
    pub meta: BatchMeta,
    pub articles: Vec<GeneratedArticle>,
}

impl ArticleBatch {
    /// Build a batch and compute its aggregate metadata.
    pub fn new(articles: Vec<GeneratedArticle>, generated_at: String) -> Self {
        let total_words = articles.iter().map(|a| a.word_count).sum();
        let average_quality = if articles.is_empty() {
            0.0
        } else {
            articles.iter().map(|a| a.quality_score as f64).sum::<f64>() / articles.len() as f64
        };
        let topics = articles.iter().map(|a| a.topic.clone()).collect();
        Self {
            meta: BatchMeta {
                total_articles: articles.len(),
                total_words,
                average_quality,
                topics,
                generated_at,
            },
            articles,
        }
    }
}
