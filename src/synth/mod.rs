//! Article synthesis from retrieved records.
//!
//! [`Synthesizer`] composes the four fixed sections from randomly chosen
//! templates (see [`templates`]) and appends a deterministic reference list.
//! The random source is a type parameter. Production code uses the
//! thread-local generator, and tests pass a seeded `StdRng` for reproducible
//! text.
//!
//! The percentages and odds ratios placed in the text are illustrative
//! placeholders drawn from fixed ranges. They are not derived from the records.

pub mod summary;
pub mod templates;

use crate::models::{ArticleRecord, GeneratedArticle, Section, SynthesizedArticle};
use crate::utils::{reading_time, word_count};
use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use std::fmt::Write;
use templates::Facts;
use tracing::{debug, instrument};

/// Illustrative percentage range (inclusive).
pub const PERCENT_RANGE: (u32, u32) = (15, 45);
/// Bounds for the illustrative odds-ratio interval.
pub const ODDS_RATIO_BOUNDS: (f64, f64) = (0.45, 1.25);

/// Randomized article composer.
#[derive(Debug)]
pub struct Synthesizer<R> {
    rng: R,
}

impl Synthesizer<ThreadRng> {
    /// Synthesizer backed by the unseeded thread-local generator.
    pub fn from_thread_rng() -> Self {
        Self::new(rand::rng())
    }
}

impl<R: Rng> Synthesizer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn pick(&mut self, pool: &[&'static str]) -> &'static str {
        pool.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn facts<'a>(&mut self, topic: &'a str, count: usize) -> Facts<'a> {
        let percent = self.rng.random_range(PERCENT_RANGE.0..=PERCENT_RANGE.1);
        let or_low = self.rng.random_range(ODDS_RATIO_BOUNDS.0..0.85);
        let or_high = (or_low + self.rng.random_range(0.10..0.40)).min(ODDS_RATIO_BOUNDS.1);
        Facts {
            topic,
            count,
            percent,
            or_low,
            or_high,
        }
    }

    fn section(&mut self, heading: &str, pools: &[&[&'static str]], facts: &Facts<'_>) -> Section {
        let body = pools
            .iter()
            .map(|pool| templates::fill(self.pick(pool), facts))
            .collect::<Vec<_>>()
            .join(" ");
        Section {
            heading: heading.to_string(),
            body,
        }
    }

    /// Compose an article about `topic` from `records`. Returns `None` when
    /// there is nothing to cite.
    #[instrument(level = "debug", skip(self, records), fields(count = records.len()))]
    pub fn synthesize(&mut self, topic: &str, records: &[ArticleRecord]) -> Option<SynthesizedArticle> {
        if records.is_empty() {
            return None;
        }
        let topic = topic.trim();
        let facts = self.facts(topic, records.len());

        let title = templates::fill(self.pick(templates::TITLES), &facts);
        let mut discussion = self.section(
            templates::DISCUSSION,
            &[templates::DISCUSSION_OPENERS, templates::DISCUSSION_LIMITS],
            &facts,
        );
        discussion.body.push(' ');
        discussion.body.push_str(templates::DISCUSSION_ADVICE);

        let sections = vec![
            self.section(
                templates::INTRODUCTION,
                &[templates::INTRO_OPENERS, templates::INTRO_CONTEXT],
                &facts,
            ),
            self.section(
                templates::METHODOLOGY,
                &[templates::METHOD_SEARCH, templates::METHOD_SELECTION],
                &facts,
            ),
            self.section(
                templates::RESULTS,
                &[templates::RESULT_EFFECT, templates::RESULT_ODDS],
                &facts,
            ),
            discussion,
        ];
        debug!(%title, "Synthesized article");

        Some(SynthesizedArticle {
            topic: topic.to_string(),
            title,
            sections,
            references: references(records),
            source_count: records.len(),
        })
    }
}

/// One line per record: `index. authors. title. journal. year. DOI: doi`.
pub fn references(records: &[ArticleRecord]) -> String {
    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{}. {}. {}. {}. {}. DOI: {}",
            i + 1,
            record.author_line(),
            record.title.trim_end_matches('.'),
            record.journal,
            record.year,
            record.doi
        );
    }
    out
}

/// Heuristic quality score in `1..=10` from source count and length.
pub fn quality_score(source_count: usize, word_count: usize) -> u8 {
    let mut score = 5 + source_count.min(3);
    if word_count >= 250 {
        score += 1;
    }
    if word_count >= 400 {
        score += 1;
    }
    score.clamp(1, 10) as u8
}

/// Shape a synthesized article for storage and publishing.
pub fn to_generated(article: &SynthesizedArticle, category: &str) -> GeneratedArticle {
    let content = article.render();
    let words = word_count(&content);
    GeneratedArticle {
        title: article.title.clone(),
        category: category.to_string(),
        topic: article.topic.clone(),
        word_count: words,
        reading_time: reading_time(words),
        quality_score: quality_score(article.source_count, words),
        source_count: article.source_count,
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NO_DOI, UNKNOWN};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn record(pmid: &str, authors: &[&str]) -> ArticleRecord {
        ArticleRecord {
            pmid: pmid.to_string(),
            title: format!("Meta-analysis {pmid}."),
            abstract_text: "x".repeat(150),
            authors: authors.iter().map(|a| a.to_string()).collect(),
            year: "2022".to_string(),
            journal: "BMJ".to_string(),
            doi: format!("10.1/{pmid}"),
        }
    }

    fn seeded(seed: u64) -> Synthesizer<StdRng> {
        Synthesizer::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_empty_records_yield_none() {
        assert!(seeded(1).synthesize("diabetes", &[]).is_none());
    }

    #[test]
    fn test_four_sections_in_fixed_order() {
        let article = seeded(1).synthesize("دیابت", &[record("1", &["Ada Lovelace"])]).unwrap();
        let headings: Vec<_> = article.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(
            headings,
            vec![
                templates::INTRODUCTION,
                templates::METHODOLOGY,
                templates::RESULTS,
                templates::DISCUSSION
            ]
        );
        for section in &article.sections {
            assert!(section.body.matches('.').count() >= 2, "{}", section.heading);
        }
        assert!(article.sections[0].body.contains("دیابت"));
        assert!(article.sections[3].body.ends_with(templates::DISCUSSION_ADVICE));
    }

    #[test]
    fn test_single_record_has_single_reference() {
        let article = seeded(9).synthesize("statins", &[record("42", &["A B", "C D"])]).unwrap();
        assert_eq!(article.references.lines().count(), 1);
        assert!(article.references.starts_with("1. "));
        assert_eq!(article.references, "1. A B, C D. Meta-analysis 42. BMJ. 2022. DOI: 10.1/42");
        assert_eq!(article.source_count, 1);
    }

    #[test]
    fn test_references_enumerate_in_input_order() {
        let mut missing = record("3", &[]);
        missing.doi = NO_DOI.to_string();
        let refs = references(&[record("1", &["X Y"]), record("2", &["Z W"]), missing]);
        let lines: Vec<_> = refs.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("1. X Y."));
        assert!(lines[1].starts_with("2. Z W."));
        assert!(lines[2].starts_with(&format!("3. {UNKNOWN}.")));
        assert!(lines[2].ends_with(&format!("DOI: {NO_DOI}")));
    }

    #[test]
    fn test_same_seed_same_text() {
        let records = [record("1", &["A B"]), record("2", &[])];
        let a = seeded(42).synthesize("hypertension", &records).unwrap();
        let b = seeded(42).synthesize("hypertension", &records).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_references_do_not_depend_on_seed() {
        let records = [record("1", &["A B"]), record("2", &[])];
        let a = seeded(1).synthesize("t", &records).unwrap();
        let b = seeded(2).synthesize("t", &records).unwrap();
        assert_eq!(a.references, b.references);
    }

    #[test]
    fn test_illustrative_numbers_stay_in_range() {
        for seed in 0..200 {
            let facts = seeded(seed).facts("t", 2);
            assert!((PERCENT_RANGE.0..=PERCENT_RANGE.1).contains(&facts.percent));
            assert!(facts.or_low >= ODDS_RATIO_BOUNDS.0);
            assert!(facts.or_high > facts.or_low);
            assert!(facts.or_high <= ODDS_RATIO_BOUNDS.1);
        }
    }

    #[test]
    fn test_quality_score_bounds() {
        assert_eq!(quality_score(0, 0), 5);
        assert_eq!(quality_score(1, 100), 6);
        assert_eq!(quality_score(3, 300), 9);
        assert_eq!(quality_score(10, 1000), 10);
    }

    #[test]
    fn test_to_generated_carries_metrics() {
        let article = seeded(3).synthesize("asthma", &[record("1", &["A B"])]).unwrap();
        let generated = to_generated(&article, "ریه");
        assert_eq!(generated.title, article.title);
        assert_eq!(generated.category, "ریه");
        assert_eq!(generated.topic, "asthma");
        assert_eq!(generated.content, article.render());
        assert_eq!(generated.word_count, word_count(&generated.content));
        assert!(generated.word_count > 50);
        assert!((1..=10).contains(&generated.quality_score));
        assert_eq!(generated.reading_time, reading_time(generated.word_count));
    }
}
