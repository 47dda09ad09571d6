//! Construction of the `esearch` term.
//!
//! Every search is restricted to meta-analyses and systematic reviews. The
//! time window and abstract filters are optional.

use crate::config::PubmedConfig;

const PUBLICATION_TYPE_FILTER: &str = "(meta-analysis[pt] OR systematic review[pt])";

/// Filters applied on top of the topic string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Restrict to the last N years of publication dates.
    pub recent_years: Option<u32>,
    /// Only return records that have an abstract.
    pub require_abstract: bool,
}

impl From<&PubmedConfig> for SearchFilters {
    fn from(config: &PubmedConfig) -> Self {
        Self {
            recent_years: config.recent_years,
            require_abstract: config.require_abstract,
        }
    }
}

impl SearchFilters {
    /// Build the full search term for `topic`.
    pub fn term(&self, topic: &str) -> String {
        let mut term = format!("({}) AND {}", topic.trim(), PUBLICATION_TYPE_FILTER);
        if let Some(years) = self.recent_years.filter(|y| *y > 0) {
            term.push_str(&format!(" AND (\"last {years} years\"[dp])"));
        }
        if self.require_abstract {
            term.push_str(" AND hasabstract");
        }
        term
    }
}
