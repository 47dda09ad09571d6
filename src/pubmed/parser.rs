//! `efetch` XML → [`ArticleRecord`] extraction.
//!
//! Parsing is best-effort at two levels. A payload that is not well-formed
//! yields no records. Inside a well-formed payload each `PubmedArticle` is
//! extracted independently, and one unreadable record never hides its
//! siblings. Missing optional fields become the sentinels from
//! [`crate::models`].

use super::document::{Element, parse_document};
use crate::config::ParserConfig;
use crate::models::{ArticleRecord, NO_ABSTRACT, NO_DOI, NO_JOURNAL, NO_TITLE, UNKNOWN};
use once_cell::sync::Lazy;
use quick_xml::escape::EscapeError;
use regex::Regex;
use std::borrow::Cow;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

static DEFAULT_XMLNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s+xmlns\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("valid regex"));

/// Errors that cause a single record to be skipped.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record has no MedlineCitation")]
    MissingCitation,

    #[error("undecodable text: {0}")]
    Escape(#[from] EscapeError),
}

/// Remove default-namespace declarations (`xmlns="..."`). Prefixed
/// declarations are left alone; prefixes are dropped from names anyway.
pub fn strip_default_namespaces(xml: &str) -> Cow<'_, str> {
    DEFAULT_XMLNS.replace_all(xml, "")
}

/// Parser for `PubmedArticleSet` payloads.
#[derive(Debug, Clone)]
pub struct RecordParser {
    max_authors: usize,
    min_abstract_chars: usize,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl RecordParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            max_authors: config.max_authors,
            min_abstract_chars: config.min_abstract_chars,
        }
    }

    /// Parse a payload into records, dropping those whose abstract is shorter
    /// than the configured minimum. Never fails; problems are logged.
    #[instrument(level = "info", skip_all, fields(bytes = payload.len()))]
    pub fn parse(&self, payload: &str) -> Vec<ArticleRecord> {
        let cleaned = strip_default_namespaces(payload);
        let root = match parse_document(&cleaned) {
            Ok(root) => root,
            Err(e) => {
                error!(error = %e, "Could not parse PubMed XML payload");
                return Vec::new();
            }
        };

        let articles = if root.name() == "PubmedArticle" {
            vec![&root]
        } else {
            root.find_all("PubmedArticle")
        };

        let mut records = Vec::with_capacity(articles.len());
        for (index, article) in articles.into_iter().enumerate() {
            match self.extract(article) {
                Ok(record) if record.abstract_len() < self.min_abstract_chars => {
                    debug!(
                        index,
                        pmid = %record.pmid,
                        chars = record.abstract_len(),
                        "Dropping record with short abstract"
                    );
                }
                Ok(record) => records.push(record),
                Err(e) => warn!(index, error = %e, "Skipping unreadable record"),
            }
        }

        info!(count = records.len(), "Parsed PubMed records");
        records
    }

    /// Extract one record from a `PubmedArticle` element.
    pub fn extract(&self, article: &Element) -> Result<ArticleRecord, RecordError> {
        let citation = article
            .find("MedlineCitation")
            .ok_or(RecordError::MissingCitation)?;

        let pmid = text_or(citation.child("PMID"), UNKNOWN)?;
        let title = text_or(citation.find("ArticleTitle"), NO_TITLE)?;
        let abstract_text = self.abstract_text(citation)?;
        let authors = self.authors(citation)?;
        let year = publication_year(citation)?;
        let journal = match citation.find("Journal") {
            Some(journal) => match non_empty_text(journal.child("Title"))? {
                Some(title) => title,
                None => text_or(journal.child("ISOAbbreviation"), NO_JOURNAL)?,
            },
            None => NO_JOURNAL.to_string(),
        };
        let doi = doi(article, citation)?;

        Ok(ArticleRecord {
            pmid,
            title,
            abstract_text,
            authors,
            year,
            journal,
            doi,
        })
    }

    fn abstract_text(&self, citation: &Element) -> Result<String, RecordError> {
        let Some(section) = citation.find("Abstract") else {
            return Ok(NO_ABSTRACT.to_string());
        };

        let mut fragments = Vec::new();
        for fragment in section.find_all("AbstractText") {
            let text = fragment.text()?;
            if text.is_empty() {
                continue;
            }
            match fragment.attr("Label").transpose()? {
                Some(label) if !label.trim().is_empty() => {
                    fragments.push(format!("{}: {}", label.trim(), text));
                }
                _ => fragments.push(text),
            }
        }

        let joined = fragments.join(" ");
        let joined = joined.trim();
        Ok(if joined.is_empty() {
            NO_ABSTRACT.to_string()
        } else {
            joined.to_string()
        })
    }

    fn authors(&self, citation: &Element) -> Result<Vec<String>, RecordError> {
        let Some(list) = citation.find("AuthorList") else {
            return Ok(Vec::new());
        };

        let mut authors = Vec::new();
        for author in list.elements().filter(|e| e.name() == "Author") {
            if authors.len() == self.max_authors {
                break;
            }
            let fore = non_empty_text(author.child("ForeName"))?;
            let last = non_empty_text(author.child("LastName"))?;
            if let (Some(fore), Some(last)) = (fore, last) {
                authors.push(format!("{fore} {last}"));
            }
        }
        Ok(authors)
    }
}

fn non_empty_text(element: Option<&Element>) -> Result<Option<String>, RecordError> {
    match element {
        Some(e) => {
            let text = e.text()?;
            Ok((!text.is_empty()).then_some(text))
        }
        None => Ok(None),
    }
}

fn text_or(element: Option<&Element>, fallback: &str) -> Result<String, RecordError> {
    Ok(non_empty_text(element)?.unwrap_or_else(|| fallback.to_string()))
}

/// `PubDate/Year`, else the first four characters of `PubDate/MedlineDate`.
fn publication_year(citation: &Element) -> Result<String, RecordError> {
    let Some(pub_date) = citation.find("PubDate") else {
        return Ok(UNKNOWN.to_string());
    };
    if let Some(year) = non_empty_text(pub_date.child("Year"))? {
        return Ok(year);
    }
    if let Some(medline) = non_empty_text(pub_date.child("MedlineDate"))? {
        return Ok(medline.chars().take(4).collect());
    }
    Ok(UNKNOWN.to_string())
}

/// DOI from the record's own `ArticleIdList`, falling back to an
/// `ELocationID` of type doi. Reference lists are not consulted.
fn doi(article: &Element, citation: &Element) -> Result<String, RecordError> {
    if let Some(ids) = article.path("PubmedData/ArticleIdList") {
        for id in ids.elements().filter(|e| e.name() == "ArticleId") {
            if id.attr("IdType").transpose()?.as_deref() == Some("doi") {
                if let Some(doi) = non_empty_text(Some(id))? {
                    return Ok(doi);
                }
            }
        }
    }
    for location in citation.find_all("ELocationID") {
        if location.attr("EIdType").transpose()?.as_deref() == Some("doi") {
            if let Some(doi) = non_empty_text(Some(location))? {
                return Ok(doi);
            }
        }
    }
    Ok(NO_DOI.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_ABSTRACT: &str = "Statins reduced major cardiovascular events across twenty randomized \
        trials with consistent effects in primary and secondary prevention cohorts.";

    fn article(pmid: &str, title: &str, abstract_xml: &str, authors_xml: &str) -> String {
        format!(
            r#"<PubmedArticle>
  <MedlineCitation Status="MEDLINE" Owner="NLM">
    <PMID Version="1">{pmid}</PMID>
    <Article PubModel="Print">
      <Journal>
        <JournalIssue CitedMedium="Internet">
          <PubDate><Year>2021</Year><Month>Mar</Month></PubDate>
        </JournalIssue>
        <Title>The Lancet</Title>
        <ISOAbbreviation>Lancet</ISOAbbreviation>
      </Journal>
      <ArticleTitle>{title}</ArticleTitle>
      {abstract_xml}
      <AuthorList CompleteYN="Y">{authors_xml}</AuthorList>
    </Article>
  </MedlineCitation>
  <PubmedData>
    <ArticleIdList>
      <ArticleId IdType="pubmed">{pmid}</ArticleId>
      <ArticleId IdType="doi">10.1000/{pmid}</ArticleId>
    </ArticleIdList>
  </PubmedData>
</PubmedArticle>"#
        )
    }

    fn author(fore: &str, last: &str) -> String {
        format!("<Author ValidYN=\"Y\"><LastName>{last}</LastName><ForeName>{fore}</ForeName></Author>")
    }

    fn set(articles: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\" ?>\n<!DOCTYPE PubmedArticleSet PUBLIC \"-//NLM//DTD PubMedArticle, 1st January 2024//EN\" \"https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_240101.dtd\">\n<PubmedArticleSet>{}</PubmedArticleSet>",
            articles.join("\n")
        )
    }

    fn simple_abstract(text: &str) -> String {
        format!("<Abstract><AbstractText>{text}</AbstractText></Abstract>")
    }

    #[test]
    fn test_parse_full_record() {
        let xml = set(&[article(
            "111",
            "Statins and outcomes",
            &simple_abstract(LONG_ABSTRACT),
            &author("Ada", "Lovelace"),
        )]);
        let records = RecordParser::default().parse(&xml);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.pmid, "111");
        assert_eq!(r.title, "Statins and outcomes");
        assert_eq!(r.abstract_text, LONG_ABSTRACT.split_whitespace().collect::<Vec<_>>().join(" "));
        assert_eq!(r.authors, vec!["Ada Lovelace"]);
        assert_eq!(r.year, "2021");
        assert_eq!(r.journal, "The Lancet");
        assert_eq!(r.doi, "10.1000/111");
    }

    #[test]
    fn test_labeled_fragments_join_in_order() {
        let abstract_xml = format!(
            "<Abstract>\
               <AbstractText Label=\"BACKGROUND\" NlmCategory=\"BACKGROUND\">Hypertension is common.</AbstractText>\
               <AbstractText Label=\"METHODS\">We pooled {n} trials.</AbstractText>\
               <AbstractText>{long}</AbstractText>\
             </Abstract>",
            n = 12,
            long = LONG_ABSTRACT
        );
        let xml = set(&[article("1", "T", &abstract_xml, "")]);
        let records = RecordParser::default().parse(&xml);

        assert_eq!(records.len(), 1);
        let text = &records[0].abstract_text;
        assert!(text.starts_with("BACKGROUND: Hypertension is common. METHODS: We pooled 12 trials. Statins"));
    }

    #[test]
    fn test_authors_are_capped() {
        let authors: String = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|n| author(n, "Smith"))
            .collect();
        let xml = set(&[article("1", "T", &simple_abstract(LONG_ABSTRACT), &authors)]);

        let records = RecordParser::default().parse(&xml);
        assert_eq!(records[0].authors, vec!["A Smith", "B Smith", "C Smith"]);

        let wide = RecordParser::new(&ParserConfig {
            max_authors: 5,
            ..ParserConfig::default()
        });
        assert_eq!(wide.parse(&xml)[0].authors.len(), 5);
    }

    #[test]
    fn test_authors_without_both_names_are_skipped() {
        let authors = format!(
            "<Author><CollectiveName>GBD Collaborators</CollectiveName></Author>\
             <Author><LastName>Solo</LastName></Author>{}",
            author("Grace", "Hopper")
        );
        let xml = set(&[article("1", "T", &simple_abstract(LONG_ABSTRACT), &authors)]);
        assert_eq!(RecordParser::default().parse(&xml)[0].authors, vec!["Grace Hopper"]);
    }

    #[test]
    fn test_missing_abstract_is_sentinel_and_filtered() {
        let xml = set(&[
            article("1", "A", "", &author("A", "B")),
            article("2", "B", "<Abstract></Abstract>", ""),
        ]);
        assert!(RecordParser::default().parse(&xml).is_empty());

        let lenient = RecordParser::new(&ParserConfig {
            min_abstract_chars: 0,
            ..ParserConfig::default()
        });
        let records = lenient.parse(&xml);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.abstract_text == NO_ABSTRACT));
        assert!(NO_ABSTRACT.chars().count() < ParserConfig::default().min_abstract_chars);
    }

    #[test]
    fn test_short_abstract_is_dropped() {
        let long = "x".repeat(150);
        let short = "y".repeat(40);
        let xml = set(&[
            article("1", "Long", &simple_abstract(&long), ""),
            article("2", "Short", &simple_abstract(&short), ""),
        ]);
        let records = RecordParser::default().parse(&xml);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Long");
    }

    #[test]
    fn test_missing_fields_use_sentinels() {
        let xml = format!(
            "<PubmedArticleSet><PubmedArticle><MedlineCitation><Article>{}</Article></MedlineCitation></PubmedArticle></PubmedArticleSet>",
            simple_abstract(LONG_ABSTRACT)
        );
        let records = RecordParser::default().parse(&xml);
        let r = &records[0];
        assert_eq!(r.pmid, UNKNOWN);
        assert_eq!(r.title, NO_TITLE);
        assert_eq!(r.year, UNKNOWN);
        assert_eq!(r.journal, NO_JOURNAL);
        assert_eq!(r.doi, NO_DOI);
        assert!(r.authors.is_empty());
    }

    #[test]
    fn test_medline_date_and_elocation_fallbacks() {
        let xml = format!(
            "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>9</PMID><Article>\
               <Journal><JournalIssue><PubDate><MedlineDate>2019 Nov-Dec</MedlineDate></PubDate></JournalIssue>\
               <ISOAbbreviation>BMJ</ISOAbbreviation></Journal>\
               <ArticleTitle>T</ArticleTitle>\
               <ELocationID EIdType=\"pii\">e1</ELocationID>\
               <ELocationID EIdType=\"doi\" ValidYN=\"Y\">10.1136/bmj.9</ELocationID>{}\
             </Article></MedlineCitation></PubmedArticle></PubmedArticleSet>",
            simple_abstract(LONG_ABSTRACT)
        );
        let r = &RecordParser::default().parse(&xml)[0];
        assert_eq!(r.year, "2019");
        assert_eq!(r.journal, "BMJ");
        assert_eq!(r.doi, "10.1136/bmj.9");
    }

    #[test]
    fn test_reference_list_dois_are_ignored() {
        let xml = format!(
            "<PubmedArticleSet><PubmedArticle><MedlineCitation><Article><ArticleTitle>T</ArticleTitle>{}</Article></MedlineCitation>\
             <PubmedData><ReferenceList><Reference><ArticleIdList><ArticleId IdType=\"doi\">10.9/ref</ArticleId></ArticleIdList></Reference></ReferenceList></PubmedData>\
             </PubmedArticle></PubmedArticleSet>",
            simple_abstract(LONG_ABSTRACT)
        );
        assert_eq!(RecordParser::default().parse(&xml)[0].doi, NO_DOI);
    }

    #[test]
    fn test_default_namespace_is_stripped() {
        let xml = set(&[article("5", "T", &simple_abstract(LONG_ABSTRACT), "")])
            .replace("<PubmedArticleSet>", "<PubmedArticleSet xmlns=\"http://www.ncbi.nlm.nih.gov\">");
        assert!(strip_default_namespaces(&xml).find("xmlns").is_none());
        assert_eq!(RecordParser::default().parse(&xml).len(), 1);
    }

    #[test]
    fn test_namespace_pattern_handles_both_quote_styles() {
        Lazy::force(&DEFAULT_XMLNS);
        assert_eq!(
            strip_default_namespaces("<a xmlns='urn:x'><b xmlns = \"urn:y\"/></a>"),
            "<a><b/></a>"
        );
        assert_eq!(
            strip_default_namespaces("<a xmlns:m=\"urn:m\"/>"),
            "<a xmlns:m=\"urn:m\"/>"
        );
        assert!(matches!(strip_default_namespaces("<a/>"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_bad_record_does_not_hide_siblings() {
        let xml = set(&[
            article("1", "Broken &undefined; title", &simple_abstract(LONG_ABSTRACT), ""),
            "<PubmedArticle><PubmedData/></PubmedArticle>".to_string(),
            article("3", "Good", &simple_abstract(LONG_ABSTRACT), ""),
        ]);
        let records = RecordParser::default().parse(&xml);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pmid, "3");
    }

    #[test]
    fn test_malformed_payload_yields_nothing() {
        let xml = set(&[article("1", "T", &simple_abstract(LONG_ABSTRACT), "")]);
        let truncated = &xml[..xml.len() - "</PubmedArticleSet>".len()];
        assert!(RecordParser::default().parse(truncated).is_empty());
        assert!(RecordParser::default().parse("<PubmedArticleSet><PubmedArticle>").is_empty());
        assert!(RecordParser::default().parse("not xml at all").is_empty());
    }

    #[test]
    fn test_parsing_is_deterministic() {
        let authors: String = ["A", "B", "C", "D"].iter().map(|n| author(n, "Doe")).collect();
        let xml = set(&[
            article("1", "One", &simple_abstract(LONG_ABSTRACT), &authors),
            article("2", "Two", &simple_abstract(LONG_ABSTRACT), ""),
        ]);
        let parser = RecordParser::default();
        assert_eq!(parser.parse(&xml), parser.parse(&xml));
    }

    #[test]
    fn test_single_article_root() {
        let xml = article("7", "Root", &simple_abstract(LONG_ABSTRACT), "");
        assert_eq!(RecordParser::default().parse(&xml).len(), 1);
    }
}
