//! The local paper record reconciled from provider metadata.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PaperIdentifier;

/// Opaque store handle for a paper record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaperId(pub u64);

impl std::fmt::Display for PaperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A paper as held in the local store.
///
/// Provider clients each produce one of these from their own wire format;
/// the fallback chain then overlays fields from secondary providers before
/// the record is inserted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Display title (user supplied or provider supplied).
    pub title: String,

    /// Official title as reported by the metadata provider.
    pub paper_title: Option<String>,

    /// DOI, lowercase, unique across the store.
    pub doi: Option<String>,

    /// arXiv ID (bare, without the `arXiv:` prefix).
    pub arxiv_id: Option<String>,

    /// Abstract text.
    pub abstract_text: Option<String>,

    /// Publication date. Providers with year-only granularity fill in
    /// January 1st; the fallback chain overlays a full date when one is
    /// available from Crossref.
    pub publish_date: Option<NaiveDate>,

    /// Landing page URL.
    pub url: Option<String>,

    /// Direct PDF URL when one is known.
    pub pdf_url: Option<String>,

    /// Author names in provider order.
    pub raw_authors: Vec<String>,

    /// Whether this record was created from an external provider rather
    /// than a user upload.
    pub retrieved_from_external_source: bool,

    /// Which provider produced the record (`semantic_scholar`, `doi.org`,
    /// `crossref`, `arxiv`).
    pub external_source: Option<String>,

    /// Externally sourced records stay hidden until claimed.
    pub is_public: bool,

    /// The raw CSL item when CSL resolution was the source of truth.
    pub csl_item: Option<serde_json::Value>,
}

impl PaperRecord {
    /// Create an empty record with a title, visible by default.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), is_public: true, ..Self::default() }
    }

    /// Mark the record as externally sourced. Hidden until claimed.
    #[must_use]
    pub fn externally_sourced(mut self, source: &str) -> Self {
        self.retrieved_from_external_source = true;
        self.external_source = Some(source.to_string());
        self.is_public = false;
        self
    }

    /// The identifier used to seed provider lookups: DOI when present,
    /// otherwise the alternate arXiv ID.
    #[must_use]
    pub fn seed_identifier(&self) -> Option<PaperIdentifier> {
        if let Some(ref doi) = self.doi {
            return Some(PaperIdentifier::Doi(doi.clone()));
        }
        self.arxiv_id.as_ref().map(|id| PaperIdentifier::Arxiv(id.clone()))
    }

    /// All identifiers this record can be found under.
    #[must_use]
    pub fn identifiers(&self) -> Vec<PaperIdentifier> {
        let mut ids = Vec::new();
        if let Some(ref doi) = self.doi {
            ids.push(PaperIdentifier::Doi(doi.clone()));
        }
        if let Some(ref arxiv) = self.arxiv_id {
            ids.push(PaperIdentifier::Arxiv(arxiv.clone()));
        }
        ids
    }

    /// Set a lowercase DOI, ignoring empty input.
    pub fn set_doi(&mut self, doi: &str) {
        let doi = doi.trim();
        if !doi.is_empty() {
            self.doi = Some(doi.to_lowercase());
        }
    }
}
