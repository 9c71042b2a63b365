//! Paper identifiers: DOIs and arXiv IDs.
//!
//! Every identifier entering the pipeline is normalized here so that
//! store lookups and provider requests agree on one canonical form.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix used for arXiv identifiers in provider requests and store keys.
pub const ARXIV_PREFIX: &str = "arXiv:";

static DOI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"10\.\d{4,9}/[-._;()/:a-zA-Z0-9]+").expect("valid DOI regex"));

// New-style (2301.07041, optional version) or old-style (math.AG/0601001) IDs.
static ARXIV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\d{4}\.\d{4,5}(?:v\d+)?|[a-z-]+(?:\.[A-Z]{2})?/\d{7})")
        .expect("valid arXiv regex")
});

/// A normalized scholarly paper identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PaperIdentifier {
    /// A DOI, stored lowercase without a resolver prefix.
    Doi(String),
    /// An arXiv ID without the `arXiv:` prefix.
    Arxiv(String),
}

impl PaperIdentifier {
    /// Normalize a DOI: strip resolver prefixes, lowercase.
    ///
    /// Returns `None` when the input does not contain a DOI.
    #[must_use]
    pub fn doi(raw: &str) -> Option<Self> {
        let trimmed = raw
            .trim()
            .trim_start_matches("https://doi.org/")
            .trim_start_matches("http://doi.org/")
            .trim_start_matches("doi:");
        DOI_RE.find(trimmed).map(|m| Self::Doi(m.as_str().to_lowercase()))
    }

    /// Normalize an arXiv ID: accept prefixed and bare forms.
    ///
    /// Returns `None` when the input does not contain an arXiv ID.
    #[must_use]
    pub fn arxiv(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let bare = trimmed
            .strip_prefix(ARXIV_PREFIX)
            .or_else(|| trimmed.strip_prefix("arxiv:"))
            .unwrap_or(trimmed);
        ARXIV_RE.find(bare).map(|m| Self::Arxiv(m.as_str().to_string()))
    }

    /// Parse an identifier of unknown kind, trying DOI first.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.starts_with(ARXIV_PREFIX) || trimmed.starts_with("arxiv:") {
            return Self::arxiv(trimmed);
        }
        Self::doi(trimmed).or_else(|| Self::arxiv(trimmed))
    }

    /// Find the first DOI in a block of free text (an HTML page, a URL,
    /// or the leading bytes of a PDF).
    #[must_use]
    pub fn find_doi_in_text(text: &str) -> Option<Self> {
        DOI_RE.find(text).map(|m| Self::Doi(m.as_str().trim_end_matches(['.', ';']).to_lowercase()))
    }

    /// The identifier in the form Semantic Scholar accepts as a paper ID:
    /// the bare DOI, or the arXiv ID with its prefix.
    #[must_use]
    pub fn as_provider_id(&self) -> String {
        match self {
            Self::Doi(doi) => doi.clone(),
            Self::Arxiv(id) => format!("{ARXIV_PREFIX}{id}"),
        }
    }

    /// True for DOI identifiers.
    #[must_use]
    pub const fn is_doi(&self) -> bool {
        matches!(self, Self::Doi(_))
    }

    /// The raw identifier value without any prefix.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Doi(doi) => doi,
            Self::Arxiv(id) => id,
        }
    }
}

impl fmt::Display for PaperIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Doi(doi) => write!(f, "{doi}"),
            Self::Arxiv(id) => write!(f, "{ARXIV_PREFIX}{id}"),
        }
    }
}
