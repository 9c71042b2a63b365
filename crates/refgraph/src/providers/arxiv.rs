//! arXiv Atom export API client.
//!
//! Used for reference entries that carry an arXiv ID but no DOI. The API
//! answers with an Atom feed; an unknown ID still yields a 200 with an
//! empty feed, which is surfaced as a not-found error.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::models::PaperRecord;

use super::source;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v\d+$").expect("valid version regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// arXiv Atom API client.
#[derive(Clone)]
pub struct ArxivClient {
    client: reqwest_middleware::ClientWithMiddleware,
    api_url: String,
}

impl ArxivClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            client: super::build_http_client(config, reqwest::header::HeaderMap::new())?,
            api_url: config.arxiv_api_url.clone(),
        })
    }

    /// Fetch metadata for one arXiv ID (bare form, new or old style).
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, unparseable feeds, or unknown IDs.
    pub async fn get_entry(&self, arxiv_id: &str) -> ClientResult<ArxivEntry> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("id_list", arxiv_id), ("max_results", "1")])
            .send()
            .await?;
        let response = super::handle_response(response).await?;

        let body = response.text().await?;
        let feed: Feed = quick_xml::de::from_str(&body)?;

        feed.entries
            .into_iter()
            .find(|e| !e.title.trim().is_empty())
            .ok_or_else(|| ClientError::not_found(format!("arXiv:{arxiv_id}")))
    }
}

impl std::fmt::Debug for ArxivClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArxivClient").field("api_url", &self.api_url).finish()
    }
}

/// The Atom feed wrapper.
#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<ArxivEntry>,
}

/// One paper entry from the arXiv feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ArxivEntry {
    /// Abstract page URL, e.g. `http://arxiv.org/abs/2301.07041v1`.
    #[serde(rename = "id")]
    pub arxiv_url: String,

    /// Title, with feed line wrapping intact.
    pub title: String,

    /// Abstract, with feed line wrapping intact.
    pub summary: String,

    /// Publication date of the first version.
    pub published: DateTime<Utc>,

    /// Author list.
    #[serde(rename = "author", default)]
    pub authors: Vec<ArxivAuthor>,

    /// Subject categories, e.g. `cs.DC`.
    #[serde(rename = "category", default)]
    pub categories: Vec<ArxivCategory>,
}

/// An author entry in the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ArxivAuthor {
    /// Author's full name.
    pub name: String,
}

/// A category element; the subject lives in the `term` attribute.
#[derive(Debug, Clone, Deserialize)]
pub struct ArxivCategory {
    /// Subject class, e.g. `math.AG`.
    #[serde(rename = "@term")]
    pub term: String,
}

impl ArxivEntry {
    /// The bare arXiv ID, version suffix stripped.
    #[must_use]
    pub fn arxiv_id(&self) -> String {
        let id = self.arxiv_url.rsplit_once("/abs/").map_or(self.arxiv_url.as_str(), |(_, id)| id);
        VERSION_RE.replace(id, "").to_string()
    }

    /// Categories normalized to lowercase, used as hub candidates.
    #[must_use]
    pub fn hub_candidates(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.term.to_lowercase()).collect()
    }

    /// Build a local record from this entry.
    #[must_use]
    pub fn into_record(self) -> PaperRecord {
        let title = collapse_whitespace(&self.title);

        let mut record = PaperRecord::new(title.clone()).externally_sourced(source::ARXIV);
        record.paper_title = Some(title);
        record.arxiv_id = Some(self.arxiv_id());
        record.abstract_text = Some(collapse_whitespace(&self.summary));
        record.publish_date = Some(self.published.date_naive());
        record.url = Some(self.arxiv_url.clone());
        record.pdf_url = Some(self.arxiv_url.replace("/abs/", "/pdf/"));
        record.raw_authors = self.authors.iter().map(|a| a.name.clone()).collect();
        record
    }
}

/// Collapse feed line wrapping into single spaces.
fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").to_string()
}
