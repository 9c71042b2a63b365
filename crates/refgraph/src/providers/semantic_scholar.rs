//! Semantic Scholar Graph API client.
//!
//! Primary metadata provider: the most complete records and the only one
//! that serves reference and citation lists. Responses are cached with a
//! short TTL and requests are spaced by the configured rate-limit delay.

use chrono::NaiveDate;
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::config::{Config, fields};
use crate::error::{ClientError, ClientResult};
use crate::models::{PaperIdentifier, PaperRecord, RawReference};

use super::source;

/// Page size for reference/citation requests.
const REFERENCE_PAGE_LIMIT: i32 = 500;

/// Cap on entries fetched per direction. Reference lists beyond this are
/// truncated rather than paged forever.
const MAX_REFERENCE_ENTRIES: usize = 2000;

/// Semantic Scholar API client.
#[derive(Clone)]
pub struct SemanticScholarClient {
    /// HTTP client with middleware.
    client: reqwest_middleware::ClientWithMiddleware,

    /// Response cache.
    cache: Cache<String, serde_json::Value>,

    /// API key (optional).
    api_key: Option<String>,

    /// Graph API base URL.
    graph_api_url: String,

    /// Rate limit delay.
    rate_limit_delay: std::time::Duration,
}

impl SemanticScholarClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            "application/json".parse().expect("valid content-type header"),
        );

        if let Some(ref key) = config.api_key {
            headers.insert("x-api-key", key.parse()?);
        }

        let client = super::build_http_client(config, headers)?;

        let cache = Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            client,
            cache,
            api_key: config.api_key.clone(),
            graph_api_url: config.graph_api_url.clone(),
            rate_limit_delay: config.rate_limit_delay,
        })
    }

    /// Check if an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Get a single paper by DOI or prefixed arXiv ID.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn get_paper(&self, id: &PaperIdentifier) -> ClientResult<S2Paper> {
        let url = format!("{}/paper/{}", self.graph_api_url, id.as_provider_id());
        let params = vec![("fields".to_string(), fields::RECORD.join(","))];

        self.get(&url, &params).await
    }

    /// Get one page of papers cited by `id` (forward references).
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn get_references(
        &self,
        id: &PaperIdentifier,
        offset: i32,
        limit: i32,
    ) -> ClientResult<S2CitationResult> {
        let url = format!("{}/paper/{}/references", self.graph_api_url, id.as_provider_id());

        let params = vec![
            ("offset".to_string(), offset.to_string()),
            ("limit".to_string(), limit.to_string()),
            (
                "fields".to_string(),
                format!("citedPaper.{}", fields::REFERENCE.join(",citedPaper.")),
            ),
        ];

        self.get(&url, &params).await
    }

    /// Get one page of papers citing `id` (backward references).
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn get_citations(
        &self,
        id: &PaperIdentifier,
        offset: i32,
        limit: i32,
    ) -> ClientResult<S2CitationResult> {
        let url = format!("{}/paper/{}/citations", self.graph_api_url, id.as_provider_id());

        let params = vec![
            ("offset".to_string(), offset.to_string()),
            ("limit".to_string(), limit.to_string()),
            (
                "fields".to_string(),
                format!("citingPaper.{}", fields::REFERENCE.join(",citingPaper.")),
            ),
        ];

        self.get(&url, &params).await
    }

    /// Fetch the full reference list for a paper, following pagination.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn all_references(&self, id: &PaperIdentifier) -> ClientResult<Vec<RawReference>> {
        self.drain_pages(id, false).await
    }

    /// Fetch the full citing-paper list for a paper, following pagination.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn all_citations(&self, id: &PaperIdentifier) -> ClientResult<Vec<RawReference>> {
        self.drain_pages(id, true).await
    }

    async fn drain_pages(
        &self,
        id: &PaperIdentifier,
        citations: bool,
    ) -> ClientResult<Vec<RawReference>> {
        let mut entries = Vec::new();
        let mut offset = 0;

        loop {
            let page = if citations {
                self.get_citations(id, offset, REFERENCE_PAGE_LIMIT).await?
            } else {
                self.get_references(id, offset, REFERENCE_PAGE_LIMIT).await?
            };

            entries.extend(page.data.iter().filter_map(S2CitationContext::as_raw_reference));

            match page.next {
                Some(next) if entries.len() < MAX_REFERENCE_ENTRIES => offset = next,
                _ => break,
            }
        }

        if entries.len() >= MAX_REFERENCE_ENTRIES {
            tracing::warn!(id = %id, count = entries.len(), "reference list truncated");
        }

        Ok(entries)
    }

    /// Make a GET request with caching and rate limiting.
    async fn get<T>(&self, url: &str, params: &[(String, String)]) -> ClientResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        // Check cache
        let cache_key = super::cache_key("GET", url, params);
        if let Some(cached) = self.cache.get(&cache_key).await {
            return serde_json::from_value(cached).map_err(ClientError::from);
        }

        // Rate limit
        tokio::time::sleep(self.rate_limit_delay).await;

        let response = self.client.get(url).query(params).send().await?;

        let response = super::handle_response(response).await?;
        let value: serde_json::Value = response.json().await?;

        // Cache response
        self.cache.insert(cache_key, value.clone()).await;

        serde_json::from_value(value).map_err(ClientError::from)
    }
}

impl std::fmt::Debug for SemanticScholarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticScholarClient").field("has_api_key", &self.has_api_key()).finish()
    }
}

/// A paper from the Semantic Scholar Graph API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S2Paper {
    /// Unique Semantic Scholar paper ID.
    pub paper_id: String,

    /// Paper title.
    #[serde(default)]
    pub title: Option<String>,

    /// Paper abstract.
    #[serde(default)]
    pub r#abstract: Option<String>,

    /// Publication year.
    #[serde(default)]
    pub year: Option<i32>,

    /// Publication date in ISO format (YYYY-MM-DD), often absent.
    #[serde(default)]
    pub publication_date: Option<String>,

    /// Fields of study (e.g., "Computer Science", "Medicine").
    #[serde(default)]
    pub fields_of_study: Option<Vec<String>>,

    /// List of authors.
    #[serde(default)]
    pub authors: Vec<S2AuthorRef>,

    /// Publication venue.
    #[serde(default)]
    pub venue: Option<String>,

    /// Open access PDF information.
    #[serde(default)]
    pub open_access_pdf: Option<S2OpenAccessPdf>,

    /// External identifiers (DOI, ArXiv, etc.).
    #[serde(default)]
    pub external_ids: Option<S2ExternalIds>,
}

impl S2Paper {
    /// Get the DOI if available.
    #[must_use]
    pub fn doi(&self) -> Option<&str> {
        self.external_ids.as_ref()?.doi.as_deref()
    }

    /// Get the arXiv ID if available.
    #[must_use]
    pub fn arxiv_id(&self) -> Option<&str> {
        self.external_ids.as_ref()?.arxiv.as_deref()
    }

    /// Fields of study normalized to lowercase, used as hub candidates.
    #[must_use]
    pub fn hub_candidates(&self) -> Vec<String> {
        self.fields_of_study
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|f| f.to_lowercase())
            .collect()
    }

    /// Publication date, falling back to January 1st of the year when the
    /// API gives only year granularity.
    #[must_use]
    pub fn publish_date(&self) -> Option<NaiveDate> {
        if let Some(ref date) = self.publication_date {
            if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                return Some(parsed);
            }
        }
        self.year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
    }

    /// Build a local record from this paper.
    #[must_use]
    pub fn into_record(self) -> PaperRecord {
        let title = self.title.clone().unwrap_or_default();

        let mut record = PaperRecord::new(title).externally_sourced(source::SEMANTIC_SCHOLAR);
        record.paper_title = self.title.clone();
        if let Some(doi) = self.doi() {
            record.set_doi(doi);
        }
        record.arxiv_id = self.arxiv_id().map(str::to_string);
        record.abstract_text = self.r#abstract.clone();
        record.publish_date = self.publish_date();
        record.pdf_url = self.open_access_pdf.as_ref().and_then(|p| p.url.clone());
        record.raw_authors =
            self.authors.iter().filter_map(|a| a.name.clone()).collect();
        record
    }
}

/// Minimal author reference on a paper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S2AuthorRef {
    /// Semantic Scholar author ID.
    #[serde(default)]
    pub author_id: Option<String>,

    /// Author name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Open access PDF information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S2OpenAccessPdf {
    /// Direct URL to the PDF.
    pub url: Option<String>,

    /// Status of open access.
    pub status: Option<String>,
}

/// External identifiers for a paper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S2ExternalIds {
    /// Digital Object Identifier.
    #[serde(rename = "DOI")]
    pub doi: Option<String>,

    /// ArXiv preprint ID.
    #[serde(rename = "ArXiv")]
    pub arxiv: Option<String>,

    /// PubMed ID.
    #[serde(rename = "PubMed")]
    pub pubmed: Option<String>,

    /// Semantic Scholar Corpus ID.
    #[serde(rename = "CorpusId")]
    pub corpus_id: Option<i64>,
}

/// Citation context wrapping the citing/cited paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S2CitationContext {
    /// The citing or cited paper.
    #[serde(alias = "citingPaper", alias = "citedPaper")]
    pub paper: Option<S2Paper>,
}

impl S2CitationContext {
    /// Reduce to the identifiers the reconciler needs.
    ///
    /// Entries without a paper (the API returns them for withdrawn works)
    /// are dropped.
    #[must_use]
    pub fn as_raw_reference(&self) -> Option<RawReference> {
        let paper = self.paper.as_ref()?;
        Some(RawReference {
            doi: paper.doi().map(str::to_string),
            arxiv_id: paper.arxiv_id().map(str::to_string),
            title: paper.title.clone(),
        })
    }
}

/// One page of a reference or citation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S2CitationResult {
    /// Offset for pagination.
    #[serde(default)]
    pub offset: i32,

    /// Next offset if more results available.
    #[serde(default)]
    pub next: Option<i32>,

    /// Citation data.
    pub data: Vec<S2CitationContext>,
}
