//! The retrieval driver and its per-method implementations.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{PaperId, PaperIdentifier, PaperRecord};
use crate::providers::{CrossrefClient, CslClient, source};
use crate::store::PaperStore;

use super::{RetrievalMethod, method_priority_list};

/// Bytes of a PDF scanned for a DOI. Publishers stamp the DOI into the
/// first page, so the head of the file is enough.
const PDF_SCAN_BYTES: usize = 65536;

/// DataCite DOI prefix under which arXiv registers its papers.
const ARXIV_DOI_PREFIX: &str = "10.48550/arXiv.";

// Meta tags are matched in both attribute orders since publishers emit
// name-first and content-first variants.
static META_NAME_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?name\s*=\s*["']([^"']+)["'][^>]*?content\s*=\s*["']([^"']+)["']"#)
        .expect("valid meta regex")
});

static META_CONTENT_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?content\s*=\s*["']([^"']+)["'][^>]*?name\s*=\s*["']([^"']+)["']"#)
        .expect("valid meta regex")
});

/// Walks the retrieval method chain for URL-seeded papers.
pub struct MetadataRetriever {
    store: Arc<dyn PaperStore>,
    http: reqwest_middleware::ClientWithMiddleware,
    /// Separate client for the PDF probe: short timeout, no retries.
    probe: reqwest::Client,
    csl: CslClient,
    crossref: CrossrefClient,
}

impl MetadataRetriever {
    /// Create a retriever over the given store.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config, store: Arc<dyn PaperStore>) -> anyhow::Result<Self> {
        let probe = reqwest::Client::builder().timeout(config.pdf_probe_timeout).build()?;

        Ok(Self {
            store,
            http: crate::providers::build_http_client(config, reqwest::header::HeaderMap::new())?,
            probe,
            csl: CslClient::new(config)?,
            crossref: CrossrefClient::new(config)?,
        })
    }

    /// Populate a URL-seeded paper's metadata.
    ///
    /// Probes the URL, walks the method priority list, and stops at the
    /// first method that yields metadata. Every attempt is journaled,
    /// including the failures before the winning method.
    ///
    /// Returns the method that succeeded, or `None` when the chain is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns error when the paper is unknown, has no URL, or the store
    /// fails. Method-level failures only advance the chain.
    pub async fn populate_from_url(&self, paper: PaperId) -> PipelineResult<Option<RetrievalMethod>> {
        let mut record = self
            .store
            .get(paper)
            .await?
            .ok_or_else(|| PipelineError::validation("paper", format!("unknown paper: {paper}")))?;

        let url = record
            .url
            .clone()
            .ok_or_else(|| PipelineError::validation("url", "paper has no seed URL"))?;
        let url = url::Url::parse(&url)
            .map_err(|err| PipelineError::validation("url", err.to_string()))?
            .to_string();

        let is_pdf = self.url_points_to_pdf(&url).await;
        let methods = method_priority_list(record.doi.is_some(), is_pdf);
        tracing::debug!(paper = %paper, %url, is_pdf, ?methods, "retrieval chain selected");

        for method in methods {
            self.store.record_attempt(paper, method).await?;

            if self.apply(method, &mut record, &url).await {
                self.store.update(paper, record).await?;
                tracing::info!(paper = %paper, method = %method, "metadata retrieved");
                return Ok(Some(method));
            }
        }

        tracing::warn!(paper = %paper, %url, "retrieval chain exhausted");
        Ok(None)
    }

    /// Probe whether a URL serves a PDF.
    ///
    /// ScienceDirect links carrying `download=false` never answer with a
    /// PDF content type but still gate a PDF, so a non-error status is
    /// enough for them. Transport errors mean "not a PDF".
    pub async fn url_points_to_pdf(&self, url: &str) -> bool {
        let response = match self.probe.get(url).send().await {
            Ok(response) => response,
            Err(_) => return false,
        };

        if url.contains("sciencedirect") && url.contains("download=false") {
            return response.status().as_u16() < 400;
        }

        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/pdf"))
    }

    /// Run one method against the record. True means metadata arrived.
    async fn apply(&self, method: RetrievalMethod, record: &mut PaperRecord, url: &str) -> bool {
        let outcome = match method {
            RetrievalMethod::CslDoi => self.from_known_doi_csl(record).await,
            RetrievalMethod::CrossrefDoi => self.from_known_doi_crossref(record).await,
            RetrievalMethod::CslUrl => self.from_landing_page(record, url).await,
            RetrievalMethod::CslPdfUrl => self.from_pdf_url(record, url).await,
            RetrievalMethod::ParsePdf => self.from_pdf_bytes(record, url).await,
            RetrievalMethod::CrossrefQuery => self.from_title_query(record).await,
            RetrievalMethod::PdfFromUrl => self.pdf_link_from_page(record, url).await,
        };

        match outcome {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(method = %method, error = %err, "retrieval method failed");
                false
            }
        }
    }

    async fn from_known_doi_csl(&self, record: &mut PaperRecord) -> PipelineResult<bool> {
        let Some(doi) = record.doi.clone() else { return Ok(false) };
        self.resolve_csl_into(record, &doi).await
    }

    async fn from_known_doi_crossref(&self, record: &mut PaperRecord) -> PipelineResult<bool> {
        let Some(doi) = record.doi.clone() else { return Ok(false) };
        let work = self.crossref.get_work(&doi).await?;
        merge_metadata(record, work.into_record());
        Ok(true)
    }

    /// Scrape the landing page for a DOI, then resolve it.
    async fn from_landing_page(&self, record: &mut PaperRecord, url: &str) -> PipelineResult<bool> {
        let Some(html) = self.fetch_text(url).await else { return Ok(false) };

        let doi = extract_meta_content(&html, &["citation_doi", "dc.identifier"])
            .and_then(|content| PaperIdentifier::doi(&content))
            .or_else(|| PaperIdentifier::find_doi_in_text(&html));

        match doi {
            Some(PaperIdentifier::Doi(doi)) => self.resolve_csl_into(record, &doi).await,
            _ => Ok(false),
        }
    }

    /// Resolve an identifier embedded in the PDF URL itself. arXiv IDs go
    /// through the DataCite DOI arXiv registers for every paper.
    async fn from_pdf_url(&self, record: &mut PaperRecord, url: &str) -> PipelineResult<bool> {
        if url.contains("arxiv.org") {
            if let Some(PaperIdentifier::Arxiv(id)) = PaperIdentifier::arxiv(url) {
                return self.resolve_csl_into(record, &format!("{ARXIV_DOI_PREFIX}{id}")).await;
            }
        }

        match PaperIdentifier::find_doi_in_text(url) {
            Some(PaperIdentifier::Doi(doi)) => self.resolve_csl_into(record, &doi).await,
            _ => Ok(false),
        }
    }

    /// Scan the head of the PDF for a DOI and resolve it via Crossref.
    async fn from_pdf_bytes(&self, record: &mut PaperRecord, url: &str) -> PipelineResult<bool> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(%url, error = %err, "PDF fetch failed");
                return Ok(false);
            }
        };
        let Ok(bytes) = response.bytes().await else { return Ok(false) };

        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(PDF_SCAN_BYTES)]).into_owned();
        match PaperIdentifier::find_doi_in_text(&head) {
            Some(PaperIdentifier::Doi(doi)) => {
                let work = self.crossref.get_work(&doi).await?;
                merge_metadata(record, work.into_record());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn from_title_query(&self, record: &mut PaperRecord) -> PipelineResult<bool> {
        let title = record.paper_title.clone().unwrap_or_else(|| record.title.clone());
        if title.trim().is_empty() {
            return Ok(false);
        }

        match self.crossref.query_title(&title).await? {
            Some(work) => {
                merge_metadata(record, work.into_record());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pdf_link_from_page(&self, record: &mut PaperRecord, url: &str) -> PipelineResult<bool> {
        let Some(html) = self.fetch_text(url).await else { return Ok(false) };

        match extract_meta_content(&html, &["citation_pdf_url"]) {
            Some(pdf_url) => {
                record.pdf_url = Some(pdf_url);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn resolve_csl_into(&self, record: &mut PaperRecord, doi: &str) -> PipelineResult<bool> {
        let item = self.csl.resolve(doi).await?;
        match item.into_record(source::DOI_ORG) {
            Some(fetched) => {
                merge_metadata(record, fetched);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn fetch_text(&self, url: &str) -> Option<String> {
        match self.http.get(url).send().await {
            Ok(response) => response.text().await.ok(),
            Err(err) => {
                tracing::debug!(%url, error = %err, "page fetch failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for MetadataRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRetriever").finish()
    }
}

/// Overlay fetched metadata onto an existing record, filling only what is
/// missing. The record keeps its upload provenance: visibility and source
/// flags are not copied from the fetched side.
fn merge_metadata(record: &mut PaperRecord, fetched: PaperRecord) {
    if record.title.trim().is_empty() && !fetched.title.trim().is_empty() {
        record.title = fetched.title;
    }
    if record.paper_title.is_none() {
        record.paper_title = fetched.paper_title;
    }
    if record.doi.is_none() {
        record.doi = fetched.doi;
    }
    if record.arxiv_id.is_none() {
        record.arxiv_id = fetched.arxiv_id;
    }
    if record.abstract_text.is_none() {
        record.abstract_text = fetched.abstract_text;
    }
    if record.publish_date.is_none() {
        record.publish_date = fetched.publish_date;
    }
    if record.pdf_url.is_none() {
        record.pdf_url = fetched.pdf_url;
    }
    if record.raw_authors.is_empty() {
        record.raw_authors = fetched.raw_authors;
    }
    if record.csl_item.is_none() {
        record.csl_item = fetched.csl_item;
    }
}

/// Find the first matching meta tag content, checking both attribute
/// orders.
fn extract_meta_content(html: &str, names: &[&str]) -> Option<String> {
    for captures in META_NAME_FIRST.captures_iter(html) {
        let name = captures.get(1)?.as_str().to_lowercase();
        if names.contains(&name.as_str()) {
            return Some(captures.get(2)?.as_str().to_string());
        }
    }
    for captures in META_CONTENT_FIRST.captures_iter(html) {
        let name = captures.get(2)?.as_str().to_lowercase();
        if names.contains(&name.as_str()) {
            return Some(captures.get(1)?.as_str().to_string());
        }
    }
    None
}
