//! Crossref works API client.
//!
//! Second-tier provider: authoritative publish dates and broad DOI
//! coverage, but no abstracts for most works and JATS-encoded ones where
//! present. Follows Crossref etiquette by sending a polite-pool `mailto`
//! user agent.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ClientResult;
use crate::models::PaperRecord;

use super::source;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// Crossref API client.
#[derive(Clone)]
pub struct CrossrefClient {
    client: reqwest_middleware::ClientWithMiddleware,
    api_url: String,
    mailto: String,
}

impl CrossrefClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            format!("refgraph/{} (mailto:{})", env!("CARGO_PKG_VERSION"), config.crossref_mailto)
                .parse()?,
        );

        Ok(Self {
            client: super::build_http_client(config, headers)?,
            api_url: config.crossref_api_url.clone(),
            mailto: config.crossref_mailto.clone(),
        })
    }

    /// Fetch a work by DOI.
    ///
    /// # Errors
    ///
    /// Returns error on API failure or when the DOI is unknown.
    pub async fn get_work(&self, doi: &str) -> ClientResult<CrossrefWork> {
        let url = format!("{}/{}", self.api_url, doi);

        let response =
            self.client.get(&url).query(&[("mailto", self.mailto.as_str())]).send().await?;
        let response = super::handle_response(response).await?;

        let body: CrossrefResponse = response.json().await?;
        Ok(body.message)
    }

    /// Bibliographic title query, returning the top match only when its
    /// title agrees with the query after normalization.
    ///
    /// # Errors
    ///
    /// Returns error on API failure.
    pub async fn query_title(&self, title: &str) -> ClientResult<Option<CrossrefWork>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("query.bibliographic", title),
                ("rows", "1"),
                ("mailto", self.mailto.as_str()),
            ])
            .send()
            .await?;
        let response = super::handle_response(response).await?;

        let body: CrossrefListResponse = response.json().await?;
        let top = body.message.items.into_iter().next();

        Ok(top.filter(|work| {
            work.title
                .first()
                .is_some_and(|t| normalize_title(t) == normalize_title(title))
        }))
    }
}

impl std::fmt::Debug for CrossrefClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossrefClient").field("api_url", &self.api_url).finish()
    }
}

/// Lowercase, alphanumeric-only form used for title agreement checks.
fn normalize_title(title: &str) -> String {
    title.chars().filter(char::is_ascii_alphanumeric).collect::<String>().to_lowercase()
}

/// Response wrapper for single-work lookups.
#[derive(Debug, Deserialize)]
struct CrossrefResponse {
    message: CrossrefWork,
}

/// Response wrapper for query endpoints.
#[derive(Debug, Deserialize)]
struct CrossrefListResponse {
    message: CrossrefItems,
}

#[derive(Debug, Deserialize)]
struct CrossrefItems {
    #[serde(default)]
    items: Vec<CrossrefWork>,
}

/// Metadata about an academic work from Crossref.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossrefWork {
    /// Work titles (usually one).
    #[serde(default)]
    pub title: Vec<String>,

    /// Author list.
    #[serde(default)]
    pub author: Vec<CrossrefAuthor>,

    /// Abstract in JATS XML, absent for most works.
    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,

    /// Print publication date.
    #[serde(rename = "published-print", default)]
    pub published_print: Option<CrossrefDate>,

    /// Online publication date.
    #[serde(rename = "published-online", default)]
    pub published_online: Option<CrossrefDate>,

    /// Deposit date, the fallback when no publication date exists.
    #[serde(default)]
    pub created: Option<CrossrefDate>,

    /// Landing page URL.
    #[serde(rename = "URL", default)]
    pub url: Option<String>,

    /// The work's DOI.
    #[serde(rename = "DOI", default)]
    pub doi: Option<String>,

    /// Journal or proceedings title.
    #[serde(rename = "container-title", default)]
    pub container_title: Vec<String>,
}

impl CrossrefWork {
    /// Publication date: print, else online, else deposit date.
    #[must_use]
    pub fn publish_date(&self) -> Option<NaiveDate> {
        self.published_print
            .as_ref()
            .and_then(CrossrefDate::as_naive_date)
            .or_else(|| self.published_online.as_ref().and_then(CrossrefDate::as_naive_date))
            .or_else(|| self.created.as_ref().and_then(CrossrefDate::as_naive_date))
    }

    /// Abstract with JATS tags stripped.
    #[must_use]
    pub fn plain_abstract(&self) -> Option<String> {
        self.abstract_text.as_deref().map(|a| TAG_RE.replace_all(a, "").trim().to_string())
    }

    /// Build a local record from this work.
    #[must_use]
    pub fn into_record(self) -> PaperRecord {
        let title = self.title.first().cloned().unwrap_or_default();

        let mut record = PaperRecord::new(title.clone()).externally_sourced(source::CROSSREF);
        record.paper_title = Some(title);
        if let Some(ref doi) = self.doi {
            record.set_doi(doi);
        }
        record.url = self.url.clone();
        record.abstract_text = self.plain_abstract();
        record.publish_date = self.publish_date();
        record.raw_authors = self.author.iter().filter_map(CrossrefAuthor::display_name).collect();
        record
    }
}

/// Author information from Crossref.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossrefAuthor {
    /// Given (first) name.
    #[serde(default)]
    pub given: Option<String>,

    /// Family (last) name.
    #[serde(default)]
    pub family: Option<String>,
}

impl CrossrefAuthor {
    /// Full display name.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        match (&self.given, &self.family) {
            (Some(given), Some(family)) => Some(format!("{given} {family}")),
            (None, Some(family)) => Some(family.clone()),
            (Some(given), None) => Some(given.clone()),
            (None, None) => None,
        }
    }
}

/// Date in Crossref's date-parts format, possibly partial.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossrefDate {
    /// `[[year, month, day]]` with month and day optional.
    #[serde(rename = "date-parts", default)]
    pub date_parts: Vec<Vec<i32>>,
}

impl CrossrefDate {
    /// Convert date-parts to a date, filling missing month/day with 1.
    #[must_use]
    pub fn as_naive_date(&self) -> Option<NaiveDate> {
        let parts = self.date_parts.first()?;
        let year = *parts.first()?;
        let month = parts.get(1).copied().unwrap_or(1);
        let day = parts.get(2).copied().unwrap_or(1);
        NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
    }
}
