//! Metadata provider clients.
//!
//! Each provider exposes a thin async client over its public API and a
//! conversion into [`crate::models::PaperRecord`]. All clients share the
//! HTTP plumbing here: connection pooling via reqwest, retry middleware
//! with exponential backoff, and uniform status handling.

mod arxiv;
mod crossref;
mod doi_csl;
mod semantic_scholar;

pub use arxiv::ArxivClient;
pub use crossref::CrossrefClient;
pub use doi_csl::CslClient;
pub use semantic_scholar::SemanticScholarClient;

use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult};

/// External-source labels recorded on created papers.
pub mod source {
    /// Semantic Scholar Graph API.
    pub const SEMANTIC_SCHOLAR: &str = "semantic_scholar";
    /// DOI content negotiation (CSL JSON).
    pub const DOI_ORG: &str = "doi.org";
    /// Crossref works API.
    pub const CROSSREF: &str = "crossref";
    /// arXiv Atom export API.
    pub const ARXIV: &str = "arxiv";
}

/// Build the pooled HTTP client with retry middleware shared by providers.
pub(crate) fn build_http_client(
    config: &Config,
    headers: reqwest::header::HeaderMap,
) -> anyhow::Result<ClientWithMiddleware> {
    let client = Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .pool_max_idle_per_host(api::MAX_KEEPALIVE)
        .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
        .gzip(true)
        .build()?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
        .build_with_max_retries(3);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Map non-success status codes to typed client errors.
pub(crate) async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);

            Err(ClientError::rate_limited(retry_after))
        }
        404 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::not_found(text))
        }
        400 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::bad_request(text))
        }
        500..=599 => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::server(status.as_u16(), text))
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text })
        }
    }
}

/// Cache key over method, URL and query params.
pub(crate) fn cache_key(method: &str, url: &str, params: &[(String, String)]) -> String {
    use md5::{Digest, Md5};

    let mut hasher = Md5::new();
    hasher.update(method.as_bytes());
    hasher.update(b"|");
    hasher.update(url.as_bytes());
    hasher.update(b"|");

    for (k, v) in params {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b"&");
    }

    format!("{:x}", hasher.finalize())
}
