//! CSL JSON resolution via DOI content negotiation.
//!
//! Third-tier provider. Asking `doi.org` for
//! `application/vnd.citationstyles.csl+json` delegates to the registration
//! agency's own metadata service, which covers DOIs that Semantic Scholar
//! has never indexed.

use crate::config::Config;
use crate::error::ClientResult;
use crate::models::CslItem;

/// Accept header value for CSL JSON.
const CSL_JSON: &str = "application/vnd.citationstyles.csl+json";

/// DOI content-negotiation client.
#[derive(Clone)]
pub struct CslClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base_url: String,
}

impl CslClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, CSL_JSON.parse().expect("valid accept header"));

        Ok(Self {
            client: super::build_http_client(config, headers)?,
            base_url: config.doi_org_url.clone(),
        })
    }

    /// Resolve a DOI to its CSL item.
    ///
    /// # Errors
    ///
    /// Returns error when the DOI does not resolve or the agency serves
    /// no CSL representation.
    pub async fn resolve(&self, doi: &str) -> ClientResult<CslItem> {
        let url = format!("{}/{}", self.base_url, doi);

        let response = self.client.get(&url).send().await?;
        let response = super::handle_response(response).await?;

        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for CslClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CslClient").field("base_url", &self.base_url).finish()
    }
}
