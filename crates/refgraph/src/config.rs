//! Configuration for the reference-resolution pipeline.

use std::time::Duration;

/// Provider endpoint constants.
pub mod api {
    use std::time::Duration;

    /// Semantic Scholar Graph API endpoint.
    pub const GRAPH_API: &str = "https://api.semanticscholar.org/graph/v1";

    /// Crossref works endpoint.
    pub const CROSSREF_API: &str = "https://api.crossref.org/works";

    /// DOI resolver used for CSL JSON content negotiation.
    pub const DOI_ORG: &str = "https://doi.org";

    /// arXiv Atom export endpoint.
    pub const ARXIV_API: &str = "http://export.arxiv.org/api/query";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Timeout for the PDF content-type probe. Kept short: the probe runs
    /// inline before method selection and a slow host should not stall it.
    pub const PDF_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

    /// Rate limit delay between requests without an API key (200ms = 5 req/s).
    pub const RATE_LIMIT_DELAY: Duration = Duration::from_millis(200);

    /// Rate limit delay between requests with an API key (10ms = 100 req/s).
    pub const RATE_LIMIT_DELAY_WITH_KEY: Duration = Duration::from_millis(10);

    /// Cache TTL (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum cache size.
    pub const CACHE_MAX_SIZE: u64 = 1000;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);

    /// Default polite-pool contact for Crossref requests.
    pub const DEFAULT_MAILTO: &str = "refgraph@rh-labs.dev";
}

/// Semantic Scholar field sets for API requests.
pub mod fields {
    /// Fields needed to build a local paper record.
    pub const RECORD: &[&str] = &[
        "paperId",
        "title",
        "abstract",
        "year",
        "publicationDate",
        "fieldsOfStudy",
        "authors",
        "venue",
        "openAccessPdf",
        "externalIds",
    ];

    /// Fields needed for reference/citation list entries. Only the
    /// identifiers matter for reconciliation; title helps logging.
    pub const REFERENCE: &[&str] = &["paperId", "title", "externalIds"];
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Semantic Scholar API key (optional, raises rate limits).
    pub api_key: Option<String>,

    /// Contact address sent to Crossref for polite-pool access.
    pub crossref_mailto: String,

    /// Base URL for the Semantic Scholar Graph API (overridable for mock servers).
    pub graph_api_url: String,

    /// Base URL for the Crossref works API.
    pub crossref_api_url: String,

    /// Base URL for DOI content negotiation.
    pub doi_org_url: String,

    /// Base URL for the arXiv Atom export API.
    pub arxiv_api_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Timeout for the PDF content-type probe.
    pub pdf_probe_timeout: Duration,

    /// Rate limit delay between requests.
    pub rate_limit_delay: Duration,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,
}

impl Config {
    /// Create a new configuration with an optional Semantic Scholar API key.
    ///
    /// The rate limit delay is adjusted based on key presence:
    /// without a key 5 req/s, with a key 100 req/s.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        let has_key = api_key.is_some();
        Self {
            api_key,
            crossref_mailto: api::DEFAULT_MAILTO.to_string(),
            graph_api_url: api::GRAPH_API.to_string(),
            crossref_api_url: api::CROSSREF_API.to_string(),
            doi_org_url: api::DOI_ORG.to_string(),
            arxiv_api_url: api::ARXIV_API.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            pdf_probe_timeout: api::PDF_PROBE_TIMEOUT,
            rate_limit_delay: if has_key {
                api::RATE_LIMIT_DELAY_WITH_KEY
            } else {
                api::RATE_LIMIT_DELAY
            },
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
        }
    }

    /// Create a test configuration pointing every provider at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            api_key: None,
            crossref_mailto: api::DEFAULT_MAILTO.to_string(),
            graph_api_url: format!("{}/graph/v1", base_url),
            crossref_api_url: format!("{}/works", base_url),
            doi_org_url: base_url.to_string(),
            arxiv_api_url: format!("{}/api/query", base_url),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            pdf_probe_timeout: Duration::from_secs(2),
            rate_limit_delay: Duration::from_millis(0), // No delay in tests
            cache_ttl: Duration::from_secs(0),          // No caching in tests
            cache_max_size: 0,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `SEMANTIC_SCHOLAR_API_KEY` and `CROSSREF_MAILTO`.
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok();
        let mut config = Self::new(api_key);
        if let Ok(mailto) = std::env::var("CROSSREF_MAILTO") {
            config.crossref_mailto = mailto;
        }
        Ok(config)
    }

    /// Check if a Semantic Scholar API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None)
    }
}
