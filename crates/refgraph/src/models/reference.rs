//! Raw reference-list entries and citation edge direction.

use serde::{Deserialize, Serialize};

/// One entry of a provider's reference or citation list, reduced to the
/// identifiers the reconciler cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReference {
    /// DOI when the provider knows one.
    pub doi: Option<String>,

    /// arXiv ID when the provider knows one (bare form).
    pub arxiv_id: Option<String>,

    /// Title, kept for logging only.
    pub title: Option<String>,
}

/// Direction of a citation edge relative to the originating paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationDirection {
    /// Papers the originating paper cites (forward edges).
    References,
    /// Papers citing the originating paper (backward edges).
    CitedBy,
}

impl CitationDirection {
    /// Label used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::References => "references",
            Self::CitedBy => "cited_by",
        }
    }
}

impl std::fmt::Display for CitationDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
