//! Identifier extraction from provider reference lists.

use std::collections::BTreeSet;

use crate::models::{PaperIdentifier, RawReference};

/// Deduplicated identifiers pulled from one reference list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierBatch {
    /// Normalized DOIs.
    pub dois: BTreeSet<String>,

    /// Normalized bare arXiv IDs.
    pub arxiv_ids: BTreeSet<String>,
}

impl IdentifierBatch {
    /// All identifiers in the batch.
    #[must_use]
    pub fn identifiers(&self) -> Vec<PaperIdentifier> {
        self.dois
            .iter()
            .cloned()
            .map(PaperIdentifier::Doi)
            .chain(self.arxiv_ids.iter().cloned().map(PaperIdentifier::Arxiv))
            .collect()
    }

    /// Total identifier count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dois.len() + self.arxiv_ids.len()
    }

    /// True when no reference carried a usable identifier.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dois.is_empty() && self.arxiv_ids.is_empty()
    }
}

/// Pull identifiers out of a raw reference list.
///
/// A reference contributes its DOI when it has one, otherwise its arXiv
/// ID; entries with neither are skipped. Identifiers that fail to
/// normalize are dropped rather than propagated as garbage.
#[must_use]
pub fn extract_identifiers(refs: &[RawReference]) -> IdentifierBatch {
    let mut batch = IdentifierBatch::default();

    for reference in refs {
        if let Some(ref doi) = reference.doi {
            if let Some(PaperIdentifier::Doi(normalized)) = PaperIdentifier::doi(doi) {
                batch.dois.insert(normalized);
                continue;
            }
            tracing::debug!(%doi, title = ?reference.title, "unparseable DOI in reference list");
        }
        if let Some(ref arxiv) = reference.arxiv_id {
            if let Some(PaperIdentifier::Arxiv(normalized)) = PaperIdentifier::arxiv(arxiv) {
                batch.arxiv_ids.insert(normalized);
            }
        }
    }

    batch
}
