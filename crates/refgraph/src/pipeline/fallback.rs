//! Provider fallback chain for creating paper records from identifiers.
//!
//! Every provider gives incomplete data: Semantic Scholar has the richest
//! records and field-of-study tags but year-granular dates; doi.org CSL
//! covers DOIs nobody indexed but knows no fields of study; Crossref has
//! authoritative dates but almost no abstracts. The chain tries them in
//! that order and overlays secondary fields on success.

use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{PaperId, PaperIdentifier, PaperRecord};
use crate::providers::{ArxivClient, CrossrefClient, CslClient, SemanticScholarClient, source};
use crate::store::PaperStore;

/// Creates store records for identifiers that missed during
/// reconciliation.
pub struct FallbackResolver {
    store: Arc<dyn PaperStore>,
    semantic_scholar: SemanticScholarClient,
    crossref: CrossrefClient,
    csl: CslClient,
    arxiv: ArxivClient,
}

impl FallbackResolver {
    /// Create a resolver over the given store and provider clients.
    #[must_use]
    pub fn new(
        store: Arc<dyn PaperStore>,
        semantic_scholar: SemanticScholarClient,
        crossref: CrossrefClient,
        csl: CslClient,
        arxiv: ArxivClient,
    ) -> Self {
        Self { store, semantic_scholar, crossref, csl, arxiv }
    }

    /// Create a record for a DOI miss, walking the provider chain.
    ///
    /// Returns the new record's ID, or `None` when every provider failed
    /// (the miss is logged and skipped; one bad identifier never fails
    /// the batch).
    ///
    /// # Errors
    ///
    /// Returns error only for store failures other than DOI collisions.
    pub async fn create_from_doi(&self, doi: &str) -> PipelineResult<Option<PaperId>> {
        let Some((record, hub_candidates)) = self.resolve_doi_record(doi).await else {
            tracing::warn!(doi, "all providers failed, skipping identifier");
            return Ok(None);
        };

        let paper_id = match self.insert_deduped(record).await? {
            Some(id) => id,
            None => return Ok(None),
        };

        let mut hubs = Vec::with_capacity(hub_candidates.len());
        for name in &hub_candidates {
            hubs.push(self.store.get_or_create_hub(name).await?);
        }
        self.store.attach_hubs(paper_id, &hubs).await?;

        Ok(Some(paper_id))
    }

    /// Create a record for an arXiv miss via the arXiv export API.
    ///
    /// # Errors
    ///
    /// Returns error only for store failures other than collisions.
    pub async fn create_from_arxiv(&self, arxiv_id: &str) -> PipelineResult<Option<PaperId>> {
        let entry = match self.arxiv.get_entry(arxiv_id).await {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(arxiv_id, error = %err, "arXiv lookup failed, skipping identifier");
                return Ok(None);
            }
        };

        let hub_candidates = entry.hub_candidates();
        let paper_id = match self.insert_deduped(entry.into_record()).await? {
            Some(id) => id,
            None => return Ok(None),
        };

        let mut hubs = Vec::with_capacity(hub_candidates.len());
        for name in &hub_candidates {
            hubs.push(self.store.get_or_create_hub(name).await?);
        }
        self.store.attach_hubs(paper_id, &hubs).await?;

        Ok(Some(paper_id))
    }

    /// Walk the provider chain for a DOI, returning the reconciled record
    /// and its hub candidates.
    async fn resolve_doi_record(&self, doi: &str) -> Option<(PaperRecord, Vec<String>)> {
        let id = PaperIdentifier::Doi(doi.to_string());

        // 1. Semantic Scholar, with the Crossref publish date overlaid.
        match self.semantic_scholar.get_paper(&id).await {
            Ok(paper) => {
                let hub_candidates = paper.hub_candidates();
                let mut record = paper.into_record();
                record.set_doi(doi);

                match self.crossref.get_work(doi).await {
                    Ok(work) => {
                        if let Some(date) = work.publish_date() {
                            record.publish_date = Some(date);
                        }
                    }
                    Err(err) => {
                        tracing::debug!(doi, error = %err, "no Crossref date overlay");
                    }
                }

                return Some((record, hub_candidates));
            }
            Err(err) => {
                tracing::warn!(doi, error = %err, "Semantic Scholar failed, falling back");
            }
        }

        // 2. doi.org CSL resolution.
        match self.csl.resolve(doi).await {
            Ok(item) => {
                if let Some(record) = item.into_record(source::DOI_ORG) {
                    return Some((record, Vec::new()));
                }
                tracing::warn!(doi, "CSL item is not a paper type, falling back");
            }
            Err(err) => {
                tracing::warn!(doi, error = %err, "CSL resolution failed, falling back");
            }
        }

        // 3. Crossref.
        match self.crossref.get_work(doi).await {
            Ok(work) => Some((work.into_record(), Vec::new())),
            Err(err) => {
                tracing::warn!(doi, error = %err, "Crossref failed");
                None
            }
        }
    }

    /// Insert a record, resolving DOI collisions to the existing paper.
    ///
    /// A collision means another task created the record between the miss
    /// check and this insert; linking should proceed against the winner.
    async fn insert_deduped(&self, record: PaperRecord) -> PipelineResult<Option<PaperId>> {
        let identifiers = record.identifiers();

        match self.store.insert(record).await {
            Ok(id) => Ok(Some(id)),
            Err(PipelineError::Store(message)) => {
                let existing = self.store.find_by_identifiers(&identifiers).await?;
                if let Some((id, _)) = existing.into_iter().next() {
                    tracing::debug!(paper = %id, "record already present, reusing");
                    return Ok(Some(id));
                }
                tracing::warn!(%message, "insert failed without a matching record");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for FallbackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackResolver").finish()
    }
}
