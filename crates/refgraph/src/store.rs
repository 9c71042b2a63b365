//! The paper store seam.
//!
//! Persistence is an external collaborator: the pipeline only sees the
//! [`PaperStore`] trait. [`MemoryStore`] is the in-process implementation
//! backing the CLI and the test suite.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{CitationDirection, PaperId, PaperIdentifier, PaperRecord};
use crate::retrieval::RetrievalMethod;

/// Opaque store handle for a hub (topic tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HubId(pub u64);

/// Record-store interface consumed by the pipeline.
///
/// Lookup is by identifier, edges are direction-aware, and metadata
/// retrieval attempts are journaled for later inspection.
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Fetch a record by ID.
    async fn get(&self, id: PaperId) -> PipelineResult<Option<PaperRecord>>;

    /// Find records matching any of the given identifiers (DOI column or
    /// alternate arXiv ID).
    async fn find_by_identifiers(
        &self,
        ids: &[PaperIdentifier],
    ) -> PipelineResult<Vec<(PaperId, PaperRecord)>>;

    /// Insert a new record. DOI uniqueness is enforced.
    async fn insert(&self, record: PaperRecord) -> PipelineResult<PaperId>;

    /// Replace an existing record.
    async fn update(&self, id: PaperId, record: PaperRecord) -> PipelineResult<()>;

    /// Add a citation edge: `from` cites `to`. Idempotent.
    async fn add_reference(&self, from: PaperId, to: PaperId) -> PipelineResult<()>;

    /// Count edges touching `id` in the given direction.
    async fn reference_count(
        &self,
        id: PaperId,
        direction: CitationDirection,
    ) -> PipelineResult<usize>;

    /// Get or create a hub by (lowercase) name.
    async fn get_or_create_hub(&self, name: &str) -> PipelineResult<HubId>;

    /// Attach hubs to a paper. Idempotent.
    async fn attach_hubs(&self, paper: PaperId, hubs: &[HubId]) -> PipelineResult<()>;

    /// Journal a metadata retrieval attempt for a paper.
    async fn record_attempt(&self, paper: PaperId, method: RetrievalMethod) -> PipelineResult<()>;
}

#[derive(Default)]
struct MemoryInner {
    papers: HashMap<u64, PaperRecord>,
    next_paper_id: u64,
    edges: HashSet<(u64, u64)>,
    hubs: HashMap<String, u64>,
    next_hub_id: u64,
    paper_hubs: HashMap<u64, HashSet<u64>>,
    attempts: Vec<(PaperId, RetrievalMethod)>,
}

/// In-memory [`PaperStore`] used by the CLI and tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: tokio::sync::RwLock<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored papers.
    pub async fn paper_count(&self) -> usize {
        self.inner.read().await.papers.len()
    }

    /// Number of citation edges.
    pub async fn edge_count(&self) -> usize {
        self.inner.read().await.edges.len()
    }

    /// Hub names attached to a paper, sorted.
    pub async fn hubs_for(&self, paper: PaperId) -> Vec<String> {
        let inner = self.inner.read().await;
        let Some(hub_ids) = inner.paper_hubs.get(&paper.0) else {
            return Vec::new();
        };
        let mut names: Vec<String> = inner
            .hubs
            .iter()
            .filter(|(_, id)| hub_ids.contains(id))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// The journaled retrieval attempts, in order.
    pub async fn attempts(&self) -> Vec<(PaperId, RetrievalMethod)> {
        self.inner.read().await.attempts.clone()
    }
}

#[async_trait]
impl PaperStore for MemoryStore {
    async fn get(&self, id: PaperId) -> PipelineResult<Option<PaperRecord>> {
        Ok(self.inner.read().await.papers.get(&id.0).cloned())
    }

    async fn find_by_identifiers(
        &self,
        ids: &[PaperIdentifier],
    ) -> PipelineResult<Vec<(PaperId, PaperRecord)>> {
        let inner = self.inner.read().await;

        let mut dois = HashSet::new();
        let mut arxiv_ids = HashSet::new();
        for id in ids {
            match id {
                PaperIdentifier::Doi(doi) => dois.insert(doi.as_str()),
                PaperIdentifier::Arxiv(arxiv) => arxiv_ids.insert(arxiv.as_str()),
            };
        }

        let mut found: Vec<(PaperId, PaperRecord)> = inner
            .papers
            .iter()
            .filter(|(_, record)| {
                record.doi.as_deref().is_some_and(|d| dois.contains(d))
                    || record.arxiv_id.as_deref().is_some_and(|a| arxiv_ids.contains(a))
            })
            .map(|(id, record)| (PaperId(*id), record.clone()))
            .collect();
        found.sort_by_key(|(id, _)| *id);
        Ok(found)
    }

    async fn insert(&self, record: PaperRecord) -> PipelineResult<PaperId> {
        let mut inner = self.inner.write().await;

        if let Some(ref doi) = record.doi {
            let duplicate = inner.papers.values().any(|p| p.doi.as_deref() == Some(doi));
            if duplicate {
                return Err(PipelineError::store(format!("duplicate DOI: {doi}")));
            }
        }

        let id = inner.next_paper_id;
        inner.next_paper_id += 1;
        inner.papers.insert(id, record);
        Ok(PaperId(id))
    }

    async fn update(&self, id: PaperId, record: PaperRecord) -> PipelineResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.papers.contains_key(&id.0) {
            return Err(PipelineError::store(format!("unknown paper: {id}")));
        }
        inner.papers.insert(id.0, record);
        Ok(())
    }

    async fn add_reference(&self, from: PaperId, to: PaperId) -> PipelineResult<()> {
        if from == to {
            return Err(PipelineError::store("self-citation edge".to_string()));
        }
        let mut inner = self.inner.write().await;
        if !inner.papers.contains_key(&from.0) || !inner.papers.contains_key(&to.0) {
            return Err(PipelineError::store("edge endpoint missing".to_string()));
        }
        inner.edges.insert((from.0, to.0));
        Ok(())
    }

    async fn reference_count(
        &self,
        id: PaperId,
        direction: CitationDirection,
    ) -> PipelineResult<usize> {
        let inner = self.inner.read().await;
        let count = match direction {
            CitationDirection::References => {
                inner.edges.iter().filter(|(from, _)| *from == id.0).count()
            }
            CitationDirection::CitedBy => {
                inner.edges.iter().filter(|(_, to)| *to == id.0).count()
            }
        };
        Ok(count)
    }

    async fn get_or_create_hub(&self, name: &str) -> PipelineResult<HubId> {
        let name = name.to_lowercase();
        let mut inner = self.inner.write().await;

        if let Some(id) = inner.hubs.get(&name) {
            return Ok(HubId(*id));
        }
        let id = inner.next_hub_id;
        inner.next_hub_id += 1;
        inner.hubs.insert(name, id);
        Ok(HubId(id))
    }

    async fn attach_hubs(&self, paper: PaperId, hubs: &[HubId]) -> PipelineResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.papers.contains_key(&paper.0) {
            return Err(PipelineError::store(format!("unknown paper: {paper}")));
        }
        inner.paper_hubs.entry(paper.0).or_default().extend(hubs.iter().map(|h| h.0));
        Ok(())
    }

    async fn record_attempt(&self, paper: PaperId, method: RetrievalMethod) -> PipelineResult<()> {
        self.inner.write().await.attempts.push((paper, method));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_doi(title: &str, doi: &str) -> PaperRecord {
        let mut record = PaperRecord::new(title);
        record.set_doi(doi);
        record
    }

    #[tokio::test]
    async fn test_insert_and_find_by_doi() {
        let store = MemoryStore::new();
        let id = store.insert(record_with_doi("A", "10.1/a")).await.unwrap();

        let found = store
            .find_by_identifiers(&[PaperIdentifier::Doi("10.1/a".into())])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, id);
    }

    #[tokio::test]
    async fn test_find_by_arxiv_alternate_id() {
        let store = MemoryStore::new();
        let mut record = record_with_doi("B", "10.1/b");
        record.arxiv_id = Some("2301.07041".into());
        store.insert(record).await.unwrap();

        // Matched through the alternate ID even though a DOI exists.
        let found = store
            .find_by_identifiers(&[PaperIdentifier::Arxiv("2301.07041".into())])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_doi_uniqueness() {
        let store = MemoryStore::new();
        store.insert(record_with_doi("A", "10.1/dup")).await.unwrap();

        let err = store.insert(record_with_doi("B", "10.1/dup")).await.unwrap_err();
        assert!(err.to_string().contains("duplicate DOI"));
    }

    #[tokio::test]
    async fn test_edges_and_direction_counts() {
        let store = MemoryStore::new();
        let a = store.insert(record_with_doi("A", "10.1/a")).await.unwrap();
        let b = store.insert(record_with_doi("B", "10.1/b")).await.unwrap();
        let c = store.insert(record_with_doi("C", "10.1/c")).await.unwrap();

        store.add_reference(a, b).await.unwrap();
        store.add_reference(a, b).await.unwrap(); // idempotent
        store.add_reference(c, a).await.unwrap();

        assert_eq!(store.reference_count(a, CitationDirection::References).await.unwrap(), 1);
        assert_eq!(store.reference_count(a, CitationDirection::CitedBy).await.unwrap(), 1);
        assert_eq!(store.reference_count(b, CitationDirection::CitedBy).await.unwrap(), 1);
        assert_eq!(store.edge_count().await, 2);

        assert!(store.add_reference(a, a).await.is_err());
    }

    #[tokio::test]
    async fn test_hub_get_or_create() {
        let store = MemoryStore::new();
        let first = store.get_or_create_hub("Computer Science").await.unwrap();
        let second = store.get_or_create_hub("computer science").await.unwrap();
        assert_eq!(first, second);

        let paper = store.insert(record_with_doi("A", "10.1/a")).await.unwrap();
        store.attach_hubs(paper, &[first]).await.unwrap();
        store.attach_hubs(paper, &[second]).await.unwrap();
        assert_eq!(store.hubs_for(paper).await, vec!["computer science"]);
    }
}
