//! The reference-resolution pipeline.
//!
//! Flow: extract identifiers from a provider reference list, reconcile
//! them against the store, create misses through the provider fallback
//! chain, and link everything as direction-aware citation edges.

mod extract;
mod fallback;
mod linker;
mod reconcile;

pub use extract::{IdentifierBatch, extract_identifiers};
pub use fallback::FallbackResolver;
pub use linker::ReferencePipeline;

use serde::Serialize;

use crate::models::{CitationDirection, PaperId};

/// Outcome counts for one reconciled direction.
#[derive(Debug, Clone, Serialize)]
pub struct DirectionReport {
    /// Which direction was reconciled.
    pub direction: CitationDirection,

    /// Distinct identifiers in the provider's list.
    pub total_identifiers: usize,

    /// Edges added to papers already in the store.
    pub linked_existing: usize,

    /// Papers created through the fallback chain and linked.
    pub created: usize,

    /// Identifiers skipped because every provider failed.
    pub failed: usize,
}

impl DirectionReport {
    pub(crate) fn new(direction: CitationDirection, total_identifiers: usize) -> Self {
        Self { direction, total_identifiers, linked_existing: 0, created: 0, failed: 0 }
    }
}

/// Outcome of one `add_references` run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    /// The originating paper.
    pub paper: PaperId,

    /// Reports for the directions that were processed.
    pub directions: Vec<DirectionReport>,

    /// Directions skipped because edges already existed.
    pub skipped: Vec<CitationDirection>,

    /// Directions whose reference list could not be fetched at all.
    pub fetch_failures: Vec<CitationDirection>,
}

impl ResolutionReport {
    pub(crate) fn new(paper: PaperId) -> Self {
        Self { paper, directions: Vec::new(), skipped: Vec::new(), fetch_failures: Vec::new() }
    }

    /// Total papers created across directions.
    #[must_use]
    pub fn total_created(&self) -> usize {
        self.directions.iter().map(|d| d.created).sum()
    }

    /// Total edges added across directions.
    #[must_use]
    pub fn total_linked(&self) -> usize {
        self.directions.iter().map(|d| d.linked_existing + d.created).sum()
    }
}
