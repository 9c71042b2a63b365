//! Reconciliation of one reference list against the store.
//!
//! Hits are linked immediately; misses go through the fallback chain and
//! the created records are linked the same way.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::PipelineResult;
use crate::models::{CitationDirection, PaperId, RawReference};
use crate::store::PaperStore;

use super::fallback::FallbackResolver;
use super::{DirectionReport, extract_identifiers};

/// Link one direction's reference list: existing papers directly, missing
/// ones after creation via the fallback chain.
pub(crate) async fn link_or_create(
    store: &Arc<dyn PaperStore>,
    resolver: &FallbackResolver,
    paper: PaperId,
    direction: CitationDirection,
    refs: &[RawReference],
) -> PipelineResult<DirectionReport> {
    let batch = extract_identifiers(refs);
    let mut report = DirectionReport::new(direction, batch.len());

    let existing = store.find_by_identifiers(&batch.identifiers()).await?;

    let mut doi_hits: BTreeSet<String> = BTreeSet::new();
    let mut arxiv_hits: BTreeSet<String> = BTreeSet::new();

    for (existing_id, record) in &existing {
        if let Some(ref doi) = record.doi {
            doi_hits.insert(doi.clone());
        }
        if let Some(ref arxiv) = record.arxiv_id {
            arxiv_hits.insert(arxiv.clone());
        }

        if *existing_id == paper {
            // A paper can show up in its own reference list when the
            // provider echoes the seed identifier back.
            continue;
        }
        link(store, paper, *existing_id, direction).await?;
        report.linked_existing += 1;
    }

    for doi in batch.dois.difference(&doi_hits) {
        match resolver.create_from_doi(doi).await? {
            Some(created) => {
                link(store, paper, created, direction).await?;
                report.created += 1;
            }
            None => report.failed += 1,
        }
    }

    for arxiv_id in batch.arxiv_ids.difference(&arxiv_hits) {
        match resolver.create_from_arxiv(arxiv_id).await? {
            Some(created) => {
                link(store, paper, created, direction).await?;
                report.created += 1;
            }
            None => report.failed += 1,
        }
    }

    tracing::info!(
        paper = %paper,
        direction = %direction,
        linked = report.linked_existing,
        created = report.created,
        failed = report.failed,
        "direction reconciled"
    );

    Ok(report)
}

/// Add the direction-aware edge: forward edges point from the originating
/// paper to the referenced one, backward edges from the citing paper in.
async fn link(
    store: &Arc<dyn PaperStore>,
    paper: PaperId,
    other: PaperId,
    direction: CitationDirection,
) -> PipelineResult<()> {
    match direction {
        CitationDirection::References => store.add_reference(paper, other).await,
        CitationDirection::CitedBy => store.add_reference(other, paper).await,
    }
}
