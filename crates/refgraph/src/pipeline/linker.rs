//! The graph-linking entry point.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{CitationDirection, PaperId};
use crate::providers::{ArxivClient, CrossrefClient, CslClient, SemanticScholarClient};
use crate::store::PaperStore;

use super::fallback::FallbackResolver;
use super::{ResolutionReport, reconcile};

/// Builds the citation graph around papers in the store.
pub struct ReferencePipeline {
    store: Arc<dyn PaperStore>,
    semantic_scholar: SemanticScholarClient,
    resolver: FallbackResolver,
}

impl ReferencePipeline {
    /// Wire up the pipeline: provider clients from `config`, records in
    /// `store`.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config, store: Arc<dyn PaperStore>) -> anyhow::Result<Self> {
        let semantic_scholar = SemanticScholarClient::new(config)?;
        let resolver = FallbackResolver::new(
            Arc::clone(&store),
            semantic_scholar.clone(),
            CrossrefClient::new(config)?,
            CslClient::new(config)?,
            ArxivClient::new(config)?,
        );

        Ok(Self { store, semantic_scholar, resolver })
    }

    /// Resolve and link both reference directions for a stored paper.
    ///
    /// The paper's DOI (or, failing that, its arXiv ID) seeds the provider
    /// lookup. A direction that already has edges is skipped: the graph
    /// for that side was built before and re-running must not duplicate
    /// the provider traffic.
    ///
    /// # Errors
    ///
    /// Returns error when the paper is unknown, carries no identifier, or
    /// the store fails. Provider failures for individual references are
    /// absorbed into the report instead.
    pub async fn add_references(&self, paper: PaperId) -> PipelineResult<ResolutionReport> {
        let record = self
            .store
            .get(paper)
            .await?
            .ok_or_else(|| PipelineError::validation("paper", format!("unknown paper: {paper}")))?;

        let seed = record.seed_identifier().ok_or_else(|| {
            PipelineError::validation("paper", "paper has neither DOI nor arXiv ID")
        })?;

        let mut report = ResolutionReport::new(paper);

        for direction in [CitationDirection::References, CitationDirection::CitedBy] {
            if self.store.reference_count(paper, direction).await? > 0 {
                tracing::debug!(paper = %paper, direction = %direction, "already linked, skipping");
                report.skipped.push(direction);
                continue;
            }

            let refs = match direction {
                CitationDirection::References => self.semantic_scholar.all_references(&seed).await,
                CitationDirection::CitedBy => self.semantic_scholar.all_citations(&seed).await,
            };

            match refs {
                Ok(refs) => {
                    let direction_report = reconcile::link_or_create(
                        &self.store,
                        &self.resolver,
                        paper,
                        direction,
                        &refs,
                    )
                    .await?;
                    report.directions.push(direction_report);
                }
                Err(err) => {
                    // Best effort: a dead provider for one direction must
                    // not undo the other direction's progress.
                    tracing::warn!(
                        paper = %paper,
                        direction = %direction,
                        error = %err,
                        "reference list fetch failed"
                    );
                    report.fetch_failures.push(direction);
                }
            }
        }

        Ok(report)
    }

    /// Run the fallback chain for a bare DOI and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns error on store failure or when every provider failed.
    pub async fn fetch_doi(&self, doi: &str) -> PipelineResult<PaperId> {
        self.resolver
            .create_from_doi(doi)
            .await?
            .ok_or_else(|| PipelineError::exhausted(doi.to_string()))
    }
}

impl std::fmt::Debug for ReferencePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferencePipeline").finish()
    }
}
