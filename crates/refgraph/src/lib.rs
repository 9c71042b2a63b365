//! refgraph
//!
//! Reference resolution and citation-graph construction over scholarly
//! metadata providers. Papers are reconciled across Semantic Scholar,
//! Crossref, doi.org CSL resolution, and arXiv, deduplicated by DOI and
//! arXiv ID, and linked into a forward/backward citation graph in a
//! pluggable record store.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use refgraph::{Config, MemoryStore, ReferencePipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(MemoryStore::new());
//!     let pipeline = ReferencePipeline::new(&config, store.clone())?;
//!
//!     let paper = pipeline.fetch_doi("10.1145/1327452.1327492").await?;
//!     let report = pipeline.add_references(paper).await?;
//!     println!("created {} papers", report.total_created());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod store;

pub use config::Config;
pub use error::{ClientError, PipelineError};
pub use pipeline::{ReferencePipeline, ResolutionReport};
pub use retrieval::MetadataRetriever;
pub use store::{MemoryStore, PaperStore};
