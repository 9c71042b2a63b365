//! refgraph - Entry Point
//!
//! CLI driver over the reference-resolution pipeline: builds citation
//! graphs, runs the provider fallback chain, and probes seed URLs.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use refgraph::models::{PaperIdentifier, PaperRecord};
use refgraph::store::PaperStore;
use refgraph::{Config, MemoryStore, MetadataRetriever, ReferencePipeline};

#[derive(Parser, Debug)]
#[command(name = "refgraph")]
#[command(about = "Resolve paper metadata and build citation graphs")]
#[command(version)]
struct Cli {
    /// Semantic Scholar API key (optional, enables higher rate limits)
    #[arg(long, env = "SEMANTIC_SCHOLAR_API_KEY")]
    api_key: Option<String>,

    /// Contact address for Crossref polite-pool access
    #[arg(long, env = "CROSSREF_MAILTO")]
    mailto: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Build the citation graph around a DOI or arXiv ID
    Graph {
        /// DOI (10....) or arXiv ID (arXiv:...)
        identifier: String,
    },
    /// Run the provider fallback chain for one DOI
    Fetch {
        /// DOI to resolve
        doi: String,
    },
    /// Run the URL retrieval chain for a seed URL
    Probe {
        /// Landing page or PDF URL
        url: String,

        /// Title hint for bibliographic queries
        #[arg(long)]
        title: Option<String>,
    },
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let mut config = Config::new(cli.api_key);
    if let Some(mailto) = cli.mailto {
        config.crossref_mailto = mailto;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting refgraph");

    let store = Arc::new(MemoryStore::new());

    match cli.command {
        Command::Graph { identifier } => {
            let id = PaperIdentifier::parse(&identifier)
                .ok_or_else(|| anyhow::anyhow!("not a DOI or arXiv ID: {identifier}"))?;

            let pipeline = ReferencePipeline::new(&config, store.clone())?;

            let mut record = PaperRecord::new(id.to_string());
            match &id {
                PaperIdentifier::Doi(doi) => record.set_doi(doi),
                PaperIdentifier::Arxiv(arxiv) => record.arxiv_id = Some(arxiv.clone()),
            }
            let paper = store.insert(record).await?;

            let report = pipeline.add_references(paper).await?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            println!(
                "store now holds {} papers and {} citation edges",
                store.paper_count().await,
                store.edge_count().await
            );
        }
        Command::Fetch { doi } => {
            let pipeline = ReferencePipeline::new(&config, store.clone())?;
            let paper = pipeline.fetch_doi(&doi).await?;

            let record = store
                .get(paper)
                .await?
                .ok_or_else(|| anyhow::anyhow!("record vanished from store"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            let hubs = store.hubs_for(paper).await;
            if !hubs.is_empty() {
                println!("hubs: {}", hubs.join(", "));
            }
        }
        Command::Probe { url, title } => {
            let retriever = MetadataRetriever::new(&config, store.clone())?;

            let mut record = PaperRecord::new(title.unwrap_or_default());
            record.url = Some(url);
            let paper = store.insert(record).await?;

            match retriever.populate_from_url(paper).await? {
                Some(method) => {
                    println!("resolved via {method}");
                    let record = store
                        .get(paper)
                        .await?
                        .ok_or_else(|| anyhow::anyhow!("record vanished from store"))?;
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
                None => {
                    println!("no retrieval method succeeded");
                    for (_, method) in store.attempts().await {
                        println!("attempted: {method}");
                    }
                }
            }
        }
    }

    Ok(())
}
