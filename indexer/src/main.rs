use anyhow::Result;
use citesearch_core::{CorpusSource, EngineConfig, IndexSnapshot, LoadPolicy};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the citation-ranked index over a corpus and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CorpusArgs {
    /// Corpus path (file or directory of .txt/.html/.json/.jsonl files)
    #[arg(long)]
    corpus: PathBuf,
    /// Engine configuration as JSON; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Abort on the first unreadable document instead of skipping it
    #[arg(long, default_value_t = false)]
    fail_fast: bool,
    /// Override the PageRank damping factor
    #[arg(long)]
    damping: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and print its statistics
    Build {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// How many of the highest-authority documents to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Run a ranked full-text query
    Search {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(long)]
        query: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// List completions for a prefix
    Suggest {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(long)]
        prefix: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[derive(Serialize)]
struct AuthorityRow<'a> {
    doc_id: u32,
    title: &'a str,
    url: &'a str,
    authority: f64,
    cited_by: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { corpus, top } => {
            let snap = build(&corpus)?;
            println!("{}", serde_json::to_string_pretty(&snap.stats())?);
            let rows: Vec<AuthorityRow> = snap
                .authority()
                .top(top)
                .into_iter()
                .filter_map(|(id, authority)| {
                    let doc = snap.document(id)?;
                    Some(AuthorityRow { doc_id: id, title: &doc.title, url: &doc.url, authority, cited_by: snap.graph().in_degree(id) })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Commands::Search { corpus, query, k } => {
            let snap = build(&corpus)?;
            let page = snap.search_page(&query, k);
            if page.hits.is_empty() {
                println!("No results found.");
            }
            for (rank, hit) in page.hits.iter().enumerate() {
                println!("[{}] {} ({})", rank + 1, hit.title, hit.url);
                println!("    score {:.4} = relevance {:.4} with authority {:.4}", hit.score, hit.relevance, hit.authority);
                println!("    {}", hit.snippet.marked("[", "]"));
            }
            tracing::info!(total_hits = page.total_hits, shown = page.hits.len(), "search done");
        }
        Commands::Suggest { corpus, prefix, limit } => {
            let snap = build(&corpus)?;
            let suggestions = snap.autocomplete(&prefix, limit);
            if suggestions.is_empty() {
                println!("No suggestions found.");
            } else {
                println!("{}", suggestions.join(", "));
            }
        }
    }
    Ok(())
}

fn build(args: &CorpusArgs) -> Result<IndexSnapshot> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if args.fail_fast {
        config.load.policy = LoadPolicy::FailFast;
    }
    if let Some(d) = args.damping {
        config.pagerank.damping = d;
    }
    let snap = IndexSnapshot::build(CorpusSource::Directory(args.corpus.clone()), config)?;
    Ok(snap)
}
