use anyhow::Result;
use axum::Router;
use citesearch_core::EngineConfig;
use citesearch_server::build_app;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus directory to index at startup
    #[arg(long, default_value = "./data")]
    corpus: PathBuf,
    /// Engine configuration as JSON; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let corpus = args.corpus.clone();
    let app: Router = tokio::task::spawn_blocking(move || build_app(corpus, config)).await??;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, corpus = %args.corpus.display(), "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
