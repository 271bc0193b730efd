// Sight Map - Dataset Server
// Serves a JSON or CSV dataset at GET /sights for the viewer to fetch

use anyhow::{Context, Result};
use clap::Parser;
use sight_map::{api, load_records, logging};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sight-server", version, about = "Serve a records dataset over HTTP")]
struct Args {
    /// Dataset file (.json array or .csv with a header row)
    #[arg(long, env = "SIGHT_MAP_DATASET", default_value = "data/sights.json")]
    dataset: PathBuf,

    /// Listen address
    #[arg(long, default_value = "127.0.0.1:5000")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_stderr();
    let args = Args::parse();

    let records = load_records(&args.dataset)
        .with_context(|| format!("Failed to load dataset {}", args.dataset.display()))?;
    tracing::info!(count = records.len(), dataset = %args.dataset.display(), "dataset loaded");

    let app = api::router(records);

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.addr))?;

    tracing::info!(addr = %args.addr, "serving /sights");
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
