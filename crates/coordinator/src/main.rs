//! Coordinator entry point.

use clap::Parser;
use coordinator::service::CoordinatorService;
use coordinator::{source, Coordinator};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Membership coordinator for the record ring.
#[derive(Parser, Debug)]
#[command(name = "coordinator")]
struct Args {
    /// Address to listen on for node traffic.
    #[arg(long, default_value = "127.0.0.1:5000")]
    listen: SocketAddr,

    /// JSON-lines file of records to distribute (one object per line).
    #[arg(long)]
    records: Option<PathBuf>,

    /// Field of each record object that supplies its key.
    #[arg(long, default_value = "key")]
    key_field: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let records = match &args.records {
        Some(path) => source::load_records(path, &args.key_field)?,
        None => Vec::new(),
    };

    let service = CoordinatorService::bind(args.listen, Coordinator::new(records)).await?;
    service.run().await
}
