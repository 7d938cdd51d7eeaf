//! Node entry point.

use clap::Parser;
use node::service::NodeService;
use std::net::SocketAddr;

/// Ring node: stores a partition of the records and answers queries.
#[derive(Parser, Debug)]
#[command(name = "node")]
struct Args {
    /// Address to receive on; port 0 picks a free port.
    #[arg(long, default_value = "127.0.0.1:0")]
    listen: SocketAddr,

    /// Coordinator address to register with.
    #[arg(long, default_value = "127.0.0.1:5000")]
    coordinator: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let service = NodeService::register(args.listen, args.coordinator).await?;
    service.run().await
}
