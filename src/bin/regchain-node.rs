#![forbid(unsafe_code)]
//! RegChain node entry point: serves the ledger API on the configured port.

use clap::Parser;

use regchain::config::load_config;
use regchain::node::Node;

#[derive(Parser)]
#[command(name = "regchain-node", about = "Run a RegChain ledger node")]
struct Args {
    /// Port to listen on (overrides config.toml)
    #[arg(short, long)]
    port: Option<u16>,

    /// Peer node URL to register at startup (repeatable)
    #[arg(long = "peer")]
    peers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config()?;
    if let Some(port) = args.port {
        config.network.api_port = port;
    }
    config.network.bootstrap_peers.extend(args.peers);

    let node = Node::init(config).await;
    node.start().await
}
