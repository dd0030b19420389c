//! Node orchestrator: builds the shared state and starts the API server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::info;

use crate::api;
use crate::config::Config;
use crate::consensus::ConsensusResolver;
use crate::ledger::Ledger;
use crate::registry::NodeRegistry;

pub struct Node {
    pub config: Config,
    pub api: Arc<api::Node>,
}

impl Node {
    /// Wire up ledger, peer registry, and resolver. The ledger is
    /// constructed exactly once here and handed around by reference; there
    /// is no process-wide singleton.
    pub async fn init(config: Config) -> Self {
        tracing_subscriber::fmt::init();
        info!(port = config.network.api_port, "starting RegChain node");

        let ledger = Arc::new(RwLock::new(Ledger::new()));
        let nodes = Arc::new(RwLock::new(NodeRegistry::new()));
        let resolver = Arc::new(ConsensusResolver::with_timeout(Duration::from_secs(
            config.consensus.peer_timeout_secs,
        )));

        {
            let mut registry = nodes.write().await;
            for peer in &config.network.bootstrap_peers {
                registry.register(peer);
            }
            if !registry.is_empty() {
                info!(peers = registry.len(), "registered bootstrap peers");
            }
        }

        let api = Arc::new(api::Node::new_shared(ledger, nodes, resolver));

        Node { config, api }
    }

    /// Serve the HTTP API until shutdown. The chain and pending pool live
    /// only in process memory; a restart starts over from genesis.
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error>> {
        api::run_api_server(self.api, self.config.network.api_port).await
    }
}
