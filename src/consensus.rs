//! Longest-chain consensus resolution
//!
//! On demand (no background loop), each known peer is asked for its full
//! chain over HTTP. Among the peers whose chain is strictly longer than
//! anything seen so far and passes full validation, the longest one
//! replaces the local chain wholesale. Per-peer failures are absorbed:
//! an unreachable or malformed peer simply contributes no candidate.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ChainError, Result};
use crate::hashing::hash_block;
use crate::ledger::{Block, Ledger};
use crate::proof::valid_proof;
use crate::registry::NodeRegistry;

const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Wire format of a node's chain: what `GET /chain` serves locally and
/// what peers are expected to return. A response that does not match this
/// schema is treated like an unreachable peer.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

/// Is every adjacent block pair correctly hash-linked and proof-backed?
///
/// Fails if any block's `previous_hash` differs from the canonical hash of
/// its predecessor, or if its proof does not satisfy the shared difficulty
/// predicate against that predecessor. Chains of length 0 or 1 are
/// trivially valid.
pub fn valid_chain(chain: &[Block]) -> bool {
    for pair in chain.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);
        let last_hash = hash_block(previous);

        if block.previous_hash != last_hash {
            return false;
        }
        if !valid_proof(previous.proof, block.proof, &last_hash) {
            return false;
        }
    }
    true
}

/// Fetches chains from peers and adopts the longest valid one.
pub struct ConsensusResolver {
    client: reqwest::Client,
}

impl ConsensusResolver {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_PEER_TIMEOUT)
    }

    /// Build a resolver whose peer requests are bounded by `timeout`, so
    /// resolution cannot hang on an unresponsive peer.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("default reqwest client configuration is valid");

        ConsensusResolver { client }
    }

    /// Fetch one peer's chain snapshot.
    ///
    /// A snapshot whose reported `length` disagrees with the number of
    /// blocks actually sent is rejected as malformed.
    pub async fn fetch_chain(&self, address: &str) -> Result<ChainSnapshot> {
        let url = format!("http://{address}/chain");
        let snapshot: ChainSnapshot = self.client.get(&url).send().await?.json().await?;

        if snapshot.length != snapshot.chain.len() {
            return Err(ChainError::MalformedPeerResponse(format!(
                "peer {address} reported length {} but sent {} blocks",
                snapshot.length,
                snapshot.chain.len()
            )));
        }

        Ok(snapshot)
    }

    /// Resolve conflicts against all registered peers.
    ///
    /// Returns `true` when the local chain was replaced by a strictly
    /// longer valid peer chain, `false` when the local chain stays
    /// authoritative. Replacement is whole-chain substitution under a
    /// single write-lock acquisition; no partial state is observable.
    pub async fn resolve(
        &self,
        ledger: &RwLock<Ledger>,
        registry: &RwLock<NodeRegistry>,
    ) -> bool {
        let peers = registry.read().await.addresses();
        let mut max_length = ledger.read().await.len();
        let mut best: Option<Vec<Block>> = None;

        for address in peers {
            let snapshot = match self.fetch_chain(&address).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(peer = %address, error = %err, "skipping peer");
                    continue;
                }
            };

            // Strict > : ties never replace.
            if snapshot.length > max_length && valid_chain(&snapshot.chain) {
                max_length = snapshot.length;
                best = Some(snapshot.chain);
                debug!(peer = %address, length = max_length, "new best candidate chain");
            }
        }

        if let Some(chain) = best {
            let mut ledger = ledger.write().await;
            // Local mining may have extended the chain while we were
            // fetching; re-check superiority before substituting.
            if chain.len() > ledger.len() {
                info!(length = chain.len(), "replacing local chain");
                ledger.replace_chain(chain);
                return true;
            }
        }

        false
    }
}

impl Default for ConsensusResolver {
    fn default() -> Self {
        Self::new()
    }
}
