//! Peer registry
//!
//! Peers are manually registered URLs; only their network location
//! (`host:port`) is kept, deduplicated. There is no discovery protocol.

use std::collections::HashSet;

use reqwest::Url;
use tracing::warn;

/// The set of known peer network locations.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashSet<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer by URL.
    ///
    /// The URL is normalized to its `host[:port]` network location.
    /// Malformed input never raises: it is logged and ignored.
    /// Re-registering a known peer is a no-op (set semantics).
    pub fn register(&mut self, url: &str) {
        match netloc(url) {
            Some(address) => {
                self.nodes.insert(address);
            }
            None => {
                warn!(url = %url, "ignoring peer URL without a network location");
            }
        }
    }

    /// Network locations of all known peers, in arbitrary order.
    pub fn addresses(&self) -> Vec<String> {
        self.nodes.iter().cloned().collect()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.nodes.contains(address)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Extract `host[:port]` from a URL, if it has one.
fn netloc(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
