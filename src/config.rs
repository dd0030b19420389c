//! Configuration management for RegChain

use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Peer URLs registered at startup; consensus has no discovery.
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConsensusConfig {
    #[serde(default = "default_peer_timeout_secs")]
    pub peer_timeout_secs: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            peer_timeout_secs: default_peer_timeout_secs(),
        }
    }
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let config_str = fs::read_to_string("config.toml").unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        // Sane defaults when config.toml is absent
        Config {
            network: NetworkConfig {
                api_port: default_api_port(),
                bootstrap_peers: Vec::new(),
            },
            consensus: ConsensusConfig::default(),
        }
    } else {
        toml::from_str(&config_str)?
    };

    if config.consensus.peer_timeout_secs == 0 {
        return Err("consensus.peer_timeout_secs must be greater than zero".into());
    }

    Ok(config)
}

fn default_api_port() -> u16 {
    5000
}

fn default_peer_timeout_secs() -> u64 {
    5
}
