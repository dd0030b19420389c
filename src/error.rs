//! Error types for RegChain

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// Constructing a [`crate::ledger::Ledger`] always seals the genesis
    /// block, so this only fires if that invariant has been broken.
    #[error("Chain is empty: the genesis block is missing")]
    EmptyChain,
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Malformed peer response: {0}")]
    MalformedPeerResponse(String),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
