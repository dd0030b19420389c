//! Ledger core: registrations, blocks, and the chain
//!
//! The [`Ledger`] owns the only two pieces of mutable state in the system:
//! the chain of sealed blocks and the pool of registrations waiting to be
//! sealed. History is append-only; a sealed block is never mutated.

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, Result};

/// Proof carried by the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// Sentinel `previous_hash` of the genesis block, distinct from any real
/// 64-character digest.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// One product registration. Immutable once created; it lives in the
/// pending pool until sealed into a block, then inside that block forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: f64,
    pub details: String,
}

/// One immutable, hash-linked unit of the ledger.
///
/// `index` is 1-based and equals the block's position in the chain;
/// `previous_hash` of block N is the canonical hash of block N-1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Seconds since the Unix epoch, non-decreasing along the chain.
    pub timestamp: u64,
    /// The pending pool at seal time, insertion order preserved.
    pub registrations: Vec<Registration>,
    pub proof: u64,
    pub previous_hash: String,
}

/// The chain and the pending-registration pool.
///
/// Construct once at startup and pass a handle to whoever needs it; all
/// mutation goes through `&mut self`, so wrapping in a single lock
/// serializes writers (see the API layer).
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Registration>,
}

impl Ledger {
    /// Create a ledger whose chain holds only the genesis block.
    pub fn new() -> Self {
        let mut ledger = Ledger {
            chain: Vec::new(),
            pending: Vec::new(),
        };
        ledger.new_block(GENESIS_PROOF, GENESIS_PREVIOUS_HASH.to_string());
        ledger
    }

    /// Queue a registration for the next block; returns the index of the
    /// block that will contain it.
    ///
    /// Field contents are not validated here; the boundary rejects
    /// incomplete input before it reaches the core.
    pub fn new_registration(
        &mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        price: f64,
        details: impl Into<String>,
    ) -> u64 {
        self.pending.push(Registration {
            name: name.into(),
            kind: kind.into(),
            price,
            details: details.into(),
        });

        self.chain.len() as u64 + 1
    }

    /// Seal a new block from the current pending pool, append it to the
    /// chain, and clear the pool.
    ///
    /// `previous_hash` is supplied by the caller and trusted; for chain
    /// integrity it must equal `hash_block(last_block)`. The `/mine`
    /// handler always derives it that way.
    pub fn new_block(&mut self, proof: u64, previous_hash: String) -> Block {
        let block = Block {
            index: self.chain.len() as u64 + 1,
            timestamp: chrono::Utc::now().timestamp() as u64,
            registrations: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };

        self.chain.push(block.clone());
        block
    }

    /// The most recently sealed block.
    pub fn last_block(&self) -> Result<&Block> {
        self.chain.last().ok_or(ChainError::EmptyChain)
    }

    /// Replace the whole chain with a longer valid one found during
    /// consensus resolution. Never a partial merge.
    pub fn replace_chain(&mut self, chain: Vec<Block>) {
        self.chain = chain;
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Registrations accepted but not yet sealed into a block.
    pub fn pending(&self) -> &[Registration] {
        &self.pending
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
