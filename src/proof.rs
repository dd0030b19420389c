//! Proof-of-work search and verification
//!
//! Block creation is throttled by a nonce-search puzzle: find a `proof`
//! whose digest, together with the previous proof and the previous block's
//! hash, starts with [`DIFFICULTY`] zero characters. Finding a proof is
//! costly; checking one is a single hash.

use sha2::{Digest, Sha256};

use crate::hashing::hash_block;
use crate::ledger::Block;

/// Number of leading `'0'` hex characters a valid proof digest must carry.
///
/// Consensus-critical: the miner and every validator must apply the exact
/// same predicate, so this is a compile-time constant rather than
/// configuration.
pub const DIFFICULTY: usize = 4;

/// Search for the next proof by brute force, starting from zero.
///
/// CPU-bound with an unbounded worst case. Callers that need to stay
/// responsive must run this on a dedicated worker (the HTTP layer uses
/// `tokio::task::spawn_blocking`).
pub fn proof_of_work(last_block: &Block) -> u64 {
    let last_hash = hash_block(last_block);

    let mut proof = 0u64;
    while !valid_proof(last_block.proof, proof, &last_hash) {
        proof += 1;
    }
    proof
}

/// Does `proof` satisfy the difficulty predicate against the previous
/// block's proof and hash?
///
/// The guess is the plain decimal concatenation of the three values; its
/// SHA-256 hex digest must lead with [`DIFFICULTY`] zeros. Chain validation
/// reuses this predicate unchanged.
pub fn valid_proof(last_proof: u64, proof: u64, last_hash: &str) -> bool {
    let guess = format!("{last_proof}{proof}{last_hash}");
    let digest = hex::encode(Sha256::digest(guess.as_bytes()));

    digest.bytes().take(DIFFICULTY).all(|b| b == b'0')
}
