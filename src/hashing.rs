//! Canonical block hashing
//!
//! Every place that needs a block digest (chain linkage, the proof-of-work
//! challenge, chain validation) goes through [`hash_block`] so that all
//! nodes agree byte-for-byte on what is being hashed.

use sha2::{Digest, Sha256};

use crate::ledger::Block;

/// Hex-encoded SHA-256 digest of a block's canonical JSON form.
///
/// The block is first converted to a `serde_json::Value`; its object
/// representation keeps keys sorted, so the byte stream is independent of
/// struct field order and identical across nodes. The result is always a
/// lowercase 64-character hex string.
pub fn hash_block(block: &Block) -> String {
    let canonical = serde_json::to_value(block)
        .expect("a block contains only JSON-representable fields")
        .to_string();

    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;

    #[test]
    fn hash_is_64_lowercase_hex_chars() {
        let ledger = Ledger::new();
        let hash = hash_block(ledger.last_block().unwrap());

        assert_eq!(hash.len(), 64);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn hash_is_deterministic() {
        let ledger = Ledger::new();
        let block = ledger.last_block().unwrap();

        assert_eq!(hash_block(block), hash_block(block));
    }

    #[test]
    fn hash_depends_on_contents() {
        let mut ledger = Ledger::new();
        let genesis_hash = hash_block(ledger.last_block().unwrap());

        ledger.new_registration("a", "b", 1.0, "c");
        let sealed = ledger.new_block(123, "abc".to_string());

        assert_ne!(genesis_hash, hash_block(&sealed));
    }
}
