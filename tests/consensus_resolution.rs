//! Integration tests for longest-chain consensus resolution
//!
//! Each scenario runs a real peer node behind `axum::serve` on an
//! ephemeral port and drives the local node through its HTTP boundary, so
//! the whole replication path (wire format included) is exercised.

use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use regchain::api::{build_api_router, Node};
use regchain::hashing::hash_block;
use regchain::proof::proof_of_work;

/// Mine `blocks` valid blocks on top of the node's genesis.
async fn extend_with_mined_blocks(node: &Node, blocks: usize) {
    let mut ledger = node.ledger.write().await;
    for _ in 0..blocks {
        let last = ledger.last_block().unwrap().clone();
        let proof = proof_of_work(&last);
        ledger.new_block(proof, hash_block(&last));
    }
}

/// Serve a node on an ephemeral local port; returns its base URL.
async fn spawn_peer(node: Arc<Node>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral port");
    let addr = listener.local_addr().expect("Failed to read local addr");

    let app = build_api_router(node);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("peer server failed");
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_longer_valid_peer_chain_is_adopted() {
    // Peer B: 5 blocks, all valid.
    let peer = Arc::new(Node::new());
    extend_with_mined_blocks(&peer, 4).await;
    let peer_url = spawn_peer(peer.clone()).await;

    // Local node A: 2 blocks, knows B, and has a registration in flight.
    let local = Arc::new(Node::new());
    extend_with_mined_blocks(&local, 1).await;
    let server = TestServer::new(build_api_router(local.clone())).unwrap();

    server
        .post("/registrations/new")
        .form(&json!({ "name": "a", "type": "b", "price": 1, "details": "c" }))
        .await;
    server
        .post("/nodes/register")
        .json(&json!({ "nodes": [peer_url] }))
        .await;

    let response = server.get("/nodes/resolve").await;
    assert_eq!(response.status_code(), 200);
    let resolved: Value = response.json();
    assert_eq!(resolved["message"], "Our chain was replaced");
    assert_eq!(resolved["replaced"], true);
    assert_eq!(resolved["length"], 5);

    // A's chain is now exactly B's chain.
    let peer_ledger = peer.ledger.read().await;
    let local_ledger = local.ledger.read().await;
    assert_eq!(local_ledger.chain(), peer_ledger.chain());

    // Replacement does not touch the pending pool.
    assert_eq!(local_ledger.pending().len(), 1);
}

#[tokio::test]
async fn test_tampered_peer_chain_is_rejected() {
    // Peer B: 5 blocks, but block 3 links to a forged previous hash.
    let peer = Arc::new(Node::new());
    {
        let mut ledger = peer.ledger.write().await;

        let last = ledger.last_block().unwrap().clone();
        ledger.new_block(proof_of_work(&last), hash_block(&last));

        let last = ledger.last_block().unwrap().clone();
        ledger.new_block(proof_of_work(&last), "0".repeat(64));

        for _ in 0..2 {
            let last = ledger.last_block().unwrap().clone();
            ledger.new_block(proof_of_work(&last), hash_block(&last));
        }
    }
    let peer_url = spawn_peer(peer).await;

    let local = Arc::new(Node::new());
    extend_with_mined_blocks(&local, 1).await;
    let server = TestServer::new(build_api_router(local.clone())).unwrap();

    server
        .post("/nodes/register")
        .json(&json!({ "nodes": [peer_url] }))
        .await;

    let before = local.ledger.read().await.chain().to_vec();

    let resolved: Value = server.get("/nodes/resolve").await.json();
    assert_eq!(resolved["message"], "Our chain is authoritative");
    assert_eq!(resolved["replaced"], false);

    // The local chain is untouched.
    assert_eq!(local.ledger.read().await.chain(), &before[..]);
}

#[tokio::test]
async fn test_equal_length_peer_chain_does_not_replace() {
    let peer = Arc::new(Node::new());
    extend_with_mined_blocks(&peer, 1).await;
    let peer_url = spawn_peer(peer).await;

    let local = Arc::new(Node::new());
    extend_with_mined_blocks(&local, 1).await;
    let server = TestServer::new(build_api_router(local.clone())).unwrap();

    server
        .post("/nodes/register")
        .json(&json!({ "nodes": [peer_url] }))
        .await;

    let resolved: Value = server.get("/nodes/resolve").await.json();
    assert_eq!(resolved["replaced"], false);
    assert_eq!(resolved["length"], 2);
}

#[tokio::test]
async fn test_unreachable_peer_does_not_abort_resolution() {
    // One dead peer and one live, longer peer: resolution must still
    // adopt the live peer's chain.
    let peer = Arc::new(Node::new());
    extend_with_mined_blocks(&peer, 2).await;
    let peer_url = spawn_peer(peer).await;

    let local = Arc::new(Node::new());
    let server = TestServer::new(build_api_router(local.clone())).unwrap();

    server
        .post("/nodes/register")
        .json(&json!({ "nodes": ["http://127.0.0.1:1", peer_url] }))
        .await;

    let resolved: Value = server.get("/nodes/resolve").await.json();
    assert_eq!(resolved["replaced"], true);
    assert_eq!(resolved["length"], 3);
}
