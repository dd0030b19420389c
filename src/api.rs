//! REST API server for RegChain
//!
//! Thin HTTP boundary over the ledger core: mining, registration
//! submission, chain export, peer registration, and consensus resolution.
//! The `GET /chain` response shape doubles as the peer-replication
//! protocol consumed by the consensus resolver.

use axum::{
    extract::{Form, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::consensus::{ChainSnapshot, ConsensusResolver};
use crate::error::ChainError;
use crate::hashing::hash_block;
use crate::ledger::{Ledger, Registration};
use crate::proof::proof_of_work;
use crate::registry::NodeRegistry;

/// Shared node state handed to every handler.
#[derive(Clone)]
pub struct Node {
    pub ledger: Arc<RwLock<Ledger>>,
    pub nodes: Arc<RwLock<NodeRegistry>>,
    pub resolver: Arc<ConsensusResolver>,
}

impl Node {
    /// Create a node with a fresh ledger and an empty peer set.
    pub fn new() -> Self {
        Self::new_shared(
            Arc::new(RwLock::new(Ledger::new())),
            Arc::new(RwLock::new(NodeRegistry::new())),
            Arc::new(ConsensusResolver::new()),
        )
    }

    /// Create an API node over externally owned state. Used by the
    /// orchestrator so the API observes the same in-memory chain and peer
    /// set as everything else.
    pub fn new_shared(
        ledger: Arc<RwLock<Ledger>>,
        nodes: Arc<RwLock<NodeRegistry>>,
        resolver: Arc<ConsensusResolver>,
    ) -> Self {
        Self {
            ledger,
            nodes,
            resolver,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BlockchainError(ChainError),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BlockchainError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::BlockchainError(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct NewRegistrationForm {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    price: f64,
    details: String,
}

#[derive(Serialize)]
struct RegistrationAccepted {
    message: String,
}

#[derive(Serialize)]
struct MineResponse {
    message: &'static str,
    index: u64,
    registrations: Vec<Registration>,
    proof: u64,
    previous_hash: String,
}

#[derive(Deserialize)]
struct RegisterNodesRequest {
    nodes: Vec<String>,
}

#[derive(Serialize)]
struct RegisterNodesResponse {
    message: &'static str,
    total_nodes: Vec<String>,
}

#[derive(Serialize)]
struct ResolveResponse {
    message: &'static str,
    replaced: bool,
    chain: Vec<crate::ledger::Block>,
    length: usize,
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware: method, path, status, duration.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints (for testing)
pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        .route("/mine", get(mine))
        .route("/registrations/new", post(new_registration))
        .route("/chain", get(full_chain))
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve_conflicts))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

/// Run the API server until shutdown.
pub async fn run_api_server(
    node: Arc<Node>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Run the proof-of-work search against the chain tip and seal a new block
/// from the pending pool.
async fn mine(State(node): State<Arc<Node>>) -> Result<Json<MineResponse>, ApiError> {
    let last_block = node.ledger.read().await.last_block()?.clone();

    // The nonce search is CPU-bound with no upper bound; keep it off the
    // async workers and off the ledger lock.
    let (proof, previous_hash) = tokio::task::spawn_blocking(move || {
        let proof = proof_of_work(&last_block);
        (proof, hash_block(&last_block))
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("mining task failed: {e}")))?;

    let block = node.ledger.write().await.new_block(proof, previous_hash);

    Ok(Json(MineResponse {
        message: "New Block Forged",
        index: block.index,
        registrations: block.registrations,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

/// Queue a product registration for the next block. Missing form fields
/// are rejected by the extractor before reaching the ledger.
async fn new_registration(
    State(node): State<Arc<Node>>,
    Form(form): Form<NewRegistrationForm>,
) -> impl IntoResponse {
    let index = node
        .ledger
        .write()
        .await
        .new_registration(form.name, form.kind, form.price, form.details);

    (
        StatusCode::CREATED,
        Json(RegistrationAccepted {
            message: format!("Registration will be added to Block {index}"),
        }),
    )
}

/// Dump the full chain. This response shape is also the wire format peers
/// consume during consensus resolution.
async fn full_chain(State(node): State<Arc<Node>>) -> Json<ChainSnapshot> {
    let ledger = node.ledger.read().await;

    Json(ChainSnapshot {
        chain: ledger.chain().to_vec(),
        length: ledger.len(),
    })
}

/// Register peer nodes by URL. A missing or malformed body is rejected by
/// the extractor; individually malformed URLs are silently skipped.
async fn register_nodes(
    State(node): State<Arc<Node>>,
    Json(request): Json<RegisterNodesRequest>,
) -> impl IntoResponse {
    let mut nodes = node.nodes.write().await;
    for url in &request.nodes {
        nodes.register(url);
    }

    (
        StatusCode::CREATED,
        Json(RegisterNodesResponse {
            message: "New nodes have been added",
            total_nodes: nodes.addresses(),
        }),
    )
}

/// Compare the local chain against all registered peers and adopt the
/// longest valid one.
async fn resolve_conflicts(State(node): State<Arc<Node>>) -> Json<ResolveResponse> {
    let replaced = node.resolver.resolve(&node.ledger, &node.nodes).await;

    let ledger = node.ledger.read().await;
    let message = if replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };

    Json(ResolveResponse {
        message,
        replaced,
        chain: ledger.chain().to_vec(),
        length: ledger.len(),
    })
}
