//! Shared test utilities for rxwatch integration tests.
//!
//! Provides JSON payload builders for the risk backend, helpers mounting
//! them on a wiremock server, and a scripted dashboard WebSocket server.

#![allow(dead_code)]

use rxwatch::analytics::AnalyticsAggregator;
use rxwatch::client::RiskApiClient;
use rxwatch::config::{AnalyticsConfig, BackendConfig, ReconnectConfig, StreamingConfig};
use rxwatch::interaction::InteractionLoop;
use rxwatch::state::StateStore;
use rxwatch::stream::StreamingClient;
use futures_util::SinkExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Payload Builders
// =============================================================================

/// One `similar_drugs` entry.
pub fn search_result(brand: &str, combined_risk: f64) -> Value {
    json!({
        "target_drug": {"brand_name": brand, "generic_name": brand.to_lowercase()},
        "spelling_similarity": combined_risk,
        "phonetic_similarity": combined_risk,
        "therapeutic_context_risk": 10.0,
        "combined_risk": combined_risk
    })
}

/// The metformin fixture: scores 82, 60, 20 in backend order.
pub fn metformin_results() -> Value {
    json!({
        "similar_drugs": [
            search_result("Metformin ER", 82.0),
            search_result("Metronidazole", 60.0),
            search_result("Methotrexate", 20.0),
        ]
    })
}

pub fn metrics_json(total_drugs: u64) -> Value {
    json!({
        "total_drugs": total_drugs,
        "critical_risk_pairs": 4,
        "high_risk_pairs": 11,
        "avg_risk_score": 37.5,
        "connected_clients": 2,
        "recent_searches": [
            {
                "timestamp": "2024-05-01T10:15:00",
                "drug_name": "metformin",
                "similar_drugs_found": 3,
                "highest_risk": 82.0
            }
        ]
    })
}

pub fn top_risks_json() -> Value {
    json!([
        {"drug1": "Hydroxyzine", "drug2": "Hydralazine", "risk_score": 88.0},
        {"drug1": "Celebrex", "drug2": "Cerebyx", "risk_score": 91.5},
        {"drug1": "Lamictal", "drug2": "Lamisil", "risk_score": 64.0}
    ])
}

pub fn breakdown_json() -> Value {
    json!([
        {"category": "critical", "count": 2},
        {"category": "high", "count": 3},
        {"category": "medium", "count": 5},
        {"category": "low", "count": 10}
    ])
}

/// The three-drug heatmap with one symmetric pair above the threshold.
pub fn heatmap_json() -> Value {
    json!({
        "drug_names": ["A", "B", "C"],
        "risk_matrix": [[0, 80, 10], [80, 0, 30], [10, 30, 0]]
    })
}

pub fn health_json(status: &str) -> Value {
    json!({
        "status": status,
        "metrics": {"drugs_in_database": 250, "total_analyses": 1200}
    })
}

/// A text frame carrying `{"type": kind, "data": data}`.
pub fn envelope(kind: &str, data: Value) -> Message {
    Message::Text(json!({"type": kind, "data": data}).to_string())
}

// =============================================================================
// Dashboard Socket
// =============================================================================

/// Local WebSocket server replaying the same script on every connection,
/// then sending a close frame.
pub struct DashboardSocket {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<String>>>,
}

impl DashboardSocket {
    pub async fn start(script: Vec<Message>) -> Self {
        Self::start_with_delay(script, Duration::ZERO).await
    }

    /// Like [`DashboardSocket::start`], waiting `delay` after each handshake.
    pub async fn start_with_delay(script: Vec<Message>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let paths = Arc::new(Mutex::new(Vec::new()));

        let accepted = Arc::clone(&connections);
        let seen = Arc::clone(&paths);
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                let script = script.clone();
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let record = move |request: &Request, response: Response| {
                        seen.lock().unwrap().push(request.uri().path().to_string());
                        Ok::<Response, ErrorResponse>(response)
                    };
                    let Ok(mut socket) = tokio_tungstenite::accept_hdr_async(tcp, record).await
                    else {
                        return;
                    };
                    tokio::time::sleep(delay).await;
                    for message in script {
                        if socket.send(message).await.is_err() {
                            return;
                        }
                    }
                    let _ = socket.close(None).await;
                });
            }
        });

        Self {
            addr,
            connections,
            paths,
        }
    }

    /// HTTP base URL; the client swaps in the `ws` scheme itself.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Request paths of every completed handshake.
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

// =============================================================================
// Mock Mounting
// =============================================================================

pub async fn mount_json(server: &MockServer, http_method: &str, route: &str, body: Value) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount all four analytics endpoints with the standard fixtures.
pub async fn mount_analytics(server: &MockServer) {
    mount_json(server, "GET", "/api/metrics", metrics_json(250)).await;
    mount_json(server, "GET", "/api/top-risks", top_risks_json()).await;
    mount_json(server, "GET", "/api/risk-breakdown", breakdown_json()).await;
    mount_json(server, "GET", "/api/heatmap", heatmap_json()).await;
}

/// Any search returns the metformin fixture.
pub async fn mount_any_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/search/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metformin_results()))
        .mount(server)
        .await;
}

// =============================================================================
// Component Builders
// =============================================================================

pub fn backend_config(server: &MockServer) -> BackendConfig {
    backend_at(&server.uri())
}

pub fn backend_at(base_url: &str) -> BackendConfig {
    BackendConfig {
        base_url: base_url.to_string(),
        search_timeout_seconds: 5,
        health_timeout_seconds: 2,
        analytics_timeout_seconds: 2,
        seed_timeout_seconds: 5,
    }
}

pub fn api_client(server: &MockServer) -> Arc<RiskApiClient> {
    Arc::new(RiskApiClient::new(backend_config(server)).unwrap())
}

/// Streaming settings with fast, bounded reconnects.
pub fn streaming_config(reconnect: bool, max_attempts: u32) -> StreamingConfig {
    StreamingConfig {
        enabled: true,
        connect_timeout_seconds: 2,
        reconnect: ReconnectConfig {
            enabled: reconnect,
            initial_backoff_ms: 10,
            max_backoff_ms: 40,
            max_attempts,
        },
        ..StreamingConfig::default()
    }
}

/// Push channel client whose socket lives below `base_url`.
pub fn streaming_client(
    base_url: &str,
    store: &Arc<StateStore>,
    config: StreamingConfig,
) -> StreamingClient {
    let api = RiskApiClient::new(backend_at(base_url)).unwrap();
    StreamingClient::new(&api, config, Arc::clone(store), CancellationToken::new()).unwrap()
}

/// Interaction loop against `server` without a push channel.
pub fn interaction(server: &MockServer) -> InteractionLoop {
    build_interaction(server, None)
}

/// Interaction loop against `server`, pushing live metrics from `socket`.
pub fn interaction_with_socket(
    server: &MockServer,
    socket: &DashboardSocket,
    config: StreamingConfig,
) -> InteractionLoop {
    build_interaction(server, Some((socket.base_url(), config)))
}

fn build_interaction(
    server: &MockServer,
    streaming: Option<(String, StreamingConfig)>,
) -> InteractionLoop {
    let store = Arc::new(StateStore::new());
    let client = api_client(server);
    let aggregator = AnalyticsAggregator::new(
        Arc::clone(&client),
        Arc::clone(&store),
        AnalyticsConfig::default(),
    );
    let streaming = streaming.map(|(base_url, config)| streaming_client(&base_url, &store, config));
    InteractionLoop::new(
        store,
        client,
        aggregator,
        streaming,
        vec!["metformin".to_string(), "clonidine".to_string()],
    )
}
