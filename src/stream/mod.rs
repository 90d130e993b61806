//! Push channel to the backend's dashboard WebSocket.
//!
//! [`StreamingClient`] keeps a long-lived WebSocket open on a background task.
//! The socket URL is the backend base URL with its scheme swapped to `ws` or
//! `wss` and the configured path appended. Inbound envelopes only ever reach the rest of the console
//! as [`StateStore`] writes; the channel task never renders anything.
//!
//! ## State machine
//!
//! ```text
//! Disconnected --start()--> Connecting --open--> Connected
//!      ^                        |                    |
//!      |                     error               close/error
//!      |                        v                    v
//!      +---- attempts out -- Reconnecting{n} <-------+
//! ```
//!
//! With reconnection disabled a close or error lands directly in
//! `Disconnected`, and only another [`StreamingClient::start`] reopens it.

mod frames;

pub use frames::payloads;

use crate::client::{ClientError, MetricsSnapshot, RiskApiClient};
use crate::config::StreamingConfig;
use crate::state::{ConnectionState, Notice, StateStore};
use chrono::Utc;
use futures_util::StreamExt;
use reqwest::Url;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Inbound message wrapper: `{"type": ..., "data": ...}`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// How one connection pass ended.
#[derive(Debug)]
enum ChannelEnd {
    Closed,
    Failed(String),
}

/// Client for the backend's push-update stream.
///
/// Cloning is cheap; clones share the dropped-message counter and the
/// cancellation token.
#[derive(Clone)]
pub struct StreamingClient {
    url: Url,
    config: StreamingConfig,
    store: Arc<StateStore>,
    cancel: CancellationToken,
    dropped: Arc<AtomicU64>,
}

impl StreamingClient {
    /// Build a streaming client against `api`'s base URL.
    pub fn new(
        api: &RiskApiClient,
        config: StreamingConfig,
        store: Arc<StateStore>,
        cancel: CancellationToken,
    ) -> Result<Self, ClientError> {
        let url = socket_url(api.endpoint(&config.path_segments())?)?;
        Ok(Self {
            url,
            config,
            store,
            cancel,
            dropped: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Open the channel on a background task.
    ///
    /// Returns `None` without doing anything when a channel is already
    /// connecting, connected or backing off.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let claimed = self.store.try_apply(|current| {
            if current.connection.state.is_active() {
                return None;
            }
            let mut next = current.clone();
            next.connection.state = ConnectionState::Connecting;
            Some(next)
        });

        if !claimed {
            debug!("Push channel already active, start ignored");
            return None;
        }

        info!(url = %self.url, "Opening push channel");
        let client = self.clone();
        Some(tokio::spawn(async move { client.run().await }))
    }

    /// Stop any running channel task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Envelopes dropped because they were malformed or of an unknown type.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// The channel opened.
    pub fn on_open(&self) {
        info!(url = %self.url, "Push channel connected");
        self.store.apply(|current| {
            let mut next = current.clone();
            next.connection.state = ConnectionState::Connected;
            next.connection.connected_at = Some(Utc::now());
            next.connection.last_error = None;
            next
        });
    }

    /// The channel closed, gracefully or not.
    pub fn on_close(&self) {
        info!("Push channel disconnected");
        self.store.apply(|current| {
            let mut next = current.clone();
            next.connection.state = ConnectionState::Disconnected;
            next.connection.connected_at = None;
            next
        });
    }

    /// The channel failed. Consumers see `Disconnected` plus the diagnostic.
    pub fn on_error(&self, message: &str) {
        warn!(error = %message, "Push channel failed");
        let message = message.to_string();
        self.store.apply(move |current| {
            let mut next = current.clone();
            next.connection.state = ConnectionState::Disconnected;
            next.connection.connected_at = None;
            next.connection.last_error = Some(message);
            next
        });
    }

    /// Process one inbound envelope.
    ///
    /// `initial` and `update` envelopes replace the live metrics wholesale.
    /// Anything else is counted and dropped; the channel keeps running.
    /// Returns true if new metrics were installed.
    pub fn handle_message(&self, text: &str) -> bool {
        let envelope: Envelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(error = %e, "Dropping unparseable push message");
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        };

        match envelope.kind.as_str() {
            "initial" | "update" => {
                let metrics: MetricsSnapshot = match serde_json::from_value(envelope.data) {
                    Ok(metrics) => metrics,
                    Err(e) => {
                        debug!(kind = %envelope.kind, error = %e, "Dropping push message with invalid metrics");
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        return false;
                    }
                };
                let metrics = Arc::new(metrics);
                self.store.apply(move |current| {
                    let mut next = current.clone();
                    next.metrics = Some(metrics);
                    next.connection.updates_received += 1;
                    next
                });
                true
            }
            other => {
                debug!(kind = other, "Ignoring push message of unknown type");
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    async fn run(self) {
        let reconnect = self.config.reconnect.clone();
        let mut attempt: u32 = 0;

        loop {
            let mut opened = false;
            let end = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Push channel shutting down");
                    self.on_close();
                    return;
                }
                end = self.connect_and_read(&mut opened) => end,
            };

            if opened {
                attempt = 0;
            }
            let error = match end {
                ChannelEnd::Closed => None,
                ChannelEnd::Failed(message) => Some(message),
            };

            if !reconnect.enabled || attempt >= reconnect.max_attempts {
                if reconnect.enabled {
                    warn!(attempts = attempt, "Push channel reconnect attempts exhausted");
                }
                match error {
                    Some(message) => self.on_error(&message),
                    None => self.on_close(),
                }
                if reconnect.enabled {
                    self.store
                        .notify(Notice::warning("Live updates stopped; use retry to reconnect"));
                }
                return;
            }

            attempt += 1;
            let delay = reconnect.backoff(attempt);
            self.enter_reconnecting(attempt, error);
            info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Push channel reconnecting"
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Push channel shutting down");
                    self.on_close();
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            self.store.apply(|current| {
                let mut next = current.clone();
                next.connection.state = ConnectionState::Connecting;
                next
            });
        }
    }

    async fn connect_and_read(&self, opened: &mut bool) -> ChannelEnd {
        let connect_timeout = Duration::from_secs(self.config.connect_timeout_seconds);
        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(self.config.max_message_bytes);
        ws_config.max_frame_size = Some(self.config.max_message_bytes);
        let handshake =
            tokio_tungstenite::connect_async_with_config(self.url.as_str(), Some(ws_config), false);

        // Bounds only the handshake; the socket stays open indefinitely
        let socket = match tokio::time::timeout(connect_timeout, handshake).await {
            Err(_) => {
                return ChannelEnd::Failed(
                    ClientError::Timeout(connect_timeout.as_millis() as u64).to_string(),
                )
            }
            Ok(Err(WsError::Http(response))) => {
                return ChannelEnd::Failed(format!(
                    "stream endpoint returned HTTP {}",
                    response.status().as_u16()
                ))
            }
            Ok(Err(e)) => return ChannelEnd::Failed(format!("connection failed: {}", e)),
            Ok(Ok((socket, _response))) => socket,
        };

        self.on_open();
        *opened = true;

        // Outbound half is unused; the backend only pushes
        let (_sink, inbound) = socket.split();
        let stream = payloads(inbound);
        futures_util::pin_mut!(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(payload) => {
                    self.handle_message(&payload);
                }
                Err(e) => return ChannelEnd::Failed(format!("stream read failed: {}", e)),
            }
        }

        ChannelEnd::Closed
    }

    fn enter_reconnecting(&self, attempt: u32, error: Option<String>) {
        match &error {
            Some(message) => warn!(error = %message, "Push channel failed"),
            None => info!("Push channel closed by backend"),
        }
        self.store.apply(move |current| {
            let mut next = current.clone();
            next.connection.state = ConnectionState::Reconnecting { attempt };
            next.connection.connected_at = None;
            if error.is_some() {
                next.connection.last_error = error;
            }
            next
        });
    }
}

/// Swap an `http`/`https` endpoint onto the matching WebSocket scheme.
fn socket_url(mut url: Url) -> Result<Url, ClientError> {
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ClientError::InvalidRequest(format!(
                "unsupported scheme for push channel: {}",
                other
            )))
        }
    };
    url.set_scheme(scheme).map_err(|_| {
        ClientError::InvalidRequest(format!("cannot use {} as a WebSocket URL", url))
    })?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, ReconnectConfig};

    fn streaming_client(reconnect: bool) -> (StreamingClient, Arc<StateStore>) {
        let api = RiskApiClient::new(BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..BackendConfig::default()
        })
        .unwrap();
        let config = StreamingConfig {
            connect_timeout_seconds: 1,
            reconnect: ReconnectConfig {
                enabled: reconnect,
                initial_backoff_ms: 10,
                max_backoff_ms: 20,
                max_attempts: 2,
            },
            ..StreamingConfig::default()
        };
        let store = Arc::new(StateStore::new());
        let client =
            StreamingClient::new(&api, config, Arc::clone(&store), CancellationToken::new())
                .unwrap();
        (client, store)
    }

    fn state(store: &StateStore) -> ConnectionState {
        store.snapshot().connection.state
    }

    const UPDATE: &str = r#"{"type":"update","data":{"total_drugs":42,"critical_risk_pairs":3,"high_risk_pairs":7,"avg_risk_score":31.5}}"#;

    #[test]
    fn test_url_uses_socket_scheme_and_path() {
        let (client, _) = streaming_client(false);
        assert_eq!(client.url().as_str(), "ws://127.0.0.1:9/ws/dashboard");
    }

    #[test]
    fn test_https_base_maps_to_wss() {
        let url = Url::parse("https://risk.example.org/ws/dashboard").unwrap();
        assert_eq!(
            socket_url(url).unwrap().as_str(),
            "wss://risk.example.org/ws/dashboard"
        );

        let url = Url::parse("ftp://risk.example.org/ws").unwrap();
        assert!(matches!(socket_url(url), Err(ClientError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_start_moves_to_connecting() {
        let (client, store) = streaming_client(false);
        assert_eq!(state(&store), ConnectionState::Disconnected);

        let handle = client.start();
        assert!(handle.is_some());
        assert_eq!(state(&store), ConnectionState::Connecting);
        client.shutdown();
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (client, store) = streaming_client(false);
        let first = client.start();
        let generation = store.snapshot().generation;

        assert!(first.is_some());
        assert!(client.start().is_none());
        assert_eq!(store.snapshot().generation, generation);

        client.on_open();
        assert_eq!(state(&store), ConnectionState::Connected);
        assert!(client.start().is_none());
        assert_eq!(state(&store), ConnectionState::Connected);
        client.shutdown();
    }

    #[test]
    fn test_open_clears_previous_error() {
        let (client, store) = streaming_client(false);
        client.on_error("connection reset");
        assert_eq!(
            store.snapshot().connection.last_error.as_deref(),
            Some("connection reset")
        );

        client.on_open();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.connection.state, ConnectionState::Connected);
        assert!(snapshot.connection.last_error.is_none());
        assert!(snapshot.connection.connected_at.is_some());
    }

    #[test]
    fn test_close_and_error_land_in_disconnected() {
        let (client, store) = streaming_client(false);

        client.on_open();
        client.on_close();
        assert_eq!(state(&store), ConnectionState::Disconnected);
        assert!(store.snapshot().connection.connected_at.is_none());

        client.on_open();
        client.on_error("stream read failed");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.connection.state, ConnectionState::Disconnected);
        assert_eq!(
            snapshot.connection.last_error.as_deref(),
            Some("stream read failed")
        );
    }

    #[test]
    fn test_update_replaces_metrics_wholesale() {
        let (client, store) = streaming_client(false);

        let initial = r#"{"type":"initial","data":{"total_drugs":10,"critical_risk_pairs":1,"high_risk_pairs":2,"avg_risk_score":12.0,"connected_clients":4}}"#;
        assert!(client.handle_message(initial));
        assert_eq!(store.snapshot().metrics.as_ref().unwrap().connected_clients, 4);

        assert!(client.handle_message(UPDATE));
        let snapshot = store.snapshot();
        let metrics = snapshot.metrics.as_ref().unwrap();
        assert_eq!(metrics.total_drugs, 42);
        // Not merged with the previous snapshot
        assert_eq!(metrics.connected_clients, 0);
        assert_eq!(snapshot.connection.updates_received, 2);
    }

    #[test]
    fn test_malformed_and_unknown_messages_dropped() {
        let (client, store) = streaming_client(false);
        assert!(client.handle_message(UPDATE));
        let before = store.snapshot();

        assert!(!client.handle_message("not json"));
        assert!(!client.handle_message(r#"{"type":"heartbeat","data":{}}"#));
        assert!(!client.handle_message(r#"{"type":"update","data":{"total_drugs":"many"}}"#));
        assert!(!client.handle_message(r#"{"data":{}}"#));

        assert_eq!(client.dropped_messages(), 4);
        let after = store.snapshot();
        assert_eq!(after.generation, before.generation);
        assert_eq!(after.metrics, before.metrics);
    }

    #[tokio::test]
    async fn test_cancelled_channel_ends_disconnected() {
        let (client, store) = streaming_client(true);
        client.shutdown();

        let handle = client.start().unwrap();
        handle.await.unwrap();
        assert_eq!(state(&store), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_unreachable_without_reconnect_reports_error() {
        let (client, store) = streaming_client(false);

        let handle = client.start().unwrap();
        handle.await.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.connection.state, ConnectionState::Disconnected);
        assert!(snapshot.connection.last_error.is_some());
    }
}
