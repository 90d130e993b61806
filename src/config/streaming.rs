//! Push channel configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Push channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Open the push channel at startup
    pub enabled: bool,
    /// WebSocket path below the backend base URL; the scheme follows it
    /// (`http` opens `ws`, `https` opens `wss`)
    pub path: String,
    /// Timeout for the opening handshake (not for the channel's lifetime)
    pub connect_timeout_seconds: u64,
    /// Largest inbound message accepted; a bigger one fails the channel
    pub max_message_bytes: usize,
    pub reconnect: ReconnectConfig,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/ws/dashboard".to_string(),
            connect_timeout_seconds: 10,
            max_message_bytes: 1024 * 1024,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl StreamingConfig {
    /// Non-empty path segments of the stream path.
    pub fn path_segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// Automatic reconnection after the channel drops.
///
/// With `enabled = false` a dropped channel stays down until the operator
/// asks for a retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub enabled: bool,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Reconnect attempts before giving up
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            max_attempts: 5,
        }
    }
}

impl ReconnectConfig {
    /// Delay before reconnect `attempt` (1-based): doubles each time, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }
}
