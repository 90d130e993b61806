use crate::analytics::AnalyticsCache;
use crate::client::{HealthReport, MetricsSnapshot, SearchResult};
use crate::risk::CategoryFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Maximum notices kept in a snapshot; older ones are dropped first.
pub const MAX_NOTICES: usize = 8;

/// Push channel connection state as seen by consumers.
///
/// A channel error surfaces as `Disconnected` with the diagnostic kept in
/// [`ConnectionStatus::last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Waiting out the backoff before reconnect `attempt` (1-based)
    Reconnecting { attempt: u32 },
}

impl ConnectionState {
    /// True while a channel task owns the connection (open, opening or backing off).
    pub fn is_active(&self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("Disconnected"),
            ConnectionState::Connecting => f.write_str("Connecting"),
            ConnectionState::Connected => f.write_str("Connected"),
            ConnectionState::Reconnecting { attempt } => write!(f, "Reconnecting (attempt {})", attempt),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Most recent channel failure, cleared when the channel opens
    pub last_error: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    /// Envelopes installed since the process started
    pub updates_received: u64,
}

/// Results of the most recent accepted search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: Option<String>,
    pub results: Arc<Vec<SearchResult>>,
    /// Request tag of the installed results; older responses are discarded
    pub sequence: u64,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible, non-fatal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Immutable view of everything the dashboard shows at one instant.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    /// Bumped by the store on every installed write
    pub generation: u64,
    pub connection: ConnectionStatus,
    /// Latest metrics from the push channel
    pub metrics: Option<Arc<MetricsSnapshot>>,
    pub search: SearchState,
    pub selected_filter: CategoryFilter,
    pub analytics: AnalyticsCache,
    pub health: Option<HealthReport>,
    /// Oldest first, at most [`MAX_NOTICES`]
    pub notices: Vec<Notice>,
    /// Number of event handlers currently in flight
    pub busy_depth: u32,
}

impl DashboardSnapshot {
    pub fn is_busy(&self) -> bool {
        self.busy_depth > 0
    }

    /// Copy of `self` with `notice` appended, evicting the oldest past the cap.
    pub fn with_notice(&self, notice: Notice) -> Self {
        let mut next = self.clone();
        next.notices.push(notice);
        if next.notices.len() > MAX_NOTICES {
            let excess = next.notices.len() - MAX_NOTICES;
            next.notices.drain(..excess);
        }
        next
    }
}
