//! The operator interaction loop.
//!
//! Each [`Event`] runs one handler: it marks the dashboard busy for its whole
//! duration, performs its backend calls, writes the outcome into the
//! [`StateStore`] (or a notice on failure) and ends with a full re-render.
//!
//! Handlers are not serialized against each other. Overlapping searches race;
//! every response carries the sequence tag it was issued with, and a response
//! older than the installed results is discarded.

mod event;

pub use event::{Event, COMMAND_HELP};

use crate::analytics::{AnalyticsAggregator, AnalyticsCache};
use crate::client::{ClientError, RiskApiClient};
use crate::state::{Notice, SearchState, StateStore};
use crate::stream::StreamingClient;
use crate::view::render_dashboard;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Escape sequence clearing the terminal and homing the cursor.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Outcome of a single search request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Results were installed
    Installed { sequence: u64, results: usize },
    /// A newer search landed first; this response was dropped
    Stale { sequence: u64 },
    /// Input was blank; no request issued
    Rejected,
    Failed(ClientError),
}

/// Event-driven console cycle over shared dashboard state.
pub struct InteractionLoop {
    store: Arc<StateStore>,
    client: Arc<RiskApiClient>,
    analytics: AnalyticsAggregator,
    /// `None` when live updates are disabled
    streaming: Option<StreamingClient>,
    examples: Vec<String>,
    clear_screen: bool,
}

impl InteractionLoop {
    pub fn new(
        store: Arc<StateStore>,
        client: Arc<RiskApiClient>,
        analytics: AnalyticsAggregator,
        streaming: Option<StreamingClient>,
        examples: Vec<String>,
    ) -> Self {
        Self {
            store,
            client,
            analytics,
            streaming,
            examples,
            clear_screen: false,
        }
    }

    /// Clear the terminal before each frame written by [`run`](Self::run).
    pub fn with_clear_screen(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Run the handler for `event`.
    ///
    /// Returns the full re-render afterwards, or `None` for [`Event::Quit`].
    pub async fn handle(&self, event: Event) -> Option<String> {
        debug!(event = %event, "Handling event");
        match event {
            Event::Quit => return None,
            Event::Search(query) => {
                self.search(&query).await;
            }
            Event::Example(n) => self.example(n).await,
            Event::Filter(filter) => {
                let _busy = self.store.enter_busy();
                self.store.apply(|current| {
                    let mut next = current.clone();
                    next.selected_filter = filter;
                    next
                });
            }
            Event::Refresh => self.refresh().await,
            Event::Seed => self.seed().await,
            Event::Clear => self.clear(),
            Event::RetryConnection => self.retry_connection(),
            Event::CheckHealth => self.check_health().await,
        }
        Some(self.render())
    }

    /// Full dashboard text for the current snapshot, plus the command footer.
    pub fn render(&self) -> String {
        let snapshot = self.store.snapshot();
        let examples: Vec<String> = self
            .examples
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{}={}", i + 1, name))
            .collect();
        format!(
            "{}\n\nExamples: {}\nCommands: {}\n",
            render_dashboard(&snapshot),
            examples.join("  "),
            COMMAND_HELP
        )
    }

    /// Search look-alikes for `query` and install the results unless a newer
    /// search already landed.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            self.store
                .notify(Notice::warning("Enter a drug name to search"));
            return SearchOutcome::Rejected;
        }

        let _busy = self.store.enter_busy();
        let sequence = self.store.next_search_sequence();
        info!(drug = query, sequence, "Searching look-alike drugs");

        let results = match self.client.search(query).await {
            Ok(results) => results,
            Err(e) => {
                warn!(drug = query, error = %e, "Search failed");
                self.store
                    .notify(Notice::error(format!("Search for {} failed: {}", query, e)));
                return SearchOutcome::Failed(e);
            }
        };

        let count = results.len();
        let results = Arc::new(results);
        let installed = self.store.try_apply(|current| {
            if sequence < current.search.sequence {
                return None;
            }
            let mut next = current.clone();
            next.search = SearchState {
                query: Some(query.to_string()),
                results,
                sequence,
                completed_at: Some(Utc::now()),
            };
            Some(next)
        });

        if installed {
            debug!(drug = query, sequence, results = count, "Search results installed");
            SearchOutcome::Installed {
                sequence,
                results: count,
            }
        } else {
            debug!(drug = query, sequence, "Discarding stale search response");
            SearchOutcome::Stale { sequence }
        }
    }

    async fn example(&self, n: usize) {
        let example = n.checked_sub(1).and_then(|i| self.examples.get(i));
        match example {
            Some(drug) => {
                self.search(drug).await;
            }
            None => self.store.notify(Notice::warning(format!(
                "No example #{} (choose 1-{})",
                n,
                self.examples.len()
            ))),
        }
    }

    async fn refresh(&self) {
        let _busy = self.store.enter_busy();
        let (health, _report) = tokio::join!(self.client.check_health(), self.analytics.refresh());
        self.store.apply(|current| {
            let mut next = current.clone();
            next.health = Some(health);
            next
        });
    }

    async fn seed(&self) {
        let _busy = self.store.enter_busy();
        info!("Seeding backend sample database");
        match self.client.seed_database().await {
            Ok(()) => {
                self.store
                    .notify(Notice::info("Sample drug database loaded"));
                self.refresh().await;
            }
            Err(e) => {
                warn!(error = %e, "Seeding failed");
                self.store
                    .notify(Notice::error(format!("Seeding database failed: {}", e)));
            }
        }
    }

    /// Forget search results and analytics. Live metrics, health and the
    /// push channel are left alone.
    fn clear(&self) {
        let _busy = self.store.enter_busy();
        info!("Clearing cached results");
        self.store.apply(|current| {
            let mut next = current.clone();
            next.search = SearchState {
                sequence: current.search.sequence,
                ..SearchState::default()
            };
            next.analytics = AnalyticsCache::default();
            next
        });
        self.store.notify(Notice::info("Cache cleared"));
    }

    fn retry_connection(&self) {
        let _busy = self.store.enter_busy();
        let notice = match &self.streaming {
            None => Notice::warning("Live updates are disabled"),
            Some(streaming) => match streaming.start() {
                Some(_task) => Notice::info("Reconnecting live updates"),
                None => Notice::info("Live updates already active"),
            },
        };
        self.store.notify(notice);
    }

    async fn check_health(&self) {
        let _busy = self.store.enter_busy();
        let report = self.client.check_health().await;
        debug!(tier = report.tier.label(), "Health checked");
        self.store.apply(|current| {
            let mut next = current.clone();
            next.health = Some(report);
            next
        });
    }

    /// Drive the loop until [`Event::Quit`] or until `events` closes.
    ///
    /// Handlers run concurrently as events arrive; either way out, the ones
    /// still running are awaited first. A frame is written to `out`
    /// at start, whenever the store changes (handler writes and push updates
    /// alike), and once more on exit.
    pub async fn run<W: Write>(
        &self,
        mut events: mpsc::Receiver<Event>,
        mut out: W,
    ) -> std::io::Result<()> {
        let mut changes = self.store.subscribe();
        let mut in_flight = FuturesUnordered::new();

        self.write_frame(&mut out)?;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(Event::Quit) => {
                        info!(pending = in_flight.len(), "Quit requested");
                        break;
                    }
                    Some(event) => in_flight.push(self.handle(event)),
                    None => break,
                },
                Some(_) = in_flight.next(), if !in_flight.is_empty() => {}
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.write_frame(&mut out)?;
                }
            }
        }

        while in_flight.next().await.is_some() {}

        self.write_frame(&mut out)?;
        out.flush()
    }

    fn write_frame<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        if self.clear_screen {
            out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        out.write_all(self.render().as_bytes())?;
        out.flush()
    }
}
