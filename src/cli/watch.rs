//! Watch command implementation

use crate::analytics::AnalyticsAggregator;
use crate::cli::{load_config_with_overrides, WatchArgs};
use crate::client::RiskApiClient;
use crate::config::RxwatchConfig;
use crate::interaction::{Event, InteractionLoop, COMMAND_HELP};
use crate::logging::init_tracing;
use crate::state::{Notice, StateStore};
use crate::stream::StreamingClient;
use std::io::{BufRead, IsTerminal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of the operator event queue
const EVENT_QUEUE: usize = 32;

/// Load configuration for `watch`, applying its own flags.
pub fn load_watch_config(args: &WatchArgs) -> Result<RxwatchConfig, Box<dyn std::error::Error>> {
    let mut config = load_config_with_overrides(&args.connect)?;
    if args.no_stream {
        config.streaming.enabled = false;
    }
    Ok(config)
}

/// Forward operator command lines as events until EOF or `quit`.
///
/// Blocking; runs on its own thread. Lines that do not parse become warnings
/// on the dashboard.
pub fn forward_commands<R: BufRead>(input: R, store: &StateStore, events: &mpsc::Sender<Event>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read operator input");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Event>() {
            Ok(event) => {
                let quit = event == Event::Quit;
                if events.blocking_send(event).is_err() || quit {
                    break;
                }
            }
            Err(e) => store.notify(Notice::warning(format!("{}. Commands: {}", e, COMMAND_HELP))),
        }
    }
}

/// Wait for shutdown signal (SIGINT)
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for CTRL+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received SIGINT, shutting down...");
}

/// Main watch command handler
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and merge configuration
    let config = load_watch_config(&args)?;
    config.validate()?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;
    tracing::info!(backend = %config.backend.base_url, "Starting rxwatch");
    tracing::debug!(?config, "Loaded configuration");

    // 3. Shared state and backend clients
    let store = Arc::new(StateStore::new());
    let client = Arc::new(RiskApiClient::new(config.backend.clone())?);
    let aggregator = AnalyticsAggregator::new(
        Arc::clone(&client),
        Arc::clone(&store),
        config.analytics.clone(),
    );

    // 4. Push channel
    let cancel_token = CancellationToken::new();
    let streaming = if config.streaming.enabled {
        let streaming = StreamingClient::new(
            &client,
            config.streaming.clone(),
            Arc::clone(&store),
            cancel_token.clone(),
        )?;
        streaming.start();
        Some(streaming)
    } else {
        tracing::info!("Push channel disabled");
        None
    };

    let interaction = InteractionLoop::new(
        Arc::clone(&store),
        client,
        aggregator,
        streaming,
        config.examples.clone(),
    )
    .with_clear_screen(std::io::stdout().is_terminal());

    // 5. Operator input, starting with an initial refresh
    let (tx, rx) = mpsc::channel(EVENT_QUEUE);
    tx.send(Event::Refresh).await?;
    // Not joined: a read blocked on stdin must not hold up shutdown
    let input_store = Arc::clone(&store);
    std::thread::spawn(move || forward_commands(std::io::stdin().lock(), &input_store, &tx));

    tokio::select! {
        result = interaction.run(rx, std::io::stdout()) => result?,
        _ = shutdown_signal() => {}
    }

    // 6. Stop background work
    cancel_token.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;
    tracing::info!("rxwatch stopped");

    Ok(())
}
