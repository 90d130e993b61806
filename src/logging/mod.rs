//! Tracing setup.
//!
//! Diagnostics go to stderr. Stdout belongs to the rendered dashboard and the
//! one-shot command output.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// The filter for `config`. `RUST_LOG`, when set, wins over the file.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(config.directives()),
    }
}

/// Install the global subscriber.
///
/// ```
/// use rxwatch::config::LoggingConfig;
///
/// let config: LoggingConfig = toml::from_str(r#"
///     level = "info"
///     format = "json"
///     [component_levels]
///     stream = "debug"
/// "#).unwrap();
/// assert_eq!(config.directives(), "info,rxwatch::stream=debug");
/// rxwatch::logging::init_tracing(&config).unwrap();
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}
