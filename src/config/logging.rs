//! Diagnostics settings.
//!
//! Levels are tracing filter levels. Per-module overrides are keyed by the
//! console's own module names, so `stream = "debug"` turns on channel tracing
//! without flooding the terminal with HTTP client noise.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Modules that accept a level override.
pub const LOG_MODULES: &[&str] = &[
    "analytics",
    "cli",
    "client",
    "config",
    "interaction",
    "risk",
    "state",
    "stream",
    "view",
];

/// How diagnostics are written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One JSON object per line, for shipping to a collector
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.eq_ignore_ascii_case("pretty") {
            Ok(LogFormat::Pretty)
        } else if raw.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(format!("unknown log format '{}' (expected pretty or json)", raw))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level for everything, rxwatch and its dependencies alike
    pub level: String,
    pub format: LogFormat,
    /// Level overrides per console module, e.g. `stream = "debug"`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub component_levels: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            // The dashboard owns stdout; keep stderr quiet unless asked
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            component_levels: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directives: the base level, then one `rxwatch::<module>`
    /// directive per override in module order.
    pub fn directives(&self) -> String {
        self.component_levels
            .iter()
            .fold(self.level.trim().to_string(), |mut out, (module, level)| {
                out.push_str(&format!(",rxwatch::{}={}", module, level.trim()));
                out
            })
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        parse_level(&self.level)
            .map_err(|message| ConfigError::invalid("logging.level", message))?;

        for (module, level) in &self.component_levels {
            let field = format!("logging.component_levels.{}", module);
            if !LOG_MODULES.contains(&module.as_str()) {
                return Err(ConfigError::invalid(
                    &field,
                    format!("unknown module (expected one of {})", LOG_MODULES.join(", ")),
                ));
            }
            parse_level(level).map_err(|message| ConfigError::invalid(&field, message))?;
        }
        Ok(())
    }
}

fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    raw.trim()
        .parse::<LevelFilter>()
        .map_err(|_| format!("'{}' is not a log level", raw))
}
