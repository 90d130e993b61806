use crate::risk::CategoryFilter;
use std::fmt;
use std::str::FromStr;

/// Operator commands accepted by the interactive console.
pub const COMMAND_HELP: &str = "search <drug> | example <n> | filter <all|critical|high|medium|low> | refresh | seed | clear | retry | health | quit";

/// A discrete operator action.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Search look-alikes for a drug name
    Search(String),
    /// Search the n-th (1-based) configured example drug
    Example(usize),
    Filter(CategoryFilter),
    /// Re-check health and refetch all analytics
    Refresh,
    /// Load the backend's sample drug set, then refresh
    Seed,
    /// Drop cached search results and analytics
    Clear,
    /// Reopen the push channel
    RetryConnection,
    CheckHealth,
    Quit,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Search(drug) => write!(f, "search {}", drug),
            Event::Example(n) => write!(f, "example {}", n),
            Event::Filter(filter) => write!(f, "filter {}", filter),
            Event::Refresh => f.write_str("refresh"),
            Event::Seed => f.write_str("seed"),
            Event::Clear => f.write_str("clear"),
            Event::RetryConnection => f.write_str("retry"),
            Event::CheckHealth => f.write_str("health"),
            Event::Quit => f.write_str("quit"),
        }
    }
}

impl FromStr for Event {
    type Err = String;

    /// Parse one command line. The search argument keeps its inner spaces.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command.to_lowercase().as_str() {
            "search" | "s" => Ok(Event::Search(argument.to_string())),
            "example" | "e" => argument
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(Event::Example)
                .ok_or_else(|| format!("example needs a positive number, got '{}'", argument)),
            "filter" | "f" => {
                if argument.is_empty() {
                    return Err("filter needs a category".to_string());
                }
                argument.parse::<CategoryFilter>().map(Event::Filter)
            }
            "refresh" | "r" => Ok(Event::Refresh),
            "seed" => Ok(Event::Seed),
            "clear" | "c" => Ok(Event::Clear),
            "retry" | "reconnect" => Ok(Event::RetryConnection),
            "health" | "h" => Ok(Event::CheckHealth),
            "quit" | "q" | "exit" => Ok(Event::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}
