//! `rxwatch config init`: write the documented example configuration.

use crate::cli::ConfigInitArgs;
use crate::config::{ConfigError, RxwatchConfig};
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../rxwatch.example.toml");
const DEFAULT_BASE_URL_LINE: &str = "base_url = \"http://localhost:8000\"";

/// The example file, optionally pointed at another backend.
///
/// The result always parses and validates, so a typo in `--backend-url`
/// fails here rather than on the next `rxwatch watch`.
pub fn render_example(backend_url: Option<&str>) -> Result<String, ConfigError> {
    let rendered = match backend_url {
        None => EXAMPLE_CONFIG.to_string(),
        Some(url) => {
            let line = format!("base_url = {}", toml::Value::String(url.trim().to_string()));
            EXAMPLE_CONFIG.replacen(DEFAULT_BASE_URL_LINE, &line, 1)
        }
    };

    let config: RxwatchConfig =
        toml::from_str(&rendered).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(rendered)
}

pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = &args.output;
    if path.exists() && !args.force {
        return Err(format!(
            "{} already exists; pass --force to replace it",
            path.display()
        )
        .into());
    }

    let contents = render_example(args.backend_url.as_deref())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;

    println!("✓ Wrote {}", path.display());
    if args.backend_url.is_none() {
        println!("  Set backend.base_url to your risk service, then run `rxwatch watch`.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn init(output: &Path, force: bool, backend_url: Option<&str>) -> Result<(), String> {
        handle_config_init(&ConfigInitArgs {
            output: output.to_path_buf(),
            force,
            backend_url: backend_url.map(str::to_string),
        })
        .map_err(|e| e.to_string())
    }

    #[test]
    fn test_example_matches_defaults() {
        let written: RxwatchConfig = toml::from_str(&render_example(None).unwrap()).unwrap();
        assert_eq!(written, RxwatchConfig::default());
    }

    #[test]
    fn test_backend_url_replaces_default() {
        let rendered = render_example(Some(" https://risk.internal:9443 ")).unwrap();
        let written: RxwatchConfig = toml::from_str(&rendered).unwrap();

        assert_eq!(written.backend.base_url, "https://risk.internal:9443");
        assert!(!rendered.contains("localhost:8000\""));
        // Comments survive the substitution
        assert!(rendered.contains("# WebSocket path below base_url"));
    }

    #[test]
    fn test_invalid_backend_url_rejected() {
        assert!(matches!(
            render_example(Some("risk-server:8000")),
            Err(ConfigError::Validation { ref field, .. }) if field == "backend.base_url"
        ));
    }

    #[test]
    fn test_existing_file_kept_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rxwatch.toml");
        fs::write(&path, "existing").unwrap();

        let err = init(&path, false, None).unwrap_err();
        assert!(err.contains("--force"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing");

        init(&path, true, None).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[streaming]"));
    }

    #[test]
    fn test_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("etc/rxwatch/rxwatch.toml");

        init(&path, false, Some("http://10.0.0.5:8000")).unwrap();

        let config = RxwatchConfig::load(Some(&path)).unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.5:8000");
    }

    #[test]
    fn test_bad_url_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rxwatch.toml");

        assert!(init(&path, false, Some("ftp://risk")).is_err());
        assert!(!path.exists());
    }
}
