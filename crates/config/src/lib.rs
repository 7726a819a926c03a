pub mod schema;
pub mod watcher;

pub use schema::{SourceConfig, StreamConfig, VscopeConfig, MAX_RATE_HZ, MIN_RATE_HZ};
pub use watcher::ConfigWatcher;

use std::path::{Path, PathBuf};
use vscope_core::{Result, VscopeError};

/// Load configuration from a TOML file.  Returns `VscopeConfig::default()` if
/// the file doesn't exist so the pipeline always has sensible defaults.
///
/// The loaded values are validated before being returned.
pub fn load(path: impl AsRef<Path>) -> Result<VscopeConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(VscopeConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| VscopeError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse and validate configuration from TOML text.
pub fn parse(raw: &str) -> Result<VscopeConfig> {
    let config: VscopeConfig =
        toml::from_str(raw).map_err(|e| VscopeError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("vscope").join("vscope.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load("/nonexistent/vscope/vscope.toml").unwrap();
        assert_eq!(config.stream.window_ms, 10_000);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse("[stream]\ningest_hz = 120.0\n").unwrap();
        assert_eq!(config.stream.ingest_hz, 120.0);
        assert_eq!(config.stream.display_hz, 6.0);
        assert_eq!(config.source.fault_rate, 0.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse("[stream]\nwindow_ms = 0\n").is_err());
        assert!(parse("[stream]\ndisplay_hz = 120.0\n").is_err());
        assert!(parse("[source]\nfault_rate = 1.5\n").is_err());
        assert!(parse("[stream\n").is_err());
        assert!(parse("[stream]\ningest_hz = 1e-300\n").is_err());
        assert!(parse("[stream]\ndisplay_hz = 1e-19\n").is_err());
    }

    #[test]
    fn default_path_ends_with_file_name() {
        assert!(default_path().ends_with("vscope/vscope.toml"));
    }
}
