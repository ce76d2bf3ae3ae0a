use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub behavior: BehaviorConfig,
    pub viewport: ViewportConfig,
    pub transport: TransportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Build the search index right after loading instead of on first query
    pub index_on_load: bool,

    /// Compute and show the totals row
    pub show_total_row: bool,

    /// Header clicks append to the sort keys instead of replacing them
    pub multi_sort: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Page size used until a measurement says otherwise
    pub rows_to_render: usize,

    /// Rows in the first measurement probe
    pub probe_rows: usize,

    /// Rows in the second probe when the first one fit entirely
    pub extended_probe_rows: usize,

    /// Rows subtracted from the measured count
    pub edge_margin: usize,
}

/// Where and how the HTTP data source talks to its server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Endpoint that answers data requests
    pub base_url: String,

    /// Token sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Command name sent in the request body
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    pub level: String,

    /// Also write logs to a file in the data directory
    pub log_to_file: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            index_on_load: false,
            show_total_row: true,
            multi_sort: false,
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            rows_to_render: 20,
            probe_rows: 100,
            extended_probe_rows: 200,
            edge_margin: 3,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: None,
            request_timeout_ms: 30_000,
            command: "data".to_string(),
        }
    }
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl Config {
    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            // Create default config if it doesn't exist
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("hugelist").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# HugeList Configuration File
# Location: ~/.config/hugelist/config.toml (Linux)
#           ~/Library/Application Support/hugelist/config.toml (macOS)
#           %APPDATA%\hugelist\config.toml (Windows)

[behavior]
# Build the search index as soon as data is loaded
# (otherwise it is built on the first search)
index_on_load = false

# Show the totals row for columns with a roll-up (count/sum/average)
show_total_row = true

# Sorting a column adds it to the existing sort keys instead of replacing them
multi_sort = false

[viewport]
# Rows per page until the page size is measured
rows_to_render = 20

# Measurement probes: a first window of probe_rows, then
# extended_probe_rows if every probe row was visible
probe_rows = 100
extended_probe_rows = 200

# Rows kept back from the measured page size
edge_margin = 3

[transport]
# Server endpoint used for http:// and https:// sources
base_url = ""

# Token sent with every request
# auth_token = "secret"

# Request timeout in milliseconds
request_timeout_ms = 30000

# Command name sent in the request body
command = "data"

[logging]
# Log level when RUST_LOG is not set: "error", "warn", "info", "debug", "trace"
level = "info"

# Also write logs to a timestamped file in the data directory
log_to_file = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.behavior.show_total_row);
        assert!(!config.behavior.index_on_load);
        assert_eq!(config.viewport.rows_to_render, 20);
        assert_eq!(config.transport.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.transport.auth_token = Some("abc".to_string());
        config.viewport.edge_margin = 1;
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_commented_template_matches_defaults() {
        let parsed: Config = toml::from_str(&Config::create_default_with_comments()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("[viewport]\nrows_to_render = 50\n").unwrap();
        assert_eq!(parsed.viewport.rows_to_render, 50);
        assert_eq!(parsed.viewport.probe_rows, 100);
        assert_eq!(parsed.logging, LoggingConfig::default());
    }

    #[test]
    fn test_save_and_load_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.behavior.multi_sort = true;
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
