//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.grammy-charts.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".grammy-charts.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Chart aggregation settings.
    #[serde(default)]
    pub charts: ChartsConfig,

    /// Column resolution keywords.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "grammy_payload.json".to_string()
}

/// Where the dataset comes from and how hard to try.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Local path, http(s) URL, or `kaggle:<owner>/<slug>`.
    #[serde(default = "default_location")]
    pub location: String,

    /// Download timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries on download failure.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_location() -> String {
    "kaggle:johnpendenque/grammy-winners-and-nominees-from-1965-to-2024".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> usize {
    3
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Ordering of the category distribution labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionOrder {
    /// Order of first occurrence in the dataset.
    #[default]
    FirstSeen,
    /// Highest count first, ties by first occurrence.
    Frequency,
}

/// Which entities survive the marquee cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarqueeOrder {
    /// The first N distinct winners in dataset order.
    #[default]
    FirstSeen,
    /// The N winners with the most marquee wins.
    Wins,
}

/// Chart aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Series colors, cycled by category position.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,

    /// Marquee category phrases (matched case-insensitively as substrings).
    #[serde(default = "default_marquee_categories")]
    pub marquee_categories: Vec<String>,

    /// Maximum number of entities in the marquee view.
    #[serde(default = "default_marquee_limit")]
    pub marquee_limit: usize,

    #[serde(default)]
    pub marquee_order: MarqueeOrder,

    #[serde(default)]
    pub distribution_order: DistributionOrder,

    /// Maximum number of distribution labels (unset keeps all).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_limit: Option<usize>,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            marquee_categories: default_marquee_categories(),
            marquee_limit: default_marquee_limit(),
            marquee_order: MarqueeOrder::default(),
            distribution_order: DistributionOrder::default(),
            distribution_limit: None,
        }
    }
}

fn default_palette() -> Vec<String> {
    vec![
        "#ec4899", "#3b82f6", "#6366f1", "#10b981", "#f97316", "#a78bfa",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_marquee_categories() -> Vec<String> {
    vec![
        "record of the year",
        "album of the year",
        "song of the year",
        "best new artist",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_marquee_limit() -> usize {
    12
}

/// Ordered keyword table per role. First column containing a keyword wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_temporal_keywords")]
    pub temporal: Vec<String>,

    #[serde(default = "default_category_keywords")]
    pub category: Vec<String>,

    #[serde(default = "default_entity_keywords")]
    pub entity: Vec<String>,

    #[serde(default = "default_outcome_keywords")]
    pub outcome: Vec<String>,

    /// Keywords for the column scanned for marquee categories.
    #[serde(default = "default_award_keywords")]
    pub award: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            temporal: default_temporal_keywords(),
            category: default_category_keywords(),
            entity: default_entity_keywords(),
            outcome: default_outcome_keywords(),
            award: default_award_keywords(),
        }
    }
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn default_temporal_keywords() -> Vec<String> {
    keywords(&["year", "date"])
}

fn default_category_keywords() -> Vec<String> {
    keywords(&["genre", "category"])
}

fn default_entity_keywords() -> Vec<String> {
    keywords(&["artist", "performer", "name"])
}

fn default_outcome_keywords() -> Vec<String> {
    keywords(&["winner", "result", "won"])
}

fn default_award_keywords() -> Vec<String> {
    keywords(&["category", "award"])
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref source) = args.source {
            self.source.location = source.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "grammy_payload.json");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.charts.palette.len(), 6);
        assert_eq!(config.charts.marquee_limit, 12);
        assert_eq!(config.charts.marquee_order, MarqueeOrder::FirstSeen);
        assert_eq!(config.resolver.entity, vec!["artist", "performer", "name"]);
        assert!(config.source.location.starts_with("kaggle:"));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "charts.json"
verbose = true

[source]
location = "data/grammys.csv"
retries = 1

[charts]
marquee_limit = 5
marquee_order = "wins"
distribution_order = "frequency"
distribution_limit = 8

[resolver]
entity = ["nominee"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "charts.json");
        assert!(config.general.verbose);
        assert_eq!(config.source.location, "data/grammys.csv");
        assert_eq!(config.source.retries, 1);
        assert_eq!(config.source.timeout_seconds, 60);
        assert_eq!(config.charts.marquee_limit, 5);
        assert_eq!(config.charts.marquee_order, MarqueeOrder::Wins);
        assert_eq!(config.charts.distribution_order, DistributionOrder::Frequency);
        assert_eq!(config.charts.distribution_limit, Some(8));
        assert_eq!(config.resolver.entity, vec!["nominee"]);
        assert_eq!(config.resolver.temporal, vec!["year", "date"]);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[charts]"));
        assert!(toml_str.contains("[resolver]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.charts.marquee_categories.len(), 4);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");

        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
