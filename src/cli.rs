//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Grammy Charts - chart-ready aggregates from Grammy nominee datasets
///
/// Loads a nominations dataset whose column names are not known in advance,
/// figures out which columns hold the year, category, artist and outcome,
/// and builds the payload consumed by the charts front-end.
///
/// Examples:
///   grammy-charts --source data/grammys.csv
///   grammy-charts --source data/grammys.zip --format markdown -o report.md
///   grammy-charts --source kaggle:johnpendenque/grammy-winners-and-nominees-from-1965-to-2024
///   grammy-charts --serve --port 5000
///   grammy-charts --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Dataset location
    ///
    /// A local .csv, .zip, .json file or directory, an http(s) URL,
    /// or kaggle:<owner>/<slug>. Defaults to the config file setting.
    #[arg(short, long, value_name = "LOCATION", env = "GRAMMY_SOURCE")]
    pub source: Option<String>,

    /// Output file path for the payload ("-" writes to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (json, markdown)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .grammy-charts.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Serve the payload over HTTP instead of writing it once
    #[arg(long, conflicts_with = "dry_run")]
    pub serve: bool,

    /// Address to bind when serving
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to bind when serving
    #[arg(short, long, value_name = "PORT", env = "GRAMMY_PORT")]
    pub port: Option<u16>,

    /// Download timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load the dataset and show the resolved columns
    ///
    /// Prints row count, column names and the role mapping, then exits.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .grammy-charts.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON payload (default)
    #[default]
    Json,
    /// Markdown summary report
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.port == Some(0) {
            return Err("Port must be between 1 and 65535".to_string());
        }

        if let Some(ref source) = self.source {
            let source = source.trim();
            if source.is_empty() {
                return Err("Source must not be empty".to_string());
            }
            if !crate::source::is_remote(source) && !std::path::Path::new(source).exists() {
                return Err(format!("Local source does not exist: {}", source));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins
    /// over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            source: None,
            output: None,
            format: OutputFormat::Json,
            config: None,
            serve: false,
            host: None,
            port: None,
            timeout: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_defaults_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_missing_local_source() {
        let mut args = make_args();
        args.source = Some("/definitely/not/here.csv".to_string());
        assert!(args.validate().is_err());

        args.source = Some("https://example.com/grammys.zip".to_string());
        assert!(args.validate().is_ok());

        args.source = Some("kaggle:owner/slug".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.port = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_from_flags() {
        let args = Args::try_parse_from([
            "grammy-charts",
            "--source",
            "kaggle:owner/slug",
            "--format",
            "markdown",
            "-o",
            "-",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Markdown);
        assert_eq!(args.output, Some(PathBuf::from("-")));

        assert!(Args::try_parse_from(["grammy-charts", "--serve", "--dry-run"]).is_err());
    }
}
