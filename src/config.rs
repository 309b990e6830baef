//! Runtime configuration for the vanity address generator.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::crypto::AddressPrefix;
use crate::matcher::{sanitize_terms, split_terms, DEFAULT_MIN_SCORE};

/// Attempts a worker makes between looking at its command channel.
pub const DEFAULT_BATCH_SIZE: usize = 40;

/// Engine settings shared by the coordinator and its workers.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Attempts per batch; bounds how long a Stop can take to land
    pub batch_size: usize,
    /// How often workers report counters, and how often the rate window turns
    pub stat_interval: Duration,
    /// Scores below this are counted as ignored instead of reported
    pub min_score: u32,
    /// Prefix of generated addresses
    pub prefix: AddressPrefix,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            stat_interval: Duration::from_secs(1),
            min_score: DEFAULT_MIN_SCORE,
            prefix: AddressPrefix::default(),
        }
    }
}

/// Nano Vanity Address Generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Terms to search for anywhere in the address (0, 2, l and v are dropped)
    #[arg(required = true, num_args = 1..)]
    pub terms: Vec<String>,

    /// Fraction of CPU cores to search with, in (0, 1]
    #[arg(short = 'c', long, default_value = "1")]
    pub concurrency: f64,

    /// Minimum score for a match to be reported
    #[arg(short = 'm', long, default_value_t = DEFAULT_MIN_SCORE)]
    pub min_score: u32,

    /// Address prefix: xrb or nano
    #[arg(short = 'p', long, default_value = "xrb")]
    pub prefix: AddressPrefix,

    /// Stop after finding N addresses (0 = run forever)
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,

    /// Attempts per worker batch
    #[arg(short = 'b', long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Directory to write `<address>.json` wallet files to on exit
    #[arg(short = 'o', long)]
    pub export_dir: Option<PathBuf>,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if sanitize_terms(self.search_terms().as_slice()).is_empty() {
            return Err(ConfigError::NoSearchTerms);
        }

        if !(self.concurrency > 0.0 && self.concurrency <= 1.0) {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }

        if self.report_interval == 0 {
            return Err(ConfigError::InvalidReportInterval);
        }

        if let Some(ref dir) = self.export_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigError::InvalidExportDir(dir.clone()));
            }
        }

        Ok(())
    }

    /// Raw terms, with quoted arguments split on whitespace
    pub fn search_terms(&self) -> Vec<String> {
        self.terms
            .iter()
            .flat_map(|arg| split_terms(arg))
            .map(str::to_string)
            .collect()
    }

    /// Engine settings derived from the command line
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            batch_size: self.batch_size,
            min_score: self.min_score,
            prefix: self.prefix,
            ..SearchSettings::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No searchable terms: Nano addresses only use 13456789abcdefghijkmnopqrstuwxyz")]
    NoSearchTerms,
    #[error("Concurrency must be in (0, 1], got {0}")]
    InvalidConcurrency(f64),
    #[error("Batch size must be at least 1")]
    InvalidBatchSize,
    #[error("Report interval must be at least 1 second")]
    InvalidReportInterval,
    #[error("Export path is not a directory: {}", .0.display())]
    InvalidExportDir(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_config(terms: &[&str]) -> Config {
        Config {
            terms: terms.iter().map(|t| t.to_string()).collect(),
            concurrency: 1.0,
            min_score: DEFAULT_MIN_SCORE,
            prefix: AddressPrefix::Xrb,
            count: 1,
            report_interval: 5,
            batch_size: DEFAULT_BATCH_SIZE,
            export_dir: None,
        }
    }

    #[test]
    fn test_valid_terms() {
        let config = make_test_config(&["nano", "abc def"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.search_terms(), vec!["nano", "abc", "def"]);
    }

    #[test]
    fn test_only_forbidden_terms() {
        let config = make_test_config(&["0220", "lv"]);
        assert!(matches!(config.validate(), Err(ConfigError::NoSearchTerms)));
    }

    #[test]
    fn test_invalid_concurrency() {
        let mut config = make_test_config(&["abc"]);
        config.concurrency = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency(_))
        ));
        config.concurrency = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_command_line() {
        let config =
            Config::try_parse_from(["nano_vanity", "-c", "0.5", "-p", "nano", "abc", "xyz"])
                .unwrap();
        assert_eq!(config.terms, vec!["abc", "xyz"]);
        assert_eq!(config.concurrency, 0.5);
        assert_eq!(config.prefix, AddressPrefix::Nano);

        let settings = config.search_settings();
        assert_eq!(settings.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(settings.stat_interval, Duration::from_secs(1));
    }
}
