//! Linkshell-Harvest: a paced roster harvester for the Lodestone directory
//!
//! This crate walks the three levels of the linkshell directory (search result
//! pages, linkshell entries, member listings) and writes one CSV row per member,
//! spreading its requests over time so the server does not start refusing them.

pub mod config;
pub mod crawler;
pub mod output;

use thiserror::Error;

pub use crawler::{ExtractError, FetchError};
pub use output::SinkError;

/// Main error type for Linkshell-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Output error: {0}")]
    Sink(#[from] SinkError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Linkshell-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, SearchRequest};
pub use output::{CrawlReport, CsvSink, OutputRow, OutputSink};
