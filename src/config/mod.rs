//! Configuration module for Linkshell-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A run without a configuration file uses [`Config::default`].
//!
//! # Example
//!
//! ```no_run
//! use linkshell_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Searching world: {}", config.directory.server);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, DirectoryConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
