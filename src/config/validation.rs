use crate::config::types::{Config, CrawlerConfig, DirectoryConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Longest spread window accepted (one hour)
const MAX_SPREAD_WINDOW_MS: u64 = 60 * 60 * 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_directory_config(&config.directory)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the directory location
fn validate_directory_config(config: &DirectoryConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.search_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "search_path must start with '/', got '{}'",
            config.search_path
        )));
    }

    if config.server.trim().is_empty() {
        return Err(ConfigError::Validation("server cannot be empty".to_string()));
    }

    Ok(())
}

/// Validates crawler pacing
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.spread_window_ms > MAX_SPREAD_WINDOW_MS {
        return Err(ConfigError::Validation(format!(
            "spread_window_ms must be <= {}ms, got {}ms",
            MAX_SPREAD_WINDOW_MS, config.spread_window_ms
        )));
    }

    if config.member_page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "member_page_size must be >= 1, got {}",
            config.member_page_size
        )));
    }

    if let Some(limit) = config.max_in_flight {
        if limit < 1 {
            return Err(ConfigError::Validation(format!(
                "max_in_flight must be >= 1 when set, got {}",
                limit
            )));
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation("csv_path cannot be empty".to_string()));
    }

    Ok(())
}
