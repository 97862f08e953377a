use serde::Deserialize;

/// Main configuration structure for Linkshell-Harvest
///
/// Every section may be omitted from the TOML file; missing values fall back
/// to the Lodestone NA directory and the Zodiark world.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the directory lives and which world is searched
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Scheme and host every request path is resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the linkshell search listing
    #[serde(rename = "search-path")]
    pub search_path: String,

    /// World name passed as the `worldname` search parameter
    pub server: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://na.finalfantasyxiv.com".to_string(),
            search_path: "/lodestone/linkshell/".to_string(),
            server: "Zodiark".to_string(),
        }
    }
}

/// Crawler pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Width of the random delay window each task is spread over (milliseconds)
    #[serde(rename = "spread-window-ms")]
    pub spread_window_ms: u64,

    /// Delay every task waits at minimum (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Number of members listed per linkshell page
    #[serde(rename = "member-page-size")]
    pub member_page_size: u32,

    /// Optional cap on tasks running at the same time
    #[serde(rename = "max-in-flight")]
    pub max_in_flight: Option<u32>,

    /// Process only the first linkshell that gets looked up
    #[serde(rename = "single-shot")]
    pub single_shot: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            spread_window_ms: 60_000,
            min_delay_ms: 100,
            member_page_size: 50,
            max_in_flight: None,
            single_shot: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "LinkshellHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the CSV file rows are appended to
    #[serde(rename = "csv-path")]
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "ZodiarkHuntingLinkshells.csv".to_string(),
        }
    }
}
