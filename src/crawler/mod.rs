//! Crawler module for paginated directory harvesting
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of listing pages
//! - Extraction of linkshells and members from listings
//! - Spreading requests over time
//! - Overall crawl coordination across the three listing levels

mod coordinator;
mod extract;
mod fetcher;
mod scheduler;

pub use coordinator::{annotate, CrawlOptions, Crawler, SearchRequest};
pub use extract::{
    extract_groups, extract_members, extract_page_count, member_page_count, parse_count,
    parse_groups, parse_members, parse_page_count, ExtractError, GroupEntry, MemberRecord,
};
pub use fetcher::{build_http_client, page_url, FetchError, HttpFetcher, PageFetcher};
pub use scheduler::{DelayPolicy, Scheduler};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::HarvestError;

/// Runs a complete crawl for `term`
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and open the CSV output
/// 2. Resolve how many search result pages exist
/// 3. Schedule every search page, linkshell and member page
/// 4. Wait until all scheduled work has finished
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Every scheduled task ran (some may have failed)
/// * `Err(HarvestError)` - The crawl could not start
pub async fn crawl(config: &Config, term: &str) -> Result<CrawlReport, HarvestError> {
    Crawler::from_config(config, term)?.run().await
}
