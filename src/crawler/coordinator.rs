//! Crawler coordinator - main crawl orchestration logic
//!
//! The crawl walks three levels, each one's width only known once the level
//! above has been fetched:
//!
//! 1. Search result pages, counted from the pager of page 1
//! 2. Linkshells listed on each search result page
//! 3. Member pages of each linkshell, counted from its member count
//!
//! Every unit of work is handed to the [`Scheduler`], which spreads it over
//! time. Each search page, linkshell and member page is its own branch: its
//! errors are logged and end that branch only.

use crate::config::Config;
use crate::crawler::extract::{
    member_page_count, parse_groups, parse_members, parse_page_count, GroupEntry, MemberRecord,
};
use crate::crawler::fetcher::{build_http_client, HttpFetcher, PageFetcher};
use crate::crawler::scheduler::Scheduler;
use crate::output::{CrawlLevel, CrawlReport, CrawlStats, CsvSink, OutputRow, OutputSink};
use crate::HarvestError;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// What a run searches for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text search term
    pub term: String,

    /// World the search is restricted to
    pub server: String,
}

impl SearchRequest {
    pub fn new(term: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            server: server.into(),
        }
    }

    /// Locator of the search listing below `search_path`
    ///
    /// # Example
    ///
    /// ```
    /// use linkshell_harvest::SearchRequest;
    ///
    /// let request = SearchRequest::new("Hunt", "Zodiark");
    /// assert_eq!(
    ///     request.locator("/lodestone/linkshell/"),
    ///     "/lodestone/linkshell/?q=Hunt&order=&worldname=Zodiark"
    /// );
    /// ```
    pub fn locator(&self, search_path: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("q", &self.term)
            .append_pair("order", "")
            .append_pair("worldname", &self.server)
            .finish();
        format!("{}?{}", search_path, query)
    }
}

/// Crawl behaviour that is not about pacing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Path of the search listing
    pub search_path: String,

    /// Members listed per linkshell page
    pub member_page_size: u32,

    /// Process only the first linkshell looked up
    pub single_shot: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            search_path: "/lodestone/linkshell/".to_string(),
            member_page_size: 50,
            single_shot: false,
        }
    }
}

impl CrawlOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            search_path: config.directory.search_path.clone(),
            member_page_size: config.crawler.member_page_size,
            single_shot: config.crawler.single_shot,
        }
    }
}

/// Attaches the linkshell name to each member of one of its pages
pub fn annotate(members: Vec<MemberRecord>, group_name: &str) -> Vec<OutputRow> {
    members
        .into_iter()
        .map(|member| OutputRow {
            group_name: group_name.to_string(),
            name: member.name,
            free_company: member.free_company,
            rank: member.rank,
        })
        .collect()
}

/// State shared by every task of one crawl
struct CrawlSession {
    search_locator: String,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn OutputSink>,
    scheduler: Scheduler,
    member_page_size: u32,
    single_shot: bool,
    /// Set once the first linkshell is claimed in single-shot mode
    suppress_further_groups: AtomicBool,
    stats: CrawlStats,
}

impl CrawlSession {
    /// Decides whether a linkshell lookup may proceed
    ///
    /// In single-shot mode the first caller flips the flag and wins; the swap
    /// makes check and set one step.
    fn claim_group(&self) -> bool {
        if self.single_shot {
            !self.suppress_further_groups.swap(true, Ordering::AcqRel)
        } else {
            !self.suppress_further_groups.load(Ordering::Acquire)
        }
    }

    async fn fetch_groups(&self, page: u32) -> Result<Vec<GroupEntry>, HarvestError> {
        let body = self.fetcher.fetch(&self.search_locator, page).await?;
        Ok(parse_groups(&body)?)
    }

    async fn fetch_members(
        &self,
        group: &GroupEntry,
        page: u32,
    ) -> Result<Vec<MemberRecord>, HarvestError> {
        let body = self.fetcher.fetch(&group.locator, page).await?;
        Ok(parse_members(&body)?)
    }
}

/// Main crawler structure
///
/// A crawler runs one search. Sessions are independent: two crawlers in the
/// same process share no state.
pub struct Crawler {
    request: SearchRequest,
    session: Arc<CrawlSession>,
}

impl Crawler {
    /// Creates a new crawler from its collaborators
    ///
    /// # Arguments
    ///
    /// * `request` - The search to run
    /// * `fetcher` - Source of directory pages
    /// * `sink` - Destination of annotated member rows
    /// * `scheduler` - Dispatcher spreading the crawl tasks over time
    /// * `options` - Search path, page size and single-shot mode
    pub fn new(
        request: SearchRequest,
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn OutputSink>,
        scheduler: Scheduler,
        options: CrawlOptions,
    ) -> Self {
        let search_locator = request.locator(&options.search_path);
        Self {
            request,
            session: Arc::new(CrawlSession {
                search_locator,
                fetcher,
                sink,
                scheduler,
                member_page_size: options.member_page_size,
                single_shot: options.single_shot,
                suppress_further_groups: AtomicBool::new(false),
                stats: CrawlStats::new(),
            }),
        }
    }

    /// Creates a crawler talking to the configured directory and CSV file
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - HTTP client built and output file open
    /// * `Err(HarvestError)` - Invalid base URL, client or output failure
    pub fn from_config(config: &Config, term: &str) -> Result<Self, HarvestError> {
        let base_url = Url::parse(&config.directory.base_url)?;
        let client = build_http_client(&config.user_agent)?;
        let fetcher = Arc::new(HttpFetcher::new(client, base_url));
        let sink = Arc::new(CsvSink::open(Path::new(&config.output.csv_path))?);

        Ok(Self::new(
            SearchRequest::new(term, config.directory.server.clone()),
            fetcher,
            sink,
            Scheduler::from_config(&config.crawler),
            CrawlOptions::from_config(config),
        ))
    }

    /// Whether further linkshell lookups are being skipped
    pub fn is_suppressing(&self) -> bool {
        self.session.suppress_further_groups.load(Ordering::Acquire)
    }

    /// Fetches the first search result page and reads the total page count
    pub async fn resolve_page_count(&self) -> Result<u32, HarvestError> {
        let body = self
            .session
            .fetcher
            .fetch(&self.session.search_locator, 1)
            .await?;
        Ok(parse_page_count(&body)?)
    }

    /// Runs the whole crawl and waits for every scheduled task to finish
    ///
    /// Only a failure to resolve the page count fails the run. Failures of
    /// individual pages are logged, counted in the report and otherwise
    /// ignored.
    pub async fn run(&self) -> Result<CrawlReport, HarvestError> {
        let start_time = Instant::now();

        let page_count = match self.resolve_page_count().await {
            Ok(count) => count,
            Err(e) => {
                tracing::error!(
                    "Failed to resolve result pages for '{}' on {}: {}",
                    self.request.term,
                    self.request.server,
                    e
                );
                return Err(e);
            }
        };

        tracing::info!(
            "Lodestone linkshell dump started. Parsing {} pages",
            page_count
        );

        for page in 1..=page_count {
            let session = Arc::clone(&self.session);
            self.session
                .scheduler
                .schedule(run_search_page(session, page));
        }

        self.session.scheduler.wait_idle().await;

        Ok(self.session.stats.report(page_count, start_time.elapsed()))
    }
}

/// Fetches one search result page and schedules a lookup per linkshell
async fn run_search_page(session: Arc<CrawlSession>, page: u32) {
    tracing::info!("Parsing linkshell search result page {}", page);

    let groups = match session.fetch_groups(page).await {
        Ok(groups) => groups,
        Err(e) => {
            tracing::error!(branch = %CrawlLevel::Search, page, "Branch failed: {}", e);
            session.stats.record_failure(CrawlLevel::Search);
            return;
        }
    };

    session.stats.record_search_page(groups.len());

    for group in groups {
        let task_session = Arc::clone(&session);
        session.scheduler.schedule(run_group(task_session, group));
    }
}

/// Schedules every member page of one linkshell
async fn run_group(session: Arc<CrawlSession>, group: GroupEntry) {
    // A linkshell that cannot be looked up must not use up the single shot
    if group.locator.is_empty() {
        tracing::warn!(
            branch = %CrawlLevel::Group,
            "Skipping linkshell '{}' without a link",
            group.display_name
        );
        return;
    }

    if !session.claim_group() {
        session.stats.record_suppressed_group();
        return;
    }

    tracing::info!(
        "Looking up linkshell {} ({} members)",
        group.display_name,
        group.member_count
    );

    let page_count = member_page_count(group.member_count, session.member_page_size);
    let group = Arc::new(group);
    for page in 1..=page_count {
        let task_session = Arc::clone(&session);
        session
            .scheduler
            .schedule(run_group_page(task_session, Arc::clone(&group), page));
    }
}

/// Fetches one member page, annotates its rows and hands them to the sink
async fn run_group_page(session: Arc<CrawlSession>, group: Arc<GroupEntry>, page: u32) {
    tracing::info!("Looking up {}, page {}", group.display_name, page);

    let members = match session.fetch_members(&group, page).await {
        Ok(members) => members,
        Err(e) => {
            tracing::error!(
                branch = %CrawlLevel::GroupPage,
                linkshell = %group.display_name,
                page,
                "Branch failed: {}",
                e
            );
            session.stats.record_failure(CrawlLevel::GroupPage);
            return;
        }
    };

    let rows = annotate(members, &group.display_name);
    match session.sink.append(&rows).await {
        Ok(()) => {
            session.stats.record_group_page(rows.len());
            tracing::debug!("processed page {} of {}", page, group.display_name);
        }
        Err(e) => {
            tracing::error!(
                branch = %CrawlLevel::GroupPage,
                linkshell = %group.display_name,
                page,
                "Failed to write {} rows: {}",
                rows.len(),
                e
            );
            session.stats.record_sink_failure();
        }
    }
}
