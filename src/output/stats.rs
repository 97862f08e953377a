//! Crawl statistics
//!
//! Counters are shared by every task of a crawl session and summarised into a
//! [`CrawlReport`] once the run has drained. The report is informational only;
//! branch failures do not change the outcome of a run.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Crawl level a counter or failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlLevel {
    /// Search result pages
    Search,
    /// Linkshell lookups
    Group,
    /// Linkshell member pages
    GroupPage,
}

impl fmt::Display for CrawlLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlLevel::Search => "search page",
            CrawlLevel::Group => "linkshell",
            CrawlLevel::GroupPage => "linkshell page",
        };
        f.write_str(name)
    }
}

/// Live counters updated by crawl tasks
#[derive(Debug, Default)]
pub struct CrawlStats {
    search_pages: AtomicU64,
    groups_found: AtomicU64,
    groups_suppressed: AtomicU64,
    group_pages: AtomicU64,
    rows_written: AtomicU64,
    search_failures: AtomicU64,
    group_page_failures: AtomicU64,
    sink_failures: AtomicU64,
}

impl CrawlStats {
    /// Creates zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_search_page(&self, groups: usize) {
        self.search_pages.fetch_add(1, Ordering::Relaxed);
        self.groups_found.fetch_add(groups as u64, Ordering::Relaxed);
    }

    pub fn record_suppressed_group(&self) {
        self.groups_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_group_page(&self, rows: usize) {
        self.group_pages.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows as u64, Ordering::Relaxed);
    }

    /// Records a failed fetch or extraction at `level`
    pub fn record_failure(&self, level: CrawlLevel) {
        let counter = match level {
            CrawlLevel::Search => &self.search_failures,
            // Group lookups do no I/O of their own
            CrawlLevel::Group | CrawlLevel::GroupPage => &self.group_page_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot of the counters
    pub fn report(&self, page_count: u32, elapsed: Duration) -> CrawlReport {
        CrawlReport {
            result_pages: page_count,
            search_pages_fetched: self.search_pages.load(Ordering::Relaxed),
            groups_found: self.groups_found.load(Ordering::Relaxed),
            groups_suppressed: self.groups_suppressed.load(Ordering::Relaxed),
            group_pages_fetched: self.group_pages.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            search_failures: self.search_failures.load(Ordering::Relaxed),
            group_page_failures: self.group_page_failures.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Result pages announced by the search pager
    pub result_pages: u32,
    pub search_pages_fetched: u64,
    pub groups_found: u64,
    /// Linkshells skipped by single-shot mode
    pub groups_suppressed: u64,
    pub group_pages_fetched: u64,
    pub rows_written: u64,
    pub search_failures: u64,
    pub group_page_failures: u64,
    pub sink_failures: u64,
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Total failed branches across all levels
    pub fn total_failures(&self) -> u64 {
        self.search_failures + self.group_page_failures + self.sink_failures
    }

    /// Logs the report at info level
    pub fn log(&self) {
        tracing::info!(
            "Harvest finished in {:?}: {} of {} result pages, {} linkshells ({} suppressed), {} member pages, {} rows",
            self.elapsed,
            self.search_pages_fetched,
            self.result_pages,
            self.groups_found,
            self.groups_suppressed,
            self.group_pages_fetched,
            self.rows_written
        );

        if self.total_failures() > 0 {
            tracing::warn!(
                "{} branches failed ({} search pages, {} member pages, {} writes); output is incomplete",
                self.total_failures(),
                self.search_failures,
                self.group_page_failures,
                self.sink_failures
            );
        }
    }
}
