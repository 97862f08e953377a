//! Output module for harvested rows and crawl reports
//!
//! This module handles:
//! - The sink contract the crawler forwards annotated rows to
//! - Appending rows to a CSV file
//! - Counting what a crawl did and summarising it

mod csv_output;
pub mod stats;
mod traits;

pub use csv_output::{write_row, CsvSink};
pub use stats::{CrawlLevel, CrawlReport, CrawlStats};
pub use traits::{OutputRow, OutputSink, SinkError, SinkResult};
