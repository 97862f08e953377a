//! Output sink traits and types
//!
//! This module defines the trait interface for output sinks and the row
//! type the crawler hands to them.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output writer lock poisoned")]
    Poisoned,
}

/// Result type for output operations
pub type SinkResult<T> = Result<T, SinkError>;

/// One harvested member annotated with the linkshell it was listed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    /// Linkshell the member was found in
    pub group_name: String,

    /// Character name
    pub name: String,

    /// Free company of the character
    pub free_company: String,

    /// Rank inside the linkshell
    pub rank: String,
}

impl OutputRow {
    /// Column titles, in the order [`OutputRow::fields`] yields values
    pub const HEADER: [&'static str; 4] =
        ["Linkshell", "Player name", "Free company", "Linkshell Rank"];

    /// Field values in column order
    pub fn fields(&self) -> [&str; 4] {
        [&self.group_name, &self.name, &self.free_company, &self.rank]
    }
}

/// Trait for output sinks
///
/// Sinks receive one batch per processed member page. Implementations must be
/// thread-safe and must write each row whole: two concurrent batches may land
/// in either order but never with their fields interleaved.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Appends a batch of rows
    ///
    /// # Arguments
    ///
    /// * `rows` - The rows of one member page
    async fn append(&self, rows: &[OutputRow]) -> SinkResult<()>;
}
