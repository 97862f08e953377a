//! Extraction of linkshells and members from directory listings
//!
//! Both listing kinds share the same layout: a `.ldst__window` container with
//! one `.entry` block per result. Extraction is total over any page that has
//! the container. Fields missing from a single entry come back empty (or zero
//! for counts) instead of failing the page.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use thiserror::Error;

/// Container every listing page renders its entries in
const LISTING_CONTAINER: &str = ".ldst__window";
/// One result block inside the container
const LISTING_ENTRY: &str = ".ldst__window .entry";

const ENTRY_LINK: &str = "a";
const ENTRY_NAME: &str = ".entry__name";
const LINKSHELL_MEMBER_COUNT: &str = ".entry__linkshell__member > span";
const MEMBER_FREE_COMPANY: &str = ".entry__freecompany__link > span";
const MEMBER_RANK: &str = ".entry__chara_info__linkshell > span";
const PAGER_CURRENT: &str = ".btn__pager__current";

/// Matches the pager text, e.g. "Page 1 of 3"
const PAGER_PATTERN: &str = r"(?i)page\s*\d+\s*of\s*(\d+)";

static PAGER_RE: OnceLock<Regex> = OnceLock::new();

fn pager_regex() -> &'static Regex {
    PAGER_RE.get_or_init(|| Regex::new(PAGER_PATTERN).expect("pager pattern is a valid literal"))
}

/// Errors produced when a page does not look like a listing at all
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Listing container '{selector}' not found")]
    MissingContainer { selector: &'static str },

    #[error("Invalid selector '{selector}': {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },
}

/// A linkshell found on a search result page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    /// Path of the linkshell page, as linked from the search results
    pub locator: String,

    /// Linkshell name
    pub display_name: String,

    /// Member count shown in the search results
    pub member_count: u32,
}

/// One member row of a linkshell member listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberRecord {
    /// Character name
    pub name: String,

    /// Free company the character belongs to (empty if none)
    pub free_company: String,

    /// Rank inside the linkshell (empty for plain members)
    pub rank: String,
}

fn selector(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css,
        message: format!("{:?}", e),
    })
}

/// Text of the first element below `entry` matching `selector`, trimmed
fn first_text(entry: &ElementRef<'_>, selector: &Selector) -> String {
    entry
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Selects the entry blocks of a listing, failing if the container is absent
fn listing_entries<'a>(document: &'a Html) -> Result<Vec<ElementRef<'a>>, ExtractError> {
    let container = selector(LISTING_CONTAINER)?;
    if document.select(&container).next().is_none() {
        return Err(ExtractError::MissingContainer {
            selector: LISTING_CONTAINER,
        });
    }

    let entry = selector(LISTING_ENTRY)?;
    Ok(document.select(&entry).collect())
}

/// Parses a scraped count, treating anything that is not a number as 0
///
/// Thousands separators are ignored.
///
/// # Example
///
/// ```
/// use linkshell_harvest::crawler::parse_count;
///
/// assert_eq!(parse_count(" 1,024 "), 1024);
/// assert_eq!(parse_count(""), 0);
/// assert_eq!(parse_count("n/a"), 0);
/// ```
pub fn parse_count(text: &str) -> u32 {
    let digits: String = text.trim().chars().filter(|c| *c != ',').collect();
    digits.parse().unwrap_or(0)
}

/// Number of member pages a linkshell of `member_count` members spans
pub fn member_page_count(member_count: u32, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    member_count.div_ceil(page_size)
}

/// Extracts every linkshell listed on a search result page, in document order
pub fn extract_groups(document: &Html) -> Result<Vec<GroupEntry>, ExtractError> {
    let link = selector(ENTRY_LINK)?;
    let name = selector(ENTRY_NAME)?;
    let count = selector(LINKSHELL_MEMBER_COUNT)?;

    let groups: Vec<GroupEntry> = listing_entries(document)?
        .iter()
        .map(|entry| {
            let locator = entry
                .select(&link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default()
                .to_string();
            let display_name = first_text(entry, &name);

            if locator.is_empty() || display_name.is_empty() {
                tracing::warn!(
                    "Linkshell entry is missing fields (locator: '{}', name: '{}')",
                    locator,
                    display_name
                );
            }

            GroupEntry {
                locator,
                display_name,
                member_count: parse_count(&first_text(entry, &count)),
            }
        })
        .collect();

    tracing::info!("Found {} linkshells", groups.len());
    Ok(groups)
}

/// Extracts every member listed on a linkshell page, in document order
pub fn extract_members(document: &Html) -> Result<Vec<MemberRecord>, ExtractError> {
    let name = selector(ENTRY_NAME)?;
    let free_company = selector(MEMBER_FREE_COMPANY)?;
    let rank = selector(MEMBER_RANK)?;

    Ok(listing_entries(document)?
        .iter()
        .map(|entry| MemberRecord {
            name: first_text(entry, &name),
            free_company: first_text(entry, &free_company),
            rank: first_text(entry, &rank),
        })
        .collect())
}

/// Reads the total page count from the pager of a search result page
///
/// A page without a pager marker is a single page of results.
pub fn extract_page_count(document: &Html) -> Result<u32, ExtractError> {
    let pager = selector(PAGER_CURRENT)?;

    let Some(marker) = document.select(&pager).next() else {
        return Ok(1);
    };

    let text = marker.text().collect::<String>();
    match pager_regex()
        .captures(&text)
        .and_then(|captures| captures.get(1))
        .and_then(|total| total.as_str().parse::<u32>().ok())
    {
        Some(total) => Ok(total),
        None => {
            tracing::warn!("Unrecognised pager text '{}', assuming one page", text.trim());
            Ok(1)
        }
    }
}

/// Parses raw markup and extracts its linkshells
pub fn parse_groups(html: &str) -> Result<Vec<GroupEntry>, ExtractError> {
    extract_groups(&Html::parse_document(html))
}

/// Parses raw markup and extracts its members
pub fn parse_members(html: &str) -> Result<Vec<MemberRecord>, ExtractError> {
    extract_members(&Html::parse_document(html))
}

/// Parses raw markup and reads its pager
pub fn parse_page_count(html: &str) -> Result<u32, ExtractError> {
    extract_page_count(&Html::parse_document(html))
}
