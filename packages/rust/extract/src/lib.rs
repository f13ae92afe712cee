//! Heuristic content extraction for knowledge-base harvesting.
//!
//! This crate provides:
//! - [`node`]: the [`ContentNode`] interface and its `scraper` implementation
//! - [`locator`]: main-content root selection
//! - [`segment`], [`lists`], [`links`]: the three section extractors
//! - [`relevance`]: the [`KeywordSet`] filter they share
//! - [`extract_page`]: all of the above chained over one HTML document

pub mod links;
pub mod lists;
pub mod locator;
pub mod node;
pub mod page;
pub mod relevance;
pub mod segment;

pub use links::extract_links;
pub use lists::extract_lists;
pub use locator::locate_content;
pub use node::{ContentNode, NodeKind, Region, normalize_whitespace};
pub use page::extract_page;
pub use relevance::{KeywordSet, admits};
pub use segment::{MIN_TITLE_CHARS, segment_sections};
