//! Network-facing orchestration for kbharvest.
//!
//! This crate ties fetching, extraction, and output together:
//! - [`fetch`]: single-attempt page and binary retrieval
//! - [`pipeline`]: the sequential multi-source [`harvest`] loop
//! - [`download`]: PDF downloads with a signature check
//! - [`output`]: JSON document writers

pub mod download;
pub mod fetch;
pub mod output;
pub mod pipeline;

pub use download::{PDF_MAGIC, download_pdfs, verify_magic};
pub use fetch::{Fetcher, SavedBody};
pub use output::{write_aggregate, write_json};
pub use pipeline::{ProgressReporter, SilentProgress, harvest, harvest_with};
