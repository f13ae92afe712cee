//! Shared types, error model, and configuration for kbharvest.
//!
//! This crate is the foundation depended on by all other kbharvest crates.
//! It provides:
//! - [`HarvestError`]: the unified error type
//! - Domain types ([`Source`], [`Section`], [`ExtractionRecord`], [`AggregateResult`],
//!   [`DownloadManifest`])
//! - Configuration ([`AppConfig`], [`HarvestConfig`], [`DownloadConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_CONFIG_TEMPLATE, DownloadConfig, DownloadSettings, ExtractOptions,
    HarvestConfig, HarvestSettings, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_config,
};
pub use error::{HarvestError, Result};
pub use types::{
    AggregateResult, DEFAULT_INFO_KEY, DownloadEntry, DownloadInfo, DownloadManifest,
    ExtractionInfo, ExtractionRecord, KeyedAggregate, KeyedRecord, PdfResource, Section, Source,
    SourceOutcome, TIMESTAMP_FORMAT, timestamp_now,
};
