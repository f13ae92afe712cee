//! Core domain types for kbharvest knowledge-base records.

use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use url::Url;

/// Wall-clock timestamp format used in every written record.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default JSON key for a record's section array.
pub const DEFAULT_INFO_KEY: &str = "sections";

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_.-]+").unwrap());

/// Current local time at second resolution, e.g. `2025-06-01 14:03:22`.
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// One configured page to harvest. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Display name, copied into the output record.
    pub name: String,
    /// Page URL to fetch.
    pub url: String,
    /// Free-form description, copied into the output record.
    #[serde(default)]
    pub description: String,
    /// Relevance keywords. `None` inherits the run default; an empty list disables filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A titled group of extracted text strings. `content` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: Vec<String>,
}

impl Section {
    /// Build a section, or `None` when there is no content to carry.
    pub fn new(title: impl Into<String>, content: Vec<String>) -> Option<Self> {
        if content.is_empty() {
            return None;
        }
        Some(Self {
            title: title.into(),
            content,
        })
    }
}

// ---------------------------------------------------------------------------
// ExtractionRecord
// ---------------------------------------------------------------------------

/// How a single source ended up after its fetch/extract pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Fetched and at least one section extracted.
    Extracted,
    /// Fetched and parsed, but nothing qualified.
    Empty,
    /// The fetch failed; no sections were produced.
    Failed { error: String },
}

impl SourceOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, Self::Extracted)
    }
}

/// Output for one processed source.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRecord {
    pub source: String,
    pub url: String,
    pub description: String,
    pub extracted_at: String,
    pub sections: Vec<Section>,
    #[serde(skip)]
    pub outcome: SourceOutcome,
}

impl ExtractionRecord {
    /// Record for a source whose fetch failed.
    pub fn failed(source: &Source, error: impl Into<String>) -> Self {
        Self {
            source: source.name.clone(),
            url: source.url.clone(),
            description: source.description.clone(),
            extracted_at: timestamp_now(),
            sections: Vec::new(),
            outcome: SourceOutcome::Failed {
                error: error.into(),
            },
        }
    }

    /// Record for a parsed source; the outcome follows from whether any section survived.
    pub fn parsed(source: &Source, sections: Vec<Section>) -> Self {
        let outcome = if sections.is_empty() {
            SourceOutcome::Empty
        } else {
            SourceOutcome::Extracted
        };
        Self {
            source: source.name.clone(),
            url: source.url.clone(),
            description: source.description.clone(),
            extracted_at: timestamp_now(),
            sections,
            outcome,
        }
    }

    /// Serialize with `info_key` naming the section array instead of `sections`.
    pub fn keyed<'a>(&'a self, info_key: &'a str) -> KeyedRecord<'a> {
        KeyedRecord {
            record: self,
            info_key,
        }
    }
}

/// Serialization view of an [`ExtractionRecord`] under a caller-chosen section key.
pub struct KeyedRecord<'a> {
    record: &'a ExtractionRecord,
    info_key: &'a str,
}

impl Serialize for KeyedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("source", &self.record.source)?;
        map.serialize_entry("url", &self.record.url)?;
        map.serialize_entry("description", &self.record.description)?;
        map.serialize_entry("extracted_at", &self.record.extracted_at)?;
        map.serialize_entry(self.info_key, &self.record.sections)?;
        map.end()
    }
}

// ---------------------------------------------------------------------------
// AggregateResult
// ---------------------------------------------------------------------------

/// Run-level summary written at the top of the output document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionInfo {
    pub total_sources: usize,
    pub extracted_at: String,
    /// Sources whose merged section list is non-empty.
    pub successful_extractions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Everything one harvest run produced, in source-configuration order.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub extraction_info: ExtractionInfo,
    pub sources: Vec<ExtractionRecord>,
}

impl AggregateResult {
    /// Start an empty result for a run over `total_sources` sources.
    pub fn new(total_sources: usize, note: Option<String>) -> Self {
        Self {
            extraction_info: ExtractionInfo {
                total_sources,
                extracted_at: timestamp_now(),
                successful_extractions: 0,
                note,
            },
            sources: Vec::with_capacity(total_sources),
        }
    }

    /// Append one record, keeping the success count in step.
    pub fn push(&mut self, record: ExtractionRecord) {
        if record.outcome.is_extracted() {
            self.extraction_info.successful_extractions += 1;
        }
        self.sources.push(record);
    }

    /// Sources whose fetch failed.
    pub fn failed_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|r| matches!(r.outcome, SourceOutcome::Failed { .. }))
            .count()
    }

    /// Total sections across every record.
    pub fn section_count(&self) -> usize {
        self.sources.iter().map(|r| r.sections.len()).sum()
    }

    /// Serialize with `info_key` naming each record's section array.
    pub fn keyed<'a>(&'a self, info_key: &'a str) -> KeyedAggregate<'a> {
        KeyedAggregate {
            result: self,
            info_key,
        }
    }
}

/// Serialization view of an [`AggregateResult`] under a caller-chosen section key.
pub struct KeyedAggregate<'a> {
    result: &'a AggregateResult,
    info_key: &'a str,
}

struct KeyedSources<'a> {
    records: &'a [ExtractionRecord],
    info_key: &'a str,
}

impl Serialize for KeyedSources<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.iter().map(|r| r.keyed(self.info_key)))
    }
}

impl Serialize for KeyedAggregate<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("extraction_info", &self.result.extraction_info)?;
        map.serialize_entry(
            "sources",
            &KeyedSources {
                records: &self.result.sources,
                info_key: self.info_key,
            },
        )?;
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Binary downloads
// ---------------------------------------------------------------------------

/// One configured binary (PDF) download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfResource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Target file name; derived from the URL when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl PdfResource {
    /// The file name the payload is saved under.
    ///
    /// Configured names go through the same sanitizing as derived ones, so the
    /// result is always a single path component.
    pub fn file_name(&self) -> String {
        let configured = self
            .filename
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let stem = configured
            .or_else(|| {
                Url::parse(&self.url).ok().and_then(|u| {
                    u.path_segments()
                        .and_then(|mut segs| segs.next_back().map(str::to_string))
                        .filter(|s| !s.is_empty())
                })
            })
            .unwrap_or_else(|| self.name.clone());

        let mut name = sanitize_file_name(&stem);
        if name.is_empty() {
            name = "download".into();
        }
        if !name.ends_with(".pdf") {
            name.push_str(".pdf");
        }
        name
    }
}

/// Lowercase, replace anything outside `[a-z0-9_.-]` with `_`, and strip
/// leading dots so the name can never climb out of its directory.
fn sanitize_file_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    UNSAFE_FILENAME_CHARS
        .replace_all(&lowered, "_")
        .trim_start_matches(['_', '.'])
        .trim_end_matches('_')
        .to_string()
}

/// Manifest entry for one attempted download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadEntry {
    pub filename: String,
    /// Where the bytes were written; absent when nothing was saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub url: String,
    pub description: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run-level summary for a download batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub total_pdfs: usize,
    pub extracted_at: String,
    pub successful_downloads: usize,
    pub failed_downloads: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The manifest document written next to the downloaded files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadManifest {
    pub extraction_info: DownloadInfo,
    pub pdf_files: Vec<DownloadEntry>,
}

impl DownloadManifest {
    pub fn new(total_pdfs: usize, note: Option<String>) -> Self {
        Self {
            extraction_info: DownloadInfo {
                total_pdfs,
                extracted_at: timestamp_now(),
                successful_downloads: 0,
                failed_downloads: 0,
                note,
            },
            pdf_files: Vec::with_capacity(total_pdfs),
        }
    }

    /// Append one entry, keeping both counters in step.
    pub fn push(&mut self, entry: DownloadEntry) {
        if entry.success {
            self.extraction_info.successful_downloads += 1;
        } else {
            self.extraction_info.failed_downloads += 1;
        }
        self.pdf_files.push(entry);
    }
}
