//! Multi-source harvest: fetch → locate → extract, one source at a time.

use std::time::Instant;

use tracing::{debug, info, instrument, warn};
use url::Url;

use kbharvest_extract::{KeywordSet, extract_page};
use kbharvest_shared::{
    AggregateResult, DownloadEntry, ExtractionRecord, HarvestConfig, Result, Source,
    SourceOutcome,
};

use crate::fetch::Fetcher;

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a source or download is attempted.
    fn item_started(&self, name: &str, current: usize, total: usize);
    /// Called once a source's record is complete.
    fn source_finished(&self, record: &ExtractionRecord);
    /// Called once a download's manifest entry is complete.
    fn download_finished(&self, entry: &DownloadEntry);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_started(&self, _name: &str, _current: usize, _total: usize) {}
    fn source_finished(&self, _record: &ExtractionRecord) {}
    fn download_finished(&self, _entry: &DownloadEntry) {}
}

/// Harvest every source in order and assemble the aggregate result.
///
/// Per-source failures are recorded, never returned. The only error is a
/// failure to build the HTTP client.
#[instrument(skip_all, fields(sources = sources.len()))]
pub async fn harvest(
    sources: &[Source],
    config: &HarvestConfig,
    progress: &dyn ProgressReporter,
) -> Result<AggregateResult> {
    let fetcher = Fetcher::for_pages(config.timeout)?;
    Ok(harvest_with(&fetcher, sources, config, progress).await)
}

/// [`harvest`] with a caller-supplied fetcher.
///
/// The politeness delay runs before every source after the first, failed ones
/// included; nothing sleeps after the last source.
pub async fn harvest_with(
    fetcher: &Fetcher,
    sources: &[Source],
    config: &HarvestConfig,
    progress: &dyn ProgressReporter,
) -> AggregateResult {
    let start = Instant::now();
    let total = sources.len();
    let mut result = AggregateResult::new(total, config.note.clone());

    info!(
        total,
        delay_ms = config.delay.as_millis(),
        "starting harvest"
    );
    progress.phase("Harvesting sources");

    for (i, source) in sources.iter().enumerate() {
        progress.item_started(&source.name, i + 1, total);
        info!(source = %source.name, url = %source.url, current = i + 1, total, "fetching source");

        let record = harvest_source(fetcher, source, config).await;
        match &record.outcome {
            SourceOutcome::Extracted => {
                info!(source = %source.name, sections = record.sections.len(), "extracted")
            }
            SourceOutcome::Empty => warn!(source = %source.name, "no qualifying sections"),
            SourceOutcome::Failed { error } => warn!(source = %source.name, %error, "fetch failed"),
        }
        progress.source_finished(&record);
        result.push(record);

        if i + 1 < total && !config.delay.is_zero() {
            debug!(delay_ms = config.delay.as_millis(), "politeness delay");
            tokio::time::sleep(config.delay).await;
        }
    }

    info!(
        successful = result.extraction_info.successful_extractions,
        failed = result.failed_count(),
        sections = result.section_count(),
        elapsed_ms = start.elapsed().as_millis(),
        "harvest complete"
    );

    result
}

/// Fetch, parse, and extract a single source.
async fn harvest_source(
    fetcher: &Fetcher,
    source: &Source,
    config: &HarvestConfig,
) -> ExtractionRecord {
    let page_url = match Url::parse(&source.url) {
        Ok(url) => url,
        Err(e) => return ExtractionRecord::failed(source, format!("invalid URL: {e}")),
    };

    let html = match fetcher.fetch_text(page_url.as_str()).await {
        Ok(html) => html,
        Err(e) => return ExtractionRecord::failed(source, e.to_string()),
    };

    let keywords = KeywordSet::from_terms(config.keywords_for(source));
    let sections = extract_page(&html, &page_url, keywords.as_ref(), &config.extract);

    ExtractionRecord::parsed(source, sections)
}
