//! Binary downloader: fetch each PDF, persist it, and verify its signature.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, instrument, warn};

use kbharvest_shared::{
    DownloadConfig, DownloadEntry, DownloadManifest, HarvestError, PdfResource, Result,
};

use crate::fetch::Fetcher;
use crate::pipeline::ProgressReporter;

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Download every PDF in order and build the manifest.
///
/// Per-download failures become entries with `success: false`. Only an
/// unusable download directory or HTTP client is returned as an error.
#[instrument(skip_all, fields(pdfs = pdfs.len(), dir = %config.dir.display()))]
pub async fn download_pdfs(
    pdfs: &[PdfResource],
    config: &DownloadConfig,
    progress: &dyn ProgressReporter,
) -> Result<DownloadManifest> {
    tokio::fs::create_dir_all(&config.dir)
        .await
        .map_err(|e| HarvestError::io(&config.dir, e))?;
    let fetcher = Fetcher::for_downloads(config.timeout)?;

    let total = pdfs.len();
    let mut manifest = DownloadManifest::new(total, config.note.clone());
    progress.phase("Downloading PDFs");

    for (i, pdf) in pdfs.iter().enumerate() {
        progress.item_started(&pdf.name, i + 1, total);

        let entry = download_one(&fetcher, pdf, &config.dir).await;
        match &entry.error {
            None => info!(pdf = %pdf.name, size = entry.size, "downloaded"),
            Some(error) => warn!(pdf = %pdf.name, %error, "download failed"),
        }
        progress.download_finished(&entry);
        manifest.push(entry);

        if i + 1 < total && !config.delay.is_zero() {
            debug!(delay_ms = config.delay.as_millis(), "politeness delay");
            tokio::time::sleep(config.delay).await;
        }
    }

    info!(
        successful = manifest.extraction_info.successful_downloads,
        failed = manifest.extraction_info.failed_downloads,
        "downloads complete"
    );
    Ok(manifest)
}

async fn download_one(fetcher: &Fetcher, pdf: &PdfResource, dir: &Path) -> DownloadEntry {
    let filename = pdf.file_name();
    let mut entry = DownloadEntry {
        filename: filename.clone(),
        path: None,
        size: None,
        url: pdf.url.clone(),
        description: pdf.description.clone(),
        success: false,
        error: None,
    };

    let target = dir.join(&filename);
    let saved = match fetcher.fetch_to_file(&pdf.url, &target).await {
        Ok(saved) => saved,
        Err(e) => {
            entry.error = Some(e.to_string());
            if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                entry.path = Some(target.display().to_string());
            }
            return entry;
        }
    };

    if let Some(ct) = saved.content_type.as_deref() {
        if !ct.contains("pdf") && !ct.contains("octet-stream") {
            warn!(pdf = %pdf.name, content_type = ct, "unexpected content type");
        }
    }

    entry.path = Some(target.display().to_string());
    entry.size = Some(saved.size);

    match verify_magic(&target).await {
        Ok(()) => entry.success = true,
        Err(e) => entry.error = Some(e.to_string()),
    }
    entry
}

/// Check that the file at `path` starts with [`PDF_MAGIC`].
pub async fn verify_magic(path: &Path) -> Result<()> {
    let file = File::open(path).await.map_err(|e| HarvestError::io(path, e))?;
    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    file.take(PDF_MAGIC.len() as u64)
        .read_to_end(&mut head)
        .await
        .map_err(|e| HarvestError::io(path, e))?;

    if head.as_slice() == PDF_MAGIC {
        Ok(())
    } else {
        Err(HarvestError::Integrity(format!(
            "{} does not start with %PDF",
            path.display()
        )))
    }
}
