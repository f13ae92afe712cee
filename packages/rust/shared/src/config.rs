//! Application configuration for kbharvest.
//!
//! User config lives at `~/.kbharvest/kbharvest.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{HarvestError, Result};
use crate::types::{DEFAULT_INFO_KEY, PdfResource, Source};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "kbharvest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".kbharvest";

/// Starter config written by [`init_config`]: the epilepsy and pregnancy
/// knowledge base, with its sources, keywords, and reference PDFs.
pub const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../templates/kbharvest.toml");

// ---------------------------------------------------------------------------
// Config structs (matching kbharvest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Page harvest settings.
    #[serde(default)]
    pub harvest: HarvestSettings,

    /// Pages to harvest, in output order.
    #[serde(default)]
    pub sources: Vec<Source>,

    /// Binary download settings.
    #[serde(default)]
    pub downloads: DownloadSettings,

    /// Binary payloads to download, in manifest order.
    #[serde(default)]
    pub pdfs: Vec<PdfResource>,
}

/// `[harvest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestSettings {
    /// Topic label used in synthesized section titles.
    #[serde(default = "default_topic")]
    pub topic: String,

    /// JSON key naming each record's section array.
    #[serde(default = "default_info_key")]
    pub info_key: String,

    /// Free-form note copied into `extraction_info`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Keyword set for sources that declare none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,

    /// Section content must be longer than this many characters.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,

    /// List items must be longer than this many characters.
    #[serde(default = "default_min_item_chars")]
    pub min_item_chars: usize,

    /// Lists with fewer qualifying items are dropped.
    #[serde(default = "default_min_list_items")]
    pub min_list_items: usize,

    /// Cap on entries in the synthesized links section.
    #[serde(default = "default_max_links")]
    pub max_links: usize,

    /// Pause between sources, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Page fetch timeout, in seconds.
    #[serde(default = "default_page_timeout")]
    pub timeout_secs: u64,

    /// Output JSON path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            info_key: default_info_key(),
            note: None,
            keywords: None,
            min_content_chars: default_min_content_chars(),
            min_item_chars: default_min_item_chars(),
            min_list_items: default_min_list_items(),
            max_links: default_max_links(),
            delay_secs: default_delay_secs(),
            timeout_secs: default_page_timeout(),
            output: default_output(),
        }
    }
}

fn default_topic() -> String {
    "Important".into()
}
fn default_info_key() -> String {
    DEFAULT_INFO_KEY.into()
}
fn default_min_content_chars() -> usize {
    15
}
fn default_min_item_chars() -> usize {
    10
}
fn default_min_list_items() -> usize {
    2
}
fn default_max_links() -> usize {
    15
}
fn default_delay_secs() -> u64 {
    2
}
fn default_page_timeout() -> u64 {
    15
}
fn default_output() -> String {
    "knowledge_base.json".into()
}

/// `[downloads]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    /// Directory the payloads are written into.
    #[serde(default = "default_download_dir")]
    pub dir: String,

    /// Manifest JSON path.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Free-form note copied into the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Download timeout, in seconds.
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,

    /// Pause between downloads, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
            manifest: default_manifest(),
            note: None,
            timeout_secs: default_download_timeout(),
            delay_secs: default_delay_secs(),
        }
    }
}

fn default_download_dir() -> String {
    "pdfs".into()
}
fn default_manifest() -> String {
    "pdf_database.json".into()
}
fn default_download_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Thresholds and labels the extractors run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Topic label for synthesized titles.
    pub topic: String,
    /// Minimum (exclusive) character count for section content.
    pub min_content_chars: usize,
    /// Minimum (exclusive) character count for list items.
    pub min_item_chars: usize,
    /// Minimum qualifying items for a list to become a section.
    pub min_list_items: usize,
    /// Maximum entries in the links section.
    pub max_links: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from(&HarvestSettings::default())
    }
}

impl From<&HarvestSettings> for ExtractOptions {
    fn from(settings: &HarvestSettings) -> Self {
        Self {
            topic: settings.topic.clone(),
            min_content_chars: settings.min_content_chars,
            min_item_chars: settings.min_item_chars,
            min_list_items: settings.min_list_items,
            max_links: settings.max_links,
        }
    }
}

/// Runtime harvest configuration.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub extract: ExtractOptions,
    /// Keyword set for sources that declare none.
    pub default_keywords: Option<Vec<String>>,
    /// Pause between consecutive sources, failed ones included.
    pub delay: Duration,
    /// Page fetch timeout.
    pub timeout: Duration,
    pub info_key: String,
    pub note: Option<String>,
    pub output: PathBuf,
}

impl From<&AppConfig> for HarvestConfig {
    fn from(config: &AppConfig) -> Self {
        let h = &config.harvest;
        Self {
            extract: ExtractOptions::from(h),
            default_keywords: h.keywords.clone(),
            delay: Duration::from_secs(h.delay_secs),
            timeout: Duration::from_secs(h.timeout_secs),
            info_key: h.info_key.clone(),
            note: h.note.clone(),
            output: PathBuf::from(&h.output),
        }
    }
}

impl HarvestConfig {
    /// The keyword set that applies to `source`, if any.
    pub fn keywords_for<'a>(&'a self, source: &'a Source) -> Option<&'a [String]> {
        source
            .keywords
            .as_deref()
            .or(self.default_keywords.as_deref())
    }
}

/// Runtime download configuration.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub dir: PathBuf,
    pub manifest: PathBuf,
    pub note: Option<String>,
    pub timeout: Duration,
    pub delay: Duration,
}

impl From<&AppConfig> for DownloadConfig {
    fn from(config: &AppConfig) -> Self {
        let d = &config.downloads;
        Self {
            dir: PathBuf::from(&d.dir),
            manifest: PathBuf::from(&d.manifest),
            note: d.note.clone(),
            timeout: Duration::from_secs(d.timeout_secs),
            delay: Duration::from_secs(d.delay_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.kbharvest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HarvestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.kbharvest/kbharvest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load and validate the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HarvestError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        HarvestError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Check that every configured source and download has a name and an absolute http(s) URL.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let targets = config
        .sources
        .iter()
        .map(|s| (s.name.as_str(), s.url.as_str()))
        .chain(config.pdfs.iter().map(|p| (p.name.as_str(), p.url.as_str())));

    for (name, url) in targets {
        if name.trim().is_empty() {
            return Err(HarvestError::validation(format!("entry for {url} has no name")));
        }
        let parsed = Url::parse(url)
            .map_err(|e| HarvestError::validation(format!("{name}: invalid URL '{url}': {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(HarvestError::validation(format!(
                "{name}: unsupported scheme '{}'",
                parsed.scheme()
            )));
        }
    }

    if config.harvest.info_key.trim().is_empty() {
        return Err(HarvestError::validation("harvest.info_key must not be empty"));
    }

    Ok(())
}

/// Create the config directory and write [`DEFAULT_CONFIG_TEMPLATE`] into it.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE).map_err(|e| HarvestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[harvest]
topic = "Epilepsy & Pregnancy"
info_key = "epilepsy_pregnancy_info"
note = "Specialized epilepsy and pregnancy resources"
keywords = ["epilepsy", "seizure", "pregnancy"]
delay_secs = 3

[[sources]]
name = "Epilepsy Pregnancy Resources"
url = "https://epilepsypregnancy.com/resources-tools/"
description = "Resources and tools"

[[sources]]
name = "Mayo Clinic Pregnancy"
url = "https://www.mayoclinic.org/healthy-lifestyle/pregnancy-week-by-week"
description = "Week-by-week guide"
keywords = []

[downloads]
dir = "/tmp/pdfs"

[[pdfs]]
name = "Seizure Event Diary"
url = "https://www.epilepsy.com/files/diary.pdf"
"#;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("info_key"));
        assert!(toml_str.contains("min_content_chars"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.harvest.min_content_chars, 15);
        assert_eq!(parsed.harvest.info_key, "sections");
        assert_eq!(parsed.downloads.timeout_secs, 30);
    }

    #[test]
    fn config_with_sources() {
        let config: AppConfig = toml::from_str(SAMPLE).expect("parse");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.pdfs.len(), 1);
        assert_eq!(config.harvest.topic, "Epilepsy & Pregnancy");
        assert_eq!(config.harvest.max_links, 15);
        assert_eq!(config.sources[1].keywords, Some(vec![]));
        validate_config(&config).expect("valid");
    }

    #[test]
    fn harvest_config_from_app_config() {
        let app: AppConfig = toml::from_str(SAMPLE).expect("parse");
        let harvest = HarvestConfig::from(&app);
        assert_eq!(harvest.delay, Duration::from_secs(3));
        assert_eq!(harvest.timeout, Duration::from_secs(15));
        assert_eq!(harvest.info_key, "epilepsy_pregnancy_info");

        let downloads = DownloadConfig::from(&app);
        assert_eq!(downloads.dir, PathBuf::from("/tmp/pdfs"));
        assert_eq!(downloads.timeout, Duration::from_secs(30));
    }

    #[test]
    fn source_keywords_inherit_run_default() {
        let app: AppConfig = toml::from_str(SAMPLE).expect("parse");
        let harvest = HarvestConfig::from(&app);

        let inherited = harvest.keywords_for(&app.sources[0]).expect("inherited");
        assert_eq!(inherited.len(), 3);

        let explicit_empty = harvest.keywords_for(&app.sources[1]).expect("explicit");
        assert!(explicit_empty.is_empty());
    }

    #[test]
    fn shipped_template_loads_and_validates() {
        let path = std::env::temp_dir().join(format!(
            "kbh-config-template-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE).unwrap();
        let config = load_config_from(&path).expect("template loads");
        let _ = std::fs::remove_file(&path);

        validate_config(&config).expect("template validates");
        assert_eq!(config.harvest.topic, "Epilepsy & Pregnancy");
        assert_eq!(config.harvest.info_key, "epilepsy_pregnancy_info");
        assert_eq!(
            config.harvest.output,
            "epilepsy_pregnancy_comprehensive_data.json"
        );
        assert_eq!(config.sources.len(), 8);
        assert_eq!(config.pdfs.len(), 11);

        let keywords = config.harvest.keywords.as_deref().expect("keywords");
        assert_eq!(keywords.len(), 15);
        assert!(keywords.iter().any(|k| k == "anti-seizure"));

        // Every source inherits the run-wide keyword set.
        assert!(config.sources.iter().all(|s| s.keywords.is_none()));

        for pdf in &config.pdfs {
            assert_eq!(Some(pdf.file_name()), pdf.filename, "{}", pdf.name);
        }
    }

    #[test]
    fn rejects_non_http_source() {
        let mut config = AppConfig::default();
        config.sources.push(Source {
            name: "local".into(),
            url: "file:///etc/passwd".into(),
            description: String::new(),
            keywords: None,
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn rejects_relative_url() {
        let mut config = AppConfig::default();
        config.pdfs.push(PdfResource {
            name: "guide".into(),
            url: "/files/guide.pdf".into(),
            description: String::new(),
            filename: None,
        });
        assert!(validate_config(&config).is_err());
    }
}
