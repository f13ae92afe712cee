//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use kbharvest_core::{ProgressReporter, download_pdfs, harvest, write_aggregate, write_json};
use kbharvest_shared::{
    AppConfig, DownloadConfig, DownloadEntry, ExtractionRecord, HarvestConfig, SourceOutcome,
    init_config, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// kbharvest: turn topic web pages into knowledge-base JSON.
#[derive(Parser)]
#[command(
    name = "kbharvest",
    version,
    about = "Harvest titled sections from web pages into knowledge-base JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.kbharvest/kbharvest.toml.
    #[arg(long, global = true, env = "KBHARVEST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch every configured source and write the aggregate JSON.
    Harvest {
        /// Output JSON path (overrides `harvest.output`).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Key naming each record's section array (overrides `harvest.info_key`).
        #[arg(long)]
        info_key: Option<String>,

        /// Seconds to wait between sources (overrides `harvest.delay_secs`).
        #[arg(long)]
        delay: Option<f64>,
    },

    /// Download every configured PDF and write the manifest.
    Download {
        /// Target directory (overrides `downloads.dir`).
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Manifest JSON path (overrides `downloads.manifest`).
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write the starter config (epilepsy and pregnancy sources and PDFs).
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "kbharvest=info",
        1 => "kbharvest=debug",
        _ => "kbharvest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Harvest {
            output,
            info_key,
            delay,
        } => {
            let config = resolve_config(config_path)?;
            let overrides = HarvestOverrides {
                output,
                info_key,
                delay,
            };
            cmd_harvest(&config, overrides).await
        }
        Command::Download { dir, manifest } => {
            let config = resolve_config(config_path)?;
            cmd_download(&config, dir, manifest).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
struct HarvestOverrides {
    output: Option<PathBuf>,
    info_key: Option<String>,
    delay: Option<f64>,
}

impl HarvestOverrides {
    fn apply(self, mut config: HarvestConfig) -> Result<HarvestConfig> {
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(key) = self.info_key {
            if key.trim().is_empty() {
                return Err(eyre!("--info-key must not be empty"));
            }
            config.info_key = key;
        }
        if let Some(secs) = self.delay {
            config.delay = Duration::try_from_secs_f64(secs)
                .map_err(|_| eyre!("--delay must be a non-negative number of seconds, got {secs}"))?;
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_harvest(config: &AppConfig, overrides: HarvestOverrides) -> Result<()> {
    if config.sources.is_empty() {
        return Err(eyre!(
            "no sources configured; add [[sources]] entries to the config file"
        ));
    }

    let harvest_config = overrides.apply(HarvestConfig::from(config))?;

    info!(
        sources = config.sources.len(),
        output = %harvest_config.output.display(),
        info_key = %harvest_config.info_key,
        "harvesting knowledge base"
    );

    let reporter = CliProgress::new();
    let result = harvest(&config.sources, &harvest_config, &reporter).await?;
    reporter.finish();

    write_aggregate(&harvest_config.output, &result, &harvest_config.info_key)?;

    let info = &result.extraction_info;
    println!();
    println!("  Harvest complete!");
    println!(
        "  Sources:  {}/{} extracted",
        info.successful_extractions, info.total_sources
    );
    println!("  Failed:   {}", result.failed_count());
    println!("  Sections: {}", result.section_count());
    println!("  Output:   {}", harvest_config.output.display());
    println!();

    Ok(())
}

async fn cmd_download(
    config: &AppConfig,
    dir: Option<PathBuf>,
    manifest: Option<PathBuf>,
) -> Result<()> {
    if config.pdfs.is_empty() {
        return Err(eyre!(
            "no PDFs configured; add [[pdfs]] entries to the config file"
        ));
    }

    let mut download_config = DownloadConfig::from(config);
    if let Some(dir) = dir {
        download_config.dir = dir;
    }
    if let Some(manifest) = manifest {
        download_config.manifest = manifest;
    }

    info!(
        pdfs = config.pdfs.len(),
        dir = %download_config.dir.display(),
        "downloading PDFs"
    );

    let reporter = CliProgress::new();
    let manifest = download_pdfs(&config.pdfs, &download_config, &reporter).await?;
    reporter.finish();

    write_json(&download_config.manifest, &manifest)?;

    let info = &manifest.extraction_info;
    println!();
    println!("  Downloads complete!");
    println!(
        "  PDFs:      {}/{} verified",
        info.successful_downloads, info.total_pdfs
    );
    println!("  Failed:    {}", info.failed_downloads);
    println!("  Directory: {}", download_config.dir.display());
    println!("  Manifest:  {}", download_config.manifest.display());
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_started(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {name}"));
    }

    fn source_finished(&self, record: &ExtractionRecord) {
        let line = match &record.outcome {
            SourceOutcome::Extracted => {
                format!("  ✓ {} ({} sections)", record.source, record.sections.len())
            }
            SourceOutcome::Empty => format!("  - {} (no relevant sections)", record.source),
            SourceOutcome::Failed { error } => format!("  ✗ {}: {error}", record.source),
        };
        self.spinner.println(line);
    }

    fn download_finished(&self, entry: &DownloadEntry) {
        let line = match (&entry.error, entry.size) {
            (None, Some(size)) => format!("  ✓ {} ({size} bytes)", entry.filename),
            (None, None) => format!("  ✓ {}", entry.filename),
            (Some(error), _) => format!("  ✗ {}: {error}", entry.filename),
        };
        self.spinner.println(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_harvest_overrides() {
        let cli = Cli::try_parse_from([
            "kbharvest",
            "-vv",
            "--config",
            "custom.toml",
            "harvest",
            "--output",
            "out/kb.json",
            "--info-key",
            "pregnancy_info",
            "--delay",
            "0.5",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some(Path::new("custom.toml")));
        match cli.command {
            Command::Harvest {
                output,
                info_key,
                delay,
            } => {
                assert_eq!(output, Some(PathBuf::from("out/kb.json")));
                assert_eq!(info_key.as_deref(), Some("pregnancy_info"));
                assert_eq!(delay, Some(0.5));
            }
            _ => panic!("expected harvest command"),
        }
    }

    #[test]
    fn overrides_replace_config_values() {
        let base = HarvestConfig::from(&AppConfig::default());
        let overrides = HarvestOverrides {
            output: Some(PathBuf::from("kb.json")),
            info_key: Some("epilepsy_info".into()),
            delay: Some(0.0),
        };

        let config = overrides.apply(base).unwrap();
        assert_eq!(config.output, PathBuf::from("kb.json"));
        assert_eq!(config.info_key, "epilepsy_info");
        assert!(config.delay.is_zero());
    }

    #[test]
    fn negative_delay_is_rejected() {
        let base = HarvestConfig::from(&AppConfig::default());
        let overrides = HarvestOverrides {
            delay: Some(-1.0),
            ..HarvestOverrides::default()
        };
        assert!(overrides.apply(base).is_err());
    }

    #[test]
    fn empty_info_key_is_rejected() {
        let base = HarvestConfig::from(&AppConfig::default());
        let overrides = HarvestOverrides {
            info_key: Some("  ".into()),
            ..HarvestOverrides::default()
        };
        assert!(overrides.apply(base).is_err());
    }

    #[test]
    fn defaults_keep_config_values() {
        let base = HarvestConfig::from(&AppConfig::default());
        let config = HarvestOverrides::default().apply(base).unwrap();
        assert_eq!(config.info_key, "sections");
        assert_eq!(config.delay, Duration::from_secs(2));
        assert_eq!(config.output, PathBuf::from("knowledge_base.json"));
    }
}
