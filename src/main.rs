mod config;
mod error;
mod filter;
mod grouping;
mod loader;
mod model;
mod normalize;
mod pipeline;
mod stats;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use config::Settings;

#[derive(Parser)]
#[command(name = "dmarket-analyzer", version)]
#[command(about = "Split collected marketplace items into good and bad buy candidates", long_about = None)]
struct Cli {
    /// TOML settings file
    #[arg(short, long, env = "DMARKET_ANALYZER_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory holding aggregated/items_all.json
    #[arg(long, env = "DMARKET_ANALYZER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Raw items file (JSON array or NDJSON)
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[arg(long)]
    good_output: Option<PathBuf>,

    #[arg(long)]
    bad_output: Option<PathBuf>,

    /// Write one item per line instead of a JSON array
    #[arg(long)]
    ndjson: bool,

    /// Write per-item verdicts (NDJSON) to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Only accept good candidates whose recent prices are consistent
    #[arg(long)]
    require_price_consistency: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply(self, settings: &mut Settings) {
        if let Some(dir) = self.data_dir {
            settings.data_dir = dir;
        }
        if self.input.is_some() {
            settings.input = self.input;
        }
        if self.good_output.is_some() {
            settings.good_output = self.good_output;
        }
        if self.bad_output.is_some() {
            settings.bad_output = self.bad_output;
        }
        if self.report.is_some() {
            settings.report = self.report;
        }
        settings.ndjson |= self.ndjson;
        settings.filters.require_price_consistency |= self.require_price_consistency;
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    cli.apply(&mut settings);

    let now = chrono::Local::now().naive_local();
    let summary = pipeline::run(&settings, now).context("writing classified items")?;

    tracing::info!(loaded = summary.loaded, "done");
    Ok(())
}
