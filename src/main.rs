//! THP Dashboard - mobile network throughput report viewer
//!
//! Loads a semicolon-delimited measurement CSV and shows per-operator
//! averages, trend charts and a filterable detail table.

mod charts;
mod config;
mod data;
mod gui;
mod report;
mod stats;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::DashboardConfig;
use eframe::egui;
use gui::DashboardApp;
use std::path::{Path, PathBuf};
use tracing::info;

/// Config file picked up from the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "thp_dashboard.json";

#[derive(Parser, Debug)]
#[command(name = "thp-dashboard", version, about)]
struct Args {
    /// Measurement CSV to open (overrides the config file)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// An explicit `--config` must exist; the default file is optional.
fn load_config(explicit: Option<&Path>) -> Result<DashboardConfig> {
    match explicit {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Ok(DashboardConfig::load(Path::new(DEFAULT_CONFIG_FILE))?)
        }
        None => Ok(DashboardConfig::default()),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(data) = args.data {
        config.data_path = data;
    }
    info!(data = %config.data_path.display(), periods = config.periods.len(), "Starting dashboard");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("THP Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "THP Dashboard",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("GUI error: {e}"))
}
