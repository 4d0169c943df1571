use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use anyhow::anyhow;
use backend_bridge::commands::BackendCommand;
use clap::Parser;
use controller::events::UiEvent;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;
use ui::UploaderApp;

#[derive(Parser, Debug)]
#[command(about = "Watches a folder for exported XML results and uploads them")]
struct Args {
    /// Settings file; defaults to ./uploader.toml when present
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    let settings = uploader_core::config::load_settings(args.config.as_deref())?;
    tracing::info!(api_url = %settings.api_url, "starting desktop uploader");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    let log_capacity = settings.log_capacity;
    let worker = backend_bridge::runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("OResults XML Uploader")
            .with_inner_size([760.0, 560.0])
            .with_min_inner_size([520.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "OResults XML Uploader",
        options,
        Box::new(move |_cc| Ok(Box::new(UploaderApp::new(cmd_tx, ui_rx, log_capacity)))),
    )
    .map_err(|err| anyhow!("desktop window failed: {err}"))?;

    if worker.join().is_err() {
        tracing::error!("backend worker panicked");
    }
    Ok(())
}
