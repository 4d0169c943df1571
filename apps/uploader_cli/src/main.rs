use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::{LogEntry, Severity};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;
use uploader_core::{config::load_settings, HostBridge, MissingFolderPicker, UploaderHost};

/// Watches a folder without a window and uploads exported XML results.
#[derive(Parser, Debug)]
struct Args {
    /// API key from OResults.eu
    #[arg(short, long)]
    key: String,
    /// Folder the timing software exports into
    #[arg(short, long, default_value = ".")]
    path: PathBuf,
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Print each event as a JSON line instead of logging it
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    let settings = load_settings(args.config.as_deref())?;

    let folder = args
        .path
        .canonicalize()
        .with_context(|| format!("cannot open folder {}", args.path.display()))?;
    let host = UploaderHost::new(&settings, Arc::new(MissingFolderPicker))?;
    let mut events = host.subscribe_events();

    host.set_api_key(&args.key).await?;
    host.set_folder(folder.clone()).await;
    host.watch().await?;
    tracing::info!(folder = %folder.display(), api_url = %settings.api_url, "watching for new XML files");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(entry) => report(&entry, args.json)?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    host.unwatch().await?;
    tracing::info!("watcher stopped");
    Ok(())
}

fn report(entry: &LogEntry, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(entry)?);
        return Ok(());
    }
    let filename = entry.filename.as_deref().unwrap_or("-");
    match entry.severity {
        Severity::Error => tracing::error!(file = filename, "{}", entry.event),
        Severity::Info | Severity::Success => tracing::info!(file = filename, "{}", entry.event),
    }
    Ok(())
}
