//! bundle-sync - Main entry point
//!
//! Reconciles an S3 bucket against the newest archive bundle.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use bundle_sync::store::s3::S3Store;
use bundle_sync::sync::{SyncHandler, SyncOptions};
use bundle_sync::{shutdown, utils, Config, SyncError};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Target bucket to reconcile (overrides config)
    #[arg(long)]
    target_bucket: Option<String>,

    /// Bucket holding the source bundle (overrides config)
    #[arg(long)]
    source_bucket: Option<String>,

    /// Object key of the source bundle (overrides config)
    #[arg(long)]
    source_key: Option<String>,

    /// Maximum concurrent uploads (overrides config)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile the target bucket against the source bundle (default)
    Sync,
    /// Delete every object in the target bucket
    Empty,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    // CLI flags win over file values
    if let Some(bucket) = args.target_bucket {
        config.buckets.target = bucket;
    }
    if let Some(bucket) = args.source_bucket {
        config.buckets.source = bucket;
    }
    if let Some(key) = args.source_key {
        config.buckets.source_key = key;
    }
    if let Some(limit) = args.concurrency {
        config.transfer.upload_concurrency = limit;
    }

    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let command = args.command.unwrap_or(Command::Sync);
    config.validate(matches!(command, Command::Sync))?;

    tracing::info!(
        "Starting bundle-sync v{} (target: '{}')",
        env!("CARGO_PKG_VERSION"),
        config.buckets.target
    );

    let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = Arc::new(S3Store::new(&sdk_config));

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown::cancel_on_signal(cancel.clone()));

    let options = SyncOptions {
        target_bucket: config.buckets.target.clone(),
        source_bucket: config.buckets.source.clone(),
        source_key: config.buckets.source_key.clone(),
        upload_concurrency: config.transfer.upload_concurrency,
        delete_batch_size: config.transfer.delete_batch_size,
        type_overrides: config.content_types.overrides.clone(),
    };
    let handler = SyncHandler::with_cancel(store, options, cancel);

    let result = match command {
        Command::Sync => handler.sync_bucket().await,
        Command::Empty => handler.empty_bucket().await,
    };

    match result {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string(&report)?);
            }
            Ok(())
        }
        Err(SyncError::Cancelled) => {
            tracing::warn!("Run cancelled before completion");
            std::process::exit(130);
        }
        Err(err) => Err(err.into()),
    }
}
