#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point: back up one file to S3 if it changed.
//!
//! Credentials come from `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`
//! and are checked before any work starts. Exits `0` when the file was
//! uploaded or was already identical remotely, `1` on any failure.

use std::process::ExitCode;

use clap::Parser;
use s3_backup_cli_utils::IndicatifProgress;
use s3_backup_s3::S3Store;
use s3_backup_sync::path::parse_strip_count;
use s3_backup_sync::{BackupError, BackupRequest, UploadOutcome, pipeline};

#[derive(Parser)]
#[command(
    name = "s3_backup",
    about = "Backup your family photos (or any file) efficiently to Amazon S3"
)]
struct Cli {
    /// Filename (with path) for file to upload
    #[arg(short, long)]
    input: String,
    /// AWS bucket name
    #[arg(short, long)]
    bucket: String,
    /// Number of leading directories to strip from the remote key
    /// (e.g. 2 turns `/Users/brian/Pictures/a.jpg` into `/Pictures/a.jpg`)
    #[arg(short, long)]
    strip: Option<String>,
    /// Text prepended verbatim to the remote key (e.g. `/Backups`)
    #[arg(short, long)]
    prepend: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let multi = s3_backup_cli_utils::init_logger();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let store = match S3Store::from_env(&cli.bucket) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{}", BackupError::from(e));
            return ExitCode::FAILURE;
        }
    };

    let request = BackupRequest {
        local_path: cli.input,
        strip_count: cli.strip.as_deref().and_then(parse_strip_count),
        prepend: cli.prepend,
    };

    println!("Processing {}", request.local_path);
    log::debug!("bucket: {}, request: {request:?}", store.bucket());

    let progress = IndicatifProgress::transfer_bar(&multi, &request.local_path);
    let outcome = pipeline::run(&store, &request, progress.clone()).await;

    if let UploadOutcome::Uploaded { location } = &outcome {
        println!("file available at {location}");
    } else {
        progress.finish_and_clear();
    }

    if outcome.is_failure() {
        log::error!("backup of {} failed: {outcome:?}", request.local_path);
        eprintln!("{}", outcome.message());
    } else {
        println!("{}", outcome.message());
    }

    ExitCode::from(outcome.exit_code())
}
