//! `lecture-archive` CLI: archive one page into the snapshot bucket.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lecture_archiver::archiver::{ArchiveOutcome, archive_url_to_html, archive_url_to_pdf};
use lecture_archiver::config::{ArchiveConfig, StoreConfig};
use lecture_archiver::error::ArchiveError;
use lecture_archiver::store::{ArchiveStore, Provenance, default_object_key_for_url};

#[derive(Parser)]
#[command(
    name = "lecture-archive",
    version,
    about = "Archive an external web page into the lecture snapshot bucket"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture, sanitize and upload a self-contained HTML snapshot
    Html(ArchiveArgs),
    /// Capture and upload a printed PDF snapshot
    Pdf(ArchiveArgs),
}

#[derive(Args)]
struct ArchiveArgs {
    /// Page URL to archive
    #[arg(long)]
    url: String,

    /// Object key to upload to (default: derived from the URL)
    #[arg(long)]
    out: Option<String>,

    /// Bucket override (default: MINIO_BUCKET)
    #[arg(long)]
    bucket: Option<String>,

    /// Also write the payload to a local file
    #[arg(long, value_name = "PATH")]
    save_local: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ArchiveError> {
    let cli = Cli::parse();
    // Fail on store misconfiguration before any capture work.
    let store_config = StoreConfig::from_env()?;

    let (args, extension) = match &cli.command {
        Command::Html(args) => (args, "html"),
        Command::Pdf(args) => (args, "pdf"),
    };
    let bucket = store_config.bucket_or(args.bucket.as_deref())?;

    let config = ArchiveConfig::default();
    let outcome = match &cli.command {
        Command::Html(_) => archive_url_to_html(&args.url, &config).await?,
        Command::Pdf(_) => archive_url_to_pdf(&args.url, &config).await?,
    };

    let key = args
        .out
        .clone()
        .unwrap_or_else(|| default_object_key_for_url(&args.url, extension, outcome.captured_at));

    if let Some(path) = &args.save_local {
        save_local(path, &outcome)?;
        println!("saved local copy to {}", path.display());
    }

    let store = ArchiveStore::new(&store_config);
    let provenance = Provenance {
        source_url: outcome.source_url.clone(),
        sha256_hex: outcome.sha256_hex.clone(),
        captured_at: outcome.captured_at,
    };
    store
        .put_snapshot(
            &bucket,
            &key,
            outcome.bytes.clone(),
            &outcome.content_type,
            &provenance,
        )
        .await
        .map_err(|e| ArchiveError::Store(format!("{e:#}")))?;

    println!("assetKey: {key}");
    println!("sha256: {}", outcome.sha256_hex);
    println!();
    println!("lesson snippet:");
    println!("  - type: url");
    println!("    url: {}", args.url);
    println!("    mode: embed");
    match &cli.command {
        Command::Html(_) => {
            println!("    archiveHtml:");
            println!("      assetKey: {key}");
        }
        Command::Pdf(_) => {
            println!("    archivePdf:");
            println!("      assetKey: {key}");
        }
    }
    Ok(())
}

fn save_local(path: &Path, outcome: &ArchiveOutcome) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| ArchiveError::Other(format!("Failed to create {}: {e}", parent.display())))?;
    }
    std::fs::write(path, &outcome.bytes)
        .map_err(|e| ArchiveError::Other(format!("Failed to write {}: {e}", path.display())))
}
