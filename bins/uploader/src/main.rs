//! Kindred uploader
//!
//! Picks files from the command line, runs them through the upload surface
//! and prints what the surface renders. Reads `KINDRED_API_URL` and
//! `KINDRED_TOKEN` when the flags are absent.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kindred_client::{ClientConfig, HttpUploadClient};
use kindred_core::upload::{
    AcceptFilter, DeleteAction, LocalFile, SurfaceEvent, SurfaceOutcome, UploadOptions,
    UploadOrchestrator, UploadSurface,
};
use kindred_shared::UploadSettings;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Parser)]
#[command(name = "kindred-upload", about = "Upload files to the Kindred admin panel")]
struct Cli {
    /// Server origin
    #[arg(long)]
    url: Option<String>,
    /// Session token
    #[arg(long)]
    token: Option<String>,
    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more files as a single batch
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target folder
        #[arg(long)]
        folder: Option<String>,
        /// Maximum size per file in bytes
        #[arg(long)]
        max_size: Option<u64>,
        /// Maximum files per selection
        #[arg(long)]
        max_files: Option<usize>,
        /// Accept exactly one file
        #[arg(long)]
        single: bool,
        /// Accepted types, e.g. "image/*,.pdf"
        #[arg(long)]
        accept: Option<String>,
    },
    /// Delete a committed file by its public id
    Delete {
        /// Public id returned by an upload
        public_id: String,
    },
}

fn client_from(cli: &Cli) -> anyhow::Result<HttpUploadClient> {
    let base_url = cli
        .url
        .clone()
        .or_else(|| std::env::var("KINDRED_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let mut config = ClientConfig::new(base_url);
    if let Some(token) = cli
        .token
        .clone()
        .or_else(|| std::env::var("KINDRED_TOKEN").ok())
    {
        config = config.with_token(token);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    HttpUploadClient::new(config).context("Failed to create HTTP client")
}

/// Reads a file and sniffs its MIME type from the leading bytes.
async fn read_local(path: &Path) -> anyhow::Result<LocalFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();
    let mime = infer::get(&bytes).map_or(FALLBACK_MIME, |kind| kind.mime_type());
    Ok(LocalFile::new(name, mime, bytes))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kindred=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = Arc::new(client_from(&cli)?);

    match cli.command {
        Commands::Upload {
            files,
            folder,
            max_size,
            max_files,
            single,
            accept,
        } => {
            let mut options = UploadOptions::from(&UploadSettings::default());
            if let Some(folder) = folder {
                options = options.with_folder(folder);
            }
            if let Some(max_size) = max_size {
                options = options.with_max_size(max_size);
            }
            if let Some(max_files) = max_files {
                options = options.with_max_files(max_files);
            }
            if single {
                options = options.single();
            }
            if let Some(accept) = accept {
                options = options.with_accept(AcceptFilter::parse(&accept));
            }

            let mut picked = Vec::with_capacity(files.len());
            for path in &files {
                picked.push(read_local(path).await?);
            }

            let orchestrator = Arc::new(UploadOrchestrator::new(client.clone(), options));
            let mut status = orchestrator.subscribe();
            tokio::spawn(async move {
                while status.changed().await.is_ok() {
                    let snapshot = status.borrow_and_update().clone();
                    debug!(
                        phase = ?snapshot.phase,
                        pending = snapshot.pending.len(),
                        committed = snapshot.committed.len(),
                        "Session changed"
                    );
                }
            });

            let surface = UploadSurface::new(orchestrator).with_delete_action(client);
            let outcome = surface.handle(SurfaceEvent::Pick(picked)).await;
            print!("{}", surface.view());

            match outcome {
                SurfaceOutcome::Submitted(outcome) => {
                    for file in &outcome.committed {
                        println!("{}\t{}", file.public_id, file.url);
                    }
                    if outcome.committed.is_empty() {
                        bail!("No file was uploaded");
                    }
                }
                SurfaceOutcome::Failed(e) => bail!("Upload failed: {e}"),
                SurfaceOutcome::Ignored | SurfaceOutcome::Changed => {}
            }
        }
        Commands::Delete { public_id } => {
            client
                .delete(&public_id)
                .await
                .with_context(|| format!("Failed to delete {public_id}"))?;
            println!("Deleted {public_id}");
        }
    }

    Ok(())
}
