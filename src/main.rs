//! Command-line client for the meeting-analysis pipeline.
//!
//! # Startup sequence
//!
//! 1. Parse arguments.
//! 2. Initialise logging.
//! 3. Load [`AppConfig`] (defaults on first run), apply CLI overrides.
//! 4. Create the [`tokio`] runtime.
//! 5. Run the chosen subcommand:
//!    - `run`: spawn the [`SessionOrchestrator`], feed it the metadata and
//!      recording, and print events until the session ends.
//!    - `upload`: post one reference document through [`ApiUploader`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use meeting_pipeline::{
    audio::{AudioPayload, SessionMetadata},
    config::AppConfig,
    connection::WsConnector,
    events::{event_channel, SessionEvent, SessionOutcome},
    pipeline::{SessionCommand, SessionOrchestrator},
    upload::{ApiUploader, DocumentUploader, UploadFile},
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "meeting-pipeline", version, about = "Stream a meeting recording through the analysis pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the settings file (default: platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a recording and follow the five stages to the final report
    Run {
        /// Encoded audio file (webm, wav, mp3, m4a, ogg)
        audio: PathBuf,

        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        /// Repeat for each participant
        #[arg(long = "participant", value_name = "NAME")]
        participants: Vec<String>,

        #[arg(long, default_value = "")]
        purpose: String,

        #[arg(long = "info", default_value = "")]
        additional_info: String,

        /// Override `server.ws_url`
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Write the report markup here instead of printing it
        #[arg(long, short, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Upload a reference document for later retrieval
    Upload {
        file: PathBuf,

        #[arg(long, short, default_value = "")]
        description: String,
    },
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

async fn run_session(
    config: AppConfig,
    metadata: SessionMetadata,
    audio: PathBuf,
    out: Option<PathBuf>,
) -> Result<()> {
    let payload = AudioPayload::from_file(&audio)
        .await
        .with_context(|| format!("reading {}", audio.display()))?;
    log::info!("loaded {} ({} bytes, {})", audio.display(), payload.len(), payload.mime_type);

    let (events_tx, mut events_rx) = event_channel();
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);

    let mut orchestrator = SessionOrchestrator::new(Arc::new(WsConnector), &config, Arc::new(events_tx));
    let task = tokio::spawn(async move { orchestrator.run(command_rx).await });

    command_tx.send(SessionCommand::SetMetadata(metadata)).await?;
    command_tx.send(SessionCommand::AttachAudio(payload)).await?;

    let mut outcome = None;
    while let Some(event) = events_rx.recv().await {
        match event {
            SessionEvent::StatusChanged(status) => println!("connection: {status}"),
            SessionEvent::StageUpdated { stage, status } => println!("stage {stage}: {status:?}"),
            SessionEvent::DocumentsReceived(docs) => {
                println!("{} related document(s):", docs.len());
                for doc in &docs {
                    println!("  [{}] {} ({})", doc.id, doc.title, doc.doc_type);
                }
            }
            SessionEvent::InsightsReceived(insights) => {
                println!("{} insight(s):", insights.len());
                for insight in &insights {
                    println!("  [{}] {:.2} {}", insight.id, insight.score, insight.text);
                }
            }
            SessionEvent::ReportReceived(report) => match &out {
                Some(path) => {
                    tokio::fs::write(path, &report.markup)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("report written to {}", path.display());
                }
                None => println!("{}", report.markup),
            },
            SessionEvent::ProtocolError(e) => eprintln!("warning: {e}"),
            SessionEvent::TransportError(e) => eprintln!("error: {e}"),
            SessionEvent::SessionEnded(ended) => {
                outcome = Some(ended);
                break;
            }
            other => log::debug!("event: {other:?}"),
        }
    }

    let _ = command_tx.send(SessionCommand::Shutdown).await;
    task.await.context("orchestrator task panicked")?;

    match outcome {
        Some(SessionOutcome::Completed) => Ok(()),
        Some(SessionOutcome::Failed(e)) => bail!("{e}: {}", e.user_hint()),
        Some(SessionOutcome::Cancelled) => bail!("session cancelled"),
        None => bail!("session ended without an outcome"),
    }
}

async fn upload_document(config: AppConfig, file: PathBuf, description: String) -> Result<()> {
    let upload = UploadFile::from_path(&file).await?;
    let uploader = ApiUploader::from_config(&config.upload);
    let response = uploader.upload(upload, &description).await?;

    println!("{} document(s) stored", response.documents.len());
    for doc in &response.documents {
        println!("  {} ({})", doc.title, doc.doc_type);
    }
    if !response.summary.is_empty() {
        println!("summary: {}", response.summary);
    }
    for item in &response.action_items {
        println!("  - {item}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // 1. Arguments
    let cli = Cli::parse();

    // 2. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 3. Configuration
    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 4. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 5. Subcommand
    match cli.command {
        Command::Run {
            audio,
            title,
            author,
            participants,
            purpose,
            additional_info,
            url,
            out,
        } => {
            if let Some(url) = url {
                config.server.ws_url = url;
            }
            let metadata = SessionMetadata {
                title,
                author,
                participants,
                purpose,
                additional_info,
            };
            if !metadata.is_complete() {
                bail!("--title and --author must not be blank");
            }
            rt.block_on(run_session(config, metadata, audio, out))
        }
        Command::Upload { file, description } => rt.block_on(upload_document(config, file, description)),
    }
}
