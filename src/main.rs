#![forbid(unsafe_code)]

//! `life-organizer`: Slack productivity assistant binary.
//!
//! Bootstraps configuration, the local `SQLite` state, the workspace and
//! model adapters, and the Slack Socket Mode integration.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use life_organizer::app::{AppState, Collaborators};
use life_organizer::classifier::openai::OpenAiCompatModel;
use life_organizer::classifier::transcriber::{SpeechToText, UnconfiguredSpeech, WhisperEngine};
use life_organizer::classifier::{LanguageModel, UnconfiguredModel};
use life_organizer::clock::{Clock, SystemClock};
use life_organizer::config::GlobalConfig;
use life_organizer::persistence::db;
use life_organizer::persistence::journal_repo::JournalRepo;
use life_organizer::persistence::snapshot::{self, SNAPSHOT_INTERVAL};
use life_organizer::persistence::xp_repo::XpRepo;
use life_organizer::slack::client::SlackService;
use life_organizer::store::memory::MemoryBackend;
use life_organizer::store::notion::NotionBackend;
use life_organizer::store::PageBackend;
use life_organizer::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "life-organizer", about = "Slack productivity assistant", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Keep items in memory instead of the remote workspace.
    #[arg(long)]
    local: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("life-organizer bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let local = args.local || config.credentials.workspace_token.is_none();
    let backend: Arc<dyn PageBackend> = if local {
        info!("no workspace configured; keeping items in memory");
        use_local_databases(&mut config);
        Arc::new(MemoryBackend::with_clock(Arc::clone(&clock)))
    } else {
        let token = config
            .credentials
            .workspace_token
            .clone()
            .unwrap_or_default();
        if config.workspace.items_db_id.trim().is_empty() {
            return Err(AppError::Config("workspace.items_db_id must be set".into()));
        }
        Arc::new(NotionBackend::new(
            &config.workspace,
            &token,
            config.timeouts.store(),
        ))
    };

    let model: Arc<dyn LanguageModel> = match &config.credentials.llm_api_key {
        Some(key) => Arc::new(OpenAiCompatModel::new(
            &config.llm,
            key,
            config.timeouts.vision(),
        )),
        None => {
            warn!("no model key configured; every classification uses its fallback");
            Arc::new(UnconfiguredModel)
        }
    };
    let speech: Arc<dyn SpeechToText> = match &config.credentials.transcription_api_key {
        Some(key) => Arc::new(WhisperEngine::new(
            &config.transcription,
            key,
            config.timeouts.transcription(),
        )),
        None => {
            warn!("no transcription key configured; voice notes go to triage");
            Arc::new(UnconfiguredSpeech)
        }
    };

    let credentials = config.credentials.clone();
    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Initialize database ─────────────────────────────
    let db = Arc::new(db::connect(&config.db_path).await?);
    info!("database connected");

    let state = Arc::new(AppState::new(
        Arc::clone(&config),
        Collaborators {
            backend,
            model,
            speech,
            journal: Some(JournalRepo::new(Arc::clone(&db))),
            clock,
        },
    ));

    // ── Restore XP and start snapshots ──────────────────
    let xp_repo = XpRepo::new(Arc::clone(&db));
    match snapshot::restore(&state.ledger, &xp_repo).await {
        Ok(count) => info!(count, "xp records restored"),
        Err(err) => error!(%err, "xp restore failed; starting from empty ledger"),
    }
    let ct = CancellationToken::new();
    let snapshot_handle = snapshot::spawn_snapshot_task(
        Arc::clone(&state.ledger),
        xp_repo,
        SNAPSHOT_INTERVAL,
        ct.clone(),
    );

    // ── Start Slack ─────────────────────────────────────
    let (_slack, runtime) =
        SlackService::start(&credentials, Arc::clone(&state)).map_err(|err| {
            error!(%err, "slack service start failed");
            err
        })?;
    info!("life-organizer ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();
    runtime.socket_task.abort();

    if let Err(err) = snapshot_handle.await {
        error!(%err, "snapshot task ended abnormally");
    }
    runtime.queue_task.abort();
    info!("life-organizer shut down");

    Ok(())
}

/// Fill in database ids for the in-memory workspace.
fn use_local_databases(config: &mut GlobalConfig) {
    let workspace = &mut config.workspace;
    for (id, fallback) in [
        (&mut workspace.items_db_id, "items"),
        (&mut workspace.triage_db_id, "triage"),
        (&mut workspace.progress_db_id, "progress"),
    ] {
        if id.trim().is_empty() {
            fallback.clone_into(id);
        }
    }
    if workspace.habits_db_id.is_none() {
        workspace.habits_db_id = Some("habits".into());
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
