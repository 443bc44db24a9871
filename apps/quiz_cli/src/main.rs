mod config;
mod input;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{spawn_session, HttpQuizTransport, SessionController};
use storage::{KeyValueStore, Leaderboard, MemoryStore, Storage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, prepare_database_url, DEFAULT_CONFIG_FILE},
    input::Input,
};

#[derive(Parser, Debug)]
#[command(name = "quiz", about = "Timed quiz played against a remote question server")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    start_url: Option<String>,
    #[arg(long)]
    time_limit_ms: Option<u64>,
    #[arg(long)]
    database_url: Option<String>,
    /// Keep high scores in memory only.
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(&args.config);
    if let Some(v) = args.start_url {
        settings.start_url = v;
    }
    if let Some(v) = args.time_limit_ms {
        settings.time_limit_ms = v;
    }
    if let Some(v) = args.database_url {
        settings.database_url = v;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store: Arc<dyn KeyValueStore> = if args.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let database_url = prepare_database_url(&settings.database_url)?;
        let storage = Storage::new(&database_url)
            .await
            .with_context(|| format!("failed to open high score database '{database_url}'"))?;
        Arc::new(storage)
    };
    let leaderboard = Arc::new(Leaderboard::new(store));

    let session_config = settings.session_config();
    info!(
        start_url = %session_config.start_url,
        time_limit_ms = settings.time_limit_ms,
        "quiz: starting"
    );
    let controller = SessionController::new(
        session_config,
        Arc::new(HttpQuizTransport::new()),
        leaderboard,
    );
    let (handle, session_task) = spawn_session(controller);
    let renderer = tokio::spawn(render::run(handle.subscribe()));

    handle.open().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match input::interpret(&line, &handle.snapshot()) {
            Input::Command(command) => handle.send(command).await?,
            Input::Quit => break,
            Input::Ignore => {}
        }
    }

    handle.shutdown().await?;
    session_task.await.context("session task panicked")?;
    renderer.abort();
    println!();
    Ok(())
}
