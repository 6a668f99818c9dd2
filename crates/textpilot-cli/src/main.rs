use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use textpilot_gateway::{AppState, build_router};
use textpilot_providers::AdapterRegistry;
use textpilot_store::{HistoryStore, SettingsStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "textpilot", version, about = "AI writing-assistant backend")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1", env = "TEXTPILOT_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 3742, env = "TEXTPILOT_PORT")]
    port: u16,

    /// Directory for the settings and history databases. Defaults to the
    /// platform data directory.
    #[arg(long, env = "TEXTPILOT_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("could not determine a data directory; pass --data-dir")?
            .join("textpilot"),
    };
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let settings = Arc::new(SettingsStore::open(&data_dir.join("settings.db"))?);
    let history = Arc::new(HistoryStore::open(&data_dir.join("history.db"))?);
    let state = AppState::new(settings, history, AdapterRegistry::new());

    let app = build_router(state);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid host/port")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("textpilot gateway listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
