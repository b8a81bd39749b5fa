//! gamenote server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite review store, and serves the JSON API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use gamenote_server::{ServerConfig, router};
use gamenote_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "gamenote review store server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Override the configured database path.
  #[arg(long)]
  store: Option<PathBuf>,

  /// Override the configured listen port.
  #[arg(short, long)]
  port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut server_cfg = ServerConfig::load(&cli.config)?;
  if let Some(store) = cli.store {
    server_cfg.store_path = store;
  }
  if let Some(port) = cli.port {
    server_cfg.port = port;
  }

  let store_cfg = server_cfg.store_config();
  let store = SqliteStore::open_with(&store_cfg)
    .await
    .with_context(|| format!("failed to open store at {:?}", store_cfg.path))?;

  let app = router(Arc::new(store), &server_cfg);
  let address = server_cfg.address();

  tracing::info!(store = %store_cfg.path.display(), "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
