//! HTTP server wiring for the gamenote review store.
//!
//! Configuration loading and router assembly live here so they can be tested;
//! `main.rs` only parses flags, initialises tracing and binds the listener.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::Router;
use gamenote_api::{ClientConfig, api_router};
use gamenote_core::store::ReviewStore;
use gamenote_store_sqlite::StoreConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix of environment variables overriding the config file.
pub const ENV_PREFIX: &str = "GAMENOTE";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `GAMENOTE_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  /// How long SQLite waits on a locked database before a request fails.
  pub busy_timeout_ms:      u64,
  pub max_review_length:    usize,
  pub show_character_count: bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let client = ClientConfig::default();
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 5233,
      store_path:           PathBuf::from("reviews.db"),
      busy_timeout_ms:      2000,
      max_review_length:    client.max_review_length,
      show_character_count: client.show_character_count,
    }
  }
}

impl ServerConfig {
  /// Read `path` (optional) layered under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix(ENV_PREFIX))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_config(&self) -> StoreConfig {
    StoreConfig {
      path:         expand_tilde(&self.store_path),
      busy_timeout: Duration::from_millis(self.busy_timeout_ms),
    }
  }

  pub fn client_config(&self) -> ClientConfig {
    ClientConfig {
      max_review_length:    self.max_review_length,
      show_character_count: self.show_character_count,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router: the JSON API under `/api`, with request
/// tracing.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: ReviewStore + 'static,
{
  Router::new()
    .nest("/api", api_router(store, config.client_config()))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use gamenote_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/gamenote.toml")).unwrap();
    assert_eq!(cfg, ServerConfig::default());
    assert_eq!(cfg.address(), "127.0.0.1:5233");
    assert_eq!(cfg.client_config(), ClientConfig::default());
  }

  #[test]
  fn file_values_override_defaults() {
    let path = std::env::temp_dir()
      .join(format!("gamenote-config-{}.toml", std::process::id()));
    std::fs::write(
      &path,
      "port = 8080\nstore_path = \"/var/lib/gamenote/reviews.db\"\nmax_review_length = 250\n",
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.client_config().max_review_length, 250);
    let store = cfg.store_config();
    assert_eq!(store.path, PathBuf::from("/var/lib/gamenote/reviews.db"));
    assert_eq!(store.busy_timeout, Duration::from_secs(2));
  }

  #[test]
  fn tilde_expansion() {
    let plain = Path::new("/tmp/reviews.db");
    assert_eq!(expand_tilde(plain), plain);

    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/reviews.db")),
        PathBuf::from(home).join("reviews.db")
      );
    }
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let app = router(store, &ServerConfig::default());

    let resp = app
      .clone()
      .oneshot(
        Request::builder()
          .uri("/api/ratings")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
      .await
      .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["total_games"], 0);

    let resp = app
      .oneshot(Request::builder().uri("/ratings").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
