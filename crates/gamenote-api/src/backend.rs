//! The callable facade consumed by the UI plugin.
//!
//! Each method mirrors one plugin callable and answers with the exact shape
//! the plugin expects: a JSON-encoded string or a boolean. Nothing here ever
//! returns an error; failures are logged and folded into the documented
//! "failure" value (`false`, `{}`, or an empty report).

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Path, State},
};
use gamenote_core::{
  report::{GroupedReport, ReportOptions, ReviewFilter, YearFilter},
  review::{ItemId, ReviewFields},
  store::ReviewStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
  error::ApiError,
  wire::{ReviewView, SaveReviewBody},
};

/// Log target for messages forwarded by [`Backend::debug_log`].
pub const UI_LOG_TARGET: &str = "gamenote::ui";

// ─── Client configuration ────────────────────────────────────────────────────

/// Settings handed to the plugin by `get_config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  /// Advisory limit the editor enforces; the store never truncates.
  pub max_review_length:    usize,
  pub show_character_count: bool,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self { max_review_length: 5000, show_character_count: true }
  }
}

// ─── Facade ──────────────────────────────────────────────────────────────────

/// Callable surface over a [`ReviewStore`].
pub struct Backend<S> {
  store:  Arc<S>,
  client: Arc<ClientConfig>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for Backend<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), client: self.client.clone() }
  }
}

#[derive(Debug, Serialize)]
struct ReviewSummary<'a> {
  display_name: Option<&'a str>,
  has_review:   bool,
}

impl<S: ReviewStore> Backend<S> {
  pub fn new(store: Arc<S>, client: ClientConfig) -> Self {
    Self { store, client: Arc::new(client) }
  }

  /// The record as JSON, or `{}` when there is none (or it cannot be read).
  pub async fn get_review(&self, item_id: ItemId) -> String {
    match self.store.get(item_id).await {
      Ok(Some(record)) => to_json(&ReviewView::from(record), "{}"),
      Ok(None) => "{}".to_owned(),
      Err(e) => {
        tracing::error!(item_id, error = %e, "failed to load review");
        "{}".to_owned()
      }
    }
  }

  /// Upsert from a JSON-encoded save payload.
  pub async fn save_review(&self, item_id: ItemId, review_data: &str) -> bool {
    let fields = match SaveReviewBody::from_json(review_data)
      .and_then(ReviewFields::try_from)
    {
      Ok(f) => f,
      Err(e) => {
        tracing::warn!(item_id, error = %e, "rejected review payload");
        return false;
      }
    };

    match self.store.save(item_id, fields).await {
      Ok(record) => {
        tracing::info!(item_id, status = %record.status, "review saved");
        true
      }
      Err(e) => {
        tracing::error!(item_id, error = %e, "failed to save review");
        false
      }
    }
  }

  /// Remove the record. Deleting an absent record succeeds.
  pub async fn delete_review(&self, item_id: ItemId) -> bool {
    match self.store.delete(item_id).await {
      Ok(existed) => {
        tracing::info!(item_id, existed, "review deleted");
        true
      }
      Err(e) => {
        tracing::error!(item_id, error = %e, "failed to delete review");
        false
      }
    }
  }

  pub async fn has_review(&self, item_id: ItemId) -> bool {
    self.store.has(item_id).await.unwrap_or_else(|e| {
      tracing::error!(item_id, error = %e, "failed to check review");
      false
    })
  }

  /// The grouped report as JSON; an empty report on failure.
  pub async fn get_ratings(&self, show_all: bool, year: YearFilter) -> String {
    let options = ReportOptions { show_all, year };
    let report = self.store.aggregate(&options).await.unwrap_or_else(|e| {
      tracing::error!(%year, show_all, error = %e, "failed to build ratings report");
      GroupedReport::default()
    });
    to_json(&report, "{}")
  }

  /// Every stored review keyed by item id.
  pub async fn get_all_reviews(&self) -> String {
    let records = match self.store.list(&ReviewFilter::default()).await {
      Ok(records) => records,
      Err(e) => {
        tracing::error!(error = %e, "failed to list reviews");
        return "{}".to_owned();
      }
    };

    let summaries: BTreeMap<String, ReviewSummary<'_>> = records
      .iter()
      .map(|r| {
        (r.item_id.to_string(), ReviewSummary {
          display_name: r.display_name.as_deref(),
          has_review:   true,
        })
      })
      .collect();
    to_json(&summaries, "{}")
  }

  pub fn get_config(&self) -> String { to_json(&*self.client, "{}") }

  /// Forward a plugin log line.
  pub fn debug_log(&self, message: &str) -> bool {
    tracing::info!(target: UI_LOG_TARGET, "{message}");
    true
  }
}

fn to_json<T: Serialize + ?Sized>(value: &T, fallback: &str) -> String {
  serde_json::to_string(value).unwrap_or_else(|e| {
    tracing::error!(error = %e, "failed to encode response");
    fallback.to_owned()
  })
}

// ─── HTTP dispatch ───────────────────────────────────────────────────────────

/// Arguments of a callable, as the plugin sends them. Each method reads the
/// subset it needs.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallArgs {
  #[serde(alias = "game_id")]
  pub app_id:      Option<ItemId>,
  pub review_data: Option<String>,
  pub show_all:    Option<bool>,
  pub year:        Option<YearFilter>,
  pub message:     Option<String>,
}

impl CallArgs {
  fn app_id(&self) -> Result<ItemId, ApiError> {
    self
      .app_id
      .ok_or_else(|| ApiError::BadRequest("missing argument: app_id".into()))
  }
}

/// `POST /backend/:method`, with the callable's argument object as body.
pub async fn call<S>(
  State(backend): State<Backend<S>>,
  Path(method): Path<String>,
  Json(args): Json<CallArgs>,
) -> Result<Json<Value>, ApiError>
where
  S: ReviewStore + 'static,
{
  let value = match method.as_str() {
    "get_review" => json!(backend.get_review(args.app_id()?).await),
    "save_review" => {
      let item_id = args.app_id()?;
      let data = args
        .review_data
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("missing argument: review_data".into()))?;
      json!(backend.save_review(item_id, data).await)
    }
    "delete_review" => json!(backend.delete_review(args.app_id()?).await),
    "has_review" => json!(backend.has_review(args.app_id()?).await),
    "get_ratings" => json!(
      backend
        .get_ratings(args.show_all.unwrap_or(true), args.year.unwrap_or_default())
        .await
    ),
    "get_all_reviews" => json!(backend.get_all_reviews().await),
    "get_config" => json!(backend.get_config()),
    "debug_log" => json!(backend.debug_log(args.message.as_deref().unwrap_or_default())),
    other => return Err(ApiError::NotFound(format!("unknown method {other:?}"))),
  };

  Ok(Json(value))
}
