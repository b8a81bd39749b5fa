//! Handlers for `/reviews` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/reviews` | Optional `?status=FINISHED,SKIPPED&year=2023` |
//! | `GET`    | `/reviews/:item_id` | 404 if not found |
//! | `PUT`    | `/reviews/:item_id` | Body: [`SaveReviewBody`]; 201 on create, 200 on replace |
//! | `DELETE` | `/reviews/:item_id` | Always 204 |
//! | `GET`    | `/reviews/:item_id/exists` | `{"exists": bool}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use gamenote_core::{
  report::{ReviewFilter, YearFilter},
  review::{ItemId, ReviewFields, ReviewStatus},
  store::ReviewStore,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
  error::ApiError,
  wire::{ReviewView, SaveReviewBody},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Comma-separated statuses, e.g. `FINISHED,SKIPPED`.
  pub status: Option<String>,
  /// `all`, a bare year, or a `YYYY-MM-DD` day.
  pub year:   Option<String>,
}

impl TryFrom<ListParams> for ReviewFilter {
  type Error = gamenote_core::Error;

  fn try_from(p: ListParams) -> Result<Self, Self::Error> {
    let statuses = p
      .status
      .as_deref()
      .map(|s| {
        s.split(',')
          .map(str::trim)
          .filter(|t| !t.is_empty())
          .map(ReviewStatus::parse)
          .collect::<Result<Vec<_>, _>>()
      })
      .transpose()?
      .unwrap_or_default();

    let year = p
      .year
      .as_deref()
      .map(str::parse::<YearFilter>)
      .transpose()?
      .and_then(YearFilter::year);

    Ok(ReviewFilter { statuses, year })
  }
}

/// `GET /reviews[?status=...][&year=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ReviewView>>, ApiError>
where
  S: ReviewStore,
{
  let filter = ReviewFilter::try_from(params)?;
  let records = store.list(&filter).await.map_err(ApiError::store)?;
  Ok(Json(records.into_iter().map(ReviewView::from).collect()))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /reviews/:item_id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(item_id): Path<ItemId>,
) -> Result<Json<ReviewView>, ApiError>
where
  S: ReviewStore,
{
  let record = store
    .get(item_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no review for item {item_id}")))?;
  Ok(Json(record.into()))
}

/// `GET /reviews/:item_id/exists`
pub async fn exists<S>(
  State(store): State<Arc<S>>,
  Path(item_id): Path<ItemId>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReviewStore,
{
  let exists = store.has(item_id).await.map_err(ApiError::store)?;
  Ok(Json(json!({ "exists": exists })))
}

// ─── Save ─────────────────────────────────────────────────────────────────────

/// `PUT /reviews/:item_id`: returns the stored record, 201 if it is new.
pub async fn save_one<S>(
  State(store): State<Arc<S>>,
  Path(item_id): Path<ItemId>,
  Json(body): Json<SaveReviewBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReviewStore,
{
  let fields = ReviewFields::try_from(body)?;
  let existed = store.has(item_id).await.map_err(ApiError::store)?;
  let record = store
    .save(item_id, fields)
    .await
    .map_err(ApiError::store)?;

  let status = if existed { StatusCode::OK } else { StatusCode::CREATED };
  Ok((status, Json(ReviewView::from(record))))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /reviews/:item_id`, idempotent.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(item_id): Path<ItemId>,
) -> Result<StatusCode, ApiError>
where
  S: ReviewStore,
{
  store.delete(item_id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
