//! Handler for `GET /ratings`.
//!
//! Query params map directly to [`ReportOptions`]: `show_all` (default
//! `true`) and `year` (`all`, a bare year, or a `YYYY-MM-DD` day).

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use gamenote_core::{
  report::{GroupedReport, ReportOptions},
  store::ReviewStore,
};

use crate::error::ApiError;

/// `GET /ratings[?show_all=true|false][&year=all|2023]`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Query(options): Query<ReportOptions>,
) -> Result<Json<GroupedReport>, ApiError>
where
  S: ReviewStore,
{
  let report = store.aggregate(&options).await.map_err(ApiError::store)?;
  Ok(Json(report))
}
