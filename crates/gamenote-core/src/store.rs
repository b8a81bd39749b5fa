//! The `ReviewStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `gamenote-store-sqlite`).
//! Higher layers (`gamenote-api`, `gamenote-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  report::{GroupedReport, ReportOptions, ReviewFilter},
  review::{ItemId, ReviewFields, ReviewRecord},
};

/// Abstraction over a review record store backend.
///
/// Records are keyed by [`ItemId`] and replaced wholesale on save. A save that
/// returned `Ok` is visible to every read issued after it.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ReviewStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Whether a record exists for `item_id`.
  fn has(
    &self,
    item_id: ItemId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Retrieve the current record. `None` is the ordinary "no review yet"
  /// outcome, not a failure.
  fn get(
    &self,
    item_id: ItemId,
  ) -> impl Future<Output = Result<Option<ReviewRecord>, Self::Error>> + Send + '_;

  /// Create or replace the record for `item_id` and return it as persisted.
  ///
  /// `created_at` is set on first save and carried over on replacement. Fields
  /// are validated before anything is written; a rejected save leaves the
  /// previous record untouched.
  fn save(
    &self,
    item_id: ItemId,
    fields: ReviewFields,
  ) -> impl Future<Output = Result<ReviewRecord, Self::Error>> + Send + '_;

  /// Remove the record if present. Returns whether one existed; deleting an
  /// absent record is still a success.
  fn delete(
    &self,
    item_id: ItemId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All records matching `filter`, ordered by ascending `item_id`.
  fn list<'a>(
    &'a self,
    filter: &'a ReviewFilter,
  ) -> impl Future<Output = Result<Vec<ReviewRecord>, Self::Error>> + Send + 'a;

  /// Build the grouped ratings report over the whole collection.
  fn aggregate<'a>(
    &'a self,
    options: &'a ReportOptions,
  ) -> impl Future<Output = Result<GroupedReport, Self::Error>> + Send + 'a {
    async move {
      let all = self.list(&ReviewFilter::default()).await?;
      Ok(GroupedReport::build(all, options))
    }
  }
}
