//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as INTEGER epoch seconds and statuses as their
//! `SCREAMING_SNAKE_CASE` spelling.

use chrono::{DateTime, Utc};
use gamenote_core::review::{ItemId, ReviewRecord, ReviewStatus, from_epoch};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_item_id(id: ItemId) -> i64 { i64::from(id) }

pub fn encode_dt(dt: DateTime<Utc>) -> i64 { dt.timestamp() }

pub fn encode_status(status: ReviewStatus) -> &'static str { status.into() }

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw values read directly from a `reviews` row.
pub struct RawReview {
  pub item_id:      i64,
  pub display_name: Option<String>,
  pub review_text:  String,
  pub rating:       Option<f64>,
  pub status:       String,
  pub created_at:   i64,
  pub finished_at:  Option<i64>,
  pub icon_hash:    Option<String>,
}

/// Column list matching [`RawReview::from_row`].
pub const REVIEW_COLUMNS: &str = "item_id, display_name, review_text, rating, \
                                  status, created_at, finished_at, icon_hash";

impl RawReview {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:      row.get(0)?,
      display_name: row.get(1)?,
      review_text:  row.get(2)?,
      rating:       row.get(3)?,
      status:       row.get(4)?,
      created_at:   row.get(5)?,
      finished_at:  row.get(6)?,
      icon_hash:    row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<ReviewRecord> {
    let raw_id = self.item_id;
    let corrupt = |reason: String| Error::Corrupt { item_id: raw_id, reason };

    let item_id = ItemId::try_from(raw_id)
      .map_err(|_| corrupt("item id out of range".to_owned()))?;
    let status =
      ReviewStatus::parse(&self.status).map_err(|e| corrupt(e.to_string()))?;
    let created_at =
      from_epoch(self.created_at).map_err(|e| corrupt(e.to_string()))?;
    let finished_at = self
      .finished_at
      .map(from_epoch)
      .transpose()
      .map_err(|e| corrupt(e.to_string()))?;

    Ok(ReviewRecord {
      item_id,
      display_name: self.display_name,
      review_text: self.review_text,
      rating: self.rating,
      status,
      created_at,
      finished_at,
      icon_hash: self.icon_hash,
    })
  }
}
