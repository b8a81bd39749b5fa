//! Review records, one per library item.
//!
//! A record is replaced wholesale on every save; the only field that survives
//! a replacement is `created_at`.

use chrono::{DateTime, Datelike, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// Identifier of a library item in the host application's id space.
pub type ItemId = u32;

/// Lowest accepted rating.
pub const RATING_MIN: f64 = 1.0;
/// Highest accepted rating.
pub const RATING_MAX: f64 = 5.0;

/// Calendar years a `finished_at` may fall in. SQLite date functions return
/// NULL outside this range.
pub const FINISHED_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Play-status tag of an item.
///
/// Variants are declared in report presentation order, so the derived `Ord`
/// sorts groups as `FINISHED`, `IN_PROGRESS`, `SKIPPED`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
  Finished,
  #[default]
  InProgress,
  Skipped,
}

impl ReviewStatus {
  /// Parse the wire/database spelling, mapping failures to
  /// [`Error::UnknownStatus`].
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// The persisted review of a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
  pub item_id:      ItemId,
  /// Denormalised item name, kept for reporting.
  pub display_name: Option<String>,
  pub review_text:  String,
  /// `None` until the user rates the item.
  pub rating:       Option<f64>,
  pub status:       ReviewStatus,
  /// Set by the store on first save; never changes afterwards.
  #[serde(with = "chrono::serde::ts_seconds")]
  pub created_at:   DateTime<Utc>,
  /// Caller-supplied; the store never derives it from `status`.
  #[serde(default, with = "chrono::serde::ts_seconds_option")]
  pub finished_at:  Option<DateTime<Utc>>,
  pub icon_hash:    Option<String>,
}

impl ReviewRecord {
  /// Build the record a save of `fields` produces.
  pub fn from_fields(
    item_id: ItemId,
    fields: ReviewFields,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      item_id,
      display_name: fields.display_name,
      review_text: fields.review_text,
      rating: fields.rating,
      status: fields.status.unwrap_or_default(),
      created_at,
      finished_at: fields.finished_at,
      icon_hash: fields.icon_hash,
    }
  }

  /// Calendar year (UTC) of `finished_at`.
  pub fn finished_year(&self) -> Option<i32> {
    self.finished_at.map(|at| at.year())
  }

  pub fn is_rated(&self) -> bool { self.rating.is_some() }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ReviewStore::save`].
///
/// Carries every attribute the caller wants persisted for this revision of the
/// record; anything left out is cleared. `created_at` is always owned by the
/// store and is not accepted from callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewFields {
  pub display_name: Option<String>,
  #[serde(default)]
  pub review_text:  String,
  pub rating:       Option<f64>,
  /// Defaults to [`ReviewStatus::InProgress`] when absent.
  pub status:       Option<ReviewStatus>,
  #[serde(default, with = "chrono::serde::ts_seconds_option")]
  pub finished_at:  Option<DateTime<Utc>>,
  pub icon_hash:    Option<String>,
}

impl ReviewFields {
  /// Convenience constructor with every optional field unset.
  pub fn new(review_text: impl Into<String>) -> Self {
    Self { review_text: review_text.into(), ..Self::default() }
  }

  pub fn with_rating(mut self, rating: f64) -> Self {
    self.rating = Some(rating);
    self
  }

  pub fn with_status(mut self, status: ReviewStatus) -> Self {
    self.status = Some(status);
    self
  }

  pub fn with_finished_at(mut self, at: DateTime<Utc>) -> Self {
    self.finished_at = Some(at);
    self
  }

  pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
    self.display_name = Some(name.into());
    self
  }

  /// Reject values that would corrupt aggregation or year filtering. The text
  /// is never inspected or truncated.
  pub fn validate(&self) -> Result<()> {
    if let Some(rating) = self.rating
      && !(rating.is_finite() && (RATING_MIN..=RATING_MAX).contains(&rating))
    {
      return Err(Error::InvalidRating(rating));
    }
    if let Some(at) = self.finished_at
      && !FINISHED_YEARS.contains(&at.year())
    {
      return Err(Error::InvalidDate(format!(
        "finish date {} is outside years 0000..=9999",
        at.to_rfc3339()
      )));
    }
    Ok(())
  }

  /// Validate and truncate timestamps to whole seconds, the precision the
  /// store persists.
  pub fn normalized(mut self) -> Result<Self> {
    self.validate()?;
    self.finished_at = self.finished_at.map(|at| at.trunc_subsecs(0));
    Ok(self)
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Parse a `YYYY-MM-DD` day into midnight UTC.
pub fn parse_day(s: &str) -> Result<DateTime<Utc>> {
  let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|e| Error::InvalidDate(format!("{s:?}: {e}")))?;
  date
    .and_hms_opt(0, 0, 0)
    .map(|dt| dt.and_utc())
    .ok_or_else(|| Error::InvalidDate(s.to_owned()))
}

/// Format a timestamp as a `YYYY-MM-DD` day in UTC.
pub fn format_day(at: DateTime<Utc>) -> String {
  at.format("%Y-%m-%d").to_string()
}

/// Interpret an epoch-seconds value as a UTC timestamp.
pub fn from_epoch(secs: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp(secs, 0)
    .ok_or_else(|| Error::InvalidDate(format!("epoch seconds out of range: {secs}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_spellings() {
    assert_eq!(ReviewStatus::InProgress.to_string(), "IN_PROGRESS");
    assert_eq!(ReviewStatus::parse("SKIPPED").unwrap(), ReviewStatus::Skipped);
    assert!(matches!(
      ReviewStatus::parse("ABANDONED"),
      Err(Error::UnknownStatus(s)) if s == "ABANDONED"
    ));
    assert_eq!(
      serde_json::to_string(&ReviewStatus::Finished).unwrap(),
      "\"FINISHED\""
    );
  }

  #[test]
  fn status_order_is_presentation_order() {
    let mut all = vec![
      ReviewStatus::Skipped,
      ReviewStatus::InProgress,
      ReviewStatus::Finished,
    ];
    all.sort();
    assert_eq!(all, [
      ReviewStatus::Finished,
      ReviewStatus::InProgress,
      ReviewStatus::Skipped,
    ]);
  }

  #[test]
  fn rating_bounds() {
    assert!(ReviewFields::new("").with_rating(1.0).validate().is_ok());
    assert!(ReviewFields::new("").with_rating(5.0).validate().is_ok());
    assert!(ReviewFields::new("").validate().is_ok());

    for bad in [0.0, 0.99, 5.01, 6.0, f64::NAN, f64::INFINITY] {
      let err = ReviewFields::new("").with_rating(bad).validate().unwrap_err();
      assert!(err.is_invalid_input(), "{bad} should be rejected");
    }
  }

  #[test]
  fn finish_year_bounds() {
    let edge = parse_day("9999-12-31").unwrap();
    assert!(ReviewFields::new("").with_finished_at(edge).validate().is_ok());

    let past_edge = from_epoch(253_402_300_800).unwrap();
    assert_eq!(past_edge.year(), 10_000);
    let err = ReviewFields::new("")
      .with_finished_at(past_edge)
      .validate()
      .unwrap_err();
    assert!(matches!(err, Error::InvalidDate(_)));

    let before_zero = from_epoch(-62_167_219_201).unwrap();
    assert!(
      ReviewFields::new("")
        .with_finished_at(before_zero)
        .validate()
        .unwrap_err()
        .is_invalid_input()
    );
  }

  #[test]
  fn long_text_is_untouched() {
    let text = "x".repeat(12_000);
    let fields = ReviewFields::new(text.clone()).normalized().unwrap();
    assert_eq!(fields.review_text, text);
  }

  #[test]
  fn day_parsing() {
    let at = parse_day("2023-06-01").unwrap();
    assert_eq!(at.timestamp(), 1_685_577_600);
    assert_eq!(format_day(at), "2023-06-01");
    assert!(parse_day("06/01/2023").unwrap_err().is_invalid_input());
  }

  #[test]
  fn record_wire_timestamps_are_epoch_seconds() {
    let record = ReviewRecord::from_fields(
      7,
      ReviewFields::new("ok").with_finished_at(from_epoch(1_685_577_600).unwrap()),
      from_epoch(1_690_000_000).unwrap(),
    );
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["created_at"], 1_690_000_000);
    assert_eq!(json["finished_at"], 1_685_577_600);
    assert_eq!(json["status"], "IN_PROGRESS");
    assert_eq!(record.finished_year(), Some(2023));
  }
}
