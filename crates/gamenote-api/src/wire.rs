//! JSON shapes exchanged with the UI plugin.
//!
//! Timestamps travel as Unix epoch seconds. Reads additionally carry
//! `YYYY-MM-DD` renderings, and writes accept a day string wherever a
//! timestamp is expected.

use chrono::{DateTime, Utc};
use gamenote_core::review::{
  ReviewFields, ReviewRecord, ReviewStatus, format_day, from_epoch, parse_day,
};
use serde::{Deserialize, Serialize};

// ─── Read shape ──────────────────────────────────────────────────────────────

/// A [`ReviewRecord`] as returned to the UI.
///
/// The text is emitted under both `review_text` and the older `review` key,
/// so plugin builds that send `review` also read it back.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
  #[serde(flatten)]
  pub record:                ReviewRecord,
  pub review:                String,
  pub created_at_formatted:  String,
  pub finished_at_formatted: Option<String>,
}

impl From<ReviewRecord> for ReviewView {
  fn from(record: ReviewRecord) -> Self {
    Self {
      review: record.review_text.clone(),
      created_at_formatted: format_day(record.created_at),
      finished_at_formatted: record.finished_at.map(format_day),
      record,
    }
  }
}

// ─── Write shape ─────────────────────────────────────────────────────────────

/// A timestamp as the UI may send it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
  Epoch(i64),
  /// Fractional epoch seconds, truncated to whole seconds.
  FractionalEpoch(f64),
  /// `YYYY-MM-DD`; an empty string means "not set".
  Day(String),
}

impl WireTimestamp {
  fn resolve(self) -> gamenote_core::Result<Option<DateTime<Utc>>> {
    match self {
      Self::Epoch(secs) => from_epoch(secs).map(Some),
      Self::FractionalEpoch(secs) if secs.is_finite() => {
        from_epoch(secs.trunc() as i64).map(Some)
      }
      Self::FractionalEpoch(secs) => Err(gamenote_core::Error::InvalidDate(
        format!("epoch seconds out of range: {secs}"),
      )),
      Self::Day(day) if day.trim().is_empty() => Ok(None),
      Self::Day(day) => parse_day(&day).map(Some),
    }
  }
}

/// JSON body of a save. Unknown fields are ignored.
///
/// Field aliases accept the names older plugin builds send (`review`,
/// `game_name`, `finished_at_formatted`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveReviewBody {
  #[serde(default, alias = "game_name")]
  pub display_name: Option<String>,
  #[serde(default, alias = "review")]
  pub review_text:  String,
  #[serde(default)]
  pub rating:       Option<f64>,
  /// Kept as text so an unknown status surfaces as invalid input rather
  /// than a JSON syntax error.
  #[serde(default)]
  pub status:       Option<String>,
  #[serde(default, alias = "finished_at_formatted")]
  pub finished_at:  Option<WireTimestamp>,
  #[serde(default)]
  pub icon_hash:    Option<String>,
}

impl SaveReviewBody {
  /// Parse the raw `review_data` string of a callable save.
  pub fn from_json(raw: &str) -> gamenote_core::Result<Self> {
    Ok(serde_json::from_str(raw)?)
  }
}

impl TryFrom<SaveReviewBody> for ReviewFields {
  type Error = gamenote_core::Error;

  fn try_from(b: SaveReviewBody) -> Result<Self, Self::Error> {
    let status = b
      .status
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(ReviewStatus::parse)
      .transpose()?;

    let finished_at = b.finished_at.map(WireTimestamp::resolve).transpose()?.flatten();

    let fields = ReviewFields {
      display_name: b.display_name,
      review_text: b.review_text,
      rating: b.rating,
      status,
      finished_at,
      icon_hash: b.icon_hash,
    };
    fields.validate()?;
    Ok(fields)
  }
}

#[cfg(test)]
mod tests {
  use gamenote_core::Error;

  use super::*;

  fn fields(json: &str) -> gamenote_core::Result<ReviewFields> {
    ReviewFields::try_from(SaveReviewBody::from_json(json)?)
  }

  #[test]
  fn full_payload_with_day_string() {
    let f = fields(
      r#"{"review_text":"Great","rating":4.5,"status":"FINISHED","finished_at":"2023-06-01"}"#,
    )
    .unwrap();
    assert_eq!(f.review_text, "Great");
    assert_eq!(f.rating, Some(4.5));
    assert_eq!(f.status, Some(ReviewStatus::Finished));
    assert_eq!(f.finished_at.unwrap().timestamp(), 1_685_577_600);
  }

  #[test]
  fn legacy_field_names() {
    let f = fields(
      r#"{"review":"ok","game_name":"Portal","finished_at_formatted":"2022-01-15","extra":1}"#,
    )
    .unwrap();
    assert_eq!(f.review_text, "ok");
    assert_eq!(f.display_name.as_deref(), Some("Portal"));
    assert_eq!(f.finished_at, Some(parse_day("2022-01-15").unwrap()));
    assert_eq!(f.status, None);
  }

  #[test]
  fn epoch_and_empty_dates() {
    let f = fields(r#"{"finished_at":1685577600}"#).unwrap();
    assert_eq!(f.finished_at, Some(parse_day("2023-06-01").unwrap()));

    let f = fields(r#"{"finished_at":1685577600.75}"#).unwrap();
    assert_eq!(f.finished_at.unwrap().timestamp(), 1_685_577_600);

    let f = fields(r#"{"finished_at":"","status":""}"#).unwrap();
    assert!(f.finished_at.is_none());
    assert!(f.status.is_none());
  }

  #[test]
  fn invalid_inputs() {
    assert!(matches!(
      fields(r#"{"rating":6.0}"#),
      Err(Error::InvalidRating(_))
    ));
    assert!(matches!(
      fields(r#"{"status":"ABANDONED"}"#),
      Err(Error::UnknownStatus(_))
    ));
    assert!(matches!(
      fields(r#"{"finished_at":"yesterday"}"#),
      Err(Error::InvalidDate(_))
    ));
    assert!(matches!(fields("not json"), Err(Error::Serialization(_))));
  }

  #[test]
  fn view_adds_formatted_days() {
    let record = ReviewRecord::from_fields(
      100,
      fields(r#"{"review_text":"Great","finished_at":"2023-06-01"}"#).unwrap(),
      parse_day("2023-07-22").unwrap(),
    );
    let json = serde_json::to_value(ReviewView::from(record)).unwrap();
    assert_eq!(json["item_id"], 100);
    assert_eq!(json["review_text"], "Great");
    assert_eq!(json["review"], "Great");
    assert_eq!(json["status"], "IN_PROGRESS");
    assert_eq!(json["created_at_formatted"], "2023-07-22");
    assert_eq!(json["finished_at_formatted"], "2023-06-01");
    assert_eq!(json["finished_at"], 1_685_577_600);
  }
}
