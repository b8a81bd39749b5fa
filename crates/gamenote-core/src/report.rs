//! Filters and the grouped ratings report.
//!
//! Aggregation is pure: it takes the whole collection as read from a store and
//! never mutates it. Every ordering here is total, so repeated reports over the
//! same data are identical.

use std::{cmp::Ordering, collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
  Error, Result,
  review::{ReviewRecord, ReviewStatus, parse_day},
};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::ReviewStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
  /// Accepted statuses; empty accepts every status.
  pub statuses: Vec<ReviewStatus>,
  /// UTC calendar year of `finished_at`. Records without a finish date never
  /// match a year.
  pub year:     Option<i32>,
}

impl ReviewFilter {
  pub fn matches(&self, record: &ReviewRecord) -> bool {
    let status_ok =
      self.statuses.is_empty() || self.statuses.contains(&record.status);
    let year_ok = match self.year {
      None => true,
      Some(year) => record.finished_year() == Some(year),
    };
    status_ok && year_ok
  }
}

// ─── Year selector ───────────────────────────────────────────────────────────

/// Year selector of a report request: `"all"` or a specific year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum YearFilter {
  #[default]
  All,
  Year(i32),
}

impl YearFilter {
  pub fn year(self) -> Option<i32> {
    match self {
      Self::All => None,
      Self::Year(y) => Some(y),
    }
  }
}

impl FromStr for YearFilter {
  type Err = Error;

  /// Accepts `all`, a bare year, or a `YYYY-MM-DD` day (its year is used).
  fn from_str(s: &str) -> Result<Self> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("all") {
      return Ok(Self::All);
    }
    if let Ok(year) = s.parse::<i32>() {
      return Ok(Self::Year(year));
    }
    let day = parse_day(s)?;
    Ok(Self::Year(chrono::Datelike::year(&day)))
  }
}

impl fmt::Display for YearFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::All => f.write_str("all"),
      Self::Year(y) => write!(f, "{y}"),
    }
  }
}

impl Serialize for YearFilter {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::All => s.serialize_str("all"),
      Self::Year(y) => s.serialize_i32(*y),
    }
  }
}

impl<'de> Deserialize<'de> for YearFilter {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Int(i64),
      Str(String),
    }

    match Raw::deserialize(d)? {
      Raw::Int(y) => i32::try_from(y)
        .map(Self::Year)
        .map_err(|_| serde::de::Error::custom(format!("year out of range: {y}"))),
      Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Options for [`crate::store::ReviewStore::aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
  /// Include `IN_PROGRESS` records. Defaults to `true`.
  #[serde(default = "default_show_all")]
  pub show_all: bool,
  #[serde(default)]
  pub year:     YearFilter,
}

fn default_show_all() -> bool { true }

impl Default for ReportOptions {
  fn default() -> Self { Self { show_all: true, year: YearFilter::All } }
}

impl ReportOptions {
  pub fn matches(&self, record: &ReviewRecord) -> bool {
    let status_ok = self.show_all || record.status != ReviewStatus::InProgress;
    let year_ok = match self.year {
      YearFilter::All => true,
      YearFilter::Year(year) => record.finished_year() == Some(year),
    };
    status_ok && year_ok
  }
}

/// Rated records partitioned by status, plus the summary the ratings page
/// needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedReport {
  /// Every rated record, ignoring the report options; ascending `item_id`.
  pub all_ratings:       Vec<ReviewRecord>,
  /// Distinct finish years across `all_ratings`, ascending.
  pub years:             Vec<i32>,
  /// Rated records matching the options, best first.
  pub ratings:           Vec<ReviewRecord>,
  /// Non-empty groups only, keyed in `FINISHED`, `IN_PROGRESS`, `SKIPPED`
  /// order.
  pub grouped_by_status: BTreeMap<ReviewStatus, Vec<ReviewRecord>>,
  pub total_games:       usize,
}

impl GroupedReport {
  /// Aggregate over the full collection.
  pub fn build(
    records: impl IntoIterator<Item = ReviewRecord>,
    options: &ReportOptions,
  ) -> Self {
    let mut all_ratings: Vec<ReviewRecord> =
      records.into_iter().filter(ReviewRecord::is_rated).collect();
    all_ratings.sort_by_key(|r| r.item_id);

    let mut years: Vec<i32> =
      all_ratings.iter().filter_map(ReviewRecord::finished_year).collect();
    years.sort_unstable();
    years.dedup();

    let mut ratings: Vec<ReviewRecord> = all_ratings
      .iter()
      .filter(|r| options.matches(r))
      .cloned()
      .collect();
    ratings.sort_by(best_first);

    // `ratings` is already sorted, so each group inherits the order.
    let mut grouped_by_status: BTreeMap<ReviewStatus, Vec<ReviewRecord>> =
      BTreeMap::new();
    for record in &ratings {
      grouped_by_status
        .entry(record.status)
        .or_default()
        .push(record.clone());
    }

    Self {
      total_games: ratings.len(),
      all_ratings,
      years,
      ratings,
      grouped_by_status,
    }
  }

  pub fn group(&self, status: ReviewStatus) -> &[ReviewRecord] {
    self
      .grouped_by_status
      .get(&status)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }
}

/// Rating descending, then `item_id` ascending.
fn best_first(a: &ReviewRecord, b: &ReviewRecord) -> Ordering {
  let ra = a.rating.unwrap_or(f64::NEG_INFINITY);
  let rb = b.rating.unwrap_or(f64::NEG_INFINITY);
  rb.total_cmp(&ra).then(a.item_id.cmp(&b.item_id))
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, Utc};

  use super::*;
  use crate::review::{ItemId, ReviewFields, parse_day};

  fn record(
    item_id: ItemId,
    rating: Option<f64>,
    status: ReviewStatus,
    finished: Option<&str>,
  ) -> ReviewRecord {
    let mut fields = ReviewFields::new(format!("review {item_id}")).with_status(status);
    fields.rating = rating;
    fields.finished_at = finished.map(|d| parse_day(d).unwrap());
    ReviewRecord::from_fields(item_id, fields, DateTime::<Utc>::UNIX_EPOCH)
  }

  fn ids(records: &[ReviewRecord]) -> Vec<ItemId> {
    records.iter().map(|r| r.item_id).collect()
  }

  fn scenario() -> Vec<ReviewRecord> {
    vec![
      record(200, Some(2.0), ReviewStatus::Skipped, Some("2022-01-15")),
      record(100, Some(4.5), ReviewStatus::Finished, Some("2023-06-01")),
    ]
  }

  #[test]
  fn two_items_all_years() {
    let report = GroupedReport::build(scenario(), &ReportOptions {
      show_all: true,
      year:     YearFilter::All,
    });

    assert_eq!(report.total_games, 2);
    assert_eq!(report.years, [2022, 2023]);
    assert_eq!(ids(report.group(ReviewStatus::Finished)), [100]);
    assert_eq!(ids(report.group(ReviewStatus::Skipped)), [200]);
    assert!(!report.grouped_by_status.contains_key(&ReviewStatus::InProgress));
  }

  #[test]
  fn year_filter_keeps_full_year_list() {
    let report = GroupedReport::build(scenario(), &ReportOptions {
      year: YearFilter::Year(2023),
      ..Default::default()
    });

    assert_eq!(ids(&report.ratings), [100]);
    assert_eq!(report.total_games, 1);
    assert_eq!(ids(&report.all_ratings), [100, 200]);
    assert_eq!(report.years, [2022, 2023]);
  }

  #[test]
  fn hide_in_progress_and_unrated() {
    let mut records = scenario();
    records.push(record(300, Some(3.0), ReviewStatus::InProgress, None));
    records.push(record(400, None, ReviewStatus::Finished, Some("2021-03-03")));

    let all = GroupedReport::build(records.clone(), &ReportOptions::default());
    assert_eq!(all.total_games, 3);
    assert_eq!(ids(all.group(ReviewStatus::InProgress)), [300]);
    // Unrated 400 contributes neither a rating nor a year.
    assert_eq!(all.years, [2022, 2023]);

    let finished_only = GroupedReport::build(records, &ReportOptions {
      show_all: false,
      year:     YearFilter::All,
    });
    assert_eq!(ids(&finished_only.ratings), [100, 200]);
  }

  #[test]
  fn ties_break_by_item_id() {
    let records = vec![
      record(9, Some(4.0), ReviewStatus::Finished, None),
      record(3, Some(4.0), ReviewStatus::Finished, None),
      record(5, Some(5.0), ReviewStatus::Finished, None),
      record(1, Some(1.5), ReviewStatus::Finished, None),
    ];

    let first = GroupedReport::build(records.clone(), &ReportOptions::default());
    let mut reversed = records;
    reversed.reverse();
    let second = GroupedReport::build(reversed, &ReportOptions::default());

    assert_eq!(ids(first.group(ReviewStatus::Finished)), [5, 3, 9, 1]);
    assert_eq!(first, second);
  }

  #[test]
  fn groups_serialize_in_presentation_order() {
    let records = vec![
      record(1, Some(3.0), ReviewStatus::Skipped, None),
      record(2, Some(3.0), ReviewStatus::InProgress, None),
      record(3, Some(3.0), ReviewStatus::Finished, None),
    ];
    let report = GroupedReport::build(records, &ReportOptions::default());
    let json = serde_json::to_string(&report.grouped_by_status).unwrap();

    let finished = json.find("FINISHED").unwrap();
    let in_progress = json.find("IN_PROGRESS").unwrap();
    let skipped = json.find("SKIPPED").unwrap();
    assert!(finished < in_progress && in_progress < skipped);
  }

  #[test]
  fn filter_excludes_undated_records_from_year_queries() {
    let undated = record(1, Some(3.0), ReviewStatus::Finished, None);
    let dated = record(2, Some(3.0), ReviewStatus::Finished, Some("2024-12-31"));

    let by_status = ReviewFilter {
      statuses: vec![ReviewStatus::Finished],
      year:     None,
    };
    assert!(by_status.matches(&undated));

    let by_year = ReviewFilter { year: Some(2024), ..Default::default() };
    assert!(!by_year.matches(&undated));
    assert!(by_year.matches(&dated));
  }

  #[test]
  fn year_filter_parsing() {
    assert_eq!("all".parse::<YearFilter>().unwrap(), YearFilter::All);
    assert_eq!("2023".parse::<YearFilter>().unwrap(), YearFilter::Year(2023));
    assert_eq!(
      "2022-01-15".parse::<YearFilter>().unwrap(),
      YearFilter::Year(2022)
    );
    assert!("last year".parse::<YearFilter>().is_err());

    let from_int: YearFilter = serde_json::from_str("2021").unwrap();
    assert_eq!(from_int, YearFilter::Year(2021));
    let from_str: YearFilter = serde_json::from_str("\"all\"").unwrap();
    assert_eq!(from_str, YearFilter::All);
    assert_eq!(serde_json::to_string(&YearFilter::Year(2020)).unwrap(), "2020");
  }
}
