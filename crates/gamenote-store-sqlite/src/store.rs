//! [`SqliteStore`]: the SQLite implementation of [`ReviewStore`].

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use chrono::{SubsecRound, Utc};
use rusqlite::{OptionalExtension as _, types::Value};
use serde::Deserialize;

use gamenote_core::{
  report::ReviewFilter,
  review::{ItemId, ReviewFields, ReviewRecord},
  store::ReviewStore,
};

use crate::{
  Result,
  encode::{REVIEW_COLUMNS, RawReview, encode_dt, encode_item_id, encode_status},
  schema::SCHEMA,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// How to open a [`SqliteStore`].
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  pub path:         PathBuf,
  /// How long a statement waits on a locked database before failing.
  #[serde(default = "default_busy_timeout")]
  pub busy_timeout: Duration,
}

fn default_busy_timeout() -> Duration { Duration::from_secs(2) }

impl StoreConfig {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), busy_timeout: default_busy_timeout() }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A review store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with default settings.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(&StoreConfig::new(path.as_ref())).await
  }

  /// Open (or create) a store described by `config` and run schema
  /// initialisation.
  pub async fn open_with(config: &StoreConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(&config.path).await?;
    let store = Self { conn };
    store.init(config.busy_timeout).await?;
    tracing::debug!(path = %config.path.display(), "opened review store");
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init(default_busy_timeout()).await?;
    Ok(store)
  }

  async fn init(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the database, bypassing record validation.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ReviewStore impl ────────────────────────────────────────────────────────

impl ReviewStore for SqliteStore {
  type Error = crate::Error;

  async fn has(&self, item_id: ItemId) -> Result<bool> {
    let id = encode_item_id(item_id);

    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM reviews WHERE item_id = ?1",
              rusqlite::params![id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(exists)
  }

  async fn get(&self, item_id: ItemId) -> Result<Option<ReviewRecord>> {
    let id = encode_item_id(item_id);

    let raw: Option<RawReview> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE item_id = ?1"),
              rusqlite::params![id],
              RawReview::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReview::into_record).transpose()
  }

  async fn save(
    &self,
    item_id: ItemId,
    fields: ReviewFields,
  ) -> Result<ReviewRecord> {
    // Validate before touching storage.
    let fields = fields.normalized().inspect_err(|e| {
      tracing::warn!(item_id, error = %e, "rejected review save");
    })?;

    let candidate =
      ReviewRecord::from_fields(item_id, fields, Utc::now().trunc_subsecs(0));

    let id           = encode_item_id(item_id);
    let display_name = candidate.display_name.clone();
    let review_text  = candidate.review_text.clone();
    let rating       = candidate.rating;
    let status       = encode_status(candidate.status);
    let created_at   = encode_dt(candidate.created_at);
    let finished_at  = candidate.finished_at.map(encode_dt);
    let icon_hash    = candidate.icon_hash.clone();

    // A single upsert statement: either the whole row is replaced or nothing
    // is. `created_at` is not in the UPDATE list.
    let stored_created_at: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO reviews (
             item_id, display_name, review_text, rating,
             status, created_at, finished_at, icon_hash
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT(item_id) DO UPDATE SET
             display_name = excluded.display_name,
             review_text  = excluded.review_text,
             rating       = excluded.rating,
             status       = excluded.status,
             finished_at  = excluded.finished_at,
             icon_hash    = excluded.icon_hash
           RETURNING created_at",
          rusqlite::params![
            id,
            display_name,
            review_text,
            rating,
            status,
            created_at,
            finished_at,
            icon_hash,
          ],
          |row| row.get(0),
        )?)
      })
      .await?;

    let created_at = gamenote_core::review::from_epoch(stored_created_at)
      .map_err(|e| crate::Error::Corrupt {
        item_id: id,
        reason:  e.to_string(),
      })?;

    tracing::debug!(item_id, status = %candidate.status, "saved review");
    Ok(ReviewRecord { created_at, ..candidate })
  }

  async fn delete(&self, item_id: ItemId) -> Result<bool> {
    let id = encode_item_id(item_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM reviews WHERE item_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    tracing::debug!(item_id, existed = removed > 0, "deleted review");
    Ok(removed > 0)
  }

  async fn list(&self, filter: &ReviewFilter) -> Result<Vec<ReviewRecord>> {
    let statuses: Vec<Value> = filter
      .statuses
      .iter()
      .map(|s| Value::Text(encode_status(*s).to_owned()))
      .collect();
    let year = filter.year;

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically.
        let mut conds: Vec<String> = vec![];
        let mut params: Vec<Value> = vec![];

        if !statuses.is_empty() {
          let marks = vec!["?"; statuses.len()].join(", ");
          conds.push(format!("status IN ({marks})"));
          params.extend(statuses);
        }
        if let Some(y) = year {
          conds.push(
            "finished_at IS NOT NULL \
             AND CAST(strftime('%Y', finished_at, 'unixepoch') AS INTEGER) = ?"
              .to_owned(),
          );
          params.push(Value::Integer(i64::from(y)));
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {REVIEW_COLUMNS} FROM reviews {where_clause} ORDER BY item_id"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_record).collect()
  }
}
