//! SQL schema for the gamenote SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per library item; saves replace the row in place.
CREATE TABLE IF NOT EXISTS reviews (
    item_id      INTEGER PRIMARY KEY,
    display_name TEXT,
    review_text  TEXT    NOT NULL DEFAULT '',
    rating       REAL,                  -- NULL until rated
    status       TEXT    NOT NULL DEFAULT 'IN_PROGRESS',
    created_at   INTEGER NOT NULL,      -- epoch seconds; never updated
    finished_at  INTEGER,               -- epoch seconds or NULL
    icon_hash    TEXT,
    CHECK (status IN ('IN_PROGRESS', 'FINISHED', 'SKIPPED')),
    CHECK (rating IS NULL OR rating BETWEEN 1.0 AND 5.0)
);

CREATE INDEX IF NOT EXISTS reviews_status_idx   ON reviews(status);
CREATE INDEX IF NOT EXISTS reviews_finished_idx ON reviews(finished_at);

PRAGMA user_version = 1;
";
