//! Error type for `gamenote-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] gamenote_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored row could not be decoded back into a record.
  #[error("corrupt record for item {item_id}: {reason}")]
  Corrupt { item_id: i64, reason: String },
}

impl Error {
  /// The caller supplied a value the store refuses to persist.
  pub fn is_invalid_input(&self) -> bool {
    matches!(self, Self::Core(e) if e.is_invalid_input())
  }

  /// The backing storage is unreachable or holds data it cannot decode.
  pub fn is_io(&self) -> bool { !self.is_invalid_input() }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
