//! Error types for `gamenote-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("rating {0} is outside the range 1.0..=5.0")]
  InvalidRating(f64),

  #[error("unknown review status: {0:?}")]
  UnknownStatus(String),

  #[error("invalid date: {0}")]
  InvalidDate(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Whether the caller supplied data the store refuses to persist, as
  /// opposed to an operational failure.
  pub fn is_invalid_input(&self) -> bool {
    matches!(
      self,
      Self::InvalidRating(_) | Self::UnknownStatus(_) | Self::InvalidDate(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
