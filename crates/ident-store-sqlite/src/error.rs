//! Error type for `ident-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] ident_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl Error {
  /// `true` for errors caused by the caller's input rather than the store.
  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Core(e) if e.is_validation())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
