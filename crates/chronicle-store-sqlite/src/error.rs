//! Error type for `chronicle-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] chronicle_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("company not found: {0}")]
  CompanyNotFound(Uuid),

  #[error("contact not found: {0}")]
  ContactNotFound(Uuid),

  /// Soft-delete requested for a row that is already soft-deleted, or an
  /// update aimed at one.
  #[error("row {0} is already deleted")]
  AlreadyDeleted(Uuid),

  /// Restore requested for a row that is not soft-deleted.
  #[error("row {0} is not deleted")]
  NotDeleted(Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
