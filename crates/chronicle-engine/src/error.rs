//! Error type for `chronicle-engine`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("company not found: {0}")]
  CompanyNotFound(Uuid),

  #[error("contact not found: {0}")]
  ContactNotFound(Uuid),

  /// The row exists but its lifecycle state forbids the operation (e.g.
  /// updating a soft-deleted company, restoring a live one).
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// The queue consumer is gone; the job cannot be delivered.
  #[error("job queue is closed")]
  QueueClosed,
}

impl Error {
  /// Box a backend error at the trait seam.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
