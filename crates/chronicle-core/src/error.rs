//! Error types for `chronicle-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown subject kind tag: {0:?}")]
  UnknownSubjectKind(String),

  #[error("unknown activity kind tag: {0:?}")]
  UnknownActivityKind(String),

  #[error("unknown company status tag: {0:?}")]
  UnknownCompanyStatus(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
