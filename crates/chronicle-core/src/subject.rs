//! Subject — the polymorphic reference an activity record points at.
//!
//! A subject is a (kind, id) pair rather than a foreign key: an activity may
//! outlive its entity, so the reference must stay valid for entities that
//! have since been purged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The kind of entity an activity can be recorded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
  Company,
  Contact,
}

impl SubjectKind {
  /// The tag string stored in the `subject_kind` column and hashed into the
  /// dedup key. Must match the `rename_all = "lowercase"` serde tags above.
  pub fn tag(self) -> &'static str {
    match self {
      Self::Company => "company",
      Self::Contact => "contact",
    }
  }

  pub fn from_tag(s: &str) -> Result<Self> {
    match s {
      "company" => Ok(Self::Company),
      "contact" => Ok(Self::Contact),
      other => Err(Error::UnknownSubjectKind(other.to_string())),
    }
  }
}

/// A typed reference to the entity an activity is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
  pub kind: SubjectKind,
  pub id:   Uuid,
}

impl SubjectRef {
  pub fn company(id: Uuid) -> Self {
    Self { kind: SubjectKind::Company, id }
  }

  pub fn contact(id: Uuid) -> Self {
    Self { kind: SubjectKind::Contact, id }
  }
}
