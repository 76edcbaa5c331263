//! Activity types — the fundamental unit of the Chronicle audit log.
//!
//! An activity is an immutable record of something that happened to a
//! subject. Records are appended exactly once and never updated or deleted
//! by this layer; retention is somebody else's problem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, actor::ActorId, subject::SubjectRef};

// ─── ActivityKind ────────────────────────────────────────────────────────────

/// The enumerated kind of an activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityKind {
  Created,
  Updated,
  Deleted,
  Restored,
  ForceDeleted,
  StatusChanged,
  NoteAdded,
  Custom,
}

impl ActivityKind {
  /// The tag string stored in the `kind` column and hashed into the dedup
  /// key. Must match the `rename_all = "kebab-case"` serde tags above.
  pub fn tag(self) -> &'static str {
    match self {
      Self::Created => "created",
      Self::Updated => "updated",
      Self::Deleted => "deleted",
      Self::Restored => "restored",
      Self::ForceDeleted => "force-deleted",
      Self::StatusChanged => "status-changed",
      Self::NoteAdded => "note-added",
      Self::Custom => "custom",
    }
  }

  pub fn from_tag(s: &str) -> Result<Self> {
    match s {
      "created" => Ok(Self::Created),
      "updated" => Ok(Self::Updated),
      "deleted" => Ok(Self::Deleted),
      "restored" => Ok(Self::Restored),
      "force-deleted" => Ok(Self::ForceDeleted),
      "status-changed" => Ok(Self::StatusChanged),
      "note-added" => Ok(Self::NoteAdded),
      "custom" => Ok(Self::Custom),
      other => Err(Error::UnknownActivityKind(other.to_string())),
    }
  }
}

// ─── Activity ────────────────────────────────────────────────────────────────

/// An immutable audit record. Once written, no field is ever updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
  pub activity_id:      Uuid,
  pub subject:          SubjectRef,
  pub actor:            ActorId,
  pub kind:             ActivityKind,
  /// Human-readable one-liner, e.g. `Created company Acme Corp`.
  pub description:      String,
  /// Structured payload chosen by the call site (diffs, snapshots, markers).
  /// Always plain data, never executable.
  pub properties:       serde_json::Value,
  /// `false` only for records produced by direct user action (manual notes).
  pub system_generated: bool,
  pub recorded_at:      DateTime<Utc>,
}

// ─── NewActivity ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::ActivityStore::record_activity`].
///
/// `recorded_at` is assigned by the recording layer from its injected clock
/// rather than by the database, so the dedup window behaves deterministically
/// under a test clock. `actor` is optional; `None` resolves to
/// [`ActorId::SYSTEM`] at the store boundary.
#[derive(Debug, Clone)]
pub struct NewActivity {
  pub subject:          SubjectRef,
  pub actor:            Option<ActorId>,
  pub kind:             ActivityKind,
  pub description:      String,
  pub properties:       serde_json::Value,
  pub system_generated: bool,
  pub recorded_at:      DateTime<Utc>,
}

impl NewActivity {
  /// Convenience constructor: system-generated, empty properties.
  pub fn new(
    subject: SubjectRef,
    kind: ActivityKind,
    description: impl Into<String>,
    recorded_at: DateTime<Utc>,
  ) -> Self {
    Self {
      subject,
      actor: None,
      kind,
      description: description.into(),
      properties: serde_json::json!({}),
      system_generated: true,
      recorded_at,
    }
  }
}

// ─── AttributeDiff ───────────────────────────────────────────────────────────

/// The per-field before/after values carried by an "updated" record.
///
/// Built from two attribute snapshots; only changed fields appear, keyed the
/// same way on both sides. Snapshots already exclude bookkeeping timestamps,
/// so an unchanged entity produces an empty diff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeDiff {
  pub old: serde_json::Map<String, serde_json::Value>,
  pub new: serde_json::Map<String, serde_json::Value>,
}

impl AttributeDiff {
  /// Compare two JSON-object snapshots field by field. Non-object inputs
  /// yield an empty diff.
  pub fn between(before: &serde_json::Value, after: &serde_json::Value) -> Self {
    let mut diff = Self::default();

    let (Some(before), Some(after)) = (before.as_object(), after.as_object())
    else {
      return diff;
    };

    for (key, old_value) in before {
      let new_value = after.get(key).unwrap_or(&serde_json::Value::Null);
      if old_value != new_value {
        diff.old.insert(key.clone(), old_value.clone());
        diff.new.insert(key.clone(), new_value.clone());
      }
    }
    for (key, new_value) in after {
      if !before.contains_key(key) && !new_value.is_null() {
        diff.old.insert(key.clone(), serde_json::Value::Null);
        diff.new.insert(key.clone(), new_value.clone());
      }
    }

    diff
  }

  pub fn is_empty(&self) -> bool { self.old.is_empty() && self.new.is_empty() }

  /// Serialise into the `{"old": {...}, "new": {...}}` properties payload.
  pub fn to_properties(&self) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(self)?)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
