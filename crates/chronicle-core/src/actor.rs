//! Actor — the identity credited with causing an activity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity an activity record is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub Uuid);

impl ActorId {
  /// The fallback identity used when no authenticated actor exists (queue
  /// workers, schema hooks). Call sites pass `Option<ActorId>`; the nil
  /// UUID is only ever substituted at the recording boundary.
  pub const SYSTEM: ActorId = ActorId(Uuid::nil());
}

impl From<Uuid> for ActorId {
  fn from(id: Uuid) -> Self { Self(id) }
}

impl fmt::Display for ActorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}
