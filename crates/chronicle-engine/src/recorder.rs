//! The guarded write path into the activity store.

use std::sync::Arc;

use chronicle_core::{
  activity::{Activity, ActivityKind, NewActivity},
  actor::ActorId,
  clock::Clock,
  store::ActivityStore,
  subject::SubjectRef,
};

use crate::{
  dedup::{DedupGuard, dedup_key},
  error::{Error, Result},
};

// ─── ActivityDraft ───────────────────────────────────────────────────────────

/// Input to [`ActivityRecorder::record`] — everything but the timestamp,
/// which the recorder assigns from its clock.
#[derive(Debug, Clone)]
pub struct ActivityDraft {
  pub subject:          SubjectRef,
  pub actor:            Option<ActorId>,
  pub kind:             ActivityKind,
  pub description:      String,
  pub properties:       serde_json::Value,
  pub system_generated: bool,
}

impl ActivityDraft {
  /// Convenience constructor: system-generated, empty properties.
  pub fn new(
    subject: SubjectRef,
    kind: ActivityKind,
    description: impl Into<String>,
  ) -> Self {
    Self {
      subject,
      actor: None,
      kind,
      description: description.into(),
      properties: serde_json::json!({}),
      system_generated: true,
    }
  }
}

// ─── ActivityRecorder ────────────────────────────────────────────────────────

/// Appends audit records through the dedup guard.
///
/// All audit writes in the system go through here, so redundant triggers for
/// the same logical change collapse to one record regardless of which layer
/// fired them.
pub struct ActivityRecorder<S> {
  store: Arc<S>,
  guard: DedupGuard,
  clock: Arc<dyn Clock>,
}

impl<S: ActivityStore> ActivityRecorder<S> {
  pub fn new(store: Arc<S>, guard: DedupGuard, clock: Arc<dyn Clock>) -> Self {
    Self { store, guard, clock }
  }

  pub fn guard(&self) -> &DedupGuard { &self.guard }

  /// Append `draft`, unless an identical write (same subject, kind, and
  /// properties) already landed within the dedup window — in which case the
  /// record that write produced is returned and nothing is persisted.
  ///
  /// If the key looks recent but no matching record can be found (the
  /// earlier write raced or failed), the draft falls through and is written
  /// normally.
  pub async fn record(&self, draft: ActivityDraft) -> Result<Activity> {
    let now = self.clock.now();
    let key = dedup_key(draft.subject, draft.kind, &draft.properties);

    if self.guard.recently_marked(&key, now) {
      let since = now - self.guard.window();
      match self.store.latest_matching(draft.subject, draft.kind, since).await {
        Ok(Some(prior)) => {
          tracing::debug!(
            key = %hex::encode(key),
            activity_id = %prior.activity_id,
            "suppressed duplicate activity write"
          );
          return Ok(prior);
        }
        Ok(None) => {}
        Err(e) => return Err(Error::store(e)),
      }
    }

    self.guard.mark(key, now);

    let mut input = NewActivity::new(draft.subject, draft.kind, draft.description, now);
    input.actor = draft.actor;
    input.properties = draft.properties;
    input.system_generated = draft.system_generated;

    self.store.record_activity(input).await.map_err(Error::store)
  }
}
