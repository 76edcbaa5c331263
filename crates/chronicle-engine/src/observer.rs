//! Lifecycle observers — translate entity transitions into audit records.
//!
//! One observer serves every [`Auditable`] entity type. Each hook builds the
//! record for its transition and submits it through the guarded recorder.
//!
//! Failure boundary: an audit write that fails here is logged and swallowed.
//! The entity mutation that triggered the hook has already committed and
//! must never be failed or rolled back by its own audit trail.

use std::sync::Arc;

use chronicle_core::{
  activity::{ActivityKind, AttributeDiff},
  actor::ActorId,
  entity::{Auditable, Transition},
  store::ActivityStore,
};
use serde_json::json;

use crate::recorder::{ActivityDraft, ActivityRecorder};

pub struct LifecycleObserver<S> {
  recorder: Arc<ActivityRecorder<S>>,
}

impl<S: ActivityStore> LifecycleObserver<S> {
  pub fn new(recorder: Arc<ActivityRecorder<S>>) -> Self {
    Self { recorder }
  }

  pub async fn entity_created<E: Auditable>(
    &self,
    entity: &E,
    actor: Option<ActorId>,
  ) {
    self
      .snapshot_record(entity, actor, ActivityKind::Created, "Created")
      .await;
  }

  /// Diff the two states and record what changed. A diff that comes back
  /// empty (only bookkeeping timestamps moved) records nothing at all.
  pub async fn entity_updated<E: Auditable>(
    &self,
    before: &E,
    after: &E,
    actor: Option<ActorId>,
  ) {
    let diff = AttributeDiff::between(&before.snapshot(), &after.snapshot());
    if diff.is_empty() {
      return;
    }

    let subject = after.subject();
    let transitions = E::transitions(before, after);

    let properties = match diff.to_properties() {
      Ok(p) => p,
      Err(error) => {
        tracing::warn!(
          subject_kind = subject.kind.tag(),
          subject_id = %subject.id,
          %error,
          "failed to serialise attribute diff"
        );
        return;
      }
    };

    // Becoming the primary contact reads differently from a routine edit.
    let description = if transitions.contains(&Transition::BecamePrimary) {
      format!("Marked {} as the primary contact", after.label())
    } else {
      format!("Updated {} {}", subject.kind.tag(), after.label())
    };

    let mut draft = ActivityDraft::new(subject, ActivityKind::Updated, description);
    draft.actor = actor;
    draft.properties = properties;
    self.submit(draft).await;

    for transition in &transitions {
      if let Transition::StatusChanged { from, to } = transition {
        let mut draft = ActivityDraft::new(
          subject,
          ActivityKind::StatusChanged,
          format!("Status changed from {from} to {to}"),
        );
        draft.actor = actor;
        draft.properties = json!({ "old": from, "new": to });
        self.submit(draft).await;
      }
    }
  }

  pub async fn entity_deleted<E: Auditable>(
    &self,
    entity: &E,
    actor: Option<ActorId>,
  ) {
    self
      .snapshot_record(entity, actor, ActivityKind::Deleted, "Deleted")
      .await;
  }

  pub async fn entity_restored<E: Auditable>(
    &self,
    entity: &E,
    actor: Option<ActorId>,
  ) {
    self
      .snapshot_record(entity, actor, ActivityKind::Restored, "Restored")
      .await;
  }

  pub async fn entity_force_deleted<E: Auditable>(
    &self,
    entity: &E,
    actor: Option<ActorId>,
  ) {
    self
      .snapshot_record(
        entity,
        actor,
        ActivityKind::ForceDeleted,
        "Permanently deleted",
      )
      .await;
  }

  async fn snapshot_record<E: Auditable>(
    &self,
    entity: &E,
    actor: Option<ActorId>,
    kind: ActivityKind,
    verb: &str,
  ) {
    let subject = entity.subject();
    let mut draft = ActivityDraft::new(
      subject,
      kind,
      format!("{verb} {} {}", subject.kind.tag(), entity.label()),
    );
    draft.actor = actor;
    draft.properties = json!({ "attributes": entity.snapshot() });
    self.submit(draft).await;
  }

  /// The catch-log-swallow boundary for every hook above.
  async fn submit(&self, draft: ActivityDraft) {
    let subject = draft.subject;
    if let Err(error) = self.recorder.record(draft).await {
      tracing::warn!(
        subject_kind = subject.kind.tag(),
        subject_id = %subject.id,
        %error,
        "failed to record activity"
      );
    }
  }
}
