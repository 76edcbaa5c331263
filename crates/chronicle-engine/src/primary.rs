//! Primary-contact transition handler.
//!
//! Reacts to "a contact was designated primary for its company", decoupled
//! from the synchronous update path via the job queue. By the time a job is
//! processed the request that produced it is long gone, so the handler
//! re-reads current state rather than trusting the captured ids to still
//! mean what they meant.

use std::sync::Arc;

use chronicle_core::{
  activity::ActivityKind,
  store::{ActivityStore, DirectoryStore},
  subject::SubjectRef,
};
use serde_json::json;

use crate::{
  error::{Error, Result},
  notify::Notifier,
  queue::PrimaryContactChange,
  recorder::{ActivityDraft, ActivityRecorder},
};

pub struct PrimaryContactHandler<S, N> {
  store:    Arc<S>,
  recorder: Arc<ActivityRecorder<S>>,
  notifier: Arc<N>,
}

impl<S, N> PrimaryContactHandler<S, N>
where
  S: ActivityStore + DirectoryStore,
  N: Notifier,
{
  pub fn new(
    store: Arc<S>,
    recorder: Arc<ActivityRecorder<S>>,
    notifier: Arc<N>,
  ) -> Self {
    Self { store, recorder, notifier }
  }

  /// Process one transition job.
  ///
  /// A company or contact that has vanished since enqueue is a logged no-op.
  /// The previous-primary lookup is best effort: no match yields an explicit
  /// null marker in the record's payload, not an error.
  pub async fn handle(&self, job: &PrimaryContactChange) -> Result<()> {
    let Some(company) = self
      .store
      .get_company(job.company_id)
      .await
      .map_err(Error::store)?
    else {
      tracing::debug!(company_id = %job.company_id, "company gone before handler ran");
      return Ok(());
    };

    let Some(contact) = self
      .store
      .get_contact(job.contact_id)
      .await
      .map_err(Error::store)?
    else {
      tracing::debug!(contact_id = %job.contact_id, "contact gone before handler ran");
      return Ok(());
    };

    let previous = self
      .store
      .primary_contact(company.company_id, Some(contact.contact_id))
      .await
      .map_err(Error::store)?;

    let description = match &previous {
      Some(prev) => format!(
        "{} replaced {} as the primary contact for {}",
        contact.name, prev.name, company.name
      ),
      None => format!(
        "{} became the primary contact for {}",
        contact.name, company.name
      ),
    };

    let mut draft = ActivityDraft::new(
      SubjectRef::company(company.company_id),
      ActivityKind::Custom,
      description,
    );
    draft.properties = json!({
      "new_primary": {
        "contact_id": contact.contact_id,
        "name":       contact.name,
      },
      "previous_primary": previous.as_ref().map(|p| json!({
        "contact_id": p.contact_id,
        "name":       p.name,
      })),
    });

    self.recorder.record(draft).await?;

    // Best effort: a failed send is logged and never reverses the record.
    if let Some(manager) = company.account_manager {
      let message = format!(
        "{} is now the primary contact for {}",
        contact.name, company.name
      );
      if let Err(error) = self.notifier.send(manager, &message).await {
        tracing::warn!(
          company_id = %company.company_id,
          recipient = %manager,
          %error,
          "failed to notify account manager"
        );
      }
    }

    Ok(())
  }
}
