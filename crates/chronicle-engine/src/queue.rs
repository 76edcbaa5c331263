//! Deferred-work queue for the primary-contact transition handler.
//!
//! Producer and consumer communicate over an in-process channel, but the
//! payload crosses it serialised — the same envelope a durable queue would
//! carry. A single consumer drains jobs in enqueue order, so handlers for
//! the same subject never reorder. A job whose handler fails is logged and
//! dropped; retry policy, if any, belongs to the host queue, not here.

use chronicle_core::store::{ActivityStore, DirectoryStore};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  notify::Notifier,
  primary::PrimaryContactHandler,
};

/// Payload enqueued when a contact's primary flag flips to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryContactChange {
  pub company_id: Uuid,
  pub contact_id: Uuid,
}

/// Producer half; cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
  pub(crate) tx: mpsc::UnboundedSender<String>,
}

/// Consumer half, fed to [`run_worker`].
pub struct JobReceiver {
  pub(crate) rx: mpsc::UnboundedReceiver<String>,
}

impl JobQueue {
  pub fn channel() -> (JobQueue, JobReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (JobQueue { tx }, JobReceiver { rx })
  }

  /// Serialise and enqueue. Fails only when the consumer is gone.
  pub fn enqueue(&self, job: &PrimaryContactChange) -> Result<()> {
    let raw = serde_json::to_string(job)?;
    self.tx.send(raw).map_err(|_| Error::QueueClosed)
  }
}

/// Drain jobs until every producer is dropped.
///
/// Malformed payloads and handler failures are logged and skipped; the loop
/// itself only ends when the channel closes.
pub async fn run_worker<S, N>(
  mut receiver: JobReceiver,
  handler: PrimaryContactHandler<S, N>,
) where
  S: ActivityStore + DirectoryStore,
  N: Notifier,
{
  while let Some(raw) = receiver.rx.recv().await {
    let job: PrimaryContactChange = match serde_json::from_str(&raw) {
      Ok(job) => job,
      Err(error) => {
        tracing::warn!(%error, raw, "dropping malformed queue payload");
        continue;
      }
    };

    if let Err(error) = handler.handle(&job).await {
      tracing::warn!(
        company_id = %job.company_id,
        contact_id = %job.contact_id,
        %error,
        "primary-contact transition handler failed"
      );
    }
  }
}
