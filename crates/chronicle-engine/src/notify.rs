//! Notification seam.
//!
//! Delivery (mail, chat, webhooks) lives outside this crate; the engine only
//! needs somewhere to hand a message, and the guarantee that a failed send
//! never propagates past its call site.

use std::future::Future;

use chronicle_core::actor::ActorId;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

pub trait Notifier: Send + Sync {
  fn send(
    &self,
    recipient: ActorId,
    message: &str,
  ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Writes notifications to the log instead of delivering them anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  async fn send(&self, recipient: ActorId, message: &str) -> Result<(), NotifyError> {
    tracing::info!(%recipient, message, "notification");
    Ok(())
  }
}
