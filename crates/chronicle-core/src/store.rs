//! The `ActivityStore` and `DirectoryStore` traits.
//!
//! Both are implemented by storage backends (e.g. `chronicle-store-sqlite`).
//! Higher layers (`chronicle-engine`, `chronicle-api`) depend on these
//! abstractions, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  activity::{Activity, ActivityKind, NewActivity},
  entity::{Company, CompanyPatch, Contact, ContactPatch, NewCompany, NewContact},
  subject::SubjectRef,
};

// ─── ActivityStore ───────────────────────────────────────────────────────────

/// Durable append and read of audit records.
///
/// Writes are strictly append-only; nothing in this trait can mutate or
/// delete an existing record.
pub trait ActivityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new record and return it. Storage failures propagate; the
  /// lifecycle observers and the transition handler catch them at their own
  /// boundary so entity mutations never fail because auditing did.
  fn record_activity(
    &self,
    input: NewActivity,
  ) -> impl Future<Output = Result<Activity, Self::Error>> + Send + '_;

  /// Records for a subject, newest first, at most `limit`. Side-effect free.
  fn list_recent(
    &self,
    subject: SubjectRef,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + '_;

  /// The most recent record for (subject, kind) recorded at or after
  /// `since`. This is the lookup behind the dedup guard's fall-back path;
  /// a miss is an ordinary `None`, not an error.
  fn latest_matching(
    &self,
    subject: SubjectRef,
    kind: ActivityKind,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Activity>, Self::Error>> + Send + '_;
}

// ─── DirectoryStore ──────────────────────────────────────────────────────────

/// Typed persistence for the directory entities, with a soft-delete
/// lifecycle per entity: update only touches live rows, soft delete stamps
/// `deleted_at`, restore clears it, and force delete removes the row and
/// returns the final snapshot (so the caller can still audit it).
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Companies ─────────────────────────────────────────────────────────

  fn create_company(
    &self,
    input: NewCompany,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  /// Retrieve by id. Soft-deleted companies are returned (with `deleted_at`
  /// set); `None` means the row does not exist at all.
  fn get_company(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  fn list_companies(
    &self,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Vec<Company>, Self::Error>> + Send + '_;

  /// Apply a patch to a live company. Errors if the row is missing or
  /// soft-deleted.
  fn update_company(
    &self,
    id: Uuid,
    patch: CompanyPatch,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  fn soft_delete_company(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  fn restore_company(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  /// Remove the row (contacts cascade) and return the final snapshot.
  fn force_delete_company(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  fn create_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn get_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// List contacts, optionally restricted to one company.
  fn list_contacts(
    &self,
    company_id: Option<Uuid>,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  fn update_contact(
    &self,
    id: Uuid,
    patch: ContactPatch,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn soft_delete_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn restore_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn force_delete_contact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// The live primary-flagged contact for a company, excluding `excluding`
  /// if given. Used by the transition handler to find the previous primary;
  /// absence is an ordinary `None`.
  fn primary_contact(
    &self,
    company_id: Uuid,
    excluding: Option<Uuid>,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;
}
