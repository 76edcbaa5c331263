//! The directory application service.
//!
//! Every entity mutation flows through here so its audit side effects fire
//! in one place: observer hooks after each successful write, the transition
//! job when a contact newly becomes primary, and manual notes straight into
//! the guarded recorder.

use std::sync::Arc;

use chronicle_core::{
  activity::{Activity, ActivityKind},
  actor::ActorId,
  entity::{
    Company, CompanyPatch, Contact, ContactPatch, NewCompany, NewContact,
  },
  store::{ActivityStore, DirectoryStore},
  subject::{SubjectKind, SubjectRef},
};
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  observer::LifecycleObserver,
  queue::{JobQueue, PrimaryContactChange},
  recorder::{ActivityDraft, ActivityRecorder},
};

pub struct Directory<S> {
  store:    Arc<S>,
  recorder: Arc<ActivityRecorder<S>>,
  observer: LifecycleObserver<S>,
  queue:    JobQueue,
}

impl<S> Directory<S>
where
  S: DirectoryStore + ActivityStore,
{
  pub fn new(
    store: Arc<S>,
    recorder: Arc<ActivityRecorder<S>>,
    queue: JobQueue,
  ) -> Self {
    Self {
      store,
      observer: LifecycleObserver::new(recorder.clone()),
      recorder,
      queue,
    }
  }

  // ── Companies ──────────────────────────────────────────────────────────────

  pub async fn create_company(
    &self,
    input: NewCompany,
    actor: Option<ActorId>,
  ) -> Result<Company> {
    let company = self.store.create_company(input).await.map_err(Error::store)?;
    self.observer.entity_created(&company, actor).await;
    Ok(company)
  }

  pub async fn company(&self, id: Uuid) -> Result<Option<Company>> {
    self.store.get_company(id).await.map_err(Error::store)
  }

  pub async fn companies(&self, include_deleted: bool) -> Result<Vec<Company>> {
    self
      .store
      .list_companies(include_deleted)
      .await
      .map_err(Error::store)
  }

  pub async fn update_company(
    &self,
    id: Uuid,
    patch: CompanyPatch,
    actor: Option<ActorId>,
  ) -> Result<Company> {
    let before = self.live_company(id).await?;
    let after = self
      .store
      .update_company(id, patch)
      .await
      .map_err(Error::store)?;
    self.observer.entity_updated(&before, &after, actor).await;
    Ok(after)
  }

  pub async fn delete_company(
    &self,
    id: Uuid,
    actor: Option<ActorId>,
  ) -> Result<Company> {
    self.live_company(id).await?;
    let company = self
      .store
      .soft_delete_company(id)
      .await
      .map_err(Error::store)?;
    self.observer.entity_deleted(&company, actor).await;
    Ok(company)
  }

  pub async fn restore_company(
    &self,
    id: Uuid,
    actor: Option<ActorId>,
  ) -> Result<Company> {
    let existing = self
      .company(id)
      .await?
      .ok_or(Error::CompanyNotFound(id))?;
    if !existing.is_deleted() {
      return Err(Error::Conflict(format!("company {id} is not deleted")));
    }
    let company = self.store.restore_company(id).await.map_err(Error::store)?;
    self.observer.entity_restored(&company, actor).await;
    Ok(company)
  }

  pub async fn purge_company(
    &self,
    id: Uuid,
    actor: Option<ActorId>,
  ) -> Result<Company> {
    self.company(id).await?.ok_or(Error::CompanyNotFound(id))?;
    let company = self
      .store
      .force_delete_company(id)
      .await
      .map_err(Error::store)?;
    self.observer.entity_force_deleted(&company, actor).await;
    Ok(company)
  }

  // ── Contacts ───────────────────────────────────────────────────────────────

  pub async fn create_contact(
    &self,
    input: NewContact,
    actor: Option<ActorId>,
  ) -> Result<Contact> {
    self.live_company(input.company_id).await?;
    let contact = self.store.create_contact(input).await.map_err(Error::store)?;
    self.observer.entity_created(&contact, actor).await;
    Ok(contact)
  }

  pub async fn contact(&self, id: Uuid) -> Result<Option<Contact>> {
    self.store.get_contact(id).await.map_err(Error::store)
  }

  pub async fn contacts(
    &self,
    company_id: Option<Uuid>,
    include_deleted: bool,
  ) -> Result<Vec<Contact>> {
    self
      .store
      .list_contacts(company_id, include_deleted)
      .await
      .map_err(Error::store)
  }

  /// Update a contact. If the patch newly sets the primary flag, the
  /// transition job is enqueued after the write lands — never before.
  pub async fn update_contact(
    &self,
    id: Uuid,
    patch: ContactPatch,
    actor: Option<ActorId>,
  ) -> Result<Contact> {
    let before = self.live_contact(id).await?;
    let after = self
      .store
      .update_contact(id, patch)
      .await
      .map_err(Error::store)?;
    self.observer.entity_updated(&before, &after, actor).await;

    if !before.is_primary && after.is_primary {
      let job = PrimaryContactChange {
        company_id: after.company_id,
        contact_id: after.contact_id,
      };
      if let Err(error) = self.queue.enqueue(&job) {
        // The update itself stands; the deferred reaction is lost and that
        // is all.
        tracing::warn!(
          contact_id = %after.contact_id,
          %error,
          "failed to enqueue primary-contact transition"
        );
      }
    }

    Ok(after)
  }

  pub async fn delete_contact(
    &self,
    id: Uuid,
    actor: Option<ActorId>,
  ) -> Result<Contact> {
    self.live_contact(id).await?;
    let contact = self
      .store
      .soft_delete_contact(id)
      .await
      .map_err(Error::store)?;
    self.observer.entity_deleted(&contact, actor).await;
    Ok(contact)
  }

  pub async fn restore_contact(
    &self,
    id: Uuid,
    actor: Option<ActorId>,
  ) -> Result<Contact> {
    let existing = self
      .contact(id)
      .await?
      .ok_or(Error::ContactNotFound(id))?;
    if !existing.is_deleted() {
      return Err(Error::Conflict(format!("contact {id} is not deleted")));
    }
    let contact = self.store.restore_contact(id).await.map_err(Error::store)?;
    self.observer.entity_restored(&contact, actor).await;
    Ok(contact)
  }

  pub async fn purge_contact(
    &self,
    id: Uuid,
    actor: Option<ActorId>,
  ) -> Result<Contact> {
    self.contact(id).await?.ok_or(Error::ContactNotFound(id))?;
    let contact = self
      .store
      .force_delete_contact(id)
      .await
      .map_err(Error::store)?;
    self.observer.entity_force_deleted(&contact, actor).await;
    Ok(contact)
  }

  // ── Activities ─────────────────────────────────────────────────────────────

  /// Record a manual note against a subject. Notes are the one record kind
  /// not produced by automation, so `system_generated` is false.
  ///
  /// The body rides in the properties payload as well as the description, so
  /// distinct notes never collide in the dedup key — only a word-for-word
  /// resubmission within the window is collapsed.
  pub async fn add_note(
    &self,
    subject: SubjectRef,
    body: impl Into<String>,
    actor: Option<ActorId>,
  ) -> Result<Activity> {
    self.ensure_subject(subject).await?;

    let body = body.into();
    let mut draft = ActivityDraft::new(subject, ActivityKind::NoteAdded, body.clone());
    draft.actor = actor;
    draft.properties = serde_json::json!({ "body": body });
    draft.system_generated = false;
    self.recorder.record(draft).await
  }

  pub async fn recent_activity(
    &self,
    subject: SubjectRef,
    limit: usize,
  ) -> Result<Vec<Activity>> {
    self
      .store
      .list_recent(subject, limit)
      .await
      .map_err(Error::store)
  }

  // ── Helpers ────────────────────────────────────────────────────────────────

  async fn live_company(&self, id: Uuid) -> Result<Company> {
    let company = self
      .company(id)
      .await?
      .ok_or(Error::CompanyNotFound(id))?;
    if company.is_deleted() {
      return Err(Error::Conflict(format!("company {id} is deleted")));
    }
    Ok(company)
  }

  async fn live_contact(&self, id: Uuid) -> Result<Contact> {
    let contact = self
      .contact(id)
      .await?
      .ok_or(Error::ContactNotFound(id))?;
    if contact.is_deleted() {
      return Err(Error::Conflict(format!("contact {id} is deleted")));
    }
    Ok(contact)
  }

  async fn ensure_subject(&self, subject: SubjectRef) -> Result<()> {
    match subject.kind {
      SubjectKind::Company => {
        self
          .company(subject.id)
          .await?
          .ok_or(Error::CompanyNotFound(subject.id))?;
      }
      SubjectKind::Contact => {
        self
          .contact(subject.id)
          .await?
          .ok_or(Error::ContactNotFound(subject.id))?;
      }
    }
    Ok(())
  }
}
