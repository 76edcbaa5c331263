//! [`SqliteStore`] — the SQLite implementation of [`ActivityStore`] and
//! [`DirectoryStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use chronicle_core::{
  activity::{Activity, ActivityKind, NewActivity},
  actor::ActorId,
  entity::{
    Company, CompanyPatch, Contact, ContactPatch, NewCompany, NewContact,
  },
  store::{ActivityStore, DirectoryStore},
  subject::SubjectRef,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  encode::{RawActivity, RawCompany, RawContact, encode_dt, encode_uuid},
  schema::SCHEMA,
  Error, Result,
};

const COMPANY_COLS: &str = "company_id, name, status, industry, website, \
                            account_manager, created_at, updated_at, deleted_at";
const CONTACT_COLS: &str = "contact_id, company_id, name, email, phone, title, \
                            is_primary, created_at, updated_at, deleted_at";
const ACTIVITY_COLS: &str = "activity_id, subject_kind, subject_id, actor_id, \
                             kind, description, properties, system_generated, \
                             recorded_at";

fn company_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCompany> {
  Ok(RawCompany {
    company_id:      row.get(0)?,
    name:            row.get(1)?,
    status:          row.get(2)?,
    industry:        row.get(3)?,
    website:         row.get(4)?,
    account_manager: row.get(5)?,
    created_at:      row.get(6)?,
    updated_at:      row.get(7)?,
    deleted_at:      row.get(8)?,
  })
}

fn contact_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawContact> {
  Ok(RawContact {
    contact_id: row.get(0)?,
    company_id: row.get(1)?,
    name:       row.get(2)?,
    email:      row.get(3)?,
    phone:      row.get(4)?,
    title:      row.get(5)?,
    is_primary: row.get(6)?,
    created_at: row.get(7)?,
    updated_at: row.get(8)?,
    deleted_at: row.get(9)?,
  })
}

fn activity_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawActivity> {
  Ok(RawActivity {
    activity_id:      row.get(0)?,
    subject_kind:     row.get(1)?,
    subject_id:       row.get(2)?,
    actor_id:         row.get(3)?,
    kind:             row.get(4)?,
    description:      row.get(5)?,
    properties:       row.get(6)?,
    system_generated: row.get(7)?,
    recorded_at:      row.get(8)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Chronicle store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_company(&self, id: Uuid) -> Result<Option<Company>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCompany> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COMPANY_COLS} FROM companies WHERE company_id = ?1"),
            rusqlite::params![id_str],
            company_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCompany::into_company).transpose()
  }

  async fn fetch_contact(&self, id: Uuid) -> Result<Option<Contact>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CONTACT_COLS} FROM contacts WHERE contact_id = ?1"),
            rusqlite::params![id_str],
            contact_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  /// Persist every column of an already-mutated [`Company`] row.
  async fn write_company(&self, company: &Company) -> Result<()> {
    let id_str      = encode_uuid(company.company_id);
    let name        = company.name.clone();
    let status      = company.status.tag().to_owned();
    let industry    = company.industry.clone();
    let website     = company.website.clone();
    let manager     = company.account_manager.map(|a| encode_uuid(a.0));
    let updated_str = encode_dt(company.updated_at);
    let deleted_str = company.deleted_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE companies
           SET name = ?2, status = ?3, industry = ?4, website = ?5,
               account_manager = ?6, updated_at = ?7, deleted_at = ?8
           WHERE company_id = ?1",
          rusqlite::params![
            id_str, name, status, industry, website, manager, updated_str,
            deleted_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Persist every column of an already-mutated [`Contact`] row.
  async fn write_contact(&self, contact: &Contact) -> Result<()> {
    let id_str      = encode_uuid(contact.contact_id);
    let name        = contact.name.clone();
    let email       = contact.email.clone();
    let phone       = contact.phone.clone();
    let title       = contact.title.clone();
    let is_primary  = contact.is_primary;
    let updated_str = encode_dt(contact.updated_at);
    let deleted_str = contact.deleted_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE contacts
           SET name = ?2, email = ?3, phone = ?4, title = ?5, is_primary = ?6,
               updated_at = ?7, deleted_at = ?8
           WHERE contact_id = ?1",
          rusqlite::params![
            id_str, name, email, phone, title, is_primary, updated_str,
            deleted_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = Error;

  // ── Companies ──────────────────────────────────────────────────────────────

  async fn create_company(&self, input: NewCompany) -> Result<Company> {
    let now = Utc::now();
    let company = Company {
      company_id:      Uuid::new_v4(),
      name:            input.name,
      status:          input.status,
      industry:        input.industry,
      website:         input.website,
      account_manager: input.account_manager,
      created_at:      now,
      updated_at:      now,
      deleted_at:      None,
    };

    let id_str      = encode_uuid(company.company_id);
    let name        = company.name.clone();
    let status      = company.status.tag().to_owned();
    let industry    = company.industry.clone();
    let website     = company.website.clone();
    let manager     = company.account_manager.map(|a| encode_uuid(a.0));
    let created_str = encode_dt(company.created_at);
    let updated_str = encode_dt(company.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO companies (
             company_id, name, status, industry, website, account_manager,
             created_at, updated_at, deleted_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)",
          rusqlite::params![
            id_str, name, status, industry, website, manager, created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(company)
  }

  async fn get_company(&self, id: Uuid) -> Result<Option<Company>> {
    self.fetch_company(id).await
  }

  async fn list_companies(&self, include_deleted: bool) -> Result<Vec<Company>> {
    let raws: Vec<RawCompany> = self
      .conn
      .call(move |conn| {
        let sql = if include_deleted {
          format!("SELECT {COMPANY_COLS} FROM companies ORDER BY created_at")
        } else {
          format!(
            "SELECT {COMPANY_COLS} FROM companies
             WHERE deleted_at IS NULL ORDER BY created_at"
          )
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], company_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCompany::into_company).collect()
  }

  async fn update_company(&self, id: Uuid, patch: CompanyPatch) -> Result<Company> {
    let mut company = self
      .fetch_company(id)
      .await?
      .ok_or(Error::CompanyNotFound(id))?;
    if company.is_deleted() {
      return Err(Error::AlreadyDeleted(id));
    }

    if let Some(name) = patch.name {
      company.name = name;
    }
    if let Some(status) = patch.status {
      company.status = status;
    }
    if let Some(industry) = patch.industry {
      company.industry = Some(industry);
    }
    if let Some(website) = patch.website {
      company.website = Some(website);
    }
    if let Some(manager) = patch.account_manager {
      company.account_manager = Some(manager);
    }
    company.updated_at = Utc::now();

    self.write_company(&company).await?;
    Ok(company)
  }

  async fn soft_delete_company(&self, id: Uuid) -> Result<Company> {
    let mut company = self
      .fetch_company(id)
      .await?
      .ok_or(Error::CompanyNotFound(id))?;
    if company.is_deleted() {
      return Err(Error::AlreadyDeleted(id));
    }

    let now = Utc::now();
    company.deleted_at = Some(now);
    company.updated_at = now;

    self.write_company(&company).await?;
    Ok(company)
  }

  async fn restore_company(&self, id: Uuid) -> Result<Company> {
    let mut company = self
      .fetch_company(id)
      .await?
      .ok_or(Error::CompanyNotFound(id))?;
    if !company.is_deleted() {
      return Err(Error::NotDeleted(id));
    }

    company.deleted_at = None;
    company.updated_at = Utc::now();

    self.write_company(&company).await?;
    Ok(company)
  }

  async fn force_delete_company(&self, id: Uuid) -> Result<Company> {
    let company = self
      .fetch_company(id)
      .await?
      .ok_or(Error::CompanyNotFound(id))?;

    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        // Contacts cascade via the FK.
        conn.execute(
          "DELETE FROM companies WHERE company_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(company)
  }

  // ── Contacts ───────────────────────────────────────────────────────────────

  async fn create_contact(&self, input: NewContact) -> Result<Contact> {
    // Surface a typed error rather than a raw FK violation.
    if self.fetch_company(input.company_id).await?.is_none() {
      return Err(Error::CompanyNotFound(input.company_id));
    }

    let now = Utc::now();
    let contact = Contact {
      contact_id: Uuid::new_v4(),
      company_id: input.company_id,
      name:       input.name,
      email:      input.email,
      phone:      input.phone,
      title:      input.title,
      is_primary: input.is_primary,
      created_at: now,
      updated_at: now,
      deleted_at: None,
    };

    let id_str      = encode_uuid(contact.contact_id);
    let company_str = encode_uuid(contact.company_id);
    let name        = contact.name.clone();
    let email       = contact.email.clone();
    let phone       = contact.phone.clone();
    let title       = contact.title.clone();
    let is_primary  = contact.is_primary;
    let created_str = encode_dt(contact.created_at);
    let updated_str = encode_dt(contact.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts (
             contact_id, company_id, name, email, phone, title, is_primary,
             created_at, updated_at, deleted_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)",
          rusqlite::params![
            id_str, company_str, name, email, phone, title, is_primary,
            created_str, updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(contact)
  }

  async fn get_contact(&self, id: Uuid) -> Result<Option<Contact>> {
    self.fetch_contact(id).await
  }

  async fn list_contacts(
    &self,
    company_id: Option<Uuid>,
    include_deleted: bool,
  ) -> Result<Vec<Contact>> {
    let company_str = company_id.map(encode_uuid);

    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLS} FROM contacts
           WHERE (?1 IS NULL OR company_id = ?1)
             AND (?2 OR deleted_at IS NULL)
           ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![company_str.as_deref(), include_deleted],
            contact_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  async fn update_contact(&self, id: Uuid, patch: ContactPatch) -> Result<Contact> {
    let mut contact = self
      .fetch_contact(id)
      .await?
      .ok_or(Error::ContactNotFound(id))?;
    if contact.is_deleted() {
      return Err(Error::AlreadyDeleted(id));
    }

    if let Some(name) = patch.name {
      contact.name = name;
    }
    if let Some(email) = patch.email {
      contact.email = Some(email);
    }
    if let Some(phone) = patch.phone {
      contact.phone = Some(phone);
    }
    if let Some(title) = patch.title {
      contact.title = Some(title);
    }
    if let Some(is_primary) = patch.is_primary {
      contact.is_primary = is_primary;
    }
    contact.updated_at = Utc::now();

    self.write_contact(&contact).await?;
    Ok(contact)
  }

  async fn soft_delete_contact(&self, id: Uuid) -> Result<Contact> {
    let mut contact = self
      .fetch_contact(id)
      .await?
      .ok_or(Error::ContactNotFound(id))?;
    if contact.is_deleted() {
      return Err(Error::AlreadyDeleted(id));
    }

    let now = Utc::now();
    contact.deleted_at = Some(now);
    contact.updated_at = now;

    self.write_contact(&contact).await?;
    Ok(contact)
  }

  async fn restore_contact(&self, id: Uuid) -> Result<Contact> {
    let mut contact = self
      .fetch_contact(id)
      .await?
      .ok_or(Error::ContactNotFound(id))?;
    if !contact.is_deleted() {
      return Err(Error::NotDeleted(id));
    }

    contact.deleted_at = None;
    contact.updated_at = Utc::now();

    self.write_contact(&contact).await?;
    Ok(contact)
  }

  async fn force_delete_contact(&self, id: Uuid) -> Result<Contact> {
    let contact = self
      .fetch_contact(id)
      .await?
      .ok_or(Error::ContactNotFound(id))?;

    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM contacts WHERE contact_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(contact)
  }

  async fn primary_contact(
    &self,
    company_id: Uuid,
    excluding: Option<Uuid>,
  ) -> Result<Option<Contact>> {
    let company_str   = encode_uuid(company_id);
    let excluding_str = excluding.map(encode_uuid);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {CONTACT_COLS} FROM contacts
               WHERE company_id = ?1
                 AND is_primary = 1
                 AND deleted_at IS NULL
                 AND (?2 IS NULL OR contact_id != ?2)
               ORDER BY updated_at DESC
               LIMIT 1"
            ),
            rusqlite::params![company_str, excluding_str.as_deref()],
            contact_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }
}

// ─── ActivityStore impl ──────────────────────────────────────────────────────

impl ActivityStore for SqliteStore {
  type Error = Error;

  async fn record_activity(&self, input: NewActivity) -> Result<Activity> {
    let activity = Activity {
      activity_id:      Uuid::new_v4(),
      subject:          input.subject,
      actor:            input.actor.unwrap_or(ActorId::SYSTEM),
      kind:             input.kind,
      description:      input.description,
      properties:       input.properties,
      system_generated: input.system_generated,
      recorded_at:      input.recorded_at,
    };

    let id_str           = encode_uuid(activity.activity_id);
    let subject_kind     = activity.subject.kind.tag().to_owned();
    let subject_str      = encode_uuid(activity.subject.id);
    let actor_str        = encode_uuid(activity.actor.0);
    let kind             = activity.kind.tag().to_owned();
    let description      = activity.description.clone();
    let properties_str   = activity.properties.to_string();
    let system_generated = activity.system_generated;
    let recorded_str     = encode_dt(activity.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO activities (
             activity_id, subject_kind, subject_id, actor_id, kind,
             description, properties, system_generated, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, subject_kind, subject_str, actor_str, kind, description,
            properties_str, system_generated, recorded_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(activity)
  }

  async fn list_recent(
    &self,
    subject: SubjectRef,
    limit: usize,
  ) -> Result<Vec<Activity>> {
    let kind_str    = subject.kind.tag().to_owned();
    let subject_str = encode_uuid(subject.id);
    let limit_val   = limit as i64;

    let raws: Vec<RawActivity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACTIVITY_COLS} FROM activities
           WHERE subject_kind = ?1 AND subject_id = ?2
           ORDER BY recorded_at DESC, rowid DESC
           LIMIT ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![kind_str, subject_str, limit_val],
            activity_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivity::into_activity).collect()
  }

  async fn latest_matching(
    &self,
    subject: SubjectRef,
    kind: ActivityKind,
    since: DateTime<Utc>,
  ) -> Result<Option<Activity>> {
    let subject_kind = subject.kind.tag().to_owned();
    let subject_str  = encode_uuid(subject.id);
    let kind_str     = kind.tag().to_owned();
    let since_str    = encode_dt(since);

    let raw: Option<RawActivity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {ACTIVITY_COLS} FROM activities
               WHERE subject_kind = ?1 AND subject_id = ?2
                 AND kind = ?3 AND recorded_at >= ?4
               ORDER BY recorded_at DESC, rowid DESC
               LIMIT 1"
            ),
            rusqlite::params![subject_kind, subject_str, kind_str, since_str],
            activity_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawActivity::into_activity).transpose()
  }
}
