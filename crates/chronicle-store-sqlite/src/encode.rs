//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The `properties` payload is
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings;
//! enum tags come straight from the core types' `tag()` methods.

use chrono::{DateTime, Utc};
use chronicle_core::{
  activity::{Activity, ActivityKind},
  actor::ActorId,
  entity::{Company, CompanyStatus, Contact},
  subject::{SubjectKind, SubjectRef},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `companies` row.
pub struct RawCompany {
  pub company_id:      String,
  pub name:            String,
  pub status:          String,
  pub industry:        Option<String>,
  pub website:         Option<String>,
  pub account_manager: Option<String>,
  pub created_at:      String,
  pub updated_at:      String,
  pub deleted_at:      Option<String>,
}

impl RawCompany {
  pub fn into_company(self) -> Result<Company> {
    Ok(Company {
      company_id:      decode_uuid(&self.company_id)?,
      name:            self.name,
      status:          CompanyStatus::from_tag(&self.status)?,
      industry:        self.industry,
      website:         self.website,
      account_manager: self
        .account_manager
        .as_deref()
        .map(decode_uuid)
        .transpose()?
        .map(ActorId),
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
      deleted_at:      self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `contacts` row.
pub struct RawContact {
  pub contact_id: String,
  pub company_id: String,
  pub name:       String,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub title:      Option<String>,
  pub is_primary: bool,
  pub created_at: String,
  pub updated_at: String,
  pub deleted_at: Option<String>,
}

impl RawContact {
  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      contact_id: decode_uuid(&self.contact_id)?,
      company_id: decode_uuid(&self.company_id)?,
      name:       self.name,
      email:      self.email,
      phone:      self.phone,
      title:      self.title,
      is_primary: self.is_primary,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from an `activities` row.
pub struct RawActivity {
  pub activity_id:      String,
  pub subject_kind:     String,
  pub subject_id:       String,
  pub actor_id:         String,
  pub kind:             String,
  pub description:      String,
  pub properties:       String,
  pub system_generated: bool,
  pub recorded_at:      String,
}

impl RawActivity {
  pub fn into_activity(self) -> Result<Activity> {
    Ok(Activity {
      activity_id:      decode_uuid(&self.activity_id)?,
      subject:          SubjectRef {
        kind: SubjectKind::from_tag(&self.subject_kind)?,
        id:   decode_uuid(&self.subject_id)?,
      },
      actor:            ActorId(decode_uuid(&self.actor_id)?),
      kind:             ActivityKind::from_tag(&self.kind)?,
      description:      self.description,
      properties:       serde_json::from_str(&self.properties)?,
      system_generated: self.system_generated,
      recorded_at:      decode_dt(&self.recorded_at)?,
    })
  }
}
