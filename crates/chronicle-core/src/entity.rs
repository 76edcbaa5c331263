//! Company and Contact — the auditable directory entities.
//!
//! Entities carry a soft-delete lifecycle (`deleted_at`); the audit log is
//! the only place their history lives, so snapshots and transitions are
//! defined here next to the types they describe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
  Error, Result,
  actor::ActorId,
  subject::SubjectRef,
};

// ─── Company ─────────────────────────────────────────────────────────────────

/// Where a company sits in the sales funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
  Lead,
  Prospect,
  Customer,
  Churned,
}

impl CompanyStatus {
  /// The tag string stored in the `status` column. Must match the
  /// `rename_all = "lowercase"` serde tags above.
  pub fn tag(self) -> &'static str {
    match self {
      Self::Lead => "lead",
      Self::Prospect => "prospect",
      Self::Customer => "customer",
      Self::Churned => "churned",
    }
  }

  pub fn from_tag(s: &str) -> Result<Self> {
    match s {
      "lead" => Ok(Self::Lead),
      "prospect" => Ok(Self::Prospect),
      "customer" => Ok(Self::Customer),
      "churned" => Ok(Self::Churned),
      other => Err(Error::UnknownCompanyStatus(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
  pub company_id:      Uuid,
  pub name:            String,
  pub status:          CompanyStatus,
  pub industry:        Option<String>,
  pub website:         Option<String>,
  /// The identity notified about noteworthy changes to this company.
  pub account_manager: Option<ActorId>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl Company {
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }
}

/// Input to [`crate::store::DirectoryStore::create_company`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompany {
  pub name:            String,
  pub status:          CompanyStatus,
  pub industry:        Option<String>,
  pub website:         Option<String>,
  pub account_manager: Option<ActorId>,
}

impl NewCompany {
  /// Convenience constructor; new companies start as leads.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:            name.into(),
      status:          CompanyStatus::Lead,
      industry:        None,
      website:         None,
      account_manager: None,
    }
  }
}

/// Partial update. `None` leaves the field unchanged; clearing an optional
/// field is not supported through a patch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyPatch {
  pub name:            Option<String>,
  pub status:          Option<CompanyStatus>,
  pub industry:        Option<String>,
  pub website:         Option<String>,
  pub account_manager: Option<ActorId>,
}

// ─── Contact ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
  pub contact_id: Uuid,
  pub company_id: Uuid,
  pub name:       String,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub title:      Option<String>,
  /// Distinguished contact for the owning company. Flipping this to `true`
  /// triggers the primary-contact transition handler.
  pub is_primary: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

impl Contact {
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }
}

/// Input to [`crate::store::DirectoryStore::create_contact`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
  pub company_id: Uuid,
  pub name:       String,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub title:      Option<String>,
  #[serde(default)]
  pub is_primary: bool,
}

impl NewContact {
  pub fn new(company_id: Uuid, name: impl Into<String>) -> Self {
    Self {
      company_id,
      name: name.into(),
      email: None,
      phone: None,
      title: None,
      is_primary: false,
    }
  }
}

/// Partial update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPatch {
  pub name:       Option<String>,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub title:      Option<String>,
  pub is_primary: Option<bool>,
}

// ─── Auditable ───────────────────────────────────────────────────────────────

/// A tracked-field transition detected between two states of an entity,
/// beyond the generic attribute diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
  /// The funnel status moved; carries the human-readable from/to tags.
  StatusChanged { from: String, to: String },
  /// The primary flag flipped from `false` to `true`.
  BecamePrimary,
}

/// The capability the lifecycle observers require of an entity: a subject
/// reference, a display label, a timestamp-free attribute snapshot, and
/// tracked-field transition detection.
pub trait Auditable {
  fn subject(&self) -> SubjectRef;

  /// Human-readable name used in activity descriptions.
  fn label(&self) -> &str;

  /// Business-attribute snapshot. Bookkeeping timestamps (`created_at`,
  /// `updated_at`, `deleted_at`) are excluded so no-op saves diff clean.
  fn snapshot(&self) -> serde_json::Value;

  /// Transitions of specially-tracked fields between two states.
  fn transitions(before: &Self, after: &Self) -> Vec<Transition>;
}

impl Auditable for Company {
  fn subject(&self) -> SubjectRef { SubjectRef::company(self.company_id) }

  fn label(&self) -> &str { &self.name }

  fn snapshot(&self) -> serde_json::Value {
    json!({
      "name":            self.name,
      "status":          self.status.tag(),
      "industry":        self.industry,
      "website":         self.website,
      "account_manager": self.account_manager,
    })
  }

  fn transitions(before: &Self, after: &Self) -> Vec<Transition> {
    if before.status != after.status {
      vec![Transition::StatusChanged {
        from: before.status.tag().to_string(),
        to:   after.status.tag().to_string(),
      }]
    } else {
      Vec::new()
    }
  }
}

impl Auditable for Contact {
  fn subject(&self) -> SubjectRef { SubjectRef::contact(self.contact_id) }

  fn label(&self) -> &str { &self.name }

  fn snapshot(&self) -> serde_json::Value {
    json!({
      "company_id": self.company_id,
      "name":       self.name,
      "email":      self.email,
      "phone":      self.phone,
      "title":      self.title,
      "is_primary": self.is_primary,
    })
  }

  fn transitions(before: &Self, after: &Self) -> Vec<Transition> {
    if !before.is_primary && after.is_primary {
      vec![Transition::BecamePrimary]
    } else {
      Vec::new()
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::activity::AttributeDiff;

  fn company(status: CompanyStatus) -> Company {
    Company {
      company_id:      Uuid::new_v4(),
      name:            "Acme Corp".to_string(),
      status,
      industry:        None,
      website:         None,
      account_manager: None,
      created_at:      Utc::now(),
      updated_at:      Utc::now(),
      deleted_at:      None,
    }
  }

  #[test]
  fn status_change_is_a_transition() {
    let before = company(CompanyStatus::Lead);
    let mut after = before.clone();
    after.status = CompanyStatus::Customer;

    let transitions = Company::transitions(&before, &after);
    assert_eq!(transitions, vec![Transition::StatusChanged {
      from: "lead".to_string(),
      to:   "customer".to_string(),
    }]);
  }

  #[test]
  fn unchanged_status_is_not_a_transition() {
    let before = company(CompanyStatus::Lead);
    assert!(Company::transitions(&before, &before).is_empty());
  }

  #[test]
  fn becoming_primary_is_a_transition_but_demotion_is_not() {
    let before = Contact {
      contact_id: Uuid::new_v4(),
      company_id: Uuid::new_v4(),
      name:       "Jane Doe".to_string(),
      email:      None,
      phone:      None,
      title:      None,
      is_primary: false,
      created_at: Utc::now(),
      updated_at: Utc::now(),
      deleted_at: None,
    };
    let mut promoted = before.clone();
    promoted.is_primary = true;

    assert_eq!(Contact::transitions(&before, &promoted), vec![
      Transition::BecamePrimary
    ]);
    // The reverse direction carries no dedicated audit semantics.
    assert!(Contact::transitions(&promoted, &before).is_empty());
  }

  #[test]
  fn snapshot_excludes_bookkeeping_timestamps() {
    let c = company(CompanyStatus::Lead);
    let snap = c.snapshot();
    let keys: Vec<_> = snap.as_object().unwrap().keys().cloned().collect();
    assert!(!keys.contains(&"created_at".to_string()));
    assert!(!keys.contains(&"updated_at".to_string()));
    assert!(!keys.contains(&"deleted_at".to_string()));
  }

  #[test]
  fn touching_updated_at_alone_diffs_clean() {
    let before = company(CompanyStatus::Lead);
    let mut after = before.clone();
    after.updated_at = after.updated_at + chrono::Duration::seconds(30);

    let diff = AttributeDiff::between(&before.snapshot(), &after.snapshot());
    assert!(diff.is_empty());
  }
}
