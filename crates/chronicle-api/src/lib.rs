//! JSON REST API for Chronicle.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`chronicle_core::store::DirectoryStore`] and
//! [`chronicle_core::store::ActivityStore`], wired through the engine's
//! [`Directory`] service so every mutation leaves its audit trail.
//! Transport concerns (TLS, request tracing) are the caller's
//! responsibility.
//!
//! The acting identity arrives as an optional `x-actor-id` header (a UUID);
//! absence means the system actor.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", chronicle_api::api_router(directory.clone()))
//! ```

pub mod activities;
pub mod companies;
pub mod contacts;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  http::HeaderMap,
  routing::{delete, get, post},
};
use chronicle_core::{
  actor::ActorId,
  store::{ActivityStore, DirectoryStore},
};
use chronicle_engine::directory::Directory;
use uuid::Uuid;

pub use error::ApiError;

/// Build a fully-materialised API router for `directory`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(directory: Arc<Directory<S>>) -> Router<()>
where
  S: DirectoryStore + ActivityStore + 'static,
{
  Router::new()
    // Companies
    .route(
      "/companies",
      get(companies::list::<S>).post(companies::create::<S>),
    )
    .route(
      "/companies/{id}",
      get(companies::get_one::<S>)
        .patch(companies::update::<S>)
        .delete(companies::delete::<S>),
    )
    .route("/companies/{id}/restore", post(companies::restore::<S>))
    .route("/companies/{id}/purge", delete(companies::purge::<S>))
    // Contacts
    .route(
      "/contacts",
      get(contacts::list::<S>).post(contacts::create::<S>),
    )
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S>)
        .patch(contacts::update::<S>)
        .delete(contacts::delete::<S>),
    )
    .route("/contacts/{id}/restore", post(contacts::restore::<S>))
    .route("/contacts/{id}/purge", delete(contacts::purge::<S>))
    // Activities
    .route("/activities", get(activities::list::<S>))
    .route("/notes", post(activities::add_note::<S>))
    .with_state(directory)
}

/// Extract the acting identity from the `x-actor-id` header.
///
/// A missing header is `None` (the system actor); a present-but-malformed
/// value is a 400, never a silent fallback.
pub(crate) fn actor_from_headers(
  headers: &HeaderMap,
) -> Result<Option<ActorId>, ApiError> {
  let Some(value) = headers.get("x-actor-id") else {
    return Ok(None);
  };
  let s = value
    .to_str()
    .map_err(|_| ApiError::BadRequest("x-actor-id is not valid ASCII".to_string()))?;
  let id = Uuid::parse_str(s)
    .map_err(|_| ApiError::BadRequest(format!("x-actor-id is not a UUID: {s:?}")))?;
  Ok(Some(ActorId(id)))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chronicle_core::clock::SystemClock;
  use chronicle_engine::{
    dedup::DedupGuard,
    queue::{JobQueue, JobReceiver},
    recorder::ActivityRecorder,
  };
  use chronicle_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  async fn make_directory() -> (Arc<Directory<SqliteStore>>, JobReceiver) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let recorder = Arc::new(ActivityRecorder::new(
      store.clone(),
      DedupGuard::with_default_window(),
      Arc::new(SystemClock),
    ));
    let (queue, receiver) = JobQueue::channel();
    (Arc::new(Directory::new(store, recorder, queue)), receiver)
  }

  async fn request(
    directory: &Arc<Directory<SqliteStore>>,
    method: &str,
    uri: &str,
    actor: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
      builder = builder.header("x-actor-id", actor);
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = api_router(directory.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  // ── Companies ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_company_returns_201_and_leaves_a_created_record() {
    let (directory, _receiver) = make_directory().await;
    let actor = Uuid::new_v4();

    let (status, company) = request(
      &directory,
      "POST",
      "/companies",
      Some(&actor.to_string()),
      Some(json!({ "name": "Acme Corp" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(company["name"], "Acme Corp");
    assert_eq!(company["status"], "lead");

    let company_id = company["company_id"].as_str().unwrap();
    let (status, records) = request(
      &directory,
      "GET",
      &format!("/activities?subject_kind=company&subject_id={company_id}"),
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["kind"], "created");
    assert_eq!(records[0]["actor"], actor.to_string());
  }

  #[tokio::test]
  async fn get_missing_company_returns_404() {
    let (directory, _receiver) = make_directory().await;
    let (status, body) = request(
      &directory,
      "GET",
      &format!("/companies/{}", Uuid::new_v4()),
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
  }

  #[tokio::test]
  async fn malformed_actor_header_returns_400() {
    let (directory, _receiver) = make_directory().await;
    let (status, body) = request(
      &directory,
      "POST",
      "/companies",
      Some("not-a-uuid"),
      Some(json!({ "name": "Acme Corp" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("x-actor-id"));
  }

  #[tokio::test]
  async fn status_patch_writes_update_and_status_records() {
    let (directory, _receiver) = make_directory().await;

    let (_, company) = request(
      &directory,
      "POST",
      "/companies",
      None,
      Some(json!({ "name": "Acme" })),
    )
    .await;
    let company_id = company["company_id"].as_str().unwrap().to_string();

    let (status, updated) = request(
      &directory,
      "PATCH",
      &format!("/companies/{company_id}"),
      None,
      Some(json!({ "status": "customer" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "customer");

    let (_, records) = request(
      &directory,
      "GET",
      &format!("/activities?subject_kind=company&subject_id={company_id}"),
      None,
      None,
    )
    .await;
    let kinds: Vec<_> = records
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["kind"].as_str().unwrap().to_string())
      .collect();
    assert_eq!(kinds.len(), 3);
    assert!(kinds.contains(&"updated".to_string()));
    assert!(kinds.contains(&"status-changed".to_string()));
  }

  #[tokio::test]
  async fn soft_delete_restore_purge_roundtrip() {
    let (directory, _receiver) = make_directory().await;

    let (_, company) = request(
      &directory,
      "POST",
      "/companies",
      None,
      Some(json!({ "name": "Acme Corp" })),
    )
    .await;
    let company_id = company["company_id"].as_str().unwrap().to_string();

    // Restoring a live company is a conflict.
    let (status, _) = request(
      &directory,
      "POST",
      &format!("/companies/{company_id}/restore"),
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, deleted) = request(
      &directory,
      "DELETE",
      &format!("/companies/{company_id}"),
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!deleted["deleted_at"].is_null());

    let (status, restored) = request(
      &directory,
      "POST",
      &format!("/companies/{company_id}/restore"),
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(restored["deleted_at"].is_null());

    let (status, _) = request(
      &directory,
      "DELETE",
      &format!("/companies/{company_id}/purge"),
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
      &directory,
      "GET",
      &format!("/companies/{company_id}"),
      None,
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The audit trail outlives the purged row.
    let (_, records) = request(
      &directory,
      "GET",
      &format!("/activities?subject_kind=company&subject_id={company_id}"),
      None,
      None,
    )
    .await;
    assert_eq!(records.as_array().unwrap().len(), 4);
  }

  // ── Contacts ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_contact_for_unknown_company_returns_404() {
    let (directory, _receiver) = make_directory().await;
    let (status, _) = request(
      &directory,
      "POST",
      "/contacts",
      None,
      Some(json!({ "company_id": Uuid::new_v4(), "name": "Jane Doe" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn promoting_a_contact_records_the_specialised_update() {
    let (directory, _receiver) = make_directory().await;

    let (_, company) = request(
      &directory,
      "POST",
      "/companies",
      None,
      Some(json!({ "name": "Acme Corp" })),
    )
    .await;
    let company_id = company["company_id"].as_str().unwrap().to_string();

    let (status, contact) = request(
      &directory,
      "POST",
      "/contacts",
      None,
      Some(json!({ "company_id": company_id, "name": "Jane Doe" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let contact_id = contact["contact_id"].as_str().unwrap().to_string();

    let (status, updated) = request(
      &directory,
      "PATCH",
      &format!("/contacts/{contact_id}"),
      None,
      Some(json!({ "is_primary": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_primary"], true);

    let (_, records) = request(
      &directory,
      "GET",
      &format!("/activities?subject_kind=contact&subject_id={contact_id}"),
      None,
      None,
    )
    .await;
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
      records[0]["description"],
      "Marked Jane Doe as the primary contact"
    );
  }

  // ── Activities ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn note_roundtrip_is_user_generated() {
    let (directory, _receiver) = make_directory().await;

    let (_, company) = request(
      &directory,
      "POST",
      "/companies",
      None,
      Some(json!({ "name": "Acme Corp" })),
    )
    .await;
    let company_id = company["company_id"].as_str().unwrap().to_string();
    let actor = Uuid::new_v4();

    let (status, note) = request(
      &directory,
      "POST",
      "/notes",
      Some(&actor.to_string()),
      Some(json!({
        "subject_kind": "company",
        "subject_id":   company_id,
        "body":         "Spoke at the conference",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["kind"], "note-added");
    assert_eq!(note["system_generated"], false);
    assert_eq!(note["actor"], actor.to_string());
    assert_eq!(note["description"], "Spoke at the conference");
  }

  #[tokio::test]
  async fn activities_list_honours_the_limit() {
    let (directory, _receiver) = make_directory().await;

    let (_, company) = request(
      &directory,
      "POST",
      "/companies",
      None,
      Some(json!({ "name": "Acme Corp" })),
    )
    .await;
    let company_id = company["company_id"].as_str().unwrap().to_string();

    for i in 0..3 {
      request(
        &directory,
        "POST",
        "/notes",
        None,
        Some(json!({
          "subject_kind": "company",
          "subject_id":   company_id,
          "body":         format!("note {i}"),
        })),
      )
      .await;
    }

    let (_, records) = request(
      &directory,
      "GET",
      &format!("/activities?subject_kind=company&subject_id={company_id}&limit=2"),
      None,
      None,
    )
    .await;
    assert_eq!(records.as_array().unwrap().len(), 2);
  }
}
