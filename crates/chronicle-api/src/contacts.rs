//! Handlers for `/contacts` endpoints.
//!
//! Same surface as `/companies`, plus an optional `?company_id` list filter.
//! Setting `is_primary` to `true` through `PATCH` is the trigger for the
//! primary-contact transition handler (dispatched asynchronously, so the
//! response never waits on it).

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use chronicle_core::{
  entity::{Contact, ContactPatch, NewContact},
  store::{ActivityStore, DirectoryStore},
};
use chronicle_engine::directory::Directory;
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor_from_headers, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub company_id:      Option<Uuid>,
  #[serde(default)]
  pub include_deleted: bool,
}

/// `GET /contacts[?company_id=<id>][&include_deleted=true]`
pub async fn list<S>(
  State(directory): State<Arc<Directory<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Contact>>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  Ok(Json(
    directory
      .contacts(params.company_id, params.include_deleted)
      .await?,
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /contacts/:id`
pub async fn get_one<S>(
  State(directory): State<Arc<Directory<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let contact = directory
    .contact(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("contact {id} not found")))?;
  Ok(Json(contact))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /contacts`.
#[derive(Debug, Deserialize)]
pub struct NewContactBody {
  pub company_id: Uuid,
  pub name:       String,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub title:      Option<String>,
  #[serde(default)]
  pub is_primary: bool,
}

impl From<NewContactBody> for NewContact {
  fn from(b: NewContactBody) -> Self {
    NewContact {
      company_id: b.company_id,
      name:       b.name,
      email:      b.email,
      phone:      b.phone,
      title:      b.title,
      is_primary: b.is_primary,
    }
  }
}

/// `POST /contacts` — returns 201 + the stored contact.
pub async fn create<S>(
  State(directory): State<Arc<Directory<S>>>,
  headers: HeaderMap,
  Json(body): Json<NewContactBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  let contact = directory
    .create_contact(NewContact::from(body), actor)
    .await?;
  Ok((StatusCode::CREATED, Json(contact)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /contacts/:id` — body is a partial [`ContactPatch`].
pub async fn update<S>(
  State(directory): State<Arc<Directory<S>>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  Json(patch): Json<ContactPatch>,
) -> Result<Json<Contact>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  Ok(Json(directory.update_contact(id, patch, actor).await?))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `DELETE /contacts/:id` — soft delete.
pub async fn delete<S>(
  State(directory): State<Arc<Directory<S>>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<Contact>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  Ok(Json(directory.delete_contact(id, actor).await?))
}

/// `POST /contacts/:id/restore`
pub async fn restore<S>(
  State(directory): State<Arc<Directory<S>>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<Contact>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  Ok(Json(directory.restore_contact(id, actor).await?))
}

/// `DELETE /contacts/:id/purge`
pub async fn purge<S>(
  State(directory): State<Arc<Directory<S>>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<Contact>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  Ok(Json(directory.purge_contact(id, actor).await?))
}
