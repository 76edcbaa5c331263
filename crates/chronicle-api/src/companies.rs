//! Handlers for `/companies` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/companies` | optional `?include_deleted=true` |
//! | `POST`   | `/companies` | Body: [`NewCompanyBody`]; returns 201 + stored company |
//! | `GET`    | `/companies/:id` | Soft-deleted rows still resolve |
//! | `PATCH`  | `/companies/:id` | Body: `CompanyPatch` |
//! | `DELETE` | `/companies/:id` | Soft delete |
//! | `POST`   | `/companies/:id/restore` | |
//! | `DELETE` | `/companies/:id/purge` | Removes the row; contacts cascade |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use chronicle_core::{
  actor::ActorId,
  entity::{Company, CompanyPatch, CompanyStatus, NewCompany},
  store::{ActivityStore, DirectoryStore},
};
use chronicle_engine::directory::Directory;
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor_from_headers, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub include_deleted: bool,
}

/// `GET /companies[?include_deleted=true]`
pub async fn list<S>(
  State(directory): State<Arc<Directory<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Company>>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  Ok(Json(directory.companies(params.include_deleted).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /companies/:id`
pub async fn get_one<S>(
  State(directory): State<Arc<Directory<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let company = directory
    .company(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("company {id} not found")))?;
  Ok(Json(company))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /companies`.
#[derive(Debug, Deserialize)]
pub struct NewCompanyBody {
  pub name:            String,
  pub status:          Option<CompanyStatus>,
  pub industry:        Option<String>,
  pub website:         Option<String>,
  pub account_manager: Option<ActorId>,
}

impl From<NewCompanyBody> for NewCompany {
  fn from(b: NewCompanyBody) -> Self {
    NewCompany {
      name:            b.name,
      status:          b.status.unwrap_or(CompanyStatus::Lead),
      industry:        b.industry,
      website:         b.website,
      account_manager: b.account_manager,
    }
  }
}

/// `POST /companies` — returns 201 + the stored company.
pub async fn create<S>(
  State(directory): State<Arc<Directory<S>>>,
  headers: HeaderMap,
  Json(body): Json<NewCompanyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  let company = directory
    .create_company(NewCompany::from(body), actor)
    .await?;
  Ok((StatusCode::CREATED, Json(company)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /companies/:id` — body is a partial [`CompanyPatch`].
pub async fn update<S>(
  State(directory): State<Arc<Directory<S>>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
  Json(patch): Json<CompanyPatch>,
) -> Result<Json<Company>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  Ok(Json(directory.update_company(id, patch, actor).await?))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `DELETE /companies/:id` — soft delete.
pub async fn delete<S>(
  State(directory): State<Arc<Directory<S>>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<Company>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  Ok(Json(directory.delete_company(id, actor).await?))
}

/// `POST /companies/:id/restore`
pub async fn restore<S>(
  State(directory): State<Arc<Directory<S>>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<Company>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  Ok(Json(directory.restore_company(id, actor).await?))
}

/// `DELETE /companies/:id/purge` — remove the row for good.
pub async fn purge<S>(
  State(directory): State<Arc<Directory<S>>>,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Json<Company>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  Ok(Json(directory.purge_company(id, actor).await?))
}
