//! Handlers for the audit-trail endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/activities` | `?subject_kind` and `?subject_id` required; optional `limit` |
//! | `POST` | `/notes` | Body: [`NoteBody`]; returns 201 + stored record |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use chronicle_core::{
  activity::Activity,
  store::{ActivityStore, DirectoryStore},
  subject::{SubjectKind, SubjectRef},
};
use chronicle_engine::directory::Directory;
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor_from_headers, error::ApiError};

const DEFAULT_LIMIT: usize = 50;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub subject_kind: SubjectKind,
  pub subject_id:   Uuid,
  pub limit:        Option<usize>,
}

/// `GET /activities?subject_kind=company&subject_id=<id>[&limit=20]`
///
/// Newest first. Works for purged subjects too — the trail outlives the
/// entity.
pub async fn list<S>(
  State(directory): State<Arc<Directory<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Activity>>, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let subject = SubjectRef {
    kind: params.subject_kind,
    id:   params.subject_id,
  };
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
  Ok(Json(directory.recent_activity(subject, limit).await?))
}

// ─── Notes ────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /notes`.
#[derive(Debug, Deserialize)]
pub struct NoteBody {
  pub subject_kind: SubjectKind,
  pub subject_id:   Uuid,
  pub body:         String,
}

/// `POST /notes` — record a manual note against a subject.
pub async fn add_note<S>(
  State(directory): State<Arc<Directory<S>>>,
  headers: HeaderMap,
  Json(body): Json<NoteBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DirectoryStore + ActivityStore,
{
  let actor = actor_from_headers(&headers)?;
  let subject = SubjectRef {
    kind: body.subject_kind,
    id:   body.subject_id,
  };
  let note = directory.add_note(subject, body.body, actor).await?;
  Ok((StatusCode::CREATED, Json(note)))
}
