//! Handlers for `/cards`, `/stats` and `/export`.
//!
//! | Method   | Path           | Notes |
//! |----------|----------------|-------|
//! | `GET`    | `/cards`       | Filters and sort, see [`ListParams`] |
//! | `POST`   | `/cards`       | Body: [`NewCard`]; 409 on duplicate mobile |
//! | `DELETE` | `/cards`       | Removes every card |
//! | `GET`    | `/cards/:id`   | 404 if not found |
//! | `PUT`    | `/cards/:id`   | Body: [`NewCard`]; 404 / 409 |
//! | `DELETE` | `/cards/:id`   | 204 whether or not it existed |
//! | `GET`    | `/stats`       | Aggregate statistics |
//! | `GET`    | `/export`      | `?format=csv\|xlsx` |

use std::{str::FromStr as _, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use cardex_core::{
  Card, CardId, CardRepository, NewCard, Tag,
  query::{CardQuery, SortKey, SortOrder},
  store::BlobStore,
};
use cardex_export::Format;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::ApiError;

/// Set on read responses that were served from a degraded (empty) listing
/// because storage could not be read.
pub const DEGRADED_HEADER: &str = "x-cardex-degraded";

fn mark_degraded(resp: &mut Response) {
  resp
    .headers_mut()
    .insert(DEGRADED_HEADER, HeaderValue::from_static("storage-unavailable"));
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Free-text filter over names, company, title, department, email, mobile.
  pub text:         Option<String>,
  pub company:      Option<String>,
  pub department:   Option<String>,
  /// Comma-separated tags; all must be present.
  pub tags:         Option<String>,
  pub added_after:  Option<DateTime<Utc>>,
  pub added_before: Option<DateTime<Utc>>,
  pub sort:         Option<SortKey>,
  pub order:        Option<SortOrder>,
}

impl ListParams {
  fn into_query(self) -> Result<CardQuery, ApiError> {
    let tags = self
      .tags
      .as_deref()
      .unwrap_or_default()
      .split(',')
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(|t| {
        Tag::from_str(t).map_err(|_| ApiError::BadRequest(format!("unknown tag {t:?}")))
      })
      .collect::<Result<Vec<_>, _>>()?;

    let sort = match (self.sort, self.order) {
      (None, None) => None,
      (key, order) => Some((key.unwrap_or_default(), order.unwrap_or_default())),
    };

    Ok(CardQuery {
      text: self.text,
      company: self.company,
      department: self.department,
      tags,
      added_after: self.added_after,
      added_before: self.added_before,
      sort,
    })
  }
}

/// `GET /cards[?text=...][&company=...][&department=...][&tags=...][&sort=...][&order=...]`
pub async fn list<B: BlobStore>(
  State(repo): State<Arc<CardRepository<B>>>,
  Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
  let query = params.into_query()?;
  let listing = repo.query(&query).await;

  let mut resp = Json(listing.cards).into_response();
  if listing.degraded.is_some() {
    mark_degraded(&mut resp);
  }
  Ok(resp)
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /cards`
pub async fn create<B: BlobStore>(
  State(repo): State<Arc<CardRepository<B>>>,
  Json(body): Json<NewCard>,
) -> Result<impl IntoResponse, ApiError> {
  let card = repo.create(body).await?;
  Ok((StatusCode::CREATED, Json(card)))
}

// ─── Clear ────────────────────────────────────────────────────────────────────

/// `DELETE /cards`
pub async fn clear<B: BlobStore>(
  State(repo): State<Arc<CardRepository<B>>>,
) -> Result<StatusCode, ApiError> {
  repo.clear().await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Single card ──────────────────────────────────────────────────────────────

/// `GET /cards/:id`
pub async fn get_one<B: BlobStore>(
  State(repo): State<Arc<CardRepository<B>>>,
  Path(id): Path<CardId>,
) -> Result<Json<Card>, ApiError> {
  let card = repo
    .get(&id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("card {id} not found")))?;
  Ok(Json(card))
}

/// `PUT /cards/:id` — replaces every field except the id and `dateAdded`.
pub async fn update_one<B: BlobStore>(
  State(repo): State<Arc<CardRepository<B>>>,
  Path(id): Path<CardId>,
  Json(body): Json<NewCard>,
) -> Result<Json<Card>, ApiError> {
  let replacement = Card::from_new(body.sanitized(), Utc::now());
  let card = repo.update(&id, replacement).await?;
  Ok(Json(card))
}

/// `DELETE /cards/:id`
pub async fn delete_one<B: BlobStore>(
  State(repo): State<Arc<CardRepository<B>>>,
  Path(id): Path<CardId>,
) -> Result<StatusCode, ApiError> {
  repo.delete(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /stats`
pub async fn stats<B: BlobStore>(
  State(repo): State<Arc<CardRepository<B>>>,
) -> Response {
  let (stats, degraded) = repo.statistics(Utc::now()).await;
  let mut resp = Json(stats).into_response();
  if degraded.is_some() {
    mark_degraded(&mut resp);
  }
  resp
}

// ─── Export ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExportParams {
  pub format: Format,
}

/// `GET /export?format=csv|xlsx`
///
/// Unlike the list endpoints, export fails outright when storage cannot be
/// read rather than producing an empty file.
pub async fn export<B: BlobStore>(
  State(repo): State<Arc<CardRepository<B>>>,
  Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
  let cards = repo.try_list().await?;
  let bytes = cardex_export::serialize(&cards, params.format)?;

  let disposition =
    format!("attachment; filename=\"{}\"", params.format.file_name());
  Ok(
    (
      [
        (header::CONTENT_TYPE, params.format.mime_type().to_string()),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      bytes,
    )
      .into_response(),
  )
}
