//! Handlers for `/items` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/items` | Create a listing owned by the acting user |
//! | `GET`   | `/items` | The acting user's items, enriched in batch |
//! | `GET`   | `/items/:id` | Enriched view; neighbors owner-only |
//! | `PATCH` | `/items/:id` | Blank fields ignored |
//! | `GET`   | `/items/search?text=` | Available items, substring match |
//! | `POST`  | `/items/:id/comments` | Requires a completed rental |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use lendit_core::{catalog, item::ItemPatch, store::RentalStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ActingUser,
  dto::{CommentDto, ItemDetailDto, ItemDto},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  pub description: String,
  pub available:   bool,
}

/// `POST /items`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RentalStore,
{
  let item = catalog::create_item(
    &*store,
    user_id,
    body.name,
    body.description,
    body.available,
  )
  .await?;
  Ok((StatusCode::CREATED, Json(ItemDto::from(item))))
}

/// `GET /items` — the acting user's items with batched enrichment.
pub async fn list_owned<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
) -> Result<Json<Vec<ItemDetailDto>>, ApiError>
where
  S: RentalStore,
{
  let views = catalog::list_owner_items(&*store, user_id).await?;
  Ok(Json(views.into_iter().map(ItemDetailDto::from).collect()))
}

/// `GET /items/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ItemDetailDto>, ApiError>
where
  S: RentalStore,
{
  let view = catalog::get_item(&*store, user_id, id).await?;
  Ok(Json(view.into()))
}

#[derive(Debug, Deserialize)]
pub struct PatchBody {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub available:   Option<bool>,
}

/// `PATCH /items/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Path(id): Path<Uuid>,
  Json(body): Json<PatchBody>,
) -> Result<Json<ItemDto>, ApiError>
where
  S: RentalStore,
{
  let item = catalog::update_item(
    &*store,
    user_id,
    id,
    ItemPatch {
      name:        body.name,
      description: body.description,
      available:   body.available,
    },
  )
  .await?;
  Ok(Json(item.into()))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub text: String,
}

/// `GET /items/search?text=`
pub async fn search<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ItemDto>>, ApiError>
where
  S: RentalStore,
{
  let items = catalog::search_items(&*store, user_id, &params.text).await?;
  Ok(Json(items.into_iter().map(ItemDto::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub text: String,
}

/// `POST /items/:id/comments`
pub async fn comment<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Path(id): Path<Uuid>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RentalStore,
{
  let comment = catalog::add_comment(&*store, user_id, id, body.text).await?;
  Ok((StatusCode::CREATED, Json(CommentDto::from(comment))))
}
