//! Handlers for `/users` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lendit_core::{
  accounts,
  store::RentalStore,
  user::{NewUser, UserPatch},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{dto::UserDto, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:  String,
  pub email: String,
}

/// `POST /users`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RentalStore,
{
  let user = accounts::create_user(
    &*store,
    NewUser { name: body.name, email: body.email },
  )
  .await?;
  Ok((StatusCode::CREATED, Json(UserDto::from(user))))
}

/// `GET /users`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<UserDto>>, ApiError>
where
  S: RentalStore,
{
  let users = accounts::list_users(&*store).await?;
  Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// `GET /users/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<UserDto>, ApiError>
where
  S: RentalStore,
{
  let user = accounts::get_user(&*store, id).await?;
  Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct PatchBody {
  pub name:  Option<String>,
  pub email: Option<String>,
}

/// `PATCH /users/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<PatchBody>,
) -> Result<Json<UserDto>, ApiError>
where
  S: RentalStore,
{
  let user = accounts::update_user(
    &*store,
    id,
    UserPatch { name: body.name, email: body.email },
  )
  .await?;
  Ok(Json(user.into()))
}

/// `DELETE /users/:id`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RentalStore,
{
  accounts::delete_user(&*store, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
