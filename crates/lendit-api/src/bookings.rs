//! Handlers for `/bookings` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/bookings` | Body: [`CreateBody`]; returns 201 + booking |
//! | `PATCH` | `/bookings/:id?approved=bool` | Owner-only decision |
//! | `GET`   | `/bookings/:id` | Visible to booker and owner |
//! | `GET`   | `/bookings?state=&page=&size=` | Requester listing |
//! | `GET`   | `/bookings/owner?state=` | Owner listing, never paginated |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use lendit_core::{booking::BookingState, lifecycle, store::RentalStore, temporal};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ActingUser,
  dto::{BookingDto, booking_dto, booking_dtos},
  error::ApiError,
};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub item_id: Uuid,
  pub start:   DateTime<Utc>,
  pub end:     DateTime<Utc>,
}

/// `POST /bookings`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RentalStore,
{
  let booking =
    lifecycle::create_booking(&*store, user_id, body.item_id, body.start, body.end)
      .await?;
  let dto = booking_dto(&*store, booking).await?;
  Ok((StatusCode::CREATED, Json(dto)))
}

// ─── Decide ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DecideParams {
  pub approved: bool,
}

/// `PATCH /bookings/:id?approved=<bool>`
pub async fn decide<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Path(id): Path<Uuid>,
  Query(params): Query<DecideParams>,
) -> Result<Json<BookingDto>, ApiError>
where
  S: RentalStore,
{
  let booking =
    lifecycle::approve_booking(&*store, user_id, id, params.approved).await?;
  Ok(Json(booking_dto(&*store, booking).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /bookings/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Path(id): Path<Uuid>,
) -> Result<Json<BookingDto>, ApiError>
where
  S: RentalStore,
{
  let booking = lifecycle::get_booking(&*store, user_id, id).await?;
  Ok(Json(booking_dto(&*store, booking).await?))
}

// ─── Listings ─────────────────────────────────────────────────────────────────

fn default_size() -> usize { 10 }

#[derive(Debug, Deserialize)]
pub struct RequesterParams {
  #[serde(default)]
  pub state: BookingState,
  #[serde(default)]
  pub page:  usize,
  #[serde(default = "default_size")]
  pub size:  usize,
}

/// `GET /bookings?state=&page=&size=`
pub async fn list_for_requester<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Query(params): Query<RequesterParams>,
) -> Result<Json<Vec<BookingDto>>, ApiError>
where
  S: RentalStore,
{
  let bookings = temporal::bookings_for_requester(
    &*store,
    user_id,
    params.state,
    params.page,
    params.size,
  )
  .await?;
  Ok(Json(booking_dtos(&*store, bookings).await?))
}

#[derive(Debug, Deserialize)]
pub struct OwnerParams {
  #[serde(default)]
  pub state: BookingState,
}

/// `GET /bookings/owner?state=`
pub async fn list_for_owner<S>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Query(params): Query<OwnerParams>,
) -> Result<Json<Vec<BookingDto>>, ApiError>
where
  S: RentalStore,
{
  let bookings = temporal::bookings_for_owner(&*store, user_id, params.state).await?;
  Ok(Json(booking_dtos(&*store, bookings).await?))
}
