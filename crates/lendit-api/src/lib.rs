//! JSON REST API for Lendit.
//!
//! Exposes an axum [`Router`] backed by any [`lendit_core::store::RentalStore`].
//! The acting user's identity arrives pre-authenticated in the
//! `X-Sharer-User-Id` header on every request; auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! axum::serve(listener, lendit_api::api_router(store.clone())).await?;
//! ```

pub mod bookings;
pub mod dto;
pub mod error;
pub mod items;
pub mod users;


use std::sync::Arc;

use axum::{
  Router,
  extract::FromRequestParts,
  http::request::Parts,
  routing::get,
};
use lendit_core::store::RentalStore;
use uuid::Uuid;

pub use error::ApiError;

/// Header carrying the acting user's id.
pub const USER_ID_HEADER: &str = "x-sharer-user-id";

/// Extractor for the acting user's id from [`USER_ID_HEADER`].
///
/// Identity is asserted by the caller; there is no session subsystem. A
/// missing or malformed header is a 400 before any handler logic runs.
pub struct ActingUser(pub Uuid);

impl<S> FromRequestParts<S> for ActingUser
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let value = parts
      .headers
      .get(USER_ID_HEADER)
      .ok_or_else(|| ApiError::BadRequest("missing X-Sharer-User-Id header".into()))?;
    let id = value
      .to_str()
      .ok()
      .and_then(|v| Uuid::parse_str(v).ok())
      .ok_or_else(|| ApiError::BadRequest("invalid X-Sharer-User-Id header".into()))?;
    Ok(Self(id))
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RentalStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route(
      "/users/{id}",
      get(users::get_one::<S>)
        .patch(users::update::<S>)
        .delete(users::delete::<S>),
    )
    // Items
    .route("/items", get(items::list_owned::<S>).post(items::create::<S>))
    .route("/items/search", get(items::search::<S>))
    .route("/items/{id}", get(items::get_one::<S>).patch(items::update::<S>))
    .route("/items/{id}/comments", axum::routing::post(items::comment::<S>))
    // Bookings
    .route(
      "/bookings",
      get(bookings::list_for_requester::<S>).post(bookings::create::<S>),
    )
    .route("/bookings/owner", get(bookings::list_for_owner::<S>))
    .route(
      "/bookings/{id}",
      get(bookings::get_one::<S>).patch(bookings::decide::<S>),
    )
    .with_state(store)
}
