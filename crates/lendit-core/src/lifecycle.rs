//! The booking lifecycle engine: request creation, the approval transition,
//! and role-gated reads.
//!
//! Stateless: every function is a transformer over store queries. Check
//! ordering inside each operation is part of the contract — callers get
//! deterministic error kinds regardless of how many preconditions fail at
//! once.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  booking::{Booking, BookingStatus, NewBooking},
  store::RentalStore,
};

/// Create a booking request for `item_id` as `booker_id`.
///
/// Checks, in order: window validity, booker existence, item existence, the
/// item's availability flag, self-booking, and finally the overlap check —
/// which runs atomically with the insert inside the store.
pub async fn create_booking<S: RentalStore>(
  store: &S,
  booker_id: Uuid,
  item_id: Uuid,
  start: DateTime<Utc>,
  end: DateTime<Utc>,
) -> Result<Booking> {
  if end <= start {
    return Err(Error::WindowEndsBeforeStart { start, end });
  }

  let booker = store
    .get_user(booker_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::UserNotFound(booker_id))?;

  let item = store
    .get_item(item_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ItemNotFound(item_id))?;

  if !item.available {
    return Err(Error::ItemUnavailable(item_id));
  }
  if item.owner_id == booker.user_id {
    return Err(Error::OwnItem { user: booker_id, item: item_id });
  }

  let input = NewBooking { item_id, booker_id, start, end };
  let created = store
    .create_booking_if_free(input, &BookingStatus::BLOCKING)
    .await
    .map_err(Error::store)?
    .ok_or(Error::WindowConflict(item_id))?;

  tracing::info!(
    booking_id = %created.booking_id,
    item_id = %item_id,
    booker_id = %booker_id,
    "booking requested"
  );
  Ok(created)
}

/// Decide a waiting booking: approve it or reject it, exactly once.
///
/// Only the owner of the booked item may decide. Re-deciding a booking in
/// any other state is a conflict, never idempotent.
pub async fn approve_booking<S: RentalStore>(
  store: &S,
  actor_id: Uuid,
  booking_id: Uuid,
  approve: bool,
) -> Result<Booking> {
  let booking = store
    .get_booking(booking_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::BookingNotFound(booking_id))?;

  if booking.status != BookingStatus::Waiting {
    return Err(Error::AlreadyDecided(booking_id));
  }
  if !store.user_exists(actor_id).await.map_err(Error::store)? {
    return Err(Error::UnknownActor(actor_id));
  }

  let item = store
    .get_item(booking.item_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ItemNotFound(booking.item_id))?;
  if item.owner_id != actor_id {
    return Err(Error::NotOwner { user: actor_id, item: item.item_id });
  }

  let to = if approve {
    BookingStatus::Approved
  } else {
    BookingStatus::Rejected
  };

  // The store's compare-and-set resolves the race between two concurrent
  // decisions: the loser observes `None` here.
  let decided = store
    .decide_booking(booking_id, to)
    .await
    .map_err(Error::store)?
    .ok_or(Error::AlreadyDecided(booking_id))?;

  tracing::info!(booking_id = %booking_id, status = ?decided.status, "booking decided");
  Ok(decided)
}

/// Fetch a booking. Visible only to the booker and the item's owner.
pub async fn get_booking<S: RentalStore>(
  store: &S,
  actor_id: Uuid,
  booking_id: Uuid,
) -> Result<Booking> {
  let booking = store
    .get_booking(booking_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::BookingNotFound(booking_id))?;

  if !store.user_exists(actor_id).await.map_err(Error::store)? {
    return Err(Error::UnknownActor(actor_id));
  }

  if booking.booker_id != actor_id {
    let item = store
      .get_item(booking.item_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ItemNotFound(booking.item_id))?;
    if item.owner_id != actor_id {
      return Err(Error::NotParticipant(actor_id));
    }
  }

  Ok(booking)
}
