//! The temporal query engine: state-bucketed booking listings, the batched
//! last/next-approved lookup used to enrich item listings, and the
//! comment-eligibility predicate.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  booking::{Booking, BookingState},
  store::{BookingQuery, Page, Party, RentalStore},
};

/// Bookings requested by `user_id`, filtered by `state`, ordered by `start`
/// descending.
///
/// Pagination applies only to the `All` branch; every other branch returns
/// an unbounded list. This asymmetry is inherited behavior, preserved on
/// purpose (see the matching tests).
pub async fn bookings_for_requester<S: RentalStore>(
  store: &S,
  user_id: Uuid,
  state: BookingState,
  page: usize,
  size: usize,
) -> Result<Vec<Booking>> {
  if !store.user_exists(user_id).await.map_err(Error::store)? {
    return Err(Error::UserNotFound(user_id));
  }

  let page = match state {
    BookingState::All => Some(Page { number: page, size }),
    _ => None,
  };
  let query = BookingQuery { party: Party::Booker(user_id), page };
  let bookings = store.list_bookings(&query).await.map_err(Error::store)?;

  let now = Utc::now();
  Ok(
    bookings
      .into_iter()
      .filter(|b| b.matches_state(state, now))
      .collect(),
  )
}

/// Bookings on items owned by `owner_id`, filtered by `state`, ordered by
/// `start` descending. Never paginated (inherited asymmetry with
/// [`bookings_for_requester`]).
pub async fn bookings_for_owner<S: RentalStore>(
  store: &S,
  owner_id: Uuid,
  state: BookingState,
) -> Result<Vec<Booking>> {
  if !store.user_exists(owner_id).await.map_err(Error::store)? {
    return Err(Error::UserNotFound(owner_id));
  }

  let query = BookingQuery { party: Party::Owner(owner_id), page: None };
  let bookings = store.list_bookings(&query).await.map_err(Error::store)?;

  let now = Utc::now();
  Ok(
    bookings
      .into_iter()
      .filter(|b| b.matches_state(state, now))
      .collect(),
  )
}

/// Per-item nearest approved bookings around `now`.
#[derive(Debug, Default)]
pub struct NearestBookings {
  /// The approved booking with the greatest `end < now`, per item.
  pub last: HashMap<Uuid, Booking>,
  /// The approved booking with the smallest `start > now`, per item.
  pub next: HashMap<Uuid, Booking>,
}

impl NearestBookings {
  pub fn last_id(&self, item_id: Uuid) -> Option<Uuid> {
    self.last.get(&item_id).map(|b| b.booking_id)
  }

  pub fn next_id(&self, item_id: Uuid) -> Option<Uuid> {
    self.next.get(&item_id).map(|b| b.booking_id)
  }
}

/// Nearest past-approved and future-approved booking for each of `item_ids`.
///
/// Two batch queries cover all items at once; grouping is a single pass in
/// which the first row per item wins (the queries are ordered so that row is
/// the nearest). No per-item queries are issued.
pub async fn nearest_for_items<S: RentalStore>(
  store: &S,
  item_ids: &[Uuid],
  now: DateTime<Utc>,
) -> Result<NearestBookings> {
  if item_ids.is_empty() {
    return Ok(NearestBookings::default());
  }

  let mut nearest = NearestBookings::default();

  for booking in store
    .last_approved_for_items(item_ids, now)
    .await
    .map_err(Error::store)?
  {
    nearest.last.entry(booking.item_id).or_insert(booking);
  }
  for booking in store
    .next_approved_for_items(item_ids, now)
    .await
    .map_err(Error::store)?
  {
    nearest.next.entry(booking.item_id).or_insert(booking);
  }

  Ok(nearest)
}

/// Require a completed, approved rental of `item_id` by `user_id` before
/// `now`. Absence is an entitlement failure, not a missing resource.
pub async fn ensure_completed_rental<S: RentalStore>(
  store: &S,
  item_id: Uuid,
  user_id: Uuid,
  now: DateTime<Utc>,
) -> Result<()> {
  let completed = store
    .completed_rental_exists(item_id, user_id, now)
    .await
    .map_err(Error::store)?;
  if completed {
    Ok(())
  } else {
    Err(Error::NotEntitled { user: user_id, item: item_id })
  }
}
