//! Integration tests for `SqliteStore` and the core engines against an
//! in-memory database.

use chrono::{DateTime, Duration, Utc};
use lendit_core::{
  Error, ErrorKind, accounts,
  booking::{Booking, BookingState, BookingStatus},
  catalog,
  item::ItemPatch,
  lifecycle,
  store::RentalStore,
  temporal,
  user::{NewUser, UserPatch},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str, email: &str) -> Uuid {
  accounts::create_user(s, NewUser { name: name.into(), email: email.into() })
    .await
    .unwrap()
    .user_id
}

async fn item(s: &SqliteStore, owner: Uuid, name: &str, available: bool) -> Uuid {
  catalog::create_item(s, owner, name.into(), format!("a {name}"), available)
    .await
    .unwrap()
    .item_id
}

fn days(n: i64) -> Duration { Duration::days(n) }

fn hours(n: i64) -> Duration { Duration::hours(n) }

/// A store seeded with an owner, a booker, a third user, and one available
/// item of the owner's.
async fn rental_fixture() -> (SqliteStore, Uuid, Uuid, Uuid, Uuid) {
  let s = store().await;
  let owner = user(&s, "Ann", "ann@example.com").await;
  let booker = user(&s, "Ben", "ben@example.com").await;
  let other = user(&s, "Cid", "cid@example.com").await;
  let drill = item(&s, owner, "drill", true).await;
  (s, owner, booker, other, drill)
}

async fn book(
  s: &SqliteStore,
  booker: Uuid,
  item: Uuid,
  start: DateTime<Utc>,
  end: DateTime<Utc>,
) -> Booking {
  lifecycle::create_booking(s, booker, item, start, end)
    .await
    .unwrap()
}

// ─── Booking creation ────────────────────────────────────────────────────────

#[tokio::test]
async fn created_booking_is_waiting() {
  let (s, _, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();

  let booking = book(&s, booker, drill, now + days(1), now + days(2)).await;
  assert_eq!(booking.status, BookingStatus::Waiting);
  assert_eq!(booking.item_id, drill);
  assert_eq!(booking.booker_id, booker);
}

#[tokio::test]
async fn nested_window_conflicts() {
  let (s, _, booker, other, drill) = rental_fixture().await;
  let now = Utc::now();
  book(&s, booker, drill, now + days(1), now + days(2)).await;

  let err = lifecycle::create_booking(
    &s,
    other,
    drill,
    now + days(1) + hours(12),
    now + days(1) + hours(18),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::WindowConflict(i) if i == drill));
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn partial_overlap_conflicts_in_both_directions() {
  let (s, _, booker, other, drill) = rental_fixture().await;
  let now = Utc::now();
  book(&s, booker, drill, now + days(2), now + days(4)).await;

  for (start, end) in [
    (now + days(1), now + days(3)),  // overlaps the front
    (now + days(3), now + days(5)),  // overlaps the back
    (now + days(1), now + days(5)),  // encloses
  ] {
    let err = lifecycle::create_booking(&s, other, drill, start, end)
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
  }
}

#[tokio::test]
async fn touching_windows_do_not_conflict() {
  let (s, _, booker, other, drill) = rental_fixture().await;
  let now = Utc::now();
  book(&s, booker, drill, now + days(1), now + days(2)).await;

  // A window starting exactly at the existing end is allowed, as is one
  // ending exactly at the existing start.
  book(&s, other, drill, now + days(2), now + days(3)).await;
  book(&s, other, drill, now + hours(12), now + days(1)).await;
}

#[tokio::test]
async fn rejected_booking_frees_its_window() {
  let (s, owner, booker, other, drill) = rental_fixture().await;
  let now = Utc::now();
  let booking = book(&s, booker, drill, now + days(1), now + days(2)).await;

  lifecycle::approve_booking(&s, owner, booking.booking_id, false)
    .await
    .unwrap();

  // The same window is bookable again once the blocker is rejected.
  book(&s, other, drill, now + days(1), now + days(2)).await;
}

#[tokio::test]
async fn window_must_end_after_start() {
  let (s, _, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();

  let err = lifecycle::create_booking(&s, booker, drill, now + days(2), now + days(1))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::WindowEndsBeforeStart { .. }));
  assert_eq!(err.kind(), ErrorKind::InvalidInput);

  // Zero-length windows are rejected too.
  let err = lifecycle::create_booking(&s, booker, drill, now + days(1), now + days(1))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn owner_cannot_book_own_item() {
  let (s, owner, _, _, drill) = rental_fixture().await;
  let now = Utc::now();

  let err = lifecycle::create_booking(&s, owner, drill, now + days(1), now + days(2))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::OwnItem { .. }));
  assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn unavailable_item_rejects_new_bookings() {
  let (s, owner, booker, _, _) = rental_fixture().await;
  let broken = item(&s, owner, "broken saw", false).await;
  let now = Utc::now();

  let err = lifecycle::create_booking(&s, booker, broken, now + days(1), now + days(2))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ItemUnavailable(i) if i == broken));
  assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn unknown_booker_or_item_is_not_found() {
  let (s, _, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();

  let err =
    lifecycle::create_booking(&s, Uuid::new_v4(), drill, now + days(1), now + days(2))
      .await
      .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)));

  let err =
    lifecycle::create_booking(&s, booker, Uuid::new_v4(), now + days(1), now + days(2))
      .await
      .unwrap_err();
  assert!(matches!(err, Error::ItemNotFound(_)));
}

#[tokio::test]
async fn creation_checks_run_in_contract_order() {
  let (s, owner, _, _, _) = rental_fixture().await;
  let unavailable = item(&s, owner, "washer", false).await;
  let now = Utc::now();

  // Window validity precedes user resolution.
  let err = lifecycle::create_booking(
    &s,
    Uuid::new_v4(),
    unavailable,
    now + days(2),
    now + days(1),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::WindowEndsBeforeStart { .. }));

  // User resolution precedes item resolution.
  let err = lifecycle::create_booking(
    &s,
    Uuid::new_v4(),
    Uuid::new_v4(),
    now + days(1),
    now + days(2),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)));

  // Availability precedes the self-booking check: the owner of an
  // unavailable item sees the availability failure.
  let err =
    lifecycle::create_booking(&s, owner, unavailable, now + days(1), now + days(2))
      .await
      .unwrap_err();
  assert!(matches!(err, Error::ItemUnavailable(_)));
}

// ─── Approval ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn owner_approves_waiting_booking() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();
  let booking = book(&s, booker, drill, now + days(1), now + days(2)).await;

  let approved = lifecycle::approve_booking(&s, owner, booking.booking_id, true)
    .await
    .unwrap();
  assert_eq!(approved.status, BookingStatus::Approved);

  // A second decision on the same booking is a conflict, not idempotent.
  let err = lifecycle::approve_booking(&s, owner, booking.booking_id, true)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AlreadyDecided(_)));
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn owner_rejects_waiting_booking() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();
  let booking = book(&s, booker, drill, now + days(1), now + days(2)).await;

  let rejected = lifecycle::approve_booking(&s, owner, booking.booking_id, false)
    .await
    .unwrap();
  assert_eq!(rejected.status, BookingStatus::Rejected);

  let err = lifecycle::approve_booking(&s, owner, booking.booking_id, false)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AlreadyDecided(_)));
}

#[tokio::test]
async fn non_owner_cannot_decide() {
  let (s, _, booker, other, drill) = rental_fixture().await;
  let now = Utc::now();
  let booking = book(&s, booker, drill, now + days(1), now + days(2)).await;

  // Neither the booker nor a bystander may decide.
  for actor in [booker, other] {
    let err = lifecycle::approve_booking(&s, actor, booking.booking_id, true)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::NotOwner { .. }));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
  }

  let fetched = s.get_booking(booking.booking_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, BookingStatus::Waiting);
}

#[tokio::test]
async fn approval_check_order() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();
  let booking = book(&s, booker, drill, now + days(1), now + days(2)).await;

  // Missing booking wins over everything.
  let err = lifecycle::approve_booking(&s, owner, Uuid::new_v4(), true)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::BookingNotFound(_)));

  // An unresolved actor is invalid input, checked before ownership.
  let err = lifecycle::approve_booking(&s, Uuid::new_v4(), booking.booking_id, true)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownActor(_)));
  assert_eq!(err.kind(), ErrorKind::InvalidInput);

  // Once decided, the state conflict is reported even to a non-owner.
  lifecycle::approve_booking(&s, owner, booking.booking_id, true)
    .await
    .unwrap();
  let err = lifecycle::approve_booking(&s, booker, booking.booking_id, true)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AlreadyDecided(_)));
}

// ─── Role-gated reads ────────────────────────────────────────────────────────

#[tokio::test]
async fn booking_visible_to_booker_and_owner_only() {
  let (s, owner, booker, other, drill) = rental_fixture().await;
  let now = Utc::now();
  let booking = book(&s, booker, drill, now + days(1), now + days(2)).await;

  for actor in [booker, owner] {
    let fetched = lifecycle::get_booking(&s, actor, booking.booking_id)
      .await
      .unwrap();
    assert_eq!(fetched.booking_id, booking.booking_id);
    assert_eq!(fetched.start, booking.start);
    assert_eq!(fetched.end, booking.end);
    assert_eq!(fetched.status, booking.status);
  }

  let err = lifecycle::get_booking(&s, other, booking.booking_id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotParticipant(_)));
  assert_eq!(err.kind(), ErrorKind::Forbidden);

  let err = lifecycle::get_booking(&s, Uuid::new_v4(), booking.booking_id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownActor(_)));

  let err = lifecycle::get_booking(&s, booker, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::BookingNotFound(_)));
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_creates_for_same_window_admit_exactly_one() {
  let (s, _, booker, other, drill) = rental_fixture().await;
  let now = Utc::now();

  let (a, b) = tokio::join!(
    lifecycle::create_booking(&s, booker, drill, now + days(1), now + days(2)),
    lifecycle::create_booking(&s, other, drill, now + days(1), now + days(2)),
  );

  let succeeded = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
  assert_eq!(succeeded, 1, "exactly one of two racing creates may win");
  let err = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
  assert!(matches!(err, Error::WindowConflict(_)));
}

#[tokio::test]
async fn concurrent_decisions_admit_exactly_one() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();
  let booking = book(&s, booker, drill, now + days(1), now + days(2)).await;

  let (a, b) = tokio::join!(
    lifecycle::approve_booking(&s, owner, booking.booking_id, true),
    lifecycle::approve_booking(&s, owner, booking.booking_id, false),
  );

  let succeeded = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
  assert_eq!(succeeded, 1, "exactly one of two racing decisions may win");
  let err = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
  assert!(matches!(err, Error::AlreadyDecided(_)));
}

// ─── Overlap checker ─────────────────────────────────────────────────────────

#[tokio::test]
async fn overlap_checker_boundary_cases() {
  let (s, _, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();
  book(&s, booker, drill, now + days(1), now + days(2)).await;
  let blocking = &BookingStatus::BLOCKING;

  // Touching at either end is not an overlap.
  assert!(
    !s.has_overlap(drill, blocking, now + days(2), now + days(3))
      .await
      .unwrap()
  );
  assert!(
    !s.has_overlap(drill, blocking, now, now + days(1))
      .await
      .unwrap()
  );
  // One-sided intersections and containment are.
  assert!(
    s.has_overlap(drill, blocking, now + days(1) + hours(1), now + days(3))
      .await
      .unwrap()
  );
  assert!(
    s.has_overlap(drill, blocking, now, now + days(1) + hours(1))
      .await
      .unwrap()
  );
  assert!(
    s.has_overlap(drill, blocking, now, now + days(5))
      .await
      .unwrap()
  );
  // A rejected-only filter sees no blocker.
  assert!(
    !s.has_overlap(drill, &[BookingStatus::Rejected], now + days(1), now + days(2))
      .await
      .unwrap()
  );
}

// ─── Temporal queries ────────────────────────────────────────────────────────

/// Seed one booking per temporal bucket for `booker` on fresh items of
/// `owner`: past-approved, current-approved, future-waiting, and rejected.
async fn temporal_fixture(
  s: &SqliteStore,
  owner: Uuid,
  booker: Uuid,
) -> (Booking, Booking, Booking, Booking) {
  let now = Utc::now();

  let past_item = item(s, owner, "tent", true).await;
  let past = book(s, booker, past_item, now - days(5), now - days(3)).await;
  let past = lifecycle::approve_booking(s, owner, past.booking_id, true)
    .await
    .unwrap();

  let current_item = item(s, owner, "kayak", true).await;
  let current =
    book(s, booker, current_item, now - hours(2), now + hours(2)).await;
  let current = lifecycle::approve_booking(s, owner, current.booking_id, true)
    .await
    .unwrap();

  let future_item = item(s, owner, "ladder", true).await;
  let future = book(s, booker, future_item, now + days(3), now + days(5)).await;

  let rejected_item = item(s, owner, "bike", true).await;
  let rejected =
    book(s, booker, rejected_item, now + days(1), now + days(2)).await;
  let rejected = lifecycle::approve_booking(s, owner, rejected.booking_id, false)
    .await
    .unwrap();

  (past, current, future, rejected)
}

#[tokio::test]
async fn requester_listing_dispatches_on_state() {
  let (s, owner, booker, _, _) = rental_fixture().await;
  let (past, current, future, rejected) = temporal_fixture(&s, owner, booker).await;

  let all =
    temporal::bookings_for_requester(&s, booker, BookingState::All, 0, 10)
      .await
      .unwrap();
  assert_eq!(all.len(), 4);
  // Ordered by start descending.
  let starts: Vec<_> = all.iter().map(|b| b.start).collect();
  let mut sorted = starts.clone();
  sorted.sort_by(|a, b| b.cmp(a));
  assert_eq!(starts, sorted);

  let by_state = |state| temporal::bookings_for_requester(&s, booker, state, 0, 10);
  let current_list = by_state(BookingState::Current).await.unwrap();
  assert_eq!(current_list.len(), 1);
  assert_eq!(current_list[0].booking_id, current.booking_id);

  let past_list = by_state(BookingState::Past).await.unwrap();
  assert_eq!(past_list.len(), 1);
  assert_eq!(past_list[0].booking_id, past.booking_id);

  let future_list = by_state(BookingState::Future).await.unwrap();
  assert_eq!(future_list.len(), 2); // future-waiting and rejected both start later
  assert!(future_list.iter().any(|b| b.booking_id == future.booking_id));

  let waiting_list = by_state(BookingState::Waiting).await.unwrap();
  assert_eq!(waiting_list.len(), 1);
  assert_eq!(waiting_list[0].booking_id, future.booking_id);

  let rejected_list = by_state(BookingState::Rejected).await.unwrap();
  assert_eq!(rejected_list.len(), 1);
  assert_eq!(rejected_list[0].booking_id, rejected.booking_id);

  // APPROVED is not a status filter; it returns the full listing.
  let approved_list = by_state(BookingState::Approved).await.unwrap();
  assert_eq!(approved_list.len(), 4);
}

#[tokio::test]
async fn requester_listing_rejects_unknown_user() {
  let s = store().await;
  let err =
    temporal::bookings_for_requester(&s, Uuid::new_v4(), BookingState::All, 0, 10)
      .await
      .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)));
}

#[tokio::test]
async fn requester_all_branch_is_paginated() {
  let (s, _, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();
  for i in 0..5 {
    book(&s, booker, drill, now + days(10 + 2 * i), now + days(11 + 2 * i)).await;
  }

  let page0 = temporal::bookings_for_requester(&s, booker, BookingState::All, 0, 2)
    .await
    .unwrap();
  let page1 = temporal::bookings_for_requester(&s, booker, BookingState::All, 1, 2)
    .await
    .unwrap();
  let page2 = temporal::bookings_for_requester(&s, booker, BookingState::All, 2, 2)
    .await
    .unwrap();
  assert_eq!(page0.len(), 2);
  assert_eq!(page1.len(), 2);
  assert_eq!(page2.len(), 1);
  // Descending by start across page boundaries, no duplicates.
  assert!(page0[1].start > page1[0].start);
  assert!(page1[1].start > page2[0].start);

  // Inherited asymmetry: only the ALL branch pages. The WAITING branch
  // ignores the page size and returns everything.
  let waiting =
    temporal::bookings_for_requester(&s, booker, BookingState::Waiting, 0, 2)
      .await
      .unwrap();
  assert_eq!(waiting.len(), 5);

  // APPROVED takes the unpaginated fall-through, not the ALL branch.
  let approved =
    temporal::bookings_for_requester(&s, booker, BookingState::Approved, 0, 2)
      .await
      .unwrap();
  assert_eq!(approved.len(), 5);
}

#[tokio::test]
async fn huge_page_numbers_do_not_overflow() {
  let (s, _, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();
  book(&s, booker, drill, now + days(1), now + days(2)).await;

  // page * size would overflow usize; the offset must saturate instead.
  let far = temporal::bookings_for_requester(
    &s,
    booker,
    BookingState::All,
    usize::MAX,
    10,
  )
  .await
  .unwrap();
  assert!(far.is_empty());
}

#[tokio::test]
async fn owner_listing_is_never_paginated() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();
  for i in 0..5 {
    book(&s, booker, drill, now + days(10 + 2 * i), now + days(11 + 2 * i)).await;
  }

  // Inherited asymmetry: the owner view has no page parameter at all.
  let all = temporal::bookings_for_owner(&s, owner, BookingState::All)
    .await
    .unwrap();
  assert_eq!(all.len(), 5);

  let waiting = temporal::bookings_for_owner(&s, owner, BookingState::Waiting)
    .await
    .unwrap();
  assert_eq!(waiting.len(), 5);
}

#[tokio::test]
async fn owner_listing_covers_only_owned_items() {
  let (s, owner, booker, other, drill) = rental_fixture().await;
  let other_item = item(&s, other, "canoe", true).await;
  let now = Utc::now();

  book(&s, booker, drill, now + days(1), now + days(2)).await;
  book(&s, booker, other_item, now + days(1), now + days(2)).await;

  let owned = temporal::bookings_for_owner(&s, owner, BookingState::All)
    .await
    .unwrap();
  assert_eq!(owned.len(), 1);
  assert_eq!(owned[0].item_id, drill);
}

// ─── Nearest bookings ────────────────────────────────────────────────────────

#[tokio::test]
async fn nearest_bookings_for_single_item() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();

  let last = book(&s, booker, drill, now - days(2), now - days(1)).await;
  lifecycle::approve_booking(&s, owner, last.booking_id, true)
    .await
    .unwrap();
  let next = book(&s, booker, drill, now + days(1), now + days(2)).await;
  lifecycle::approve_booking(&s, owner, next.booking_id, true)
    .await
    .unwrap();

  let nearest = temporal::nearest_for_items(&s, &[drill], now).await.unwrap();
  assert_eq!(nearest.last_id(drill), Some(last.booking_id));
  assert_eq!(nearest.next_id(drill), Some(next.booking_id));
}

#[tokio::test]
async fn nearest_bookings_pick_closest_of_several() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();

  // Two completed rentals: the later end wins "last".
  let older = book(&s, booker, drill, now - days(10), now - days(9)).await;
  lifecycle::approve_booking(&s, owner, older.booking_id, true)
    .await
    .unwrap();
  let recent = book(&s, booker, drill, now - days(3), now - days(2)).await;
  lifecycle::approve_booking(&s, owner, recent.booking_id, true)
    .await
    .unwrap();

  // Two upcoming rentals: the earlier start wins "next".
  let soon = book(&s, booker, drill, now + days(2), now + days(3)).await;
  lifecycle::approve_booking(&s, owner, soon.booking_id, true)
    .await
    .unwrap();
  let later = book(&s, booker, drill, now + days(8), now + days(9)).await;
  lifecycle::approve_booking(&s, owner, later.booking_id, true)
    .await
    .unwrap();

  let nearest = temporal::nearest_for_items(&s, &[drill], now).await.unwrap();
  assert_eq!(nearest.last_id(drill), Some(recent.booking_id));
  assert_eq!(nearest.next_id(drill), Some(soon.booking_id));
}

#[tokio::test]
async fn nearest_bookings_group_many_items_in_one_pass() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let saw = item(&s, owner, "saw", true).await;
  let idle = item(&s, owner, "idle mixer", true).await;
  let now = Utc::now();

  let drill_last = book(&s, booker, drill, now - days(2), now - days(1)).await;
  lifecycle::approve_booking(&s, owner, drill_last.booking_id, true)
    .await
    .unwrap();
  let saw_next = book(&s, booker, saw, now + days(1), now + days(2)).await;
  lifecycle::approve_booking(&s, owner, saw_next.booking_id, true)
    .await
    .unwrap();

  // A waiting booking never shows up as a neighbor.
  book(&s, booker, idle, now + days(1), now + days(2)).await;

  let nearest = temporal::nearest_for_items(&s, &[drill, saw, idle], now)
    .await
    .unwrap();
  assert_eq!(nearest.last_id(drill), Some(drill_last.booking_id));
  assert_eq!(nearest.next_id(drill), None);
  assert_eq!(nearest.last_id(saw), None);
  assert_eq!(nearest.next_id(saw), Some(saw_next.booking_id));
  assert_eq!(nearest.last_id(idle), None);
  assert_eq!(nearest.next_id(idle), None);
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn completed_rental_entitles_commenting() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();

  let booking = book(&s, booker, drill, now - days(2), now - days(1)).await;
  lifecycle::approve_booking(&s, owner, booking.booking_id, true)
    .await
    .unwrap();

  let comment = catalog::add_comment(&s, booker, drill, "sharp and sturdy".into())
    .await
    .unwrap();
  assert_eq!(comment.item_id, drill);
  assert_eq!(comment.author_id, booker);

  let view = catalog::get_item(&s, booker, drill).await.unwrap();
  assert_eq!(view.comments.len(), 1);
  assert_eq!(view.comments[0].text, "sharp and sturdy");
}

#[tokio::test]
async fn commenting_without_completed_rental_is_not_entitled() {
  let (s, owner, booker, other, drill) = rental_fixture().await;
  let now = Utc::now();

  // A waiting past booking does not entitle.
  book(&s, booker, drill, now - days(2), now - days(1)).await;
  let err = catalog::add_comment(&s, booker, drill, "nope".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotEntitled { .. }));
  assert_eq!(err.kind(), ErrorKind::InvalidInput);

  // An approved rental that has not ended yet does not entitle either.
  let ongoing = book(&s, other, drill, now - hours(1), now + days(1)).await;
  lifecycle::approve_booking(&s, owner, ongoing.booking_id, true)
    .await
    .unwrap();
  let err = catalog::add_comment(&s, other, drill, "still renting".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotEntitled { .. }));
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_email_conflicts() {
  let s = store().await;
  user(&s, "Ann", "ann@example.com").await;

  let err = accounts::create_user(
    &s,
    NewUser { name: "Imposter".into(), email: "ann@example.com".into() },
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::EmailTaken(_)));
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn update_user_patches_and_guards_email() {
  let s = store().await;
  let ann = user(&s, "Ann", "ann@example.com").await;
  user(&s, "Ben", "ben@example.com").await;

  let updated = accounts::update_user(
    &s,
    ann,
    UserPatch { name: Some("Anna".into()), email: None },
  )
  .await
  .unwrap();
  assert_eq!(updated.name, "Anna");
  assert_eq!(updated.email, "ann@example.com");

  // Blank fields are ignored rather than written.
  let updated = accounts::update_user(
    &s,
    ann,
    UserPatch { name: Some("  ".into()), email: None },
  )
  .await
  .unwrap();
  assert_eq!(updated.name, "Anna");

  let err = accounts::update_user(
    &s,
    ann,
    UserPatch { name: None, email: Some("ben@example.com".into()) },
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::EmailTaken(_)));

  let err = accounts::update_user(&s, Uuid::new_v4(), UserPatch::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)));
}

#[tokio::test]
async fn delete_user_is_idempotent() {
  let s = store().await;
  let ann = user(&s, "Ann", "ann@example.com").await;

  accounts::delete_user(&s, ann).await.unwrap();
  assert!(matches!(
    accounts::get_user(&s, ann).await.unwrap_err(),
    Error::UserNotFound(_)
  ));
  // Deleting again is a no-op.
  accounts::delete_user(&s, ann).await.unwrap();
}

#[tokio::test]
async fn referenced_user_cannot_be_deleted() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();
  book(&s, booker, drill, now + days(1), now + days(2)).await;

  // The item owner and the booker are both pinned by foreign keys.
  for id in [owner, booker] {
    let err = accounts::delete_user(&s, id).await.unwrap_err();
    assert!(matches!(err, Error::UserInUse(u) if u == id));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    accounts::get_user(&s, id).await.unwrap();
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn item_patch_ignores_blank_fields() {
  let (s, owner, _, _, drill) = rental_fixture().await;

  let updated = catalog::update_item(
    &s,
    owner,
    drill,
    ItemPatch {
      name:        Some("  hammer drill  ".into()),
      description: Some("".into()),
      available:   Some(false),
    },
  )
  .await
  .unwrap();
  assert_eq!(updated.name, "hammer drill");
  assert_eq!(updated.description, "a drill");
  assert!(!updated.available);
}

#[tokio::test]
async fn search_matches_available_items_case_insensitively() {
  let (s, owner, booker, _, _) = rental_fixture().await;
  item(&s, owner, "Pressure Washer", true).await;
  item(&s, owner, "sander", false).await; // unavailable: never returned

  let hits = catalog::search_items(&s, booker, "WASHER").await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].name, "Pressure Washer");

  let hits = catalog::search_items(&s, booker, "sander").await.unwrap();
  assert!(hits.is_empty());

  // A blank query returns nothing without consulting the store.
  let hits = catalog::search_items(&s, booker, "   ").await.unwrap();
  assert!(hits.is_empty());
}

#[tokio::test]
async fn owner_item_listing_is_enriched_in_batch() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let saw = item(&s, owner, "saw", true).await;
  let now = Utc::now();

  let done = book(&s, booker, drill, now - days(2), now - days(1)).await;
  lifecycle::approve_booking(&s, owner, done.booking_id, true)
    .await
    .unwrap();
  let upcoming = book(&s, booker, drill, now + days(1), now + days(2)).await;
  lifecycle::approve_booking(&s, owner, upcoming.booking_id, true)
    .await
    .unwrap();
  catalog::add_comment(&s, booker, drill, "good as new".into())
    .await
    .unwrap();

  let views = catalog::list_owner_items(&s, owner).await.unwrap();
  assert_eq!(views.len(), 2);

  let drill_view = views.iter().find(|v| v.item.item_id == drill).unwrap();
  assert_eq!(drill_view.last_booking_id, Some(done.booking_id));
  assert_eq!(drill_view.next_booking_id, Some(upcoming.booking_id));
  assert_eq!(drill_view.comments.len(), 1);

  let saw_view = views.iter().find(|v| v.item.item_id == saw).unwrap();
  assert_eq!(saw_view.last_booking_id, None);
  assert_eq!(saw_view.next_booking_id, None);
  assert!(saw_view.comments.is_empty());
}

#[tokio::test]
async fn booking_neighbors_are_owner_only_on_single_item_reads() {
  let (s, owner, booker, _, drill) = rental_fixture().await;
  let now = Utc::now();

  let done = book(&s, booker, drill, now - days(2), now - days(1)).await;
  lifecycle::approve_booking(&s, owner, done.booking_id, true)
    .await
    .unwrap();

  let owner_view = catalog::get_item(&s, owner, drill).await.unwrap();
  assert_eq!(owner_view.last_booking_id, Some(done.booking_id));

  let booker_view = catalog::get_item(&s, booker, drill).await.unwrap();
  assert_eq!(booker_view.last_booking_id, None);
  assert_eq!(booker_view.next_booking_id, None);
}
