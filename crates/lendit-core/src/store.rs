//! The `RentalStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `lendit-store-sqlite`).
//! The engines in this crate and the API layer depend on this abstraction,
//! not on any concrete backend. Domain-rule outcomes (overlap, lost
//! compare-and-set, duplicate email) are expressed through `Option`/`bool`
//! return values; `Self::Error` is reserved for infrastructure failures.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  booking::{Booking, BookingStatus, NewBooking},
  comment::{Comment, NewComment},
  item::{Item, ItemPatch, NewItem},
  user::{NewUser, User, UserPatch},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Whose bookings a [`BookingQuery`] selects.
#[derive(Debug, Clone, Copy)]
pub enum Party {
  /// Bookings requested by this user.
  Booker(Uuid),
  /// Bookings on items owned by this user.
  Owner(Uuid),
}

/// A zero-based page.
#[derive(Debug, Clone, Copy)]
pub struct Page {
  pub number: usize,
  pub size:   usize,
}

/// Parameters for [`RentalStore::list_bookings`]. Results are always ordered
/// by `start` descending; `page` is applied after ordering when present.
#[derive(Debug, Clone, Copy)]
pub struct BookingQuery {
  pub party: Party,
  pub page:  Option<Page>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Lendit storage backend.
///
/// The store is the only shared mutable resource in the system: the engines
/// hold no state of their own. Two operations carry atomicity contracts:
///
/// - [`create_booking_if_free`](Self::create_booking_if_free): the overlap
///   check and the insert must not interleave with any other booking write
///   for the same item.
/// - [`decide_booking`](Self::decide_booking): a compare-and-set from
///   `Waiting`; of two concurrent calls on the same booking exactly one may
///   succeed.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RentalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Returns `None` if the email is already taken.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn user_exists(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Apply a patch. Returns `None` if the user is missing or the patched
  /// email would collide with another user's.
  fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Delete a user if present; deleting an absent user is a no-op.
  /// Returns `false` when the user is still referenced by items, bookings,
  /// or comments and was left in place.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Items ─────────────────────────────────────────────────────────────

  fn add_item(
    &self,
    input: NewItem,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  fn get_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  /// Apply a patch. Returns `None` if the item does not exist.
  fn update_item(
    &self,
    id: Uuid,
    patch: ItemPatch,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  fn items_by_owner(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + '_;

  /// Available items whose name or description contains `text`
  /// (case-insensitive).
  fn search_available<'a>(
    &'a self,
    text: &'a str,
  ) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + 'a;

  // ── Bookings ──────────────────────────────────────────────────────────

  /// Atomically check that no booking in a `blocking` status overlaps the
  /// candidate window, and insert the booking as `Waiting` if so. Returns
  /// `None` when an overlap blocked the insert.
  fn create_booking_if_free<'a>(
    &'a self,
    input: NewBooking,
    blocking: &'a [BookingStatus],
  ) -> impl Future<Output = Result<Option<Booking>, Self::Error>> + Send + 'a;

  /// Whether any booking for `item_id` in a `blocking` status intersects
  /// `[start, end)`. Read-only; the creation path uses the atomic
  /// [`create_booking_if_free`](Self::create_booking_if_free) instead.
  fn has_overlap<'a>(
    &'a self,
    item_id: Uuid,
    blocking: &'a [BookingStatus],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn get_booking(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Booking>, Self::Error>> + Send + '_;

  /// Compare-and-set the status from `Waiting` to `to`. Returns `None` if
  /// the booking is absent or no longer waiting.
  fn decide_booking(
    &self,
    id: Uuid,
    to: BookingStatus,
  ) -> impl Future<Output = Result<Option<Booking>, Self::Error>> + Send + '_;

  /// Bookings for a party, ordered by `start` descending, optionally paged.
  fn list_bookings<'a>(
    &'a self,
    query: &'a BookingQuery,
  ) -> impl Future<Output = Result<Vec<Booking>, Self::Error>> + Send + 'a;

  /// Approved bookings for the given items with `end < now`, ordered by
  /// `end` descending — the first row per item is that item's most recently
  /// completed rental.
  fn last_approved_for_items<'a>(
    &'a self,
    item_ids: &'a [Uuid],
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Booking>, Self::Error>> + Send + 'a;

  /// Approved bookings for the given items with `start > now`, ordered by
  /// `start` ascending — the first row per item is that item's soonest
  /// upcoming rental.
  fn next_approved_for_items<'a>(
    &'a self,
    item_ids: &'a [Uuid],
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Booking>, Self::Error>> + Send + 'a;

  /// Whether `user_id` has an approved booking of `item_id` that ended
  /// before `now` — the comment-eligibility predicate.
  fn completed_rental_exists(
    &self,
    item_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn comments_for_item(
    &self,
    item_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Comments for many items in one query, for batched listing enrichment.
  fn comments_for_items<'a>(
    &'a self,
    item_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + 'a;
}
