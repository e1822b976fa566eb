//! Booking — a reservation of an item for a half-open time window.
//!
//! A booking is created in the `Waiting` state and decided exactly once by
//! the item's owner, moving to `Approved` or `Rejected`. For a given item,
//! all bookings in a blocking status must be pairwise non-overlapping over
//! `[start, end)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// The stored lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
  Waiting,
  Approved,
  Rejected,
}

impl BookingStatus {
  /// Statuses that count toward the per-item non-overlap invariant.
  /// A rejected booking frees its window.
  pub const BLOCKING: [BookingStatus; 2] = [Self::Waiting, Self::Approved];
}

// ─── Query-time state ────────────────────────────────────────────────────────

/// The query-time classification of bookings — derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingState {
  #[default]
  All,
  Current,
  Past,
  Future,
  Waiting,
  /// Accepted but has no filter of its own; returns the full listing,
  /// unpaginated. Inherited behavior.
  Approved,
  Rejected,
}

// ─── Overlap ─────────────────────────────────────────────────────────────────

/// Half-open window intersection: `[s1, e1)` and `[s2, e2)` overlap iff
/// `s1 < e2 && s2 < e1`. Windows that merely touch do not overlap.
pub fn windows_overlap(
  s1: DateTime<Utc>,
  e1: DateTime<Utc>,
  s2: DateTime<Utc>,
  e2: DateTime<Utc>,
) -> bool {
  s1 < e2 && s2 < e1
}

// ─── Booking ─────────────────────────────────────────────────────────────────

/// A persisted booking. Only `status` is ever mutated, and only through the
/// lifecycle engine's approval transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
  pub booking_id: Uuid,
  pub item_id:    Uuid,
  pub booker_id:  Uuid,
  pub start:      DateTime<Utc>,
  pub end:        DateTime<Utc>,
  pub status:     BookingStatus,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
}

impl Booking {
  /// Whether this booking falls into `state` at instant `now`.
  ///
  /// `Current` uses the closed interval `[start, end]`; the half-open form
  /// only governs overlap between two windows.
  pub fn matches_state(&self, state: BookingState, now: DateTime<Utc>) -> bool {
    match state {
      BookingState::All | BookingState::Approved => true,
      BookingState::Current => self.start <= now && now <= self.end,
      BookingState::Past => self.end < now,
      BookingState::Future => self.start > now,
      BookingState::Waiting => self.status == BookingStatus::Waiting,
      BookingState::Rejected => self.status == BookingStatus::Rejected,
    }
  }
}

/// Input to [`crate::store::RentalStore::create_booking_if_free`].
/// The id, `Waiting` status, and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewBooking {
  pub item_id:   Uuid,
  pub booker_id: Uuid,
  pub start:     DateTime<Utc>,
  pub end:       DateTime<Utc>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
