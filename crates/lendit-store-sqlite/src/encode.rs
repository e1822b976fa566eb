//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings, which keeps their
//! lexicographic order consistent with chronological order — the temporal
//! queries compare them directly in SQL. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, Utc};
use lendit_core::{
  booking::{Booking, BookingStatus},
  comment::Comment,
  item::Item,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── BookingStatus ────────────────────────────────────────────────────────────

pub fn encode_status(s: BookingStatus) -> &'static str {
  match s {
    BookingStatus::Waiting => "waiting",
    BookingStatus::Approved => "approved",
    BookingStatus::Rejected => "rejected",
  }
}

pub fn decode_status(s: &str) -> Result<BookingStatus> {
  match s {
    "waiting" => Ok(BookingStatus::Waiting),
    "approved" => Ok(BookingStatus::Approved),
    "rejected" => Ok(BookingStatus::Rejected),
    other => Err(Error::UnknownStatus(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id: String,
  pub name:    String,
  pub email:   String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id: decode_uuid(&self.user_id)?,
      name:    self.name,
      email:   self.email,
    })
  }
}

/// Raw values read directly from an `items` row.
pub struct RawItem {
  pub item_id:     String,
  pub owner_id:    String,
  pub name:        String,
  pub description: String,
  pub available:   bool,
}

impl RawItem {
  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      item_id:     decode_uuid(&self.item_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      name:        self.name,
      description: self.description,
      available:   self.available,
    })
  }
}

/// Raw strings read directly from a `bookings` row.
pub struct RawBooking {
  pub booking_id: String,
  pub item_id:    String,
  pub booker_id:  String,
  pub start_at:   String,
  pub end_at:     String,
  pub status:     String,
  pub created_at: String,
}

impl RawBooking {
  pub fn into_booking(self) -> Result<Booking> {
    Ok(Booking {
      booking_id: decode_uuid(&self.booking_id)?,
      item_id:    decode_uuid(&self.item_id)?,
      booker_id:  decode_uuid(&self.booker_id)?,
      start:      decode_dt(&self.start_at)?,
      end:        decode_dt(&self.end_at)?,
      status:     decode_status(&self.status)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub comment_id: String,
  pub item_id:    String,
  pub author_id:  String,
  pub text:       String,
  pub created_at: String,
}

impl RawComment {
  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      item_id:    decode_uuid(&self.item_id)?,
      author_id:  decode_uuid(&self.author_id)?,
      text:       self.text,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
