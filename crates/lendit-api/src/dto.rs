//! Transport representations and the mapping from persisted records.
//!
//! Pure assembly: every DTO is built with a struct literal from records the
//! handlers fetched. Booking responses embed the booker and the item, so the
//! list helpers memoise lookups to avoid refetching shared entities.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lendit_core::{
  Error, Result,
  booking::{Booking, BookingStatus},
  catalog::ItemView,
  comment::Comment,
  item::Item,
  store::RentalStore,
  user::User,
};
use serde::Serialize;
use uuid::Uuid;

// ─── Leaf DTOs ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserDto {
  pub id:    Uuid,
  pub name:  String,
  pub email: String,
}

impl From<User> for UserDto {
  fn from(u: User) -> Self {
    Self { id: u.user_id, name: u.name, email: u.email }
  }
}

#[derive(Debug, Serialize)]
pub struct ItemDto {
  pub id:          Uuid,
  pub owner_id:    Uuid,
  pub name:        String,
  pub description: String,
  pub available:   bool,
}

impl From<Item> for ItemDto {
  fn from(i: Item) -> Self {
    Self {
      id:          i.item_id,
      owner_id:    i.owner_id,
      name:        i.name,
      description: i.description,
      available:   i.available,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct CommentDto {
  pub id:         Uuid,
  pub author_id:  Uuid,
  pub text:       String,
  pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentDto {
  fn from(c: Comment) -> Self {
    Self {
      id:         c.comment_id,
      author_id:  c.author_id,
      text:       c.text,
      created_at: c.created_at,
    }
  }
}

// ─── Composite DTOs ──────────────────────────────────────────────────────────

/// An item with its listing enrichment (owner-only booking neighbors and
/// comments).
#[derive(Debug, Serialize)]
pub struct ItemDetailDto {
  #[serde(flatten)]
  pub item:            ItemDto,
  pub last_booking_id: Option<Uuid>,
  pub next_booking_id: Option<Uuid>,
  pub comments:        Vec<CommentDto>,
}

impl From<ItemView> for ItemDetailDto {
  fn from(v: ItemView) -> Self {
    Self {
      item:            v.item.into(),
      last_booking_id: v.last_booking_id,
      next_booking_id: v.next_booking_id,
      comments:        v.comments.into_iter().map(CommentDto::from).collect(),
    }
  }
}

/// A booking with its booker and item embedded.
#[derive(Debug, Serialize)]
pub struct BookingDto {
  pub id:     Uuid,
  pub start:  DateTime<Utc>,
  pub end:    DateTime<Utc>,
  pub status: BookingStatus,
  pub booker: UserDto,
  pub item:   ItemDto,
}

impl BookingDto {
  fn assemble(booking: Booking, booker: User, item: Item) -> Self {
    Self {
      id:     booking.booking_id,
      start:  booking.start,
      end:    booking.end,
      status: booking.status,
      booker: booker.into(),
      item:   item.into(),
    }
  }
}

// ─── Expansion helpers ───────────────────────────────────────────────────────

/// Expand one booking into its transport form.
pub async fn booking_dto<S: RentalStore>(
  store: &S,
  booking: Booking,
) -> Result<BookingDto> {
  let booker = store
    .get_user(booking.booker_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::UserNotFound(booking.booker_id))?;
  let item = store
    .get_item(booking.item_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ItemNotFound(booking.item_id))?;
  Ok(BookingDto::assemble(booking, booker, item))
}

/// Expand a listing, fetching each distinct booker and item once.
pub async fn booking_dtos<S: RentalStore>(
  store: &S,
  bookings: Vec<Booking>,
) -> Result<Vec<BookingDto>> {
  let mut users: HashMap<Uuid, User> = HashMap::new();
  let mut items: HashMap<Uuid, Item> = HashMap::new();
  let mut out = Vec::with_capacity(bookings.len());

  for booking in bookings {
    if !users.contains_key(&booking.booker_id) {
      let user = store
        .get_user(booking.booker_id)
        .await
        .map_err(Error::store)?
        .ok_or(Error::UserNotFound(booking.booker_id))?;
      users.insert(booking.booker_id, user);
    }
    if !items.contains_key(&booking.item_id) {
      let item = store
        .get_item(booking.item_id)
        .await
        .map_err(Error::store)?
        .ok_or(Error::ItemNotFound(booking.item_id))?;
      items.insert(booking.item_id, item);
    }
    let booker = users[&booking.booker_id].clone();
    let item = items[&booking.item_id].clone();
    out.push(BookingDto::assemble(booking, booker, item));
  }

  Ok(out)
}
