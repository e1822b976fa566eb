//! Item — something a user has listed for rent.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A listed item, owned by exactly one user.
///
/// `available` is a manually-set flag, independent of booking state: an item
/// can be `available = true` while fully booked for a window. It only gates
/// whether *new* bookings may reference the item at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
  pub item_id:     Uuid,
  pub owner_id:    Uuid,
  pub name:        String,
  pub description: String,
  pub available:   bool,
}

/// Input to [`crate::store::RentalStore::add_item`].
#[derive(Debug, Clone)]
pub struct NewItem {
  pub owner_id:    Uuid,
  pub name:        String,
  pub description: String,
  pub available:   bool,
}

/// Partial update for an item. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub available:   Option<bool>,
}
