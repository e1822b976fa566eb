//! Comment — feedback left on an item by a user who has completed a rental.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub item_id:    Uuid,
  pub author_id:  Uuid,
  pub text:       String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::RentalStore::add_comment`].
/// Eligibility (a completed approved rental) is checked by the catalog
/// service before this ever reaches the store.
#[derive(Debug, Clone)]
pub struct NewComment {
  pub item_id:   Uuid,
  pub author_id: Uuid,
  pub text:      String,
}
