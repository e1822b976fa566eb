//! User — an account that can own items and book other users' items.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user. The id is immutable once created; name and email can
/// be patched. Emails are unique store-wide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id: Uuid,
  pub name:    String,
  pub email:   String,
}

/// Input to [`crate::store::RentalStore::add_user`].
/// The id is always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:  String,
  pub email: String,
}

/// Partial update for a user. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
  pub name:  Option<String>,
  pub email: Option<String>,
}
