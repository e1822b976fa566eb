//! User account service — plain CRUD over the store, with email uniqueness
//! surfaced as a conflict.

use uuid::Uuid;

use crate::{
  Error, Result,
  store::RentalStore,
  user::{NewUser, User, UserPatch},
};

pub async fn create_user<S: RentalStore>(store: &S, input: NewUser) -> Result<User> {
  let email = input.email.clone();
  store
    .add_user(input)
    .await
    .map_err(Error::store)?
    .ok_or(Error::EmailTaken(email))
}

pub async fn get_user<S: RentalStore>(store: &S, id: Uuid) -> Result<User> {
  store
    .get_user(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::UserNotFound(id))
}

pub async fn list_users<S: RentalStore>(store: &S) -> Result<Vec<User>> {
  store.list_users().await.map_err(Error::store)
}

/// Patch name and/or email. Blank strings are treated as absent, matching
/// the inherited update semantics.
pub async fn update_user<S: RentalStore>(
  store: &S,
  id: Uuid,
  patch: UserPatch,
) -> Result<User> {
  if !store.user_exists(id).await.map_err(Error::store)? {
    return Err(Error::UserNotFound(id));
  }

  let patch = UserPatch {
    name:  patch.name.filter(|s| !s.trim().is_empty()),
    email: patch.email.filter(|s| !s.trim().is_empty()),
  };
  let wanted_email = patch.email.clone();

  match store.update_user(id, patch).await.map_err(Error::store)? {
    Some(user) => Ok(user),
    // The row existed a moment ago; a `None` here means the email collided
    // (or the user vanished concurrently, which reports the same way).
    None => match wanted_email {
      Some(email) => Err(Error::EmailTaken(email)),
      None => Err(Error::UserNotFound(id)),
    },
  }
}

/// Deleting an absent user is a no-op, not an error. A user still referenced
/// by items, bookings, or comments stays, and the caller gets a conflict.
pub async fn delete_user<S: RentalStore>(store: &S, id: Uuid) -> Result<()> {
  if store.delete_user(id).await.map_err(Error::store)? {
    Ok(())
  } else {
    Err(Error::UserInUse(id))
  }
}
