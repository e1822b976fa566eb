//! Error types for `lendit-core`.
//!
//! Every failure the engines can produce maps to exactly one [`ErrorKind`],
//! which the API layer translates into an HTTP status class.

use thiserror::Error;
use uuid::Uuid;

/// The coarse classification of an [`Error`], stable across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A referenced entity does not exist.
  NotFound,
  /// Malformed input: inverted window, unavailable item, not entitled.
  InvalidInput,
  /// Role violation: wrong user for the operation.
  Forbidden,
  /// State invariant violation: overlap, double decision, duplicate email.
  Conflict,
  /// Storage-layer failure.
  Internal,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("there is no user with id {0}")]
  UserNotFound(Uuid),

  #[error("there is no item with id {0}")]
  ItemNotFound(Uuid),

  #[error("there is no booking with id {0}")]
  BookingNotFound(Uuid),

  #[error("booking must end after it starts ({start} >= {end})")]
  WindowEndsBeforeStart {
    start: chrono::DateTime<chrono::Utc>,
    end:   chrono::DateTime<chrono::Utc>,
  },

  #[error("item {0} is not available for booking")]
  ItemUnavailable(Uuid),

  #[error("user {user} owns item {item} and cannot book it")]
  OwnItem { user: Uuid, item: Uuid },

  #[error("the requested window overlaps an active booking for item {0}")]
  WindowConflict(Uuid),

  #[error("booking {0} is not in the waiting state")]
  AlreadyDecided(Uuid),

  /// The acting user on an approve/read does not resolve. Classified as
  /// invalid input, not as a missing resource.
  #[error("there is no such user with id {0}")]
  UnknownActor(Uuid),

  #[error("user {user} is not the owner of item {item}")]
  NotOwner { user: Uuid, item: Uuid },

  #[error("access denied to see booking details for user {0}")]
  NotParticipant(Uuid),

  #[error("user {user} has no completed rental of item {item}")]
  NotEntitled { user: Uuid, item: Uuid },

  #[error("a user with email {0} already exists")]
  EmailTaken(String),

  #[error("user {0} still has items, bookings, or comments")]
  UserInUse(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a storage-backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::UserNotFound(_) | Self::ItemNotFound(_) | Self::BookingNotFound(_) => {
        ErrorKind::NotFound
      }
      Self::WindowEndsBeforeStart { .. }
      | Self::ItemUnavailable(_)
      | Self::UnknownActor(_)
      | Self::NotEntitled { .. } => ErrorKind::InvalidInput,
      Self::OwnItem { .. } | Self::NotOwner { .. } | Self::NotParticipant(_) => {
        ErrorKind::Forbidden
      }
      Self::WindowConflict(_)
      | Self::AlreadyDecided(_)
      | Self::EmailTaken(_)
      | Self::UserInUse(_) => ErrorKind::Conflict,
      Self::Store(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
