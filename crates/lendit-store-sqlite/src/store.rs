//! [`SqliteStore`] — the SQLite implementation of [`RentalStore`].
//!
//! Every method submits one closure to the single connection thread. The two
//! operations with atomicity contracts (`create_booking_if_free`,
//! `decide_booking`) do their check and their write inside that one closure,
//! so no other store operation can observe or create an intermediate state.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use lendit_core::{
  booking::{Booking, BookingStatus, NewBooking},
  comment::{Comment, NewComment},
  item::{Item, ItemPatch, NewItem},
  store::{BookingQuery, Party, RentalStore},
  user::{NewUser, User, UserPatch},
};

use crate::{
  Error, Result,
  encode::{
    RawBooking, RawComment, RawItem, RawUser, encode_dt, encode_status,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id: row.get(0)?,
    name:    row.get(1)?,
    email:   row.get(2)?,
  })
}

fn item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawItem> {
  Ok(RawItem {
    item_id:     row.get(0)?,
    owner_id:    row.get(1)?,
    name:        row.get(2)?,
    description: row.get(3)?,
    available:   row.get(4)?,
  })
}

fn booking_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawBooking> {
  Ok(RawBooking {
    booking_id: row.get(0)?,
    item_id:    row.get(1)?,
    booker_id:  row.get(2)?,
    start_at:   row.get(3)?,
    end_at:     row.get(4)?,
    status:     row.get(5)?,
    created_at: row.get(6)?,
  })
}

fn comment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawComment> {
  Ok(RawComment {
    comment_id: row.get(0)?,
    item_id:    row.get(1)?,
    author_id:  row.get(2)?,
    text:       row.get(3)?,
    created_at: row.get(4)?,
  })
}

const BOOKING_COLS: &str =
  "booking_id, item_id, booker_id, start_at, end_at, status, created_at";

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lendit rental store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RentalStore impl ────────────────────────────────────────────────────────

impl RentalStore for SqliteStore {
  type Error = Error;

  // ── Users ───────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<Option<User>> {
    let user = User {
      user_id: Uuid::new_v4(),
      name:    input.name,
      email:   input.email,
    };

    let id_str = encode_uuid(user.user_id);
    let name = user.name.clone();
    let email = user.email.clone();

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          "INSERT INTO users (user_id, name, email) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, email],
        );
        match res {
          Ok(_) => Ok(true),
          // UNIQUE(email) is the store-level backstop for duplicates.
          Err(e) if is_constraint_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(inserted.then_some(user))
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, name, email FROM users WHERE user_id = ?1",
              rusqlite::params![id_str],
              user_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn user_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?1)",
            rusqlite::params![id_str],
            |row| row.get(0),
          )?)
        })
        .await?,
    )
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT user_id, name, email FROM users")?;
        let rows = stmt
          .query_map([], user_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            "SELECT user_id, name, email FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            user_row,
          )
          .optional()?;
        let Some(mut raw) = existing else {
          return Ok(None);
        };

        if let Some(name) = patch.name {
          raw.name = name;
        }
        if let Some(email) = patch.email {
          let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 AND user_id != ?2)",
            rusqlite::params![email, id_str],
            |row| row.get(0),
          )?;
          if taken {
            return Ok(None);
          }
          raw.email = email;
        }

        conn.execute(
          "UPDATE users SET name = ?2, email = ?3 WHERE user_id = ?1",
          rusqlite::params![id_str, raw.name, raw.email],
        )?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted: bool = self
      .conn
      .call(move |conn| {
        let res = conn
          .execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id_str]);
        match res {
          Ok(_) => Ok(true),
          // Foreign keys from items/bookings/comments keep the row alive.
          Err(e) if is_constraint_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;
    Ok(deleted)
  }

  // ── Items ───────────────────────────────────────────────────────────────

  async fn add_item(&self, input: NewItem) -> Result<Item> {
    let item = Item {
      item_id:     Uuid::new_v4(),
      owner_id:    input.owner_id,
      name:        input.name,
      description: input.description,
      available:   input.available,
    };

    let id_str = encode_uuid(item.item_id);
    let owner_str = encode_uuid(item.owner_id);
    let name = item.name.clone();
    let description = item.description.clone();
    let available = item.available;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO items (item_id, owner_id, name, description, available)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, owner_str, name, description, available],
        )?;
        Ok(())
      })
      .await?;

    Ok(item)
  }

  async fn get_item(&self, id: Uuid) -> Result<Option<Item>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT item_id, owner_id, name, description, available
               FROM items WHERE item_id = ?1",
              rusqlite::params![id_str],
              item_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawItem::into_item).transpose()
  }

  async fn update_item(&self, id: Uuid, patch: ItemPatch) -> Result<Option<Item>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        let existing = conn
          .query_row(
            "SELECT item_id, owner_id, name, description, available
             FROM items WHERE item_id = ?1",
            rusqlite::params![id_str],
            item_row,
          )
          .optional()?;
        let Some(mut raw) = existing else {
          return Ok(None);
        };

        if let Some(name) = patch.name {
          raw.name = name;
        }
        if let Some(description) = patch.description {
          raw.description = description;
        }
        if let Some(available) = patch.available {
          raw.available = available;
        }

        conn.execute(
          "UPDATE items SET name = ?2, description = ?3, available = ?4
           WHERE item_id = ?1",
          rusqlite::params![id_str, raw.name, raw.description, raw.available],
        )?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawItem::into_item).transpose()
  }

  async fn items_by_owner(&self, owner_id: Uuid) -> Result<Vec<Item>> {
    let owner_str = encode_uuid(owner_id);

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT item_id, owner_id, name, description, available
           FROM items WHERE owner_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], item_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawItem::into_item).collect()
  }

  async fn search_available(&self, text: &str) -> Result<Vec<Item>> {
    let pattern = format!("%{}%", text.to_lowercase());

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT item_id, owner_id, name, description, available
           FROM items
           WHERE available = 1
             AND (LOWER(name) LIKE ?1 OR LOWER(description) LIKE ?1)",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern], item_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawItem::into_item).collect()
  }

  // ── Bookings ────────────────────────────────────────────────────────────

  async fn create_booking_if_free(
    &self,
    input: NewBooking,
    blocking: &[BookingStatus],
  ) -> Result<Option<Booking>> {
    let booking = Booking {
      booking_id: Uuid::new_v4(),
      item_id:    input.item_id,
      booker_id:  input.booker_id,
      start:      input.start,
      end:        input.end,
      status:     BookingStatus::Waiting,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(booking.booking_id);
    let item_str = encode_uuid(booking.item_id);
    let booker_str = encode_uuid(booking.booker_id);
    let start_str = encode_dt(booking.start);
    let end_str = encode_dt(booking.end);
    let status_str = encode_status(booking.status).to_owned();
    let created_str = encode_dt(booking.created_at);
    let statuses: Vec<String> =
      blocking.iter().map(|s| encode_status(*s).to_owned()).collect();

    // Overlap check and insert run in one closure on the connection thread;
    // no other booking write can interleave between them.
    let inserted: bool = self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
          "SELECT EXISTS(
             SELECT 1 FROM bookings
             WHERE item_id = ? AND status IN ({placeholders})
               AND start_at < ? AND end_at > ?
           )"
        );
        let mut params: Vec<String> = Vec::with_capacity(statuses.len() + 3);
        params.push(item_str.clone());
        params.extend(statuses);
        params.push(end_str.clone());
        params.push(start_str.clone());

        let overlapping: bool =
          conn.query_row(&sql, rusqlite::params_from_iter(params), |row| row.get(0))?;
        if overlapping {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO bookings
             (booking_id, item_id, booker_id, start_at, end_at, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, item_str, booker_str, start_str, end_str, status_str,
            created_str,
          ],
        )?;
        Ok(true)
      })
      .await?;

    Ok(inserted.then_some(booking))
  }

  async fn has_overlap(
    &self,
    item_id: Uuid,
    blocking: &[BookingStatus],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Result<bool> {
    let item_str = encode_uuid(item_id);
    let start_str = encode_dt(start);
    let end_str = encode_dt(end);
    let statuses: Vec<String> =
      blocking.iter().map(|s| encode_status(*s).to_owned()).collect();

    Ok(
      self
        .conn
        .call(move |conn| {
          let placeholders = vec!["?"; statuses.len()].join(", ");
          let sql = format!(
            "SELECT EXISTS(
               SELECT 1 FROM bookings
               WHERE item_id = ? AND status IN ({placeholders})
                 AND start_at < ? AND end_at > ?
             )"
          );
          let mut params: Vec<String> = Vec::with_capacity(statuses.len() + 3);
          params.push(item_str);
          params.extend(statuses);
          params.push(end_str);
          params.push(start_str);

          Ok(conn.query_row(&sql, rusqlite::params_from_iter(params), |row| {
            row.get(0)
          })?)
        })
        .await?,
    )
  }

  async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawBooking> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {BOOKING_COLS} FROM bookings WHERE booking_id = ?1"),
              rusqlite::params![id_str],
              booking_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBooking::into_booking).transpose()
  }

  async fn decide_booking(
    &self,
    id: Uuid,
    to: BookingStatus,
  ) -> Result<Option<Booking>> {
    let id_str = encode_uuid(id);
    let to_str = encode_status(to).to_owned();

    // Conditional UPDATE as a compare-and-set: of two concurrent decisions
    // exactly one sees `changed == 1`.
    let raw: Option<RawBooking> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE bookings SET status = ?2
           WHERE booking_id = ?1 AND status = 'waiting'",
          rusqlite::params![id_str, to_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              &format!("SELECT {BOOKING_COLS} FROM bookings WHERE booking_id = ?1"),
              rusqlite::params![id_str],
              booking_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBooking::into_booking).transpose()
  }

  async fn list_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>> {
    let (base_sql, id_str) = match query.party {
      Party::Booker(id) => (
        format!(
          "SELECT {BOOKING_COLS} FROM bookings
           WHERE booker_id = ?1 ORDER BY start_at DESC"
        ),
        encode_uuid(id),
      ),
      Party::Owner(id) => (
        format!(
          "SELECT b.booking_id, b.item_id, b.booker_id, b.start_at, b.end_at,
                  b.status, b.created_at
           FROM bookings b
           JOIN items i ON i.item_id = b.item_id
           WHERE i.owner_id = ?1 ORDER BY b.start_at DESC"
        ),
        encode_uuid(id),
      ),
    };
    let page = query.page;

    let raws: Vec<RawBooking> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(p) = page {
          // Page and size are caller-supplied; the offset must not overflow.
          let limit = i64::try_from(p.size).unwrap_or(i64::MAX);
          let offset =
            i64::try_from(p.number.saturating_mul(p.size)).unwrap_or(i64::MAX);
          let sql = format!("{base_sql} LIMIT ?2 OFFSET ?3");
          let mut stmt = conn.prepare(&sql)?;
          stmt
            .query_map(rusqlite::params![id_str, limit, offset], booking_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&base_sql)?;
          stmt
            .query_map(rusqlite::params![id_str], booking_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBooking::into_booking).collect()
  }

  async fn last_approved_for_items(
    &self,
    item_ids: &[Uuid],
    now: DateTime<Utc>,
  ) -> Result<Vec<Booking>> {
    self
      .approved_neighbors(
        item_ids,
        now,
        "end_at < ?",
        "ORDER BY end_at DESC",
      )
      .await
  }

  async fn next_approved_for_items(
    &self,
    item_ids: &[Uuid],
    now: DateTime<Utc>,
  ) -> Result<Vec<Booking>> {
    self
      .approved_neighbors(
        item_ids,
        now,
        "start_at > ?",
        "ORDER BY start_at ASC",
      )
      .await
  }

  async fn completed_rental_exists(
    &self,
    item_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<bool> {
    let item_str = encode_uuid(item_id);
    let user_str = encode_uuid(user_id);
    let now_str = encode_dt(now);

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(
            "SELECT EXISTS(
               SELECT 1 FROM bookings
               WHERE item_id = ?1 AND booker_id = ?2
                 AND status = 'approved' AND end_at < ?3
             )",
            rusqlite::params![item_str, user_str, now_str],
            |row| row.get(0),
          )?)
        })
        .await?,
    )
  }

  // ── Comments ────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      item_id:    input.item_id,
      author_id:  input.author_id,
      text:       input.text,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(comment.comment_id);
    let item_str = encode_uuid(comment.item_id);
    let author_str = encode_uuid(comment.author_id);
    let text = comment.text.clone();
    let created_str = encode_dt(comment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (comment_id, item_id, author_id, text, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, item_str, author_str, text, created_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn comments_for_item(&self, item_id: Uuid) -> Result<Vec<Comment>> {
    let item_str = encode_uuid(item_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT comment_id, item_id, author_id, text, created_at
           FROM comments WHERE item_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![item_str], comment_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn comments_for_items(&self, item_ids: &[Uuid]) -> Result<Vec<Comment>> {
    let ids: Vec<String> = item_ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
          "SELECT comment_id, item_id, author_id, text, created_at
           FROM comments WHERE item_id IN ({placeholders})
           ORDER BY created_at"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(ids), comment_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }
}

impl SqliteStore {
  /// Shared body of the last/next approved-neighbor batch queries. The
  /// caller's ordering clause makes the first returned row per item the
  /// nearest one.
  async fn approved_neighbors(
    &self,
    item_ids: &[Uuid],
    now: DateTime<Utc>,
    bound: &'static str,
    order: &'static str,
  ) -> Result<Vec<Booking>> {
    let ids: Vec<String> = item_ids.iter().copied().map(encode_uuid).collect();
    let now_str = encode_dt(now);

    let raws: Vec<RawBooking> = self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
          "SELECT {BOOKING_COLS} FROM bookings
           WHERE status = 'approved' AND {bound} AND item_id IN ({placeholders})
           {order}"
        );
        let mut params: Vec<String> = Vec::with_capacity(ids.len() + 1);
        params.push(now_str);
        params.extend(ids);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), booking_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBooking::into_booking).collect()
  }
}
