//! Item catalog service: CRUD, substring search, enriched item views, and
//! rental-gated comment creation.
//!
//! Enrichment (last/next approved booking per item, comments) reuses the
//! temporal engine's batch primitives so listing an owner's items stays two
//! booking queries and one comment query, whatever the item count.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  comment::{Comment, NewComment},
  item::{Item, ItemPatch, NewItem},
  store::RentalStore,
  temporal,
};

/// An item plus the listing enrichment computed at read time.
///
/// `last_booking_id`/`next_booking_id` are populated only when the reader is
/// the owner.
#[derive(Debug, Clone)]
pub struct ItemView {
  pub item:            Item,
  pub last_booking_id: Option<Uuid>,
  pub next_booking_id: Option<Uuid>,
  pub comments:        Vec<Comment>,
}

pub async fn create_item<S: RentalStore>(
  store: &S,
  owner_id: Uuid,
  name: String,
  description: String,
  available: bool,
) -> Result<Item> {
  if !store.user_exists(owner_id).await.map_err(Error::store)? {
    return Err(Error::UserNotFound(owner_id));
  }
  store
    .add_item(NewItem { owner_id, name, description, available })
    .await
    .map_err(Error::store)
}

/// Patch name, description, and/or the availability flag. Blank strings are
/// ignored; text fields are stored trimmed.
pub async fn update_item<S: RentalStore>(
  store: &S,
  actor_id: Uuid,
  item_id: Uuid,
  patch: ItemPatch,
) -> Result<Item> {
  if !store.user_exists(actor_id).await.map_err(Error::store)? {
    return Err(Error::UserNotFound(actor_id));
  }

  let patch = ItemPatch {
    name:        patch
      .name
      .map(|s| s.trim().to_owned())
      .filter(|s| !s.is_empty()),
    description: patch
      .description
      .map(|s| s.trim().to_owned())
      .filter(|s| !s.is_empty()),
    available:   patch.available,
  };

  store
    .update_item(item_id, patch)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ItemNotFound(item_id))
}

/// Fetch one item with comments; booking neighbors are revealed to the
/// owner only.
pub async fn get_item<S: RentalStore>(
  store: &S,
  actor_id: Uuid,
  item_id: Uuid,
) -> Result<ItemView> {
  if !store.user_exists(actor_id).await.map_err(Error::store)? {
    return Err(Error::UserNotFound(actor_id));
  }

  let item = store
    .get_item(item_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ItemNotFound(item_id))?;

  let comments = store
    .comments_for_item(item_id)
    .await
    .map_err(Error::store)?;

  let (mut last, mut next) = (None, None);
  if item.owner_id == actor_id {
    let nearest =
      temporal::nearest_for_items(store, &[item_id], Utc::now()).await?;
    last = nearest.last_id(item_id);
    next = nearest.next_id(item_id);
  }

  Ok(ItemView {
    item,
    last_booking_id: last,
    next_booking_id: next,
    comments,
  })
}

/// All of an owner's items, enriched in batch.
pub async fn list_owner_items<S: RentalStore>(
  store: &S,
  owner_id: Uuid,
) -> Result<Vec<ItemView>> {
  let items = store.items_by_owner(owner_id).await.map_err(Error::store)?;
  if items.is_empty() {
    return Ok(Vec::new());
  }

  let item_ids: Vec<Uuid> = items.iter().map(|i| i.item_id).collect();
  let nearest = temporal::nearest_for_items(store, &item_ids, Utc::now()).await?;

  let mut comments_by_item: HashMap<Uuid, Vec<Comment>> = HashMap::new();
  for comment in store
    .comments_for_items(&item_ids)
    .await
    .map_err(Error::store)?
  {
    comments_by_item.entry(comment.item_id).or_default().push(comment);
  }

  Ok(
    items
      .into_iter()
      .map(|item| {
        let id = item.item_id;
        ItemView {
          item,
          last_booking_id: nearest.last_id(id),
          next_booking_id: nearest.next_id(id),
          comments: comments_by_item.remove(&id).unwrap_or_default(),
        }
      })
      .collect(),
  )
}

/// Substring search over available items. A blank query short-circuits to an
/// empty result without touching the store.
pub async fn search_items<S: RentalStore>(
  store: &S,
  actor_id: Uuid,
  text: &str,
) -> Result<Vec<Item>> {
  let text = text.trim();
  if text.is_empty() {
    return Ok(Vec::new());
  }
  if !store.user_exists(actor_id).await.map_err(Error::store)? {
    return Err(Error::UserNotFound(actor_id));
  }
  store.search_available(text).await.map_err(Error::store)
}

/// Leave feedback on an item. Requires a completed approved rental of the
/// item by the author.
pub async fn add_comment<S: RentalStore>(
  store: &S,
  author_id: Uuid,
  item_id: Uuid,
  text: String,
) -> Result<Comment> {
  if store
    .get_item(item_id)
    .await
    .map_err(Error::store)?
    .is_none()
  {
    return Err(Error::ItemNotFound(item_id));
  }
  if !store.user_exists(author_id).await.map_err(Error::store)? {
    return Err(Error::UserNotFound(author_id));
  }

  temporal::ensure_completed_rental(store, item_id, author_id, Utc::now()).await?;

  store
    .add_comment(NewComment { item_id, author_id, text })
    .await
    .map_err(Error::store)
}
