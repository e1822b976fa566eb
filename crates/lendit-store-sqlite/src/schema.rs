//! SQL schema for the Lendit SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id  TEXT PRIMARY KEY,
    name     TEXT NOT NULL,
    email    TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS items (
    item_id     TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES users(user_id),
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    available   INTEGER NOT NULL  -- 0 | 1; gates new bookings only
);

-- Bookings are append-mostly: the only UPDATE ever issued flips `status`
-- away from 'waiting', exactly once.
CREATE TABLE IF NOT EXISTS bookings (
    booking_id TEXT PRIMARY KEY,
    item_id    TEXT NOT NULL REFERENCES items(item_id),
    booker_id  TEXT NOT NULL REFERENCES users(user_id),
    start_at   TEXT NOT NULL,   -- ISO 8601 UTC
    end_at     TEXT NOT NULL,   -- ISO 8601 UTC; strictly after start_at
    status     TEXT NOT NULL,   -- 'waiting' | 'approved' | 'rejected'
    created_at TEXT NOT NULL,
    CHECK (start_at < end_at)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    item_id    TEXT NOT NULL REFERENCES items(item_id),
    author_id  TEXT NOT NULL REFERENCES users(user_id),
    text       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS bookings_item_status_idx ON bookings(item_id, status);
CREATE INDEX IF NOT EXISTS bookings_booker_idx      ON bookings(booker_id);
CREATE INDEX IF NOT EXISTS bookings_start_idx       ON bookings(start_at);
CREATE INDEX IF NOT EXISTS items_owner_idx          ON items(owner_id);
CREATE INDEX IF NOT EXISTS comments_item_idx        ON comments(item_id);

PRAGMA user_version = 1;
";
