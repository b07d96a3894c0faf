//! SQL schema for the Sarathi SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row of recency state per user, overwritten on each answered question.
CREATE TABLE IF NOT EXISTS sessions (
    user_id      TEXT PRIMARY KEY,
    last_query   TEXT NOT NULL DEFAULT '',
    last_shlokas TEXT NOT NULL DEFAULT '[]',   -- JSON array of verse ids
    context      TEXT,                          -- 'topic_menu' or NULL
    top_topics   TEXT NOT NULL DEFAULT '{}',   -- JSON topic -> count map
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

-- Deactivating keeps the row so journey_position survives a re-subscribe.
CREATE TABLE IF NOT EXISTS subscribers (
    user_id          TEXT PRIMARY KEY,
    active           INTEGER NOT NULL DEFAULT 1,
    journey_position INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL
);

-- Rate-limit accounting; rows older than the window are prunable.
CREATE TABLE IF NOT EXISTS messages (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    sent_at TEXT NOT NULL    -- ISO 8601 UTC; lexicographic order is time order
);

-- Append-only analytics events.
CREATE TABLE IF NOT EXISTS events (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    TEXT NOT NULL,
    kind       TEXT NOT NULL,   -- 'message' | 'command' | 'callback' | 'api_failure'
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS messages_user_sent_idx ON messages(user_id, sent_at);
CREATE INDEX IF NOT EXISTS events_created_idx     ON events(created_at);
CREATE INDEX IF NOT EXISTS subscribers_active_idx ON subscribers(active);

PRAGMA user_version = 1;
";
