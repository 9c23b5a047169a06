//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `users`, `tasks`, `wishes` and
//! `shared_wishes`. Timestamps are fixed-width RFC 3339 UTC strings
//! (microsecond precision) so that text comparison matches time order.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL,
    password_hash TEXT NOT NULL,               -- argon2id PHC string
    email         TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    deleted_at    TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users(username);
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email);

-- ----------------------------------------------------------------
-- Tasks
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS tasks (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id         INTEGER NOT NULL,
    event            TEXT NOT NULL,
    description      TEXT NOT NULL DEFAULT '',
    completed        INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    is_cycle         INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    importance_level INTEGER NOT NULL DEFAULT 0
        CHECK (importance_level BETWEEN 0 AND 5),
    completed_at     TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    deleted_at       TEXT,

    CHECK ((completed = 1) = (completed_at IS NOT NULL))
);

-- ----------------------------------------------------------------
-- Wishes
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS wishes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id    INTEGER NOT NULL,
    event       TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    is_cycle    INTEGER NOT NULL DEFAULT 0,
    is_shared   INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT
);

-- ----------------------------------------------------------------
-- Shared wishes (community pool, immutable snapshots)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS shared_wishes (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    original_wish_id INTEGER,                 -- provenance only, no FK
    event            TEXT NOT NULL,
    description      TEXT NOT NULL DEFAULT '',
    shared_by_id     INTEGER,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,
    deleted_at       TEXT
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
