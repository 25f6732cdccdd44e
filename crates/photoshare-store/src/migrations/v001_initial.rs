//! v001 -- Initial schema creation.
//!
//! Creates `accounts`, `sessions`, `photos` and `comments`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Accounts (identity service)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    user_id           TEXT PRIMARY KEY NOT NULL,         -- UUID v4
    email             TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash     TEXT NOT NULL,                     -- Argon2id PHC string
    confirmed         INTEGER NOT NULL DEFAULT 0,        -- boolean 0/1
    confirmation_code TEXT,                              -- NULL once confirmed
    code_expires_at   TEXT,
    created_at        TEXT NOT NULL                      -- RFC-3339
);

-- ----------------------------------------------------------------
-- Sessions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY NOT NULL,   -- BLAKE3 of the bearer token
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES accounts(user_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);

-- ----------------------------------------------------------------
-- Photos
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS photos (
    id          TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    user_id     TEXT NOT NULL,               -- owner
    title       TEXT NOT NULL,
    description TEXT,
    s3_key      TEXT NOT NULL UNIQUE,
    uploaded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_photos_uploaded_at ON photos(uploaded_at DESC);

-- ----------------------------------------------------------------
-- Comments
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    photo_id   TEXT NOT NULL,               -- FK -> photos(id)
    user_id    TEXT NOT NULL,               -- author
    username   TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_photo_created
    ON comments(photo_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
