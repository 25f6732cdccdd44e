//! Identity-service rows persisted alongside the records.
//!
//! Photos and comments are stored as the shared record types directly; only
//! the account and session bookkeeping needs store-specific structs.

use chrono::{DateTime, Utc};

use photoshare_shared::UserId;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A signed-up user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user_id: UserId,
    /// Login id; unique, compared case-insensitively.
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Whether the sign-up confirmation code has been accepted.
    pub confirmed: bool,
    /// Outstanding confirmation code, cleared once confirmed.
    pub confirmation_code: Option<String>,
    pub code_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An issued sign-in session.  Only a hash of the bearer token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub token_hash: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
