use chrono::{Duration, Utc};

use photoshare_shared::{Session, SessionToken, UserId};
use photoshare_store::{Account, Database, StoredSession};

/// Insert a confirmed account with a live session, bypassing sign-up.
pub(crate) fn seed_session(db: &Database, email: &str, token: &str) -> Session {
    let now = Utc::now();
    let user_id = UserId::new();
    db.insert_account(&Account {
        user_id,
        email: email.into(),
        password_hash: "$argon2id$stub".into(),
        confirmed: true,
        confirmation_code: None,
        code_expires_at: None,
        created_at: now,
    })
    .unwrap();

    let token = SessionToken(token.into());
    db.insert_session(&StoredSession {
        token_hash: blake3::hash(token.as_str().as_bytes()).to_hex().to_string(),
        user_id,
        created_at: now,
        expires_at: now + Duration::hours(1),
    })
    .unwrap();

    Session {
        token,
        user_id,
        login_id: email.into(),
        expires_at: now + Duration::hours(1),
    }
}
