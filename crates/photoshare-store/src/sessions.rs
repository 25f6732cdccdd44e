use chrono::{DateTime, Utc};
use rusqlite::params;

use photoshare_shared::UserId;

use crate::database::{ts_from_sql, ts_to_sql, uuid_from_sql, Database};
use crate::error::Result;
use crate::models::StoredSession;

impl Database {
    pub fn insert_session(&self, session: &StoredSession) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token_hash,
                session.user_id.to_string(),
                ts_to_sql(&session.created_at),
                ts_to_sql(&session.expires_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_session(&self, token_hash: &str) -> Result<StoredSession> {
        let session = self.conn().query_row(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions WHERE token_hash = ?1",
            params![token_hash],
            |row| {
                let token_hash: String = row.get(0)?;
                let user_str: String = row.get(1)?;
                let created_str: String = row.get(2)?;
                let expires_str: String = row.get(3)?;

                Ok(StoredSession {
                    token_hash,
                    user_id: UserId(uuid_from_sql(1, &user_str)?),
                    created_at: ts_from_sql(2, &created_str)?,
                    expires_at: ts_from_sql(3, &expires_str)?,
                })
            },
        )?;
        Ok(session)
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE token_hash = ?1",
            params![token_hash],
        )?;
        Ok(affected > 0)
    }

    /// Drop every session that expired before `now`; returns how many.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![ts_to_sql(&now)],
        )?;
        Ok(affected)
    }
}
