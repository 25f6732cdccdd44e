use chrono::{DateTime, Utc};
use rusqlite::params;

use photoshare_shared::UserId;

use crate::database::{ts_from_sql, ts_to_sql, uuid_from_sql, Database};
use crate::error::Result;
use crate::models::Account;

const ACCOUNT_COLUMNS: &str =
    "user_id, email, password_hash, confirmed, confirmation_code, code_expires_at, created_at";

impl Database {
    pub fn insert_account(&self, account: &Account) -> Result<()> {
        self.conn().execute(
            "INSERT INTO accounts
                (user_id, email, password_hash, confirmed, confirmation_code, code_expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                account.user_id.to_string(),
                account.email,
                account.password_hash,
                account.confirmed as i32,
                account.confirmation_code,
                account.code_expires_at.as_ref().map(ts_to_sql),
                ts_to_sql(&account.created_at),
            ],
        )?;
        Ok(())
    }

    /// Look up an account by email (case-insensitive).
    pub fn get_account_by_email(&self, email: &str) -> Result<Account> {
        let account = self.conn().query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
            params![email],
            row_to_account,
        )?;
        Ok(account)
    }

    pub fn get_account(&self, user_id: UserId) -> Result<Account> {
        let account = self.conn().query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = ?1"),
            params![user_id.to_string()],
            row_to_account,
        )?;
        Ok(account)
    }

    /// Mark the account confirmed and drop its outstanding code.
    pub fn confirm_account(&self, user_id: UserId) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE accounts
             SET confirmed = 1, confirmation_code = NULL, code_expires_at = NULL
             WHERE user_id = ?1",
            params![user_id.to_string()],
        )?;
        Ok(affected > 0)
    }

    /// Restart confirmation of an unconfirmed account with a new password
    /// hash and code.  Returns `false` once the account is confirmed.
    pub fn restart_confirmation(
        &self,
        user_id: UserId,
        password_hash: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE accounts SET password_hash = ?1, confirmation_code = ?2, code_expires_at = ?3
             WHERE user_id = ?4 AND confirmed = 0",
            params![
                password_hash,
                code,
                ts_to_sql(&expires_at),
                user_id.to_string()
            ],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let user_str: String = row.get(0)?;
    let email: String = row.get(1)?;
    let password_hash: String = row.get(2)?;
    let confirmed_int: i32 = row.get(3)?;
    let confirmation_code: Option<String> = row.get(4)?;
    let code_expires_str: Option<String> = row.get(5)?;
    let created_str: String = row.get(6)?;

    let code_expires_at = match code_expires_str {
        Some(s) => Some(ts_from_sql(5, &s)?),
        None => None,
    };

    Ok(Account {
        user_id: UserId(uuid_from_sql(0, &user_str)?),
        email,
        password_hash,
        confirmed: confirmed_int != 0,
        confirmation_code,
        code_expires_at,
        created_at: ts_from_sql(6, &created_str)?,
    })
}
