//! Local identity service: sign-up with emailed confirmation code, sign-in
//! issuing bearer sessions, and session resolution for the data API.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use rand::{Rng, RngCore};
use regex::Regex;
use subtle::ConstantTimeEq;

use photoshare_shared::constants::CONFIRMATION_CODE_LEN;
use photoshare_shared::{
    ApiError, ApiResult, IdentityService, Session, SessionToken, SignUpOutcome, UserId,
};
use photoshare_store::{Account, Database, StoreError, StoredSession};

use crate::delivery::CodeDelivery;
use crate::error::{lock_db, store_error};
use crate::password;

const BAD_CREDENTIALS: &str = "Incorrect username or password.";
const ACCOUNT_EXISTS: &str = "An account with the given email already exists.";

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("hardcoded email regex is valid")
});

/// The identity behind a resolved session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub login_id: String,
}

pub struct LocalIdentity {
    db: Arc<Mutex<Database>>,
    delivery: Arc<dyn CodeDelivery>,
    session_ttl: Duration,
    code_ttl: Duration,
}

impl LocalIdentity {
    pub fn new(
        db: Arc<Mutex<Database>>,
        delivery: Arc<dyn CodeDelivery>,
        session_ttl_secs: i64,
        code_ttl_secs: i64,
    ) -> Self {
        Self {
            db,
            delivery,
            session_ttl: Duration::seconds(session_ttl_secs),
            code_ttl: Duration::seconds(code_ttl_secs),
        }
    }

    fn issue_session(&self, account: &Account) -> ApiResult<Session> {
        let token = generate_token();
        let now = Utc::now();
        let stored = StoredSession {
            token_hash: hash_token(&token),
            user_id: account.user_id,
            created_at: now,
            expires_at: now + self.session_ttl,
        };

        let db = lock_db(&self.db)?;
        match db.purge_expired_sessions(now) {
            Ok(0) => {}
            Ok(n) => tracing::debug!(purged = n, "Expired sessions removed"),
            Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
        }
        db.insert_session(&stored).map_err(store_error)?;

        Ok(Session {
            token,
            user_id: account.user_id,
            login_id: account.email.clone(),
            expires_at: stored.expires_at,
        })
    }
}

/// Resolve the bearer token of `session` against the session table.
///
/// Unknown, revoked and expired tokens resolve to `None`; the identity comes
/// from the stored rows, never from the fields the client sent.
pub(crate) fn resolve_caller(db: &Database, session: &Session) -> ApiResult<Option<Caller>> {
    let stored = match db.get_session(&hash_token(&session.token)) {
        Ok(stored) => stored,
        Err(StoreError::NotFound) => return Ok(None),
        Err(e) => return Err(store_error(e)),
    };
    if stored.expires_at <= Utc::now() {
        return Ok(None);
    }

    match db.get_account(stored.user_id) {
        Ok(account) => Ok(Some(Caller {
            user_id: account.user_id,
            login_id: account.email,
        })),
        Err(StoreError::NotFound) => Ok(None),
        Err(e) => Err(store_error(e)),
    }
}

#[async_trait]
impl IdentityService for LocalIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> ApiResult<SignUpOutcome> {
        let email = normalize_email(email)?;
        password::validate_password_strength(password)?;

        // an unconfirmed account may sign up again and gets a fresh code
        let pending = {
            let db = lock_db(&self.db)?;
            match db.get_account_by_email(&email) {
                Ok(account) if account.confirmed => {
                    return Err(ApiError::validation(ACCOUNT_EXISTS));
                }
                Ok(account) => Some(account.user_id),
                Err(StoreError::NotFound) => None,
                Err(e) => return Err(store_error(e)),
            }
        };

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .map_err(|e| ApiError::backend(format!("hashing task failed: {e}")))??;

        let code = generate_code();
        let now = Utc::now();
        let code_expires_at = now + self.code_ttl;

        let user_id = match pending {
            Some(user_id) => {
                let db = lock_db(&self.db)?;
                let restarted = db
                    .restart_confirmation(user_id, &password_hash, &code, code_expires_at)
                    .map_err(store_error)?;
                if !restarted {
                    // confirmed in the meantime
                    return Err(ApiError::validation(ACCOUNT_EXISTS));
                }
                tracing::info!(user_id = %user_id, "Confirmation restarted with a new code");
                user_id
            }
            None => {
                let account = Account {
                    user_id: UserId::new(),
                    email: email.clone(),
                    password_hash,
                    confirmed: false,
                    confirmation_code: Some(code.clone()),
                    code_expires_at: Some(code_expires_at),
                    created_at: now,
                };
                let db = lock_db(&self.db)?;
                db.insert_account(&account).map_err(|e| match e {
                    StoreError::Constraint(_) => ApiError::validation(ACCOUNT_EXISTS),
                    other => store_error(other),
                })?;
                tracing::info!(user_id = %account.user_id, "Account created, awaiting confirmation");
                account.user_id
            }
        };

        self.delivery.deliver(&email, &code).await?;

        Ok(SignUpOutcome {
            user_id,
            destination: mask_email(&email),
        })
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> ApiResult<()> {
        let email = normalize_email(email)?;
        let db = lock_db(&self.db)?;

        let account = match db.get_account_by_email(&email) {
            Ok(account) => account,
            Err(StoreError::NotFound) => return Err(ApiError::not_found("Account", &email)),
            Err(e) => return Err(store_error(e)),
        };

        if account.confirmed {
            tracing::debug!(user_id = %account.user_id, "Account already confirmed");
            return Ok(());
        }

        let expected = account.confirmation_code.as_deref().unwrap_or_default();
        let matches: bool = code.trim().as_bytes().ct_eq(expected.as_bytes()).into();
        if expected.is_empty() || !matches {
            tracing::debug!(user_id = %account.user_id, "Confirmation code mismatch");
            return Err(ApiError::Unconfirmed(
                "Invalid verification code provided, please try again.".into(),
            ));
        }
        if account.code_expires_at.map_or(true, |t| t <= Utc::now()) {
            return Err(ApiError::Unconfirmed(
                "Confirmation code has expired, please sign up again.".into(),
            ));
        }

        db.confirm_account(account.user_id).map_err(store_error)?;
        tracing::info!(user_id = %account.user_id, "Account confirmed");
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        let email = normalize_email(email)
            .map_err(|_| ApiError::authorization(BAD_CREDENTIALS))?;

        let account = {
            let db = lock_db(&self.db)?;
            match db.get_account_by_email(&email) {
                Ok(account) => account,
                Err(StoreError::NotFound) => return Err(ApiError::authorization(BAD_CREDENTIALS)),
                Err(e) => return Err(store_error(e)),
            }
        };

        let password = password.to_string();
        let hash = account.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await
            .map_err(|e| ApiError::backend(format!("verification task failed: {e}")))??;
        if !valid {
            tracing::debug!(user_id = %account.user_id, "Sign-in rejected");
            return Err(ApiError::authorization(BAD_CREDENTIALS));
        }
        if !account.confirmed {
            return Err(ApiError::Unconfirmed("User is not confirmed.".into()));
        }

        let session = self.issue_session(&account)?;
        tracing::info!(user_id = %account.user_id, "Signed in");
        Ok(session)
    }

    async fn sign_out(&self, token: &SessionToken) -> ApiResult<()> {
        let db = lock_db(&self.db)?;
        let removed = db.delete_session(&hash_token(token)).map_err(store_error)?;
        tracing::debug!(removed, "Signed out");
        Ok(())
    }

    async fn resolve_session(&self, token: &SessionToken) -> ApiResult<Option<Session>> {
        let db = lock_db(&self.db)?;
        let stored = match db.get_session(&hash_token(token)) {
            Ok(stored) => stored,
            Err(StoreError::NotFound) => return Ok(None),
            Err(e) => return Err(store_error(e)),
        };
        if stored.expires_at <= Utc::now() {
            db.delete_session(&stored.token_hash).map_err(store_error)?;
            return Ok(None);
        }

        let account = match db.get_account(stored.user_id) {
            Ok(account) => account,
            Err(StoreError::NotFound) => return Ok(None),
            Err(e) => return Err(store_error(e)),
        };
        Ok(Some(Session {
            token: token.clone(),
            user_id: account.user_id,
            login_id: account.email,
            expires_at: stored.expires_at,
        }))
    }
}

fn normalize_email(email: &str) -> ApiResult<String> {
    let email = email.trim();
    if email.len() <= 254 && EMAIL_REGEX.is_match(email) {
        Ok(email.to_string())
    } else {
        Err(ApiError::validation("A valid email address is required"))
    }
}

/// `jane@example.com` -> `j***@example.com`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}

fn generate_code() -> String {
    let max = 10u32.pow(CONFIRMATION_CODE_LEN as u32);
    let n = rand::thread_rng().gen_range(0..max);
    format!("{n:0width$}", width = CONFIRMATION_CODE_LEN)
}

fn generate_token() -> SessionToken {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    SessionToken(hex::encode(bytes))
}

fn hash_token(token: &SessionToken) -> String {
    blake3::hash(token.as_str().as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::RecordingDelivery;

    const EMAIL: &str = "jane@example.com";
    const PASSWORD: &str = "Secret123!";

    fn identity() -> (LocalIdentity, Arc<RecordingDelivery>) {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let delivery = Arc::new(RecordingDelivery::new());
        let identity = LocalIdentity::new(db, delivery.clone(), 3600, 3600);
        (identity, delivery)
    }

    async fn confirmed(identity: &LocalIdentity, delivery: &RecordingDelivery) {
        identity.sign_up(EMAIL, PASSWORD).await.unwrap();
        let code = delivery.last_code(EMAIL).unwrap();
        identity.confirm_sign_up(EMAIL, &code).await.unwrap();
    }

    #[test]
    fn masks_email() {
        assert_eq!(mask_email("jane@example.com"), "j***@example.com");
        assert_eq!(mask_email("garbage"), "***");
    }

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), CONFIRMATION_CODE_LEN);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn sign_up_delivers_code() {
        let (identity, delivery) = identity();
        let outcome = identity.sign_up(EMAIL, PASSWORD).await.unwrap();
        assert_eq!(outcome.destination, "j***@example.com");
        assert!(delivery.last_code(EMAIL).is_some());
    }

    #[tokio::test]
    async fn sign_up_rejects_confirmed_duplicates_and_bad_input() {
        let (identity, delivery) = identity();
        confirmed(&identity, &delivery).await;

        let dup = identity.sign_up("JANE@example.com", PASSWORD).await;
        assert!(matches!(dup, Err(ApiError::Validation(_))));
        let weak = identity.sign_up("other@example.com", "short").await;
        assert!(matches!(weak, Err(ApiError::Validation(_))));
        let bad_email = identity.sign_up("not-an-email", PASSWORD).await;
        assert!(matches!(bad_email, Err(ApiError::Validation(_))));
    }

    #[test]
    fn email_shape() {
        for bad in ["a@.b.c", "a b@x.yz", "a@x..yz", "@x.yz", "a@xyz", "a@x.y", ""] {
            assert!(normalize_email(bad).is_err(), "{bad}");
        }
        assert_eq!(
            normalize_email("  jane.doe+pics@mail.example.com ").unwrap(),
            "jane.doe+pics@mail.example.com"
        );
    }

    #[tokio::test]
    async fn expired_code_can_be_replaced_by_signing_up_again() {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let delivery = Arc::new(RecordingDelivery::new());
        // codes from this instance are already expired when issued
        let stale = LocalIdentity::new(db.clone(), delivery.clone(), 3600, 0);
        let original = stale.sign_up(EMAIL, PASSWORD).await.unwrap();
        let old_code = delivery.last_code(EMAIL).unwrap();
        let err = stale.confirm_sign_up(EMAIL, &old_code).await.unwrap_err();
        assert!(matches!(err, ApiError::Unconfirmed(_)));

        let identity = LocalIdentity::new(db, delivery.clone(), 3600, 3600);
        let outcome = identity.sign_up(EMAIL, "Another456?").await.unwrap();
        assert_eq!(outcome.user_id, original.user_id);

        let code = delivery.last_code(EMAIL).unwrap();
        identity.confirm_sign_up(EMAIL, &code).await.unwrap();

        // the password from the latest sign-up is the one that counts
        assert!(matches!(
            identity.sign_in(EMAIL, PASSWORD).await,
            Err(ApiError::Authorization(_))
        ));
        identity.sign_in(EMAIL, "Another456?").await.unwrap();
    }

    #[tokio::test]
    async fn sign_in_before_confirmation_is_unconfirmed() {
        let (identity, _) = identity();
        identity.sign_up(EMAIL, PASSWORD).await.unwrap();
        let err = identity.sign_in(EMAIL, PASSWORD).await.unwrap_err();
        assert!(matches!(err, ApiError::Unconfirmed(_)));
    }

    #[tokio::test]
    async fn wrong_code_keeps_account_unconfirmed() {
        let (identity, delivery) = identity();
        identity.sign_up(EMAIL, PASSWORD).await.unwrap();
        let code = delivery.last_code(EMAIL).unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let err = identity.confirm_sign_up(EMAIL, wrong).await.unwrap_err();
        assert!(matches!(err, ApiError::Unconfirmed(_)));
        assert!(matches!(
            identity.sign_in(EMAIL, PASSWORD).await,
            Err(ApiError::Unconfirmed(_))
        ));
    }

    #[tokio::test]
    async fn confirm_is_idempotent() {
        let (identity, delivery) = identity();
        confirmed(&identity, &delivery).await;
        identity.confirm_sign_up(EMAIL, "whatever").await.unwrap();
    }

    #[tokio::test]
    async fn confirm_unknown_account_is_not_found() {
        let (identity, _) = identity();
        let err = identity
            .confirm_sign_up("ghost@example.com", "123456")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn sign_in_and_resolve() {
        let (identity, delivery) = identity();
        confirmed(&identity, &delivery).await;

        let session = identity.sign_in(EMAIL, PASSWORD).await.unwrap();
        assert_eq!(session.login_id, EMAIL);
        assert!(!session.is_expired());

        let resolved = identity.resolve_session(&session.token).await.unwrap();
        assert_eq!(resolved, Some(session.clone()));

        let db = identity.db.lock().unwrap();
        let caller = resolve_caller(&db, &session).unwrap().unwrap();
        assert_eq!(caller.user_id, session.user_id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let (identity, delivery) = identity();
        confirmed(&identity, &delivery).await;

        let wrong = identity.sign_in(EMAIL, "Wrong123!").await.unwrap_err();
        let unknown = identity
            .sign_in("ghost@example.com", PASSWORD)
            .await
            .unwrap_err();
        assert_eq!(wrong, unknown);
        assert!(matches!(wrong, ApiError::Authorization(_)));
    }

    #[tokio::test]
    async fn sign_out_revokes_token() {
        let (identity, delivery) = identity();
        confirmed(&identity, &delivery).await;
        let session = identity.sign_in(EMAIL, PASSWORD).await.unwrap();

        identity.sign_out(&session.token).await.unwrap();
        assert_eq!(identity.resolve_session(&session.token).await.unwrap(), None);
        // second sign-out is harmless
        identity.sign_out(&session.token).await.unwrap();
    }

    #[tokio::test]
    async fn forged_session_resolves_to_nobody() {
        let (identity, _) = identity();
        let forged = Session {
            token: SessionToken("f".repeat(64)),
            user_id: UserId::new(),
            login_id: EMAIL.into(),
            expires_at: Utc::now() + Duration::hours(1),
        };
        let db = identity.db.lock().unwrap();
        assert_eq!(resolve_caller(&db, &forged).unwrap(), None);
    }
}
