//! Contracts of the backend platform: data API, object store, identity.
//!
//! Every operation takes the caller's [`Session`] explicitly.  Implementations
//! must resolve the session token themselves and derive ownership from it;
//! nothing the client claims about its own identity is trusted.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::records::{Comment, Photo, Record};
use crate::types::{Session, SessionToken, UserId};

/// Typed list/get/create/delete for one record kind.
#[async_trait]
pub trait RecordApi<R: Record>: Send + Sync {
    async fn list(&self, session: &Session, filter: R::Filter) -> ApiResult<Vec<R>>;

    /// `Ok(None)` when no record has this id.
    async fn get(&self, session: &Session, id: R::Id) -> ApiResult<Option<R>>;

    async fn create(&self, session: &Session, draft: R::Draft) -> ApiResult<R>;

    async fn delete(&self, session: &Session, id: R::Id) -> ApiResult<()>;
}

/// A time-limited download URL for one object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl SignedUrl {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectBody {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Path-keyed blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path`, replacing any object already there.
    async fn put(
        &self,
        session: &Session,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> ApiResult<()>;

    async fn resolve_url(&self, session: &Session, path: &str) -> ApiResult<SignedUrl>;

    async fn delete(&self, session: &Session, path: &str) -> ApiResult<()>;

    /// Download through a URL previously returned by `resolve_url`.
    async fn fetch(&self, url: &str) -> ApiResult<ObjectBody>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignUpOutcome {
    pub user_id: UserId,
    /// Masked address the confirmation code was sent to.
    pub destination: String,
}

/// Hosted sign-up / sign-in.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> ApiResult<SignUpOutcome>;

    async fn confirm_sign_up(&self, email: &str, code: &str) -> ApiResult<()>;

    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session>;

    async fn sign_out(&self, token: &SessionToken) -> ApiResult<()>;

    /// `Ok(None)` for unknown, revoked or expired tokens.
    async fn resolve_session(&self, token: &SessionToken) -> ApiResult<Option<Session>>;
}

/// Handles to every backend service, cheap to clone.
#[derive(Clone)]
pub struct Backend {
    pub photos: Arc<dyn RecordApi<Photo>>,
    pub comments: Arc<dyn RecordApi<Comment>>,
    pub objects: Arc<dyn ObjectStore>,
    pub identity: Arc<dyn IdentityService>,
}

/// Whether a declared content type names an image.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::IMAGE)
        .unwrap_or(false)
}
