use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use photoshare_shared::constants::PHOTO_PATH_PREFIX;
use photoshare_shared::{ApiResult, Backend, ObjectBody, ObjectStore, Session, SignedUrl};

/// Object store access keyed by path strings.
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
}

impl StorageClient {
    pub fn new(backend: &Backend) -> Self {
        Self {
            store: backend.objects.clone(),
        }
    }

    pub async fn put(
        &self,
        session: &Session,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> ApiResult<()> {
        let size = bytes.len();
        self.store.put(session, path, bytes, content_type).await?;
        debug!(path, size, content_type, "put object");
        Ok(())
    }

    /// Fresh time-limited URL; callers resolve per view and never keep it.
    pub async fn resolve_url(&self, session: &Session, path: &str) -> ApiResult<SignedUrl> {
        self.store.resolve_url(session, path).await
    }

    pub async fn delete(&self, session: &Session, path: &str) -> ApiResult<()> {
        self.store.delete(session, path).await?;
        debug!(path, "deleted object");
        Ok(())
    }

    pub async fn download(&self, url: &SignedUrl) -> ApiResult<ObjectBody> {
        self.store.fetch(&url.url).await
    }
}

/// Storage path for an uploaded file: `photos/{unix-millis}-{file name}`.
pub fn photo_path(file_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{PHOTO_PATH_PREFIX}{}-{}",
        now.timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

// Last path component only; anything outside [A-Za-z0-9._-] becomes '_'.
fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
