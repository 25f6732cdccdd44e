use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use photoshare_shared::constants::PHOTO_PATH_PREFIX;
use photoshare_shared::{ApiError, ApiResult, ObjectBody, ObjectStore, Session, SignedUrl, UserId};
use photoshare_store::Database;

use crate::error::{io_error, lock_db};
use crate::identity::{resolve_caller, Caller};
use crate::signed_url::UrlSigner;

const OBJECT_KIND: &str = "Object";

/// Sidecar stored next to every object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub owner: UserId,
    pub content_type: String,
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Check an object path and return it relative to a storage root.
///
/// Paths must be relative, free of `.`/`..` segments and inside the
/// `photos/` namespace.
fn object_relpath(path: &str) -> ApiResult<PathBuf> {
    let invalid = |why: &str| ApiError::validation(format!("Invalid object path '{path}': {why}"));

    if !path.starts_with(PHOTO_PATH_PREFIX) || path.len() == PHOTO_PATH_PREFIX.len() {
        return Err(invalid("must name an object under photos/"));
    }
    if path.contains('\\') || path.contains('\0') {
        return Err(invalid("illegal character"));
    }
    if path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(invalid("path traversal detected"));
    }

    let rel = PathBuf::from(path);
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(invalid("path traversal detected"));
    }
    Ok(rel)
}

/// Verify that a resolved path stays within the expected base directory.
fn ensure_within(base: &Path, rel: &Path) -> ApiResult<PathBuf> {
    let target = base.join(rel);
    if !target.starts_with(base) {
        return Err(ApiError::validation("Path traversal detected"));
    }
    Ok(target)
}

/// Filesystem object store keyed by path strings.
///
/// Layout: `{root}/objects/{path}` for the bytes and
/// `{root}/meta/{path}.json` for the [`ObjectMeta`] sidecar.
#[derive(Clone)]
pub struct FsObjectStore {
    objects_dir: PathBuf,
    meta_dir: PathBuf,
    max_size: usize,
    signer: UrlSigner,
    db: Arc<Mutex<Database>>,
}

impl FsObjectStore {
    pub async fn new(
        root: PathBuf,
        max_size: usize,
        signer: UrlSigner,
        db: Arc<Mutex<Database>>,
    ) -> ApiResult<Self> {
        let objects_dir = root.join("objects");
        let meta_dir = root.join("meta");
        for dir in [&objects_dir, &meta_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| io_error("create object directory", e))?;
        }

        info!(path = %root.display(), "Object store initialized");

        Ok(Self {
            objects_dir,
            meta_dir,
            max_size,
            signer,
            db,
        })
    }

    fn caller(&self, session: &Session, action: &str) -> ApiResult<Caller> {
        let db = lock_db(&self.db)?;
        resolve_caller(&db, session)?.ok_or_else(|| {
            ApiError::authorization(format!("{action} an object requires a signed-in user"))
        })
    }

    fn object_path(&self, rel: &Path) -> ApiResult<PathBuf> {
        ensure_within(&self.objects_dir, rel)
    }

    fn meta_path(&self, rel: &Path) -> ApiResult<PathBuf> {
        let mut name = rel.as_os_str().to_os_string();
        name.push(".json");
        ensure_within(&self.meta_dir, Path::new(&name))
    }

    async fn read_meta(&self, path: &str, rel: &Path) -> ApiResult<ObjectMeta> {
        let raw = match fs::read(self.meta_path(rel)?).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApiError::not_found(OBJECT_KIND, path));
            }
            Err(e) => return Err(io_error("read object metadata", e)),
        };
        serde_json::from_slice(&raw)
            .map_err(|e| ApiError::backend(format!("Corrupt metadata for {path}: {e}")))
    }

    /// Owner recorded for the object at `path`, or `None` when nothing is stored there.
    pub async fn owner_of(&self, path: &str) -> ApiResult<Option<UserId>> {
        let rel = object_relpath(path)?;
        match self.read_meta(path, &rel).await {
            Ok(meta) => Ok(Some(meta.owner)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write_file(target: &Path, data: &[u8]) -> ApiResult<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create object directory", e))?;
        }
        fs::write(target, data)
            .await
            .map_err(|e| io_error("write object", e))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(
        &self,
        session: &Session,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> ApiResult<()> {
        let caller = self.caller(session, "Uploading")?;
        let rel = object_relpath(path)?;

        if bytes.is_empty() {
            return Err(ApiError::validation("Empty object"));
        }
        if bytes.len() > self.max_size {
            return Err(ApiError::validation(format!(
                "Object too large: {} bytes (max {})",
                bytes.len(),
                self.max_size
            )));
        }
        if content_type.trim().is_empty() {
            return Err(ApiError::validation("Content type is required"));
        }

        match self.read_meta(path, &rel).await {
            Ok(existing) if existing.owner != caller.user_id => {
                return Err(ApiError::authorization(format!(
                    "{path} belongs to another user"
                )));
            }
            Ok(_) => debug!(path, "Overwriting object"),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let meta = ObjectMeta {
            owner: caller.user_id,
            content_type: content_type.trim().to_string(),
            size: bytes.len(),
            uploaded_at: Utc::now(),
        };
        let meta_json = serde_json::to_vec(&meta)
            .map_err(|e| ApiError::backend(format!("Failed to encode metadata: {e}")))?;

        Self::write_file(&self.object_path(&rel)?, &bytes).await?;
        Self::write_file(&self.meta_path(&rel)?, &meta_json).await?;

        debug!(path, size = meta.size, owner = %caller.user_id, "Stored object");
        Ok(())
    }

    async fn resolve_url(&self, session: &Session, path: &str) -> ApiResult<SignedUrl> {
        self.caller(session, "Reading")?;
        let rel = object_relpath(path)?;
        self.read_meta(path, &rel).await?;

        self.signer.sign(path)
    }

    async fn delete(&self, session: &Session, path: &str) -> ApiResult<()> {
        let caller = self.caller(session, "Deleting")?;
        let rel = object_relpath(path)?;

        let meta = self.read_meta(path, &rel).await?;
        if meta.owner != caller.user_id {
            return Err(ApiError::authorization(format!(
                "{path} belongs to another user"
            )));
        }

        match fs::remove_file(self.object_path(&rel)?).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path, "Object bytes already gone");
            }
            Err(e) => return Err(io_error("delete object", e)),
        }
        fs::remove_file(self.meta_path(&rel)?)
            .await
            .map_err(|e| io_error("delete object metadata", e))?;

        debug!(path, "Deleted object");
        Ok(())
    }

    async fn fetch(&self, url: &str) -> ApiResult<ObjectBody> {
        let path = self.signer.verify(url)?;
        let rel = object_relpath(&path)?;
        let meta = self.read_meta(&path, &rel).await?;

        let data = match fs::read(self.object_path(&rel)?).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApiError::not_found(OBJECT_KIND, &path));
            }
            Err(e) => return Err(io_error("read object", e)),
        };

        debug!(path = %path, size = data.len(), "Fetched object");
        Ok(ObjectBody {
            bytes: Bytes::from(data),
            content_type: meta.content_type,
        })
    }
}
