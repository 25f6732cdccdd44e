use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use photoshare_backend::{BackendConfig, LocalBackend, RecordingDelivery};
use photoshare_shared::{
    ApiError, ApiResult, Backend, NewPhoto, Photo, PhotoFilter, PhotoId, RecordApi, Session,
};

use crate::state::AppContext;

pub(crate) const PASSWORD: &str = "Secret123!";

/// A local backend in a temporary directory with codes captured in memory.
pub(crate) struct Harness {
    pub backend: Backend,
    pub ctx: AppContext,
    pub delivery: Arc<RecordingDelivery>,
    _dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let delivery = Arc::new(RecordingDelivery::new());
        let local =
            LocalBackend::open_with_delivery(&BackendConfig::in_dir(dir.path()), delivery.clone())
                .await
                .unwrap();
        let backend = local.backend();
        Self {
            ctx: AppContext::new(backend.clone()),
            backend,
            delivery,
            _dir: dir,
        }
    }

    /// Sign up, confirm and sign in `email`.
    pub async fn signed_in(&self, email: &str) -> Session {
        let identity = &self.backend.identity;
        identity.sign_up(email, PASSWORD).await.unwrap();
        let code = self.delivery.last_code(email).unwrap();
        identity.confirm_sign_up(email, &code).await.unwrap();
        identity.sign_in(email, PASSWORD).await.unwrap()
    }

    /// Same backend, but every photo create and delete fails.
    pub fn with_failing_photo_writes(&self) -> (AppContext, Arc<FailingPhotoWrites>) {
        let photos = Arc::new(FailingPhotoWrites {
            inner: self.backend.photos.clone(),
            attempted_key: Mutex::new(None),
        });
        let mut backend = self.backend.clone();
        backend.photos = photos.clone();
        (AppContext::new(backend), photos)
    }
}

/// Photo API that reads through to the real one and rejects writes.
pub(crate) struct FailingPhotoWrites {
    inner: Arc<dyn RecordApi<Photo>>,
    attempted_key: Mutex<Option<String>>,
}

impl FailingPhotoWrites {
    /// `s3Key` of the last create that was refused.
    pub fn attempted_key(&self) -> Option<String> {
        self.attempted_key.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordApi<Photo> for FailingPhotoWrites {
    async fn list(&self, session: &Session, filter: PhotoFilter) -> ApiResult<Vec<Photo>> {
        self.inner.list(session, filter).await
    }

    async fn get(&self, session: &Session, id: PhotoId) -> ApiResult<Option<Photo>> {
        self.inner.get(session, id).await
    }

    async fn create(&self, _session: &Session, draft: NewPhoto) -> ApiResult<Photo> {
        *self.attempted_key.lock().unwrap() = Some(draft.s3_key);
        Err(ApiError::backend("data API unavailable"))
    }

    async fn delete(&self, _session: &Session, _id: PhotoId) -> ApiResult<()> {
        Err(ApiError::backend("data API unavailable"))
    }
}
