//! # photoshare-backend
//!
//! In-process stand-in for the hosted PhotoShare platform:
//! - **Identity service** with sign-up, emailed confirmation code, Argon2id
//!   passwords and bearer sessions
//! - **Data API** for photos and comments, enforcing each record kind's
//!   ownership rules on every call
//! - **Object store** on the local filesystem, handing out signed,
//!   time-limited download URLs
//!
//! Everything sits behind the traits of `photoshare-shared`, so clients see
//! the same surface a hosted backend would give them.

pub mod config;
pub mod data_api;
pub mod delivery;
pub mod identity;
pub mod object_store;
pub mod password;
pub mod signed_url;

mod error;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::{Arc, Mutex};

use tracing::info;

use photoshare_shared::{ApiError, ApiResult, Backend};
use photoshare_store::Database;

pub use crate::config::BackendConfig;
pub use crate::data_api::LocalRecords;
pub use crate::delivery::{CodeDelivery, LogDelivery, RecordingDelivery};
pub use crate::identity::LocalIdentity;
pub use crate::object_store::FsObjectStore;
pub use crate::signed_url::UrlSigner;

/// The three local services sharing one database.
#[derive(Clone)]
pub struct LocalBackend {
    pub identity: Arc<LocalIdentity>,
    pub records: Arc<LocalRecords>,
    pub objects: Arc<FsObjectStore>,
}

impl LocalBackend {
    /// Open the backend with confirmation codes written to the log.
    pub async fn open(config: &BackendConfig) -> ApiResult<Self> {
        Self::open_with_delivery(config, Arc::new(LogDelivery)).await
    }

    pub async fn open_with_delivery(
        config: &BackendConfig,
        delivery: Arc<dyn CodeDelivery>,
    ) -> ApiResult<Self> {
        let data_dir = config.data_dir.clone();
        let db = tokio::task::spawn_blocking(move || Database::open_in_dir(&data_dir))
            .await
            .map_err(|e| ApiError::backend(format!("database task failed: {e}")))?
            .map_err(|e| ApiError::backend(format!("Failed to open database: {e}")))?;
        let db = Arc::new(Mutex::new(db));

        let secret = match config.object_url_secret {
            Some(secret) => secret,
            None => signed_url::load_or_create_key(&config.data_dir).await?,
        };
        let signer = UrlSigner::new(
            secret,
            &config.object_url_base,
            config.object_url_ttl_secs,
        )?;

        let identity = Arc::new(LocalIdentity::new(
            db.clone(),
            delivery,
            config.session_ttl_secs,
            config.confirmation_code_ttl_secs,
        ));
        let objects = Arc::new(
            FsObjectStore::new(config.data_dir.clone(), config.max_object_size, signer, db.clone())
                .await?,
        );
        let records = Arc::new(LocalRecords::new(db, objects.clone()));

        info!(data_dir = %config.data_dir.display(), "Local backend ready");

        Ok(Self {
            identity,
            records,
            objects,
        })
    }

    /// Trait-object handles for the client side.
    pub fn backend(&self) -> Backend {
        Backend {
            photos: self.records.clone(),
            comments: self.records.clone(),
            objects: self.objects.clone(),
            identity: self.identity.clone(),
        }
    }
}
