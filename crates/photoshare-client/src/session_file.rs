//! The signed-in session kept between CLI invocations.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use photoshare_shared::Session;

use crate::error::{ClientError, Result};
use crate::session::SessionProvider;

pub const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Option<Session>> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ClientError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_vec_pretty(session)?;
        fs::write(&self.path, json)
            .await
            .map_err(|source| ClientError::Io {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Hand the saved session to `provider`.
    ///
    /// An unreadable file or a token the identity service no longer honours
    /// is discarded and the provider stays anonymous.
    pub async fn restore(&self, provider: &mut SessionProvider) -> Option<Session> {
        let saved = match self.load().await {
            Ok(Some(saved)) => saved,
            Ok(None) => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                self.discard().await;
                return None;
            }
        };

        match provider.restore(&saved.token).await {
            Ok(Some(session)) => Some(session),
            Ok(None) => {
                debug!("Saved session no longer valid");
                self.discard().await;
                None
            }
            Err(e) => {
                warn!(error = %e, "Could not restore saved session");
                self.discard().await;
                None
            }
        }
    }

    async fn discard(&self) {
        if let Err(e) = self.clear().await {
            warn!(error = %e, "Failed to remove session file");
        }
    }

    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ClientError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
