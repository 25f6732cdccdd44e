//! Out-of-band delivery of sign-up confirmation codes.
//!
//! The hosted identity service emails the code.  Locally the code is
//! written to the log, or captured in memory so tests and scripted runs
//! can read it back.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use photoshare_shared::{ApiError, ApiResult};

#[async_trait]
pub trait CodeDelivery: Send + Sync {
    async fn deliver(&self, email: &str, code: &str) -> ApiResult<()>;
}

/// Emits the code as an info-level log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDelivery;

#[async_trait]
impl CodeDelivery for LogDelivery {
    async fn deliver(&self, email: &str, code: &str) -> ApiResult<()> {
        tracing::info!(email = %email, code = %code, "Confirmation code issued");
        Ok(())
    }
}

/// Keeps the most recent code per address.
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    codes: Mutex<HashMap<String, String>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last code delivered to `email` (case-insensitive).
    pub fn last_code(&self, email: &str) -> Option<String> {
        let codes = self.codes.lock().ok()?;
        codes.get(&email.to_lowercase()).cloned()
    }
}

#[async_trait]
impl CodeDelivery for RecordingDelivery {
    async fn deliver(&self, email: &str, code: &str) -> ApiResult<()> {
        let mut codes = self
            .codes
            .lock()
            .map_err(|e| ApiError::backend(format!("Lock poisoned: {e}")))?;
        codes.insert(email.to_lowercase(), code.to_string());
        tracing::debug!(email = %email, "Confirmation code recorded");
        Ok(())
    }
}
