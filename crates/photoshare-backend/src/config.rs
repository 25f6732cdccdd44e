//! Backend configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the local backend can start with
//! zero configuration for development.

use std::path::{Path, PathBuf};

use photoshare_shared::constants;

/// Local backend configuration.
#[derive(Clone)]
pub struct BackendConfig {
    /// Directory holding the database, stored objects and the URL key.
    /// Env: `PHOTOSHARE_DATA_DIR`
    /// Default: the platform data directory, or `./photoshare-data`.
    pub data_dir: PathBuf,

    /// Secret used to sign object URLs (hex-encoded, 64 chars).
    /// Env: `OBJECT_URL_SECRET`
    /// Default: generated once and persisted as `url.key` in `data_dir`.
    pub object_url_secret: Option<[u8; 32]>,

    /// Prefix of every resolved object URL.
    /// Env: `OBJECT_URL_BASE`
    /// Default: `photoshare://objects`
    pub object_url_base: String,

    /// Lifetime of resolved object URLs.
    /// Env: `OBJECT_URL_TTL_SECS`
    /// Default: `900`
    pub object_url_ttl_secs: i64,

    /// Maximum object size in bytes.
    /// Env: `MAX_OBJECT_SIZE`
    /// Default: 50 MiB
    pub max_object_size: usize,

    /// Lifetime of a sign-in session.
    /// Env: `SESSION_TTL_SECS`
    /// Default: `43200` (12 hours)
    pub session_ttl_secs: i64,

    /// Lifetime of a sign-up confirmation code.
    /// Env: `CONFIRMATION_CODE_TTL_SECS`
    /// Default: `86400` (24 hours)
    pub confirmation_code_ttl_secs: i64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        let data_dir = photoshare_store::default_data_dir()
            .unwrap_or_else(|_| PathBuf::from("./photoshare-data"));

        Self {
            data_dir,
            object_url_secret: None,
            object_url_base: "photoshare://objects".to_string(),
            object_url_ttl_secs: constants::OBJECT_URL_TTL_SECS,
            max_object_size: constants::MAX_OBJECT_SIZE,
            session_ttl_secs: constants::SESSION_TTL_SECS,
            confirmation_code_ttl_secs: constants::CONFIRMATION_CODE_TTL_SECS,
        }
    }
}

// The URL secret stays out of logs.
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("data_dir", &self.data_dir)
            .field("object_url_secret", &self.object_url_secret.map(|_| "<set>"))
            .field("object_url_base", &self.object_url_base)
            .field("object_url_ttl_secs", &self.object_url_ttl_secs)
            .field("max_object_size", &self.max_object_size)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("confirmation_code_ttl_secs", &self.confirmation_code_ttl_secs)
            .finish()
    }
}

impl BackendConfig {
    /// Defaults rooted at an explicit data directory.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("PHOTOSHARE_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Ok(hex_key) = std::env::var("OBJECT_URL_SECRET") {
            match parse_hex_secret(&hex_key) {
                Ok(key) => config.object_url_secret = Some(key),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Invalid OBJECT_URL_SECRET, using the persisted key"
                    );
                }
            }
        }

        if let Ok(base) = std::env::var("OBJECT_URL_BASE") {
            let base = base.trim().trim_end_matches('/');
            if !base.is_empty() {
                config.object_url_base = base.to_string();
            }
        }

        if let Some(secs) = positive_env("OBJECT_URL_TTL_SECS") {
            config.object_url_ttl_secs = secs;
        }

        if let Ok(val) = std::env::var("MAX_OBJECT_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_object_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_OBJECT_SIZE, using default"),
            }
        }

        if let Some(secs) = positive_env("SESSION_TTL_SECS") {
            config.session_ttl_secs = secs;
        }

        if let Some(secs) = positive_env("CONFIRMATION_CODE_TTL_SECS") {
            config.confirmation_code_ttl_secs = secs;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn positive_env(name: &str) -> Option<i64> {
    let val = std::env::var(name).ok()?;
    match val.trim().parse::<i64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(var = name, value = %val, "Invalid duration, using default");
            None
        }
    }
}

/// Parse a 64-character hex string into a 32-byte array.
pub(crate) fn parse_hex_secret(hex: &str) -> Result<[u8; 32], String> {
    let hex = hex.trim();
    if hex.len() != 64 {
        return Err(format!("expected 64 hex chars, got {}", hex.len()));
    }

    let bytes = hex::decode(hex).map_err(|e| format!("invalid hex: {e}"))?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BackendConfig::default();
        assert_eq!(config.object_url_ttl_secs, 900);
        assert_eq!(config.max_object_size, 50 * 1024 * 1024);
        assert!(config.object_url_secret.is_none());
    }

    #[test]
    fn test_in_dir() {
        let config = BackendConfig::in_dir("/tmp/photoshare-test");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/photoshare-test"));
        assert_eq!(config.session_ttl_secs, 12 * 60 * 60);
    }

    #[test]
    fn test_parse_hex_secret() {
        let hex = "ab".repeat(32);
        let key = parse_hex_secret(&hex).unwrap();
        assert_eq!(key, [0xab; 32]);
    }

    #[test]
    fn test_parse_hex_secret_wrong_length() {
        assert!(parse_hex_secret("abcd").is_err());
        assert!(parse_hex_secret(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut config = BackendConfig::default();
        config.object_url_secret = Some([7u8; 32]);
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<set>"));
        assert!(!rendered.contains("[7, 7"));
    }
}
