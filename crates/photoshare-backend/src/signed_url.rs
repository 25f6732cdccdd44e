//! Time-limited object URLs.
//!
//! A resolved URL has the shape
//! `{base}/{path}?expires={unix}&signature={mac}` where each path segment is
//! percent-encoded and `mac` is the unpadded URL-safe base64 of a keyed
//! BLAKE3 hash over `"{path}\n{expires}"` (the decoded path).

use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use percent_encoding::percent_decode_str;
use rand::RngCore;
use subtle::ConstantTimeEq;
use tokio::fs;
use url::Url;

use photoshare_shared::{ApiError, ApiResult, SignedUrl};

use crate::config::parse_hex_secret;
use crate::error::io_error;

pub const URL_KEY_FILE: &str = "url.key";

const EXPIRES_PARAM: &str = "expires";
const SIGNATURE_PARAM: &str = "signature";

#[derive(Clone)]
pub struct UrlSigner {
    secret: [u8; 32],
    base: Url,
    ttl: Duration,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base", &self.base.as_str())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// `base` must be a hierarchical URL such as `photoshare://objects` or
    /// `https://cdn.example.com/photos-bucket`.
    pub fn new(secret: [u8; 32], base: &str, ttl_secs: i64) -> ApiResult<Self> {
        let mut base = Url::parse(base)
            .map_err(|e| ApiError::validation(format!("Invalid object URL base '{base}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::validation(format!(
                "Object URL base '{base}' cannot carry a path"
            )));
        }
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self {
            secret,
            base,
            ttl: Duration::seconds(ttl_secs),
        })
    }

    pub fn sign(&self, path: &str) -> ApiResult<SignedUrl> {
        self.sign_at(path, Utc::now())
    }

    pub fn sign_at(&self, path: &str, now: DateTime<Utc>) -> ApiResult<SignedUrl> {
        let expires = (now + self.ttl).timestamp();
        let mac = self.mac(path, expires);

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::backend("Object URL base cannot carry a path"))?
            .pop_if_empty()
            .extend(path.split('/'));
        url.query_pairs_mut()
            .append_pair(EXPIRES_PARAM, &expires.to_string())
            .append_pair(SIGNATURE_PARAM, &URL_SAFE_NO_PAD.encode(mac));

        Ok(SignedUrl {
            url: url.into(),
            expires_at: Utc
                .timestamp_opt(expires, 0)
                .single()
                .unwrap_or(now + self.ttl),
        })
    }

    /// Check a URL produced by [`sign`](Self::sign) and return the object path.
    pub fn verify(&self, url: &str) -> ApiResult<String> {
        self.verify_at(url, Utc::now())
    }

    pub fn verify_at(&self, url: &str, now: DateTime<Utc>) -> ApiResult<String> {
        let malformed = || ApiError::validation("Malformed object URL");

        let parsed = Url::parse(url).map_err(|_| malformed())?;
        if parsed.scheme() != self.base.scheme()
            || parsed.host_str() != self.base.host_str()
            || parsed.port() != self.base.port()
        {
            return Err(malformed());
        }

        let base_path = self.base.path().trim_end_matches('/');
        let encoded = parsed
            .path()
            .strip_prefix(base_path)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(malformed)?;
        let path = encoded
            .split('/')
            .map(|segment| percent_decode_str(segment).decode_utf8())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?
            .join("/");
        if path.is_empty() {
            return Err(malformed());
        }

        let mut expires = None;
        let mut signature = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                EXPIRES_PARAM => expires = value.parse::<i64>().ok(),
                SIGNATURE_PARAM => signature = URL_SAFE_NO_PAD.decode(value.as_bytes()).ok(),
                _ => {}
            }
        }
        let (Some(expires), Some(signature)) = (expires, signature) else {
            return Err(malformed());
        };

        let expected = self.mac(&path, expires);
        let valid: bool = signature.as_slice().ct_eq(&expected[..]).into();
        if !valid {
            tracing::debug!(path = %path, "Object URL signature mismatch");
            return Err(ApiError::authorization("Invalid URL signature"));
        }
        if now.timestamp() >= expires {
            return Err(ApiError::authorization("URL has expired"));
        }

        Ok(path)
    }

    fn mac(&self, path: &str, expires: i64) -> [u8; 32] {
        let message = format!("{path}\n{expires}");
        *blake3::keyed_hash(&self.secret, message.as_bytes()).as_bytes()
    }
}

/// Read the persisted URL key from `data_dir`, generating it on first use.
pub async fn load_or_create_key(data_dir: &Path) -> ApiResult<[u8; 32]> {
    let path = data_dir.join(URL_KEY_FILE);

    match fs::read_to_string(&path).await {
        Ok(contents) => {
            return parse_hex_secret(&contents)
                .map_err(|e| ApiError::backend(format!("Corrupt {URL_KEY_FILE}: {e}")));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_error("read url key", e)),
    }

    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    fs::create_dir_all(data_dir)
        .await
        .map_err(|e| io_error("create data dir", e))?;
    fs::write(&path, hex::encode(key))
        .await
        .map_err(|e| io_error("write url key", e))?;

    tracing::info!(path = %path.display(), "Generated object URL key");
    Ok(key)
}
