/// Namespace every photo object path lives under
pub const PHOTO_PATH_PREFIX: &str = "photos/";

/// Maximum object size in bytes (50 MiB)
pub const MAX_OBJECT_SIZE: usize = 50 * 1024 * 1024;

/// Lifetime of a resolved object URL in seconds
pub const OBJECT_URL_TTL_SECS: i64 = 900;

/// Lifetime of a sign-in session in seconds (12 hours)
pub const SESSION_TTL_SECS: i64 = 12 * 60 * 60;

/// Lifetime of a sign-up confirmation code in seconds (24 hours)
pub const CONFIRMATION_CODE_TTL_SECS: i64 = 24 * 60 * 60;

/// Number of digits in a sign-up confirmation code
pub const CONFIRMATION_CODE_LEN: usize = 6;

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LEN: usize = 8;

/// Display name recorded for authors without a login id
pub const ANONYMOUS_USERNAME: &str = "Anonymous";
