/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};

use photoshare_shared::constants::MIN_PASSWORD_LEN;
use photoshare_shared::{ApiError, ApiResult};

/// Hash a password for storage in the accounts table.
pub fn hash_password(password: &str) -> ApiResult<String> {
    validate_password_strength(password)?;

    let salt = SaltString::generate(rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| ApiError::backend("Failed to hash password"))?
        .to_string();

    Ok(password_hash)
}

/// Whether `password` matches the stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| ApiError::backend("Invalid password hash format"))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::backend(format!("Password verification failed: {e}"))),
    }
}

/// Requirements:
/// - at least `MIN_PASSWORD_LEN` characters
/// - an uppercase letter, a lowercase letter, a digit and a symbol
pub fn validate_password_strength(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_alphanumeric());

    if has_uppercase && has_lowercase && has_digit && has_special {
        Ok(())
    } else {
        Err(ApiError::validation(
            "Password must contain upper and lower case letters, a digit and a symbol",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "SecurePass123!";
        let hash = hash_password(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_wrong_password() {
        let hash = hash_password("SecurePass123!").unwrap();
        assert!(!verify_password("WrongPass123!", &hash).unwrap());
    }

    #[test]
    fn test_foreign_algorithm_is_backend_error() {
        let hash = hash_password("SecurePass123!").unwrap();
        let foreign = hash.replacen("$argon2id$", "$scrypt$", 1);
        let err = verify_password("SecurePass123!", &foreign).unwrap_err();
        assert!(matches!(err, ApiError::Backend(_)));
    }

    #[test]
    fn test_corrupt_hash_is_backend_error() {
        let err = verify_password("SecurePass123!", "not-a-phc").unwrap_err();
        assert!(matches!(err, ApiError::Backend(_)));
    }

    #[test]
    fn test_weak_passwords() {
        assert!(hash_password("Pass1!").is_err());
        assert!(hash_password("securepass123!").is_err());
        assert!(hash_password("SecurePass123").is_err());
        assert!(hash_password("SecurePass!!!").is_err());
    }
}
