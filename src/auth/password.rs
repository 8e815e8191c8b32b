use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::ApiError;

/// Hash a plaintext password into an argon2 PHC string. Hashing failures are
/// server faults, never something the caller can repair.
pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}"))
        })
}

/// Check a plaintext password against a stored hash. A mismatch is `Ok(false)`;
/// only a hash that cannot be parsed is an error, since that means the stored
/// record is corrupt.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        ApiError::Internal(anyhow::anyhow!("malformed password hash: {e}"))
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn stored_hash_accepts_the_original_password() {
        let hash = hash_password("everblue-customer-pw-1").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("everblue-customer-pw-1", &hash).expect("verify"));
    }

    #[test]
    fn near_miss_passwords_do_not_verify() {
        let hash = hash_password("everblue-customer-pw-1").expect("hash");
        assert!(!verify_password("everblue-customer-pw-2", &hash).expect("verify"));
        assert!(!verify_password("", &hash).expect("verify"));
    }

    #[test]
    fn two_hashes_of_one_password_differ_by_salt() {
        let first = hash_password("same-password").expect("hash");
        let second = hash_password("same-password").expect("hash");
        assert_ne!(first, second);
        assert!(verify_password("same-password", &second).expect("verify"));
    }

    #[test]
    fn corrupt_stored_hash_is_a_server_fault() {
        let err = verify_password("whatever", "plaintext-left-in-the-column").unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
