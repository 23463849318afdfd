use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::AuthError;

pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AuthError::Internal(anyhow::anyhow!(e.to_string()))
        })?
        .to_string();
    Ok(hash)
}

/// Verify a plaintext password against a stored hash. A malformed hash
/// string is treated as a mismatch, never an error.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Minimum-strength policy: configured length plus upper/lower/digit
/// character classes.
pub fn validate_strength(password: &str, min_len: usize) -> Result<(), AuthError> {
    if password.chars().count() < min_len {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {min_len} characters long"
        )));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one uppercase letter".into(),
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain at least one digit".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn verify_returns_false_on_malformed_hash() {
        assert!(!verify_password("anything", "not-a-valid-hash"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn same_password_hashes_differently_per_salt() {
        let password = "Secur3P@ssw0rd!";
        let first = hash_password(password).expect("hashing should succeed");
        let second = hash_password(password).expect("hashing should succeed");
        assert_ne!(first, second);
        assert!(verify_password(password, &first));
        assert!(verify_password(password, &second));
    }

    #[test]
    fn strength_policy_accepts_good_passwords() {
        assert!(validate_strength("Strong1!", 8).is_ok());
        assert!(validate_strength("Abcdefg1", 8).is_ok());
    }

    #[test]
    fn strength_policy_rejects_short_passwords() {
        let err = validate_strength("Ab1", 8).unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(ref msg) if msg.contains("8 characters")));
    }

    #[test]
    fn strength_policy_requires_character_classes() {
        assert!(matches!(
            validate_strength("lowercase1", 8),
            Err(AuthError::WeakPassword(ref msg)) if msg.contains("uppercase")
        ));
        assert!(matches!(
            validate_strength("UPPERCASE1", 8),
            Err(AuthError::WeakPassword(ref msg)) if msg.contains("lowercase")
        ));
        assert!(matches!(
            validate_strength("NoDigitsHere", 8),
            Err(AuthError::WeakPassword(ref msg)) if msg.contains("digit")
        ));
    }
}
