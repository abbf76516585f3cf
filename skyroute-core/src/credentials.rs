use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use crate::{CoreError, CoreResult};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

static UNKNOWN_ACCOUNT_HASH: OnceLock<String> = OnceLock::new();

pub fn validate_password(password: &str) -> CoreResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::ValidationError(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(CoreError::ValidationError(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Hash a password with bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> CoreResult<String> {
    bcrypt::hash(password, cost).map_err(|e| CoreError::InternalError(format!("Password hashing failed: {e}")))
}

/// Verify a password against a stored bcrypt hash. Malformed hashes never verify,
/// and neither does input bcrypt would truncate.
pub fn verify_password(password: &str, hash: &str) -> bool {
    if password.len() > MAX_PASSWORD_BYTES {
        return false;
    }
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Same bcrypt work as a real check, for logins naming no account. Always false.
pub fn verify_unknown_account(password: &str, cost: u32) -> bool {
    let hash = UNKNOWN_ACCOUNT_HASH.get_or_init(|| bcrypt::hash(generate_reset_token(), cost).unwrap_or_default());
    let _ = bcrypt::verify(password, hash);
    false
}

/// 32 random bytes, hex encoded. Handed to the user exactly once.
pub fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Hash a reset token for storage and lookup
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse", 4).unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password(&"a".repeat(MAX_PASSWORD_BYTES)).is_ok());
        assert!(validate_password(&"a".repeat(MAX_PASSWORD_BYTES + 1)).is_err());
        // 25 three-byte chars: under the char limit, over the byte limit
        assert!(validate_password(&"€".repeat(25)).is_err());
    }

    #[test]
    fn test_truncated_suffix_does_not_verify() {
        let prefix = "a".repeat(MAX_PASSWORD_BYTES);
        let hash = hash_password(&prefix, 4).unwrap();
        assert!(verify_password(&prefix, &hash));
        assert!(!verify_password(&format!("{prefix}totally-different"), &hash));
    }

    #[test]
    fn test_unknown_account_never_verifies() {
        assert!(!verify_unknown_account("correct horse", 4));
        assert!(!verify_unknown_account("", 4));
    }

    #[test]
    fn test_reset_tokens() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);

        let hashed = hash_reset_token(&a);
        assert_eq!(hashed.len(), 64);
        assert_ne!(hashed, a);
        assert_eq!(hashed, hash_reset_token(&format!(" {a}\n")));
    }
}
