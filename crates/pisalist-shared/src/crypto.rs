use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

use crate::constants::KDF_CONTEXT_TOKEN_KEY;
use crate::error::CryptoError;

/// Hash a password with Argon2id and a fresh random salt.
///
/// Returns the PHC string, which embeds the salt and parameters.
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::HashingFailed(e.to_string()))
}

/// Check a password against a stored PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, CryptoError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| CryptoError::InvalidHash)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// BLAKE3 KDF with domain separation
pub fn derive_token_signing_key(secret: &[u8]) -> SigningKey {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_TOKEN_KEY);
    hasher.update(secret);
    let hash = hasher.finalize();
    SigningKey::from_bytes(hash.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret1"));
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let hash1 = hash_password("same-password").unwrap();
        let hash2 = hash_password("same-password").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("same-password", &hash1).unwrap());
        assert!(verify_password("same-password", &hash2).unwrap());
    }

    #[test]
    fn test_invalid_stored_hash() {
        assert!(matches!(
            verify_password("secret1", "plaintext-secret1"),
            Err(CryptoError::InvalidHash)
        ));
    }

    #[test]
    fn test_signing_key_derivation_deterministic() {
        let key1 = derive_token_signing_key(b"server-secret");
        let key2 = derive_token_signing_key(b"server-secret");
        let other = derive_token_signing_key(b"other-secret");

        assert_eq!(key1.to_bytes(), key2.to_bytes());
        assert_ne!(key1.to_bytes(), other.to_bytes());
    }
}
