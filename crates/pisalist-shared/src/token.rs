//! Signed bearer tokens.
//!
//! Wire form: `base64url(claims json) "." base64url(ed25519 signature)`,
//! unpadded. The signature covers the exact payload bytes, so any change to
//! the claims invalidates the token. Tokens are stateless: nothing is kept
//! server-side and there is no revocation before expiry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TOKEN_TTL_HOURS;
use crate::crypto::derive_token_signing_key;
use crate::error::AuthError;
use crate::types::PrincipalId;

/// Claims carried inside a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub principal_id: PrincipalId,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies tokens with a process-wide key.
///
/// Built once at startup; the key is never mutated afterwards.
#[derive(Clone)]
pub struct TokenSigner {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    ttl: Duration,
}

impl TokenSigner {
    /// Derive the signing key from a configured secret.
    ///
    /// A non-positive `ttl` falls back to the 24 hour default.
    pub fn from_secret(secret: &[u8], ttl: Duration) -> Self {
        let signing_key = derive_token_signing_key(secret);
        let verifying_key = signing_key.verifying_key();
        let ttl = if ttl <= Duration::zero() {
            Duration::hours(DEFAULT_TOKEN_TTL_HOURS)
        } else {
            ttl
        };

        Self {
            signing_key,
            verifying_key,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `principal_id`, valid from `now` for the configured ttl.
    pub fn issue(&self, principal_id: PrincipalId, now: DateTime<Utc>) -> String {
        let claims = TokenClaims {
            principal_id,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &TokenClaims) -> String {
        // Serializing a struct of integers cannot fail.
        let payload = serde_json::to_vec(claims).unwrap_or_default();
        let signature = self.signing_key.sign(&payload);

        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        )
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        let (payload_b64, signature_b64) = token.split_once('.').ok_or(AuthError::Malformed)?;
        if signature_b64.contains('.') {
            return Err(AuthError::Malformed);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AuthError::Malformed)?;
        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::Malformed)?;
        let signature = Signature::from_slice(&signature_bytes).map_err(|_| AuthError::Malformed)?;

        self.verifying_key
            .verify_strict(&payload, &signature)
            .map_err(|_| AuthError::Malformed)?;

        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;

        if now >= claims.expires_at {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::from_secret(b"test-secret", Duration::hours(24))
    }

    #[test]
    fn test_token_valid() {
        let signer = signer();
        let now = Utc::now();

        let token = signer.issue(PrincipalId(7), now);
        let claims = signer.verify(&token, now).unwrap();

        assert_eq!(claims.principal_id, PrincipalId(7));
        assert_eq!(claims.expires_at - claims.issued_at, Duration::hours(24));
    }

    #[test]
    fn test_token_expired() {
        let signer = signer();
        let issued = Utc::now() - Duration::hours(25);

        let token = signer.issue(PrincipalId(7), issued);
        assert_eq!(signer.verify(&token, Utc::now()), Err(AuthError::Expired));
    }

    #[test]
    fn test_token_wrong_secret() {
        let other = TokenSigner::from_secret(b"other-secret", Duration::hours(24));
        let now = Utc::now();

        let token = other.issue(PrincipalId(7), now);
        assert_eq!(signer().verify(&token, now), Err(AuthError::Malformed));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let signer = signer();
        let now = Utc::now();
        let token = signer.issue(PrincipalId(7), now);
        let (_, signature) = token.split_once('.').unwrap();

        let forged = TokenClaims {
            principal_id: PrincipalId(8),
            issued_at: now,
            expires_at: now + Duration::hours(24),
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged_token = format!("{forged_payload}.{signature}");

        assert_eq!(signer.verify(&forged_token, now), Err(AuthError::Malformed));
    }

    #[test]
    fn test_garbage_and_empty_tokens() {
        let signer = signer();
        let now = Utc::now();

        assert_eq!(signer.verify("", now), Err(AuthError::Unauthenticated));
        assert_eq!(signer.verify("   ", now), Err(AuthError::Unauthenticated));
        assert_eq!(signer.verify("not-a-token", now), Err(AuthError::Malformed));
        assert_eq!(signer.verify("a.b.c", now), Err(AuthError::Malformed));
        assert_eq!(signer.verify("!!!.???", now), Err(AuthError::Malformed));
    }

    #[test]
    fn test_non_positive_ttl_falls_back_to_default() {
        let signer = TokenSigner::from_secret(b"s", Duration::zero());
        assert_eq!(signer.ttl(), Duration::hours(DEFAULT_TOKEN_TTL_HOURS));
    }
}
