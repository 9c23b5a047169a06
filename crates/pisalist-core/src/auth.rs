//! Registration, login and bearer-token validation.

use std::sync::OnceLock;

use serde::Serialize;
use tracing::{debug, info};

use pisalist_shared::crypto::{hash_password, verify_password};
use pisalist_shared::repository::{NewPrincipal, PrincipalFilter, Repository};
use pisalist_shared::token::TokenSigner;
use pisalist_shared::{
    AuthError, CoreError, CoreResult, EntityKind, Principal, PrincipalId, RepoError,
};

use crate::clock::{Clock, SystemClock};
use crate::validation;

/// A freshly authenticated principal together with its bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    #[serde(rename = "user")]
    pub principal: Principal,
}

/// Trust boundary: issues tokens and resolves them back to principals.
pub struct AuthGate<P, C = SystemClock> {
    principals: P,
    signer: TokenSigner,
    clock: C,
}

impl<P> AuthGate<P, SystemClock>
where
    P: Repository<Principal>,
{
    pub fn new(principals: P, signer: TokenSigner) -> Self {
        Self::with_clock(principals, signer, SystemClock)
    }
}

impl<P, C> AuthGate<P, C>
where
    P: Repository<Principal>,
    C: Clock,
{
    pub fn with_clock(principals: P, signer: TokenSigner, clock: C) -> Self {
        Self {
            principals,
            signer,
            clock,
        }
    }

    /// Create a principal and sign it in.
    ///
    /// Taken usernames and emails are reported as `Conflict` naming the
    /// field, whether caught by the pre-check or by the store's unique index.
    pub fn register(&self, username: &str, password: &str, email: &str) -> CoreResult<Session> {
        validation::username(username)?;
        validation::password(password)?;
        validation::email(email)?;

        if self
            .principals
            .find_one(&PrincipalFilter::Username(username.to_string()))?
            .is_some()
        {
            return Err(conflict("username"));
        }
        if self
            .principals
            .find_one(&PrincipalFilter::Email(email.to_string()))?
            .is_some()
        {
            return Err(conflict("email"));
        }

        let password_hash = hash_password(password)?;
        let principal = self
            .principals
            .insert(NewPrincipal {
                username: username.to_string(),
                password_hash,
                email: email.to_string(),
            })
            .map_err(|err| match err {
                RepoError::UniqueViolation(column) => conflict(&column),
                other => CoreError::Persistence(other),
            })?;

        info!(user_id = %principal.id, username = %principal.username, "User registered");

        let token = self.issue_token(principal.id);
        Ok(Session { token, principal })
    }

    /// Every credential failure yields the same `InvalidCredential`.
    pub fn login(&self, username: &str, password: &str) -> CoreResult<Session> {
        let found = self
            .principals
            .find_one(&PrincipalFilter::Username(username.to_string()))?;
        let Some(principal) = found else {
            // Same Argon2 cost as a wrong password.
            let _ = verify_password(password, unknown_principal_hash());
            return Err(AuthError::InvalidCredential.into());
        };

        match verify_password(password, &principal.password_hash) {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::InvalidCredential.into()),
            Err(e) => {
                debug!(user_id = %principal.id, error = %e, "Stored password hash unreadable");
                return Err(AuthError::InvalidCredential.into());
            }
        }

        info!(user_id = %principal.id, "User logged in");

        let token = self.issue_token(principal.id);
        Ok(Session { token, principal })
    }

    pub fn issue_token(&self, principal_id: PrincipalId) -> String {
        self.signer.issue(principal_id, self.clock.now_utc())
    }

    /// Resolve a bearer token to the principal it was issued for.
    pub fn validate_token(&self, token: &str) -> Result<PrincipalId, AuthError> {
        match self.signer.verify(token, self.clock.now_utc()) {
            Ok(claims) => Ok(claims.principal_id),
            Err(e) => {
                debug!(reason = %e, "Token rejected");
                Err(e)
            }
        }
    }

    pub fn principal(&self, principal_id: PrincipalId) -> CoreResult<Principal> {
        self.principals
            .find_one(&PrincipalFilter::Id(principal_id))?
            .ok_or(CoreError::NotFound(EntityKind::Principal))
    }
}

/// Stand-in hash verified when a login names no existing principal.
fn unknown_principal_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password("pisalist-unknown-principal").unwrap_or_default())
}

fn conflict(field: &str) -> CoreError {
    match field {
        "email" => CoreError::Conflict("Email already registered".to_string()),
        "username" => CoreError::Conflict("Username already exists".to_string()),
        other => CoreError::Conflict(format!("{other} already exists")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration};
    use pisalist_store::Database;

    use super::*;
    use crate::clock::FixedClock;

    fn signer() -> TokenSigner {
        TokenSigner::from_secret(b"test-secret", Duration::hours(24))
    }

    fn gate() -> AuthGate<Arc<Database>> {
        AuthGate::new(Arc::new(Database::open_in_memory().unwrap()), signer())
    }

    #[test]
    fn register_then_login() {
        let gate = gate();
        let session = gate.register("alice", "secret1", "a@x.com").unwrap();
        assert_eq!(session.principal.username, "alice");
        assert_ne!(session.principal.password_hash, "secret1");
        assert_eq!(gate.validate_token(&session.token).unwrap(), session.principal.id);

        let again = gate.login("alice", "secret1").unwrap();
        assert_eq!(again.principal.id, session.principal.id);
        assert_eq!(gate.principal(again.principal.id).unwrap().email, "a@x.com");
    }

    #[test]
    fn duplicate_username_or_email_conflicts() {
        let gate = gate();
        gate.register("alice", "secret1", "a@x.com").unwrap();

        let err = gate.register("alice", "secret2", "b@x.com").unwrap_err();
        assert!(matches!(err, CoreError::Conflict(ref m) if m.contains("Username")));

        let err = gate.register("bob", "secret2", "a@x.com").unwrap_err();
        assert!(matches!(err, CoreError::Conflict(ref m) if m.contains("Email")));
    }

    #[test]
    fn register_validates_before_touching_the_store() {
        let gate = gate();
        for (user, pass, mail) in [
            ("al", "secret1", "a@x.com"),
            ("alice", "short", "a@x.com"),
            ("alice", "secret1", "not-an-email"),
        ] {
            assert!(matches!(
                gate.register(user, pass, mail),
                Err(CoreError::Validation(_))
            ));
        }
        assert!(gate.login("alice", "secret1").is_err());
    }

    #[test]
    fn login_failures_are_indistinguishable() {
        let gate = gate();
        gate.register("alice", "secret1", "a@x.com").unwrap();

        let wrong_password = gate.login("alice", "wrong").unwrap_err();
        let unknown_user = gate.login("nobody", "x").unwrap_err();
        assert!(matches!(
            wrong_password,
            CoreError::Auth(AuthError::InvalidCredential)
        ));
        assert!(matches!(unknown_user, CoreError::Auth(AuthError::InvalidCredential)));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[test]
    fn unknown_usernames_still_pay_for_a_verify() {
        let hash = unknown_principal_hash();
        assert!(hash.starts_with("$argon2id$"));
        assert!(matches!(verify_password("anything", hash), Ok(false)));
        assert!(std::ptr::eq(hash, unknown_principal_hash()));
    }

    #[test]
    fn token_validation_outcomes() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let issued_at = DateTime::parse_from_rfc3339("2025-03-10T12:00:00+00:00").unwrap();

        let early = AuthGate::with_clock(db.clone(), signer(), FixedClock(issued_at));
        let token = early.issue_token(PrincipalId(7));
        assert_eq!(early.validate_token(&token), Ok(PrincipalId(7)));
        assert_eq!(early.validate_token(""), Err(AuthError::Unauthenticated));
        assert_eq!(early.validate_token("garbage"), Err(AuthError::Malformed));

        let late = AuthGate::with_clock(
            db.clone(),
            signer(),
            FixedClock(issued_at + Duration::hours(24)),
        );
        assert_eq!(late.validate_token(&token), Err(AuthError::Expired));

        let other_secret = AuthGate::with_clock(
            db,
            TokenSigner::from_secret(b"another-secret", Duration::hours(24)),
            FixedClock(issued_at),
        );
        assert_eq!(other_secret.validate_token(&token), Err(AuthError::Malformed));
    }

    #[test]
    fn unknown_principal_is_not_found() {
        let gate = gate();
        assert!(matches!(
            gate.principal(PrincipalId(42)),
            Err(CoreError::NotFound(EntityKind::Principal))
        ));
    }
}
