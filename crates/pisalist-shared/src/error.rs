use thiserror::Error;

/// Errors surfaced by the core services.
///
/// `NotFound` covers both "no such row" and "row owned by someone else";
/// the two are never distinguished outward.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(EntityKind),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepoError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Which kind of record a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Principal,
    Task,
    Wish,
    SharedWish,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Principal => "User",
            EntityKind::Task => "Task",
            EntityKind::Wish => "Wish",
            EntityKind::SharedWish => "Shared wish",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Malformed or tampered token")]
    Malformed,

    #[error("Token expired")]
    Expired,

    #[error("Invalid username or password")]
    InvalidCredential,
}

/// Opaque failure reported by a persistence collaborator.
#[derive(Error, Debug)]
pub enum RepoError {
    /// A unique index rejected the write. Carries the offending column.
    #[error("Unique constraint violated on `{0}`")]
    UniqueViolation(String),

    #[error("Storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepoError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        RepoError::Backend(Box::new(err))
    }
}

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Stored password hash is not a valid PHC string")]
    InvalidHash,
}
