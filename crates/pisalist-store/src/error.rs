use pisalist_shared::RepoError;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A unique index rejected an insert. Carries the column name.
    #[error("Unique constraint failed on `{0}`")]
    UniqueViolation(String),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("Database connection lock poisoned")]
    Poisoned,

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),
}

impl StoreError {
    /// Classify a write error, lifting unique-index violations out of the
    /// generic SQLite error.
    pub(crate) fn from_write(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, Some(ref message)) = err {
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                // "UNIQUE constraint failed: users.username"
                let column = message
                    .rsplit('.')
                    .next()
                    .unwrap_or(message.as_str())
                    .trim()
                    .to_string();
                return StoreError::UniqueViolation(column);
            }
        }
        StoreError::Sqlite(err)
    }
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(column) => RepoError::UniqueViolation(column),
            other => RepoError::backend(other),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
