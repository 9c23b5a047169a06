//! # pisalist-store
//!
//! SQLite persistence for PisaList.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and implements the
//! [`Repository`](pisalist_shared::repository::Repository) primitives for
//! every record family. Soft-deleted rows are filtered out of every query.

pub mod community;
pub mod database;
pub mod migrations;
pub mod principals;
pub mod tasks;
pub mod wishes;

mod error;

pub use community::DEFAULT_COMMUNITY_WISHES;
pub use database::Database;
pub use error::StoreError;
