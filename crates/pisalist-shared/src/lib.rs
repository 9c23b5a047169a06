//! # pisalist-shared
//!
//! Types shared by every PisaList crate: typed ids, domain records, the error
//! taxonomy, partial-update requests, the persistence interface, password
//! hashing and the signed token format.

pub mod constants;
pub mod crypto;
pub mod error;
pub mod models;
pub mod patch;
pub mod repository;
pub mod token;
pub mod types;

pub use error::{AuthError, CoreError, CoreResult, CryptoError, EntityKind, RepoError};
pub use models::{Principal, SharedWish, Task, Wish};
pub use patch::{Patch, TaskUpdate, WishUpdate};
pub use types::{Importance, PrincipalId, SharedWishId, TaskId, WishId};
