//! Domain records shared by the core services, the store and the HTTP layer.
//!
//! Every struct derives `Serialize` so it can be handed directly to the
//! boundary as JSON. The password hash of a [`Principal`] is never serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Importance, PrincipalId, SharedWishId, TaskId, WishId};

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: PrincipalId,
    /// Unique, case-sensitive login name.
    pub username: String,
    /// Argon2id PHC string. Stays inside the process.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Unique, case-sensitive email address.
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A to-do item owned by one principal.
///
/// `completed_at` is `Some` exactly when `completed` is true; the store
/// derives both columns from a single value so the pair cannot drift.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: PrincipalId,
    pub event: String,
    pub description: String,
    pub completed: bool,
    /// Recurring tasks stay in the "today" view after completion.
    pub is_cycle: bool,
    pub importance_level: Importance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Wish
// ---------------------------------------------------------------------------

/// A private wish owned by one principal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wish {
    pub id: WishId,
    pub owner_id: PrincipalId,
    pub event: String,
    pub description: String,
    pub is_cycle: bool,
    /// Set once the wish has been published to the community pool. Never reset.
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// SharedWish
// ---------------------------------------------------------------------------

/// An immutable snapshot of a wish published to the community pool.
///
/// `original_wish_id` is provenance only: the snapshot outlives edits and
/// deletion of the source wish. Seeded entries carry neither provenance nor
/// a publisher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SharedWish {
    pub id: SharedWishId,
    pub original_wish_id: Option<WishId>,
    pub event: String,
    pub description: String,
    pub shared_by_id: Option<PrincipalId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}
