//! Explicit partial-update requests.
//!
//! A field wrapped in [`Patch`] is either left untouched (`Keep`) or written
//! (`Set`). An omitted JSON field deserializes to `Keep`, so "not sent" and
//! "sent with a value" are never confused.

use serde::{Deserialize, Deserializer};

/// Present/absent marker for one field of an update request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Set(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Patch::Set)
    }
}

/// Content edit of a task.
///
/// Importance is deliberately absent: it changes only through the dedicated
/// set-importance operation. Completion changes only through toggling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskUpdate {
    pub event: Patch<String>,
    pub description: Patch<String>,
    pub is_cycle: Patch<bool>,
}

/// Content edit of a wish. `is_shared` is not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WishUpdate {
    pub event: Patch<String>,
    pub description: Patch<String>,
    pub is_cycle: Patch<bool>,
}
