//! Persistence interface consumed by the core services.
//!
//! Each record family plugs its own draft, filter, order and change-set types
//! into the generic [`Repository`] primitives. Task and wish filters carry a
//! mandatory owner, so every query the core can express is already scoped to
//! one principal at the lowest layer.

use chrono::{DateTime, Utc};

use crate::error::RepoError;
use crate::models::{Principal, SharedWish, Task, Wish};
use crate::patch::Patch;
use crate::types::{Importance, PrincipalId, TaskId, WishId};

pub type RepoResult<T> = std::result::Result<T, RepoError>;

/// Associated types describing how a record is created, selected and edited.
pub trait Record: Sized {
    type Draft;
    type Filter;
    type Order: Copy + Default;
    type Changes;
}

/// The narrow set of primitives a store must provide.
///
/// Soft-deleted rows are invisible to every primitive. `update_fields` and
/// `soft_delete` return the number of rows they touched.
pub trait Repository<R: Record>: Send + Sync {
    fn insert(&self, draft: R::Draft) -> RepoResult<R>;

    fn find_one(&self, filter: &R::Filter) -> RepoResult<Option<R>>;

    fn find_many(&self, filter: &R::Filter, order: R::Order) -> RepoResult<Vec<R>>;

    fn update_fields(&self, filter: &R::Filter, changes: &R::Changes) -> RepoResult<usize>;

    fn soft_delete(&self, filter: &R::Filter) -> RepoResult<usize>;

    fn count(&self, filter: &R::Filter) -> RepoResult<u64>;

    fn fetch_at_offset(
        &self,
        filter: &R::Filter,
        order: R::Order,
        offset: u64,
    ) -> RepoResult<Option<R>>;
}

impl<R, T> Repository<R> for std::sync::Arc<T>
where
    R: Record,
    T: Repository<R> + ?Sized,
{
    fn insert(&self, draft: R::Draft) -> RepoResult<R> {
        (**self).insert(draft)
    }

    fn find_one(&self, filter: &R::Filter) -> RepoResult<Option<R>> {
        (**self).find_one(filter)
    }

    fn find_many(&self, filter: &R::Filter, order: R::Order) -> RepoResult<Vec<R>> {
        (**self).find_many(filter, order)
    }

    fn update_fields(&self, filter: &R::Filter, changes: &R::Changes) -> RepoResult<usize> {
        (**self).update_fields(filter, changes)
    }

    fn soft_delete(&self, filter: &R::Filter) -> RepoResult<usize> {
        (**self).soft_delete(filter)
    }

    fn count(&self, filter: &R::Filter) -> RepoResult<u64> {
        (**self).count(filter)
    }

    fn fetch_at_offset(
        &self,
        filter: &R::Filter,
        order: R::Order,
        offset: u64,
    ) -> RepoResult<Option<R>> {
        (**self).fetch_at_offset(filter, order, offset)
    }
}

/// Moves a private wish into the community pool.
///
/// Copying the snapshot and flagging the source wish happen as one unit: either
/// both are visible afterwards or neither is.
pub trait CommunityPublisher: Send + Sync {
    /// Returns `None` when the owner has no live wish with this id.
    fn publish(&self, owner_id: PrincipalId, wish_id: WishId) -> RepoResult<Option<SharedWish>>;
}

impl<T> CommunityPublisher for std::sync::Arc<T>
where
    T: CommunityPublisher + ?Sized,
{
    fn publish(&self, owner_id: PrincipalId, wish_id: WishId) -> RepoResult<Option<SharedWish>> {
        (**self).publish(owner_id, wish_id)
    }
}

/// Change-set for records that are never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immutable {}

/// Insertion order, the only order some families need.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ById;

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrincipal {
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalFilter {
    Id(PrincipalId),
    Username(String),
    Email(String),
}

impl Record for Principal {
    type Draft = NewPrincipal;
    type Filter = PrincipalFilter;
    type Order = ById;
    type Changes = Immutable;
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub owner_id: PrincipalId,
    pub event: String,
    pub description: String,
    pub is_cycle: bool,
    pub importance_level: Importance,
}

/// Selects tasks of exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub owner_id: PrincipalId,
    pub id: Option<TaskId>,
    pub window: TaskWindow,
}

impl TaskFilter {
    pub fn owned_by(owner_id: PrincipalId) -> Self {
        Self {
            owner_id,
            id: None,
            window: TaskWindow::Any,
        }
    }

    pub fn one(owner_id: PrincipalId, id: TaskId) -> Self {
        Self {
            id: Some(id),
            ..Self::owned_by(owner_id)
        }
    }

    pub fn within(mut self, window: TaskWindow) -> Self {
        self.window = window;
        self
    }
}

/// Time-windowed visibility predicates over tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskWindow {
    Any,
    /// Active tasks, tasks completed within `[day_start, day_end)`, and
    /// completed recurring tasks regardless of completion time.
    Today {
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    },
    /// Completed tasks whose `completed_at >= since`.
    CompletedSince(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskOrder {
    #[default]
    Id,
    /// Ascending importance, ties by id.
    ImportanceAsc,
    /// Most recently completed first, ties by id.
    CompletedAtDesc,
}

/// Field set written by `update_fields` for tasks.
///
/// `completion` drives both `completed` and `completed_at` from one value:
/// `Set(Some(t))` marks the task completed at `t`, `Set(None)` reactivates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub event: Patch<String>,
    pub description: Patch<String>,
    pub is_cycle: Patch<bool>,
    pub importance_level: Patch<Importance>,
    pub completion: Patch<Option<DateTime<Utc>>>,
}

impl Record for Task {
    type Draft = NewTask;
    type Filter = TaskFilter;
    type Order = TaskOrder;
    type Changes = TaskChanges;
}

// ---------------------------------------------------------------------------
// Wish
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWish {
    pub owner_id: PrincipalId,
    pub event: String,
    pub description: String,
    pub is_cycle: bool,
}

/// Selects wishes of exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishFilter {
    pub owner_id: PrincipalId,
    pub id: Option<WishId>,
}

impl WishFilter {
    pub fn owned_by(owner_id: PrincipalId) -> Self {
        Self { owner_id, id: None }
    }

    pub fn one(owner_id: PrincipalId, id: WishId) -> Self {
        Self {
            owner_id,
            id: Some(id),
        }
    }
}

/// Field set written by `update_fields` for wishes.
///
/// `is_shared` is absent: it is only ever switched on by
/// [`CommunityPublisher::publish`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishChanges {
    pub event: Patch<String>,
    pub description: Patch<String>,
    pub is_cycle: Patch<bool>,
}

impl Record for Wish {
    type Draft = NewWish;
    type Filter = WishFilter;
    type Order = ById;
    type Changes = WishChanges;
}

// ---------------------------------------------------------------------------
// SharedWish
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSharedWish {
    pub original_wish_id: Option<WishId>,
    pub event: String,
    pub description: String,
    pub shared_by_id: Option<PrincipalId>,
}

/// Selects the live community pool, which is readable by everyone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommunityFilter;

impl CommunityFilter {
    pub fn all() -> Self {
        CommunityFilter
    }
}

impl Record for SharedWish {
    type Draft = NewSharedWish;
    type Filter = CommunityFilter;
    type Order = ById;
    type Changes = Immutable;
}
