//! Task lifecycle: content edits, the completion toggle, importance ranking
//! and the two calendar views.
//!
//! Every lookup goes through an owner-scoped [`TaskFilter`], so a task that
//! is missing, deleted or owned by someone else is the same `NotFound`.

use chrono::Duration;
use tracing::info;

use pisalist_shared::constants::TIMELINE_DAYS;
use pisalist_shared::patch::Patch;
use pisalist_shared::repository::{NewTask, Repository, TaskChanges, TaskFilter, TaskOrder, TaskWindow};
use pisalist_shared::{CoreError, CoreResult, EntityKind, PrincipalId, Task, TaskId, TaskUpdate};

use crate::clock::{day_bounds, start_of_day, Clock, SystemClock};
use crate::validation;

pub struct TaskLifecycle<T, C = SystemClock> {
    tasks: T,
    clock: C,
}

impl<T> TaskLifecycle<T, SystemClock>
where
    T: Repository<Task>,
{
    pub fn new(tasks: T) -> Self {
        Self::with_clock(tasks, SystemClock)
    }
}

impl<T, C> TaskLifecycle<T, C>
where
    T: Repository<Task>,
    C: Clock,
{
    pub fn with_clock(tasks: T, clock: C) -> Self {
        Self { tasks, clock }
    }

    pub fn create(
        &self,
        owner: PrincipalId,
        event: String,
        description: String,
        is_cycle: bool,
        importance_level: i64,
    ) -> CoreResult<Task> {
        let importance_level = validation::importance(importance_level)?;
        validation::event(&event)?;

        let task = self.tasks.insert(NewTask {
            owner_id: owner,
            event,
            description,
            is_cycle,
            importance_level,
        })?;

        info!(task_id = %task.id, owner_id = %owner, "Task created");
        Ok(task)
    }

    /// Apply the fields present in `update` and return the re-read task.
    pub fn update(&self, owner: PrincipalId, id: TaskId, update: TaskUpdate) -> CoreResult<Task> {
        if let Patch::Set(event) = &update.event {
            validation::event(event)?;
        }

        let changes = TaskChanges {
            event: update.event,
            description: update.description,
            is_cycle: update.is_cycle,
            ..TaskChanges::default()
        };
        self.write(owner, id, &changes)
    }

    /// Soft delete.
    pub fn delete(&self, owner: PrincipalId, id: TaskId) -> CoreResult<()> {
        if self.tasks.soft_delete(&TaskFilter::one(owner, id))? == 0 {
            return Err(CoreError::NotFound(EntityKind::Task));
        }
        info!(task_id = %id, owner_id = %owner, "Task deleted");
        Ok(())
    }

    /// Flip between active and completed.
    ///
    /// Completing stamps `completed_at` with the current time; reactivating
    /// clears it. Content and importance are untouched.
    pub fn toggle_completion(&self, owner: PrincipalId, id: TaskId) -> CoreResult<Task> {
        let current = self.find(owner, id)?;

        let completed_at = if current.completed {
            None
        } else {
            Some(self.clock.now_utc())
        };
        let changes = TaskChanges {
            completion: Patch::Set(completed_at),
            ..TaskChanges::default()
        };
        let task = self.write(owner, id, &changes)?;

        info!(task_id = %id, completed = task.completed, "Task completion toggled");
        Ok(task)
    }

    /// The level is checked before the task is looked up.
    pub fn set_importance(&self, owner: PrincipalId, id: TaskId, level: i64) -> CoreResult<Task> {
        let importance_level = validation::importance(level)?;

        let changes = TaskChanges {
            importance_level: Patch::Set(importance_level),
            ..TaskChanges::default()
        };
        self.write(owner, id, &changes)
    }

    /// Active tasks, tasks completed today and completed recurring tasks,
    /// least important first.
    pub fn list_today(&self, owner: PrincipalId) -> CoreResult<Vec<Task>> {
        let (day_start, day_end) = day_bounds(self.clock.now());
        let filter = TaskFilter::owned_by(owner).within(TaskWindow::Today { day_start, day_end });
        Ok(self.tasks.find_many(&filter, TaskOrder::ImportanceAsc)?)
    }

    /// Tasks completed during the last seven calendar days, today included,
    /// most recent first.
    pub fn list_timeline(&self, owner: PrincipalId) -> CoreResult<Vec<Task>> {
        let since = start_of_day(self.clock.now() - Duration::days(TIMELINE_DAYS - 1));
        let filter = TaskFilter::owned_by(owner).within(TaskWindow::CompletedSince(since));
        Ok(self.tasks.find_many(&filter, TaskOrder::CompletedAtDesc)?)
    }

    pub fn list_all(&self, owner: PrincipalId) -> CoreResult<Vec<Task>> {
        Ok(self.tasks.find_many(&TaskFilter::owned_by(owner), TaskOrder::Id)?)
    }

    fn find(&self, owner: PrincipalId, id: TaskId) -> CoreResult<Task> {
        self.tasks
            .find_one(&TaskFilter::one(owner, id))?
            .ok_or(CoreError::NotFound(EntityKind::Task))
    }

    fn write(&self, owner: PrincipalId, id: TaskId, changes: &TaskChanges) -> CoreResult<Task> {
        let filter = TaskFilter::one(owner, id);
        if self.tasks.update_fields(&filter, changes)? == 0 {
            return Err(CoreError::NotFound(EntityKind::Task));
        }
        self.find(owner, id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, FixedOffset};
    use pisalist_store::Database;

    use super::*;
    use crate::clock::FixedClock;

    const ALICE: PrincipalId = PrincipalId(1);
    const BOB: PrincipalId = PrincipalId(2);

    fn at(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn lifecycle_at(db: &Arc<Database>, raw: &str) -> TaskLifecycle<Arc<Database>, FixedClock> {
        TaskLifecycle::with_clock(db.clone(), FixedClock(at(raw)))
    }

    fn service() -> TaskLifecycle<Arc<Database>, FixedClock> {
        lifecycle_at(&Arc::new(Database::open_in_memory().unwrap()), "2025-03-10T09:00:00+02:00")
    }

    fn add(service: &TaskLifecycle<Arc<Database>, FixedClock>, event: &str, level: i64, cycle: bool) -> Task {
        service
            .create(ALICE, event.to_string(), String::new(), cycle, level)
            .unwrap()
    }

    #[test]
    fn create_then_toggle_twice() {
        let service = service();
        let task = add(&service, "Buy milk", 3, false);
        assert!(!task.completed);
        assert!(task.completed_at.is_none());

        let done = service.toggle_completion(ALICE, task.id).unwrap();
        assert!(done.completed);
        assert_eq!(done.completed_at, Some(at("2025-03-10T07:00:00Z").into()));

        let back = service.toggle_completion(ALICE, task.id).unwrap();
        assert!(!back.completed);
        assert!(back.completed_at.is_none());
        assert_eq!(back.importance_level, task.importance_level);
        assert_eq!(back.event, task.event);
    }

    #[test]
    fn create_rejects_bad_input() {
        let service = service();
        for level in [-1, 6] {
            let err = service
                .create(ALICE, "ok".into(), String::new(), false, level)
                .unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
        let err = service
            .create(ALICE, "  ".into(), String::new(), false, 0)
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(service.list_all(ALICE).unwrap().is_empty());
    }

    #[test]
    fn update_writes_only_present_fields() {
        let service = service();
        let task = service
            .create(ALICE, "Read".into(), "chapter 1".into(), false, 2)
            .unwrap();

        let update = TaskUpdate {
            description: Patch::Set("chapter 2".into()),
            ..TaskUpdate::default()
        };
        let updated = service.update(ALICE, task.id, update).unwrap();
        assert_eq!(updated.event, "Read");
        assert_eq!(updated.description, "chapter 2");
        assert_eq!(updated.importance_level, task.importance_level);

        let blank = TaskUpdate {
            event: Patch::Set(String::new()),
            ..TaskUpdate::default()
        };
        assert!(matches!(
            service.update(ALICE, task.id, blank),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn set_importance_validates_before_lookup() {
        let service = service();
        let task = add(&service, "Plan", 0, false);

        for level in 0..=5 {
            let updated = service.set_importance(ALICE, task.id, level).unwrap();
            assert_eq!(i64::from(updated.importance_level), level);
        }

        // Invalid level on a missing task is still a validation failure.
        assert!(matches!(
            service.set_importance(ALICE, TaskId(999), 6),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            service.set_importance(ALICE, TaskId(999), 1),
            Err(CoreError::NotFound(EntityKind::Task))
        ));
    }

    #[test]
    fn other_owners_see_not_found() {
        let service = service();
        let task = add(&service, "Private", 1, false);

        let missing = service.toggle_completion(BOB, TaskId(999)).unwrap_err();
        let foreign = service.toggle_completion(BOB, task.id).unwrap_err();
        assert_eq!(missing.to_string(), foreign.to_string());

        assert!(matches!(
            service.update(BOB, task.id, TaskUpdate::default()),
            Err(CoreError::NotFound(EntityKind::Task))
        ));
        assert!(matches!(
            service.delete(BOB, task.id),
            Err(CoreError::NotFound(EntityKind::Task))
        ));
        assert!(service.list_all(BOB).unwrap().is_empty());
        assert_eq!(service.list_all(ALICE).unwrap().len(), 1);
    }

    #[test]
    fn deleted_tasks_disappear() {
        let service = service();
        let task = add(&service, "Temp", 1, false);

        service.delete(ALICE, task.id).unwrap();
        assert!(service.list_all(ALICE).unwrap().is_empty());
        assert!(matches!(
            service.delete(ALICE, task.id),
            Err(CoreError::NotFound(EntityKind::Task))
        ));
        assert!(matches!(
            service.toggle_completion(ALICE, task.id),
            Err(CoreError::NotFound(EntityKind::Task))
        ));
    }

    #[test]
    fn today_orders_by_importance_then_id() {
        let service = service();
        let a = add(&service, "a", 4, false);
        let b = add(&service, "b", 1, false);
        let c = add(&service, "c", 4, false);

        let ids: Vec<_> = service.list_today(ALICE).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id, a.id, c.id]);
    }

    #[test]
    fn yesterday_versus_today_windows() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let yesterday = lifecycle_at(&db, "2025-03-09T22:30:00+02:00");
        let today = lifecycle_at(&db, "2025-03-10T09:00:00+02:00");

        let plain = add(&today, "plain", 0, false);
        let cyclic_old = add(&today, "cyclic old", 0, true);
        let cyclic_now = add(&today, "cyclic now", 0, true);
        let open = add(&today, "open", 0, false);

        yesterday.toggle_completion(ALICE, plain.id).unwrap();
        yesterday.toggle_completion(ALICE, cyclic_old.id).unwrap();
        today.toggle_completion(ALICE, cyclic_now.id).unwrap();

        let today_ids: Vec<_> = today.list_today(ALICE).unwrap().iter().map(|t| t.id).collect();
        assert!(!today_ids.contains(&plain.id));
        assert!(today_ids.contains(&cyclic_old.id));
        assert!(today_ids.contains(&cyclic_now.id));
        assert!(today_ids.contains(&open.id));

        let timeline: Vec<_> = today
            .list_timeline(ALICE)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[0], cyclic_now.id);
        assert!(timeline.contains(&plain.id));
        assert!(!timeline.contains(&open.id));
    }

    #[test]
    fn timeline_covers_seven_calendar_days() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let today = lifecycle_at(&db, "2025-03-10T09:00:00+02:00");
        let six_days_ago = lifecycle_at(&db, "2025-03-04T00:00:01+02:00");
        let seven_days_ago = lifecycle_at(&db, "2025-03-03T23:59:59+02:00");

        let inside = add(&today, "inside", 0, false);
        let outside = add(&today, "outside", 0, false);
        six_days_ago.toggle_completion(ALICE, inside.id).unwrap();
        seven_days_ago.toggle_completion(ALICE, outside.id).unwrap();

        let ids: Vec<_> = today.list_timeline(ALICE).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![inside.id]);
    }

    #[test]
    fn completion_flag_tracks_timestamp() {
        let service = service();
        let task = add(&service, "Invariant", 2, false);

        let mut current = task;
        for _ in 0..5 {
            current = service.toggle_completion(ALICE, current.id).unwrap();
            assert_eq!(current.completed, current.completed_at.is_some());
            current = service.set_importance(ALICE, current.id, 5).unwrap();
            assert_eq!(current.completed, current.completed_at.is_some());
        }
    }
}
