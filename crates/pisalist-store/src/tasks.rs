//! [`Repository`] primitives for [`Task`] records.

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use pisalist_shared::patch::Patch;
use pisalist_shared::repository::{
    NewTask, RepoResult, Repository, TaskChanges, TaskFilter, TaskOrder, TaskWindow,
};
use pisalist_shared::{Importance, PrincipalId, Task, TaskId};

use crate::database::{fmt_ts, parse_opt_ts, parse_ts, Database};
use crate::error::{Result, StoreError};

const COLUMNS: &str = "id, owner_id, event, description, completed, is_cycle, \
                       importance_level, completed_at, created_at, updated_at, deleted_at";

impl Repository<Task> for Database {
    fn insert(&self, draft: NewTask) -> RepoResult<Task> {
        let conn = self.conn()?;
        let now = fmt_ts(Utc::now());

        conn.execute(
            "INSERT INTO tasks (owner_id, event, description, completed, is_cycle,
                                importance_level, completed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, NULL, ?6, ?6)",
            params![
                draft.owner_id.get(),
                draft.event,
                draft.description,
                draft.is_cycle,
                i64::from(draft.importance_level),
                now,
            ],
        )
        .map_err(StoreError::from_write)?;

        let id = TaskId(conn.last_insert_rowid());
        Ok(fetch_by_id(&conn, id)?)
    }

    fn find_one(&self, filter: &TaskFilter) -> RepoResult<Option<Task>> {
        Ok(<Self as Repository<Task>>::fetch_at_offset(self, filter, TaskOrder::Id, 0)?)
    }

    fn find_many(&self, filter: &TaskFilter, order: TaskOrder) -> RepoResult<Vec<Task>> {
        let conn = self.conn()?;
        let (clause, values) = where_clause(filter);
        let sql = format!(
            "SELECT {COLUMNS} FROM tasks WHERE {clause} ORDER BY {}",
            order_by(order)
        );

        let mut stmt = conn.prepare(&sql).map_err(StoreError::from)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), row_to_task)
            .map_err(StoreError::from)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row.map_err(StoreError::from)?);
        }
        Ok(tasks)
    }

    fn update_fields(&self, filter: &TaskFilter, changes: &TaskChanges) -> RepoResult<usize> {
        let (mut assignments, mut values) = set_clause(changes);
        if assignments.is_empty() {
            return Ok(<Self as Repository<Task>>::count(self, filter)? as usize);
        }

        assignments.push("updated_at = ?".to_string());
        values.push(Value::Text(fmt_ts(Utc::now())));

        let (clause, filter_values) = where_clause(filter);
        values.extend(filter_values);

        let sql = format!("UPDATE tasks SET {} WHERE {clause}", assignments.join(", "));
        let conn = self.conn()?;
        let affected = conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(StoreError::from_write)?;
        Ok(affected)
    }

    fn soft_delete(&self, filter: &TaskFilter) -> RepoResult<usize> {
        let now = fmt_ts(Utc::now());
        let (clause, filter_values) = where_clause(filter);
        let mut values = vec![Value::Text(now.clone()), Value::Text(now)];
        values.extend(filter_values);

        let sql = format!("UPDATE tasks SET deleted_at = ?, updated_at = ? WHERE {clause}");
        let conn = self.conn()?;
        let affected = conn
            .execute(&sql, params_from_iter(values.iter()))
            .map_err(StoreError::from)?;
        Ok(affected)
    }

    fn count(&self, filter: &TaskFilter) -> RepoResult<u64> {
        let conn = self.conn()?;
        let (clause, values) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM tasks WHERE {clause}");

        let count: i64 = conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
            .map_err(StoreError::from)?;
        Ok(count.max(0) as u64)
    }

    fn fetch_at_offset(
        &self,
        filter: &TaskFilter,
        order: TaskOrder,
        offset: u64,
    ) -> RepoResult<Option<Task>> {
        let conn = self.conn()?;
        let (clause, mut values) = where_clause(filter);
        values.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
        let sql = format!(
            "SELECT {COLUMNS} FROM tasks WHERE {clause} ORDER BY {} LIMIT 1 OFFSET ?",
            order_by(order)
        );

        let task = conn
            .query_row(&sql, params_from_iter(values.iter()), row_to_task)
            .optional()
            .map_err(StoreError::from)?;
        Ok(task)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build the `WHERE` body for a filter. The owner predicate is always present.
fn where_clause(filter: &TaskFilter) -> (String, Vec<Value>) {
    let mut clauses = vec!["owner_id = ?".to_string(), "deleted_at IS NULL".to_string()];
    let mut values = vec![Value::Integer(filter.owner_id.get())];

    if let Some(id) = filter.id {
        clauses.push("id = ?".to_string());
        values.push(Value::Integer(id.get()));
    }

    match filter.window {
        TaskWindow::Any => {}
        TaskWindow::Today { day_start, day_end } => {
            clauses.push(
                "(completed = 0 \
                  OR (completed = 1 AND completed_at >= ? AND completed_at < ?) \
                  OR (completed = 1 AND is_cycle = 1))"
                    .to_string(),
            );
            values.push(Value::Text(fmt_ts(day_start)));
            values.push(Value::Text(fmt_ts(day_end)));
        }
        TaskWindow::CompletedSince(since) => {
            clauses.push("completed = 1 AND completed_at >= ?".to_string());
            values.push(Value::Text(fmt_ts(since)));
        }
    }

    (clauses.join(" AND "), values)
}

fn set_clause(changes: &TaskChanges) -> (Vec<String>, Vec<Value>) {
    let mut assignments = Vec::new();
    let mut values = Vec::new();

    if let Patch::Set(event) = &changes.event {
        assignments.push("event = ?".to_string());
        values.push(Value::Text(event.clone()));
    }
    if let Patch::Set(description) = &changes.description {
        assignments.push("description = ?".to_string());
        values.push(Value::Text(description.clone()));
    }
    if let Patch::Set(is_cycle) = changes.is_cycle {
        assignments.push("is_cycle = ?".to_string());
        values.push(Value::Integer(i64::from(is_cycle)));
    }
    if let Patch::Set(level) = changes.importance_level {
        assignments.push("importance_level = ?".to_string());
        values.push(Value::Integer(i64::from(level)));
    }
    // Both completion columns come from one value.
    if let Patch::Set(completed_at) = changes.completion {
        assignments.push("completed = ?".to_string());
        values.push(Value::Integer(i64::from(completed_at.is_some())));
        assignments.push("completed_at = ?".to_string());
        values.push(completed_at.map_or(Value::Null, |ts| Value::Text(fmt_ts(ts))));
    }

    (assignments, values)
}

fn order_by(order: TaskOrder) -> &'static str {
    match order {
        TaskOrder::Id => "id ASC",
        TaskOrder::ImportanceAsc => "importance_level ASC, id ASC",
        TaskOrder::CompletedAtDesc => "completed_at DESC, id DESC",
    }
}

fn fetch_by_id(conn: &Connection, id: TaskId) -> Result<Task> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1"),
        params![id.get()],
        row_to_task,
    )
    .map_err(StoreError::from)
}

/// Map a `rusqlite::Row` to a [`Task`].
fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let level: i64 = row.get(6)?;
    let importance_level =
        Importance::new(level).ok_or(rusqlite::Error::IntegralValueOutOfRange(6, level))?;

    let completed_at = parse_opt_ts(7, row.get(7)?)?;
    let created_str: String = row.get(8)?;
    let updated_str: String = row.get(9)?;

    Ok(Task {
        id: TaskId(row.get(0)?),
        owner_id: PrincipalId(row.get(1)?),
        event: row.get(2)?,
        description: row.get(3)?,
        completed: row.get(4)?,
        is_cycle: row.get(5)?,
        importance_level,
        completed_at,
        created_at: parse_ts(8, &created_str)?,
        updated_at: parse_ts(9, &updated_str)?,
        deleted_at: parse_opt_ts(10, row.get(10)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(owner: i64, event: &str, level: i64) -> NewTask {
        NewTask {
            owner_id: PrincipalId(owner),
            event: event.to_string(),
            description: String::new(),
            is_cycle: false,
            importance_level: Importance::new(level).unwrap(),
        }
    }

    #[test]
    fn insert_and_find_scoped_by_owner() {
        let db = Database::open_in_memory().unwrap();
        let repo: &dyn Repository<Task> = &db;
        let task = repo.insert(draft(1, "Buy milk", 3)).unwrap();

        assert_eq!(task.owner_id, PrincipalId(1));
        assert!(!task.completed);
        assert!(task.completed_at.is_none());

        let mine = repo.find_one(&TaskFilter::one(PrincipalId(1), task.id)).unwrap();
        assert_eq!(mine, Some(task.clone()));

        let theirs = repo.find_one(&TaskFilter::one(PrincipalId(2), task.id)).unwrap();
        assert!(theirs.is_none());
    }

    #[test]
    fn completion_writes_both_columns() {
        let db = Database::open_in_memory().unwrap();
        let repo: &dyn Repository<Task> = &db;
        let task = repo.insert(draft(1, "Run", 0)).unwrap();
        let filter = TaskFilter::one(PrincipalId(1), task.id);
        let done_at = Utc::now();

        let changes = TaskChanges {
            completion: Patch::Set(Some(done_at)),
            ..TaskChanges::default()
        };
        assert_eq!(repo.update_fields(&filter, &changes).unwrap(), 1);
        let done = repo.find_one(&filter).unwrap().unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());

        let changes = TaskChanges {
            completion: Patch::Set(None),
            ..TaskChanges::default()
        };
        repo.update_fields(&filter, &changes).unwrap();
        let active = repo.find_one(&filter).unwrap().unwrap();
        assert!(!active.completed);
        assert!(active.completed_at.is_none());
    }

    #[test]
    fn update_outside_owner_scope_touches_nothing() {
        let db = Database::open_in_memory().unwrap();
        let repo: &dyn Repository<Task> = &db;
        let task = repo.insert(draft(1, "Mine", 0)).unwrap();

        let changes = TaskChanges {
            event: Patch::Set("Hijacked".to_string()),
            ..TaskChanges::default()
        };
        let affected = repo
            .update_fields(&TaskFilter::one(PrincipalId(2), task.id), &changes)
            .unwrap();
        assert_eq!(affected, 0);

        let unchanged = repo.find_one(&TaskFilter::one(PrincipalId(1), task.id)).unwrap().unwrap();
        assert_eq!(unchanged.event, "Mine");
    }

    #[test]
    fn soft_deleted_rows_disappear() {
        let db = Database::open_in_memory().unwrap();
        let repo: &dyn Repository<Task> = &db;
        let task = repo.insert(draft(1, "Gone", 0)).unwrap();
        let filter = TaskFilter::one(PrincipalId(1), task.id);

        assert_eq!(repo.soft_delete(&filter).unwrap(), 1);
        assert!(repo.find_one(&filter).unwrap().is_none());
        assert_eq!(repo.count(&TaskFilter::owned_by(PrincipalId(1))).unwrap(), 0);
        assert_eq!(repo.soft_delete(&filter).unwrap(), 0);
    }

    #[test]
    fn importance_order_breaks_ties_by_id() {
        let db = Database::open_in_memory().unwrap();
        let repo: &dyn Repository<Task> = &db;
        let a = repo.insert(draft(1, "a", 4)).unwrap();
        let b = repo.insert(draft(1, "b", 1)).unwrap();
        let c = repo.insert(draft(1, "c", 4)).unwrap();

        let ordered = repo
            .find_many(&TaskFilter::owned_by(PrincipalId(1)), TaskOrder::ImportanceAsc)
            .unwrap();
        let ids: Vec<TaskId> = ordered.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b.id, a.id, c.id]);
    }

    #[test]
    fn completed_since_window() {
        let db = Database::open_in_memory().unwrap();
        let repo: &dyn Repository<Task> = &db;
        let old = repo.insert(draft(1, "old", 0)).unwrap();
        let recent = repo.insert(draft(1, "recent", 0)).unwrap();
        repo.insert(draft(1, "open", 0)).unwrap();
        let now = Utc::now();

        for (task, at) in [(&old, now - Duration::days(30)), (&recent, now - Duration::hours(1))] {
            let changes = TaskChanges {
                completion: Patch::Set(Some(at)),
                ..TaskChanges::default()
            };
            repo.update_fields(&TaskFilter::one(PrincipalId(1), task.id), &changes)
                .unwrap();
        }

        let filter = TaskFilter::owned_by(PrincipalId(1))
            .within(TaskWindow::CompletedSince(now - Duration::days(7)));
        let hits = repo.find_many(&filter, TaskOrder::CompletedAtDesc).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, recent.id);
    }
}
