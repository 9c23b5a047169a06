//! [`Repository`] primitives for private [`Wish`] records.

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};

use pisalist_shared::patch::Patch;
use pisalist_shared::repository::{ById, NewWish, RepoResult, Repository, WishChanges, WishFilter};
use pisalist_shared::{PrincipalId, Wish, WishId};

use crate::database::{fmt_ts, parse_opt_ts, parse_ts, Database};
use crate::error::StoreError;

const COLUMNS: &str =
    "id, owner_id, event, description, is_cycle, is_shared, created_at, updated_at, deleted_at";

impl Repository<Wish> for Database {
    fn insert(&self, draft: NewWish) -> RepoResult<Wish> {
        let conn = self.conn()?;
        let now = fmt_ts(Utc::now());

        conn.execute(
            "INSERT INTO wishes (owner_id, event, description, is_cycle, is_shared,
                                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
            params![
                draft.owner_id.get(),
                draft.event,
                draft.description,
                draft.is_cycle,
                now,
            ],
        )
        .map_err(StoreError::from_write)?;

        let id = conn.last_insert_rowid();
        let wish = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM wishes WHERE id = ?1"),
                params![id],
                row_to_wish,
            )
            .map_err(StoreError::from)?;
        Ok(wish)
    }

    fn find_one(&self, filter: &WishFilter) -> RepoResult<Option<Wish>> {
        <Self as Repository<Wish>>::fetch_at_offset(self, filter, ById, 0)
    }

    fn find_many(&self, filter: &WishFilter, _order: ById) -> RepoResult<Vec<Wish>> {
        let conn = self.conn()?;
        let (clause, values) = where_clause(filter);
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM wishes WHERE {clause} ORDER BY id ASC"
            ))
            .map_err(StoreError::from)?;

        let rows = stmt
            .query_map(params_from_iter(values.iter()), row_to_wish)
            .map_err(StoreError::from)?;
        let wishes = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;
        Ok(wishes)
    }

    fn update_fields(&self, filter: &WishFilter, changes: &WishChanges) -> RepoResult<usize> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut values = Vec::new();

        if let Patch::Set(event) = &changes.event {
            assignments.push("event = ?");
            values.push(Value::Text(event.clone()));
        }
        if let Patch::Set(description) = &changes.description {
            assignments.push("description = ?");
            values.push(Value::Text(description.clone()));
        }
        if let Patch::Set(is_cycle) = changes.is_cycle {
            assignments.push("is_cycle = ?");
            values.push(Value::Integer(i64::from(is_cycle)));
        }

        if assignments.is_empty() {
            return Ok(<Self as Repository<Wish>>::count(self, filter)? as usize);
        }

        assignments.push("updated_at = ?");
        values.push(Value::Text(fmt_ts(Utc::now())));

        let (clause, filter_values) = where_clause(filter);
        values.extend(filter_values);

        let conn = self.conn()?;
        let affected = conn
            .execute(
                &format!("UPDATE wishes SET {} WHERE {clause}", assignments.join(", ")),
                params_from_iter(values.iter()),
            )
            .map_err(StoreError::from_write)?;
        Ok(affected)
    }

    fn soft_delete(&self, filter: &WishFilter) -> RepoResult<usize> {
        let now = fmt_ts(Utc::now());
        let (clause, filter_values) = where_clause(filter);
        let mut values = vec![Value::Text(now.clone()), Value::Text(now)];
        values.extend(filter_values);

        let conn = self.conn()?;
        let affected = conn
            .execute(
                &format!("UPDATE wishes SET deleted_at = ?, updated_at = ? WHERE {clause}"),
                params_from_iter(values.iter()),
            )
            .map_err(StoreError::from)?;
        Ok(affected)
    }

    fn count(&self, filter: &WishFilter) -> RepoResult<u64> {
        let conn = self.conn()?;
        let (clause, values) = where_clause(filter);

        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM wishes WHERE {clause}"),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )
            .map_err(StoreError::from)?;
        Ok(count.max(0) as u64)
    }

    fn fetch_at_offset(
        &self,
        filter: &WishFilter,
        _order: ById,
        offset: u64,
    ) -> RepoResult<Option<Wish>> {
        let conn = self.conn()?;
        let (clause, mut values) = where_clause(filter);
        values.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

        let wish = conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM wishes WHERE {clause} ORDER BY id ASC LIMIT 1 OFFSET ?"
                ),
                params_from_iter(values.iter()),
                row_to_wish,
            )
            .optional()
            .map_err(StoreError::from)?;
        Ok(wish)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn where_clause(filter: &WishFilter) -> (String, Vec<Value>) {
    let mut clause = String::from("owner_id = ? AND deleted_at IS NULL");
    let mut values = vec![Value::Integer(filter.owner_id.get())];

    if let Some(id) = filter.id {
        clause.push_str(" AND id = ?");
        values.push(Value::Integer(id.get()));
    }

    (clause, values)
}

fn row_to_wish(row: &rusqlite::Row<'_>) -> rusqlite::Result<Wish> {
    let created_str: String = row.get(6)?;
    let updated_str: String = row.get(7)?;

    Ok(Wish {
        id: WishId(row.get(0)?),
        owner_id: PrincipalId(row.get(1)?),
        event: row.get(2)?,
        description: row.get(3)?,
        is_cycle: row.get(4)?,
        is_shared: row.get(5)?,
        created_at: parse_ts(6, &created_str)?,
        updated_at: parse_ts(7, &updated_str)?,
        deleted_at: parse_opt_ts(8, row.get(8)?)?,
    })
}
