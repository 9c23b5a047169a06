//! [`Repository`] primitives for [`Principal`] records (the `users` table).

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};

use pisalist_shared::repository::{
    ById, Immutable, NewPrincipal, PrincipalFilter, RepoResult, Repository,
};
use pisalist_shared::{Principal, PrincipalId};

use crate::database::{fmt_ts, parse_ts, Database};
use crate::error::StoreError;

const COLUMNS: &str = "id, username, password_hash, email, created_at, updated_at";

impl Repository<Principal> for Database {
    fn insert(&self, draft: NewPrincipal) -> RepoResult<Principal> {
        let conn = self.conn()?;
        let now = fmt_ts(Utc::now());

        conn.execute(
            "INSERT INTO users (username, password_hash, email, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![draft.username, draft.password_hash, draft.email, now],
        )
        .map_err(StoreError::from_write)?;

        let id = conn.last_insert_rowid();
        let principal = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_principal,
            )
            .map_err(StoreError::from)?;
        Ok(principal)
    }

    fn find_one(&self, filter: &PrincipalFilter) -> RepoResult<Option<Principal>> {
        <Self as Repository<Principal>>::fetch_at_offset(self, filter, ById, 0)
    }

    fn find_many(&self, filter: &PrincipalFilter, _order: ById) -> RepoResult<Vec<Principal>> {
        let conn = self.conn()?;
        let (clause, value) = where_clause(filter);
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM users WHERE {clause} ORDER BY id ASC"
            ))
            .map_err(StoreError::from)?;

        let rows = stmt
            .query_map(params![value], row_to_principal)
            .map_err(StoreError::from)?;
        let principals = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;
        Ok(principals)
    }

    fn update_fields(&self, _filter: &PrincipalFilter, changes: &Immutable) -> RepoResult<usize> {
        match *changes {}
    }

    fn soft_delete(&self, filter: &PrincipalFilter) -> RepoResult<usize> {
        let conn = self.conn()?;
        let now = fmt_ts(Utc::now());
        let (clause, value) = where_clause(filter);

        let affected = conn
            .execute(
                &format!("UPDATE users SET deleted_at = ?, updated_at = ? WHERE {clause}"),
                params_from_iter([Value::Text(now.clone()), Value::Text(now), value]),
            )
            .map_err(StoreError::from)?;
        Ok(affected)
    }

    fn count(&self, filter: &PrincipalFilter) -> RepoResult<u64> {
        let conn = self.conn()?;
        let (clause, value) = where_clause(filter);

        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM users WHERE {clause}"),
                params![value],
                |row| row.get(0),
            )
            .map_err(StoreError::from)?;
        Ok(count.max(0) as u64)
    }

    fn fetch_at_offset(
        &self,
        filter: &PrincipalFilter,
        _order: ById,
        offset: u64,
    ) -> RepoResult<Option<Principal>> {
        let conn = self.conn()?;
        let (clause, value) = where_clause(filter);

        let principal = conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM users WHERE {clause} ORDER BY id ASC LIMIT 1 OFFSET ?"
                ),
                params![value, i64::try_from(offset).unwrap_or(i64::MAX)],
                row_to_principal,
            )
            .optional()
            .map_err(StoreError::from)?;
        Ok(principal)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn where_clause(filter: &PrincipalFilter) -> (&'static str, Value) {
    match filter {
        PrincipalFilter::Id(id) => ("id = ? AND deleted_at IS NULL", Value::Integer(id.get())),
        PrincipalFilter::Username(username) => (
            "username = ? AND deleted_at IS NULL",
            Value::Text(username.clone()),
        ),
        PrincipalFilter::Email(email) => (
            "email = ? AND deleted_at IS NULL",
            Value::Text(email.clone()),
        ),
    }
}

fn row_to_principal(row: &rusqlite::Row<'_>) -> rusqlite::Result<Principal> {
    let created_str: String = row.get(4)?;
    let updated_str: String = row.get(5)?;

    Ok(Principal {
        id: PrincipalId(row.get(0)?),
        username: row.get(1)?,
        password_hash: row.get(2)?,
        email: row.get(3)?,
        created_at: parse_ts(4, &created_str)?,
        updated_at: parse_ts(5, &updated_str)?,
    })
}
