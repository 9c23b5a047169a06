//! [`Repository`] primitives for the community pool of [`SharedWish`]
//! snapshots, the transactional publish step, and first-run seeding.
//!
//! Snapshots are immutable: the change-set type is uninhabited, so
//! `update_fields` can never be called with a value.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use pisalist_shared::repository::{
    ById, CommunityFilter, CommunityPublisher, Immutable, NewSharedWish, RepoResult, Repository,
};
use pisalist_shared::{PrincipalId, SharedWish, SharedWishId, WishId};

use crate::database::{fmt_ts, parse_opt_ts, parse_ts, Database};
use crate::error::{Result, StoreError};

const COLUMNS: &str = "id, original_wish_id, event, description, shared_by_id, \
                       created_at, updated_at, deleted_at";

/// The pool is everything not soft-deleted; [`CommunityFilter`] selects all of it.
const LIVE: &str = "deleted_at IS NULL";

/// Entries inserted into an empty community pool on first start.
pub const DEFAULT_COMMUNITY_WISHES: &[(&str, &str)] = &[
    ("Travel around the world", "Experience the cultures of different countries"),
    ("Learn a new language", "Master a foreign language and widen my horizons"),
    ("Run a marathon", "Finish a marathon after steady long-term training"),
    ("Learn to cook", "Cook good food for my family"),
    ("Start a company", "Make the founder dream real and create value"),
    ("Write a book", "Record my thoughts and experiences"),
    ("Learn photography", "Capture the beautiful moments of everyday life"),
    ("Volunteer", "Give back to society and help others"),
    ("Learn an instrument", "Grow a sense of music and enrich my life"),
    ("Plant a garden", "Raise plants by hand and watch them grow"),
];

impl Database {
    /// Insert [`DEFAULT_COMMUNITY_WISHES`] when the pool is empty.
    ///
    /// Returns the number of rows inserted (zero when the pool already has
    /// entries).
    pub fn seed_community(&self) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM shared_wishes WHERE deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(0);
        }

        let now = fmt_ts(Utc::now());
        for (event, description) in DEFAULT_COMMUNITY_WISHES {
            tx.execute(
                "INSERT INTO shared_wishes (original_wish_id, event, description, shared_by_id,
                                            created_at, updated_at)
                 VALUES (NULL, ?1, ?2, NULL, ?3, ?3)",
                params![event, description, now],
            )?;
        }
        tx.commit()?;

        tracing::info!(
            count = DEFAULT_COMMUNITY_WISHES.len(),
            "seeded community pool with default wishes"
        );
        Ok(DEFAULT_COMMUNITY_WISHES.len())
    }
}

impl CommunityPublisher for Database {
    fn publish(&self, owner_id: PrincipalId, wish_id: WishId) -> RepoResult<Option<SharedWish>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(StoreError::from)?;

        let source: Option<(String, String)> = tx
            .query_row(
                "SELECT event, description FROM wishes
                 WHERE id = ?1 AND owner_id = ?2 AND deleted_at IS NULL",
                params![wish_id.get(), owner_id.get()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(StoreError::from)?;
        let Some((event, description)) = source else {
            return Ok(None);
        };

        let now = fmt_ts(Utc::now());
        tx.execute(
            "INSERT INTO shared_wishes (original_wish_id, event, description, shared_by_id,
                                        created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![wish_id.get(), event, description, owner_id.get(), now],
        )
        .map_err(StoreError::from_write)?;
        let id = SharedWishId(tx.last_insert_rowid());

        tx.execute(
            "UPDATE wishes SET is_shared = 1, updated_at = ?1 WHERE id = ?2",
            params![now, wish_id.get()],
        )
        .map_err(StoreError::from_write)?;

        let shared = fetch_by_id(&tx, id)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(Some(shared))
    }
}

impl Repository<SharedWish> for Database {
    fn insert(&self, draft: NewSharedWish) -> RepoResult<SharedWish> {
        let conn = self.conn()?;
        let now = fmt_ts(Utc::now());

        conn.execute(
            "INSERT INTO shared_wishes (original_wish_id, event, description, shared_by_id,
                                        created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                draft.original_wish_id.map(WishId::get),
                draft.event,
                draft.description,
                draft.shared_by_id.map(PrincipalId::get),
                now,
            ],
        )
        .map_err(StoreError::from_write)?;

        let id = SharedWishId(conn.last_insert_rowid());
        Ok(fetch_by_id(&conn, id)?)
    }

    fn find_one(&self, filter: &CommunityFilter) -> RepoResult<Option<SharedWish>> {
        <Self as Repository<SharedWish>>::fetch_at_offset(self, filter, ById, 0)
    }

    fn find_many(&self, _filter: &CommunityFilter, _order: ById) -> RepoResult<Vec<SharedWish>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM shared_wishes WHERE {LIVE} ORDER BY id ASC"
            ))
            .map_err(StoreError::from)?;

        let rows = stmt
            .query_map([], row_to_shared_wish)
            .map_err(StoreError::from)?;
        let pool = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;
        Ok(pool)
    }

    fn update_fields(&self, _filter: &CommunityFilter, changes: &Immutable) -> RepoResult<usize> {
        match *changes {}
    }

    fn soft_delete(&self, _filter: &CommunityFilter) -> RepoResult<usize> {
        let now = fmt_ts(Utc::now());
        let conn = self.conn()?;
        let affected = conn
            .execute(
                &format!("UPDATE shared_wishes SET deleted_at = ?1, updated_at = ?1 WHERE {LIVE}"),
                params![now],
            )
            .map_err(StoreError::from)?;
        Ok(affected)
    }

    fn count(&self, _filter: &CommunityFilter) -> RepoResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM shared_wishes WHERE {LIVE}"),
                [],
                |row| row.get(0),
            )
            .map_err(StoreError::from)?;
        Ok(count.max(0) as u64)
    }

    fn fetch_at_offset(
        &self,
        _filter: &CommunityFilter,
        _order: ById,
        offset: u64,
    ) -> RepoResult<Option<SharedWish>> {
        let conn = self.conn()?;
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let entry = conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM shared_wishes WHERE {LIVE} \
                     ORDER BY id ASC LIMIT 1 OFFSET ?1"
                ),
                params![offset],
                row_to_shared_wish,
            )
            .optional()
            .map_err(StoreError::from)?;
        Ok(entry)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fetch_by_id(conn: &Connection, id: SharedWishId) -> Result<SharedWish> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM shared_wishes WHERE id = ?1"),
        params![id.get()],
        row_to_shared_wish,
    )
    .map_err(StoreError::from)
}

fn row_to_shared_wish(row: &rusqlite::Row<'_>) -> rusqlite::Result<SharedWish> {
    let original: Option<i64> = row.get(1)?;
    let shared_by: Option<i64> = row.get(4)?;
    let created_str: String = row.get(5)?;
    let updated_str: String = row.get(6)?;

    Ok(SharedWish {
        id: SharedWishId(row.get(0)?),
        original_wish_id: original.map(WishId),
        event: row.get(2)?,
        description: row.get(3)?,
        shared_by_id: shared_by.map(PrincipalId),
        created_at: parse_ts(5, &created_str)?,
        updated_at: parse_ts(6, &updated_str)?,
        deleted_at: parse_opt_ts(7, row.get(7)?)?,
    })
}

#[cfg(test)]
mod tests {
    use pisalist_shared::repository::{NewWish, WishFilter};
    use pisalist_shared::Wish;

    use super::*;

    #[test]
    fn seeding_only_fills_an_empty_pool() {
        let db = Database::open_in_memory().unwrap();
        let repo: &dyn Repository<SharedWish> = &db;

        assert_eq!(db.seed_community().unwrap(), DEFAULT_COMMUNITY_WISHES.len());
        assert_eq!(db.seed_community().unwrap(), 0);

        let pool = repo.find_many(&CommunityFilter::all(), ById).unwrap();
        assert_eq!(pool.len(), DEFAULT_COMMUNITY_WISHES.len());
        assert!(pool.iter().all(|entry| entry.original_wish_id.is_none()));
        assert!(pool.iter().all(|entry| entry.shared_by_id.is_none()));
    }

    #[test]
    fn offset_follows_id_order() {
        let db = Database::open_in_memory().unwrap();
        let repo: &dyn Repository<SharedWish> = &db;
        let mut ids = Vec::new();
        for n in 0..4 {
            let entry = repo
                .insert(NewSharedWish {
                    original_wish_id: Some(WishId(n)),
                    event: format!("wish {n}"),
                    description: String::new(),
                    shared_by_id: Some(PrincipalId(1)),
                })
                .unwrap();
            ids.push(entry.id);
        }

        for (offset, id) in ids.iter().enumerate() {
            let entry = repo
                .fetch_at_offset(&CommunityFilter::all(), ById, offset as u64)
                .unwrap()
                .unwrap();
            assert_eq!(entry.id, *id);
        }
        assert!(repo
            .fetch_at_offset(&CommunityFilter::all(), ById, 4)
            .unwrap()
            .is_none());
        assert_eq!(repo.count(&CommunityFilter::all()).unwrap(), 4);
    }

    fn private_wish(db: &Database, owner: i64, event: &str) -> Wish {
        let wishes: &dyn Repository<Wish> = db;
        wishes
            .insert(NewWish {
                owner_id: PrincipalId(owner),
                event: event.to_string(),
                description: "one day".to_string(),
                is_cycle: false,
            })
            .unwrap()
    }

    #[test]
    fn publish_copies_the_wish_and_flags_it() {
        let db = Database::open_in_memory().unwrap();
        let wish = private_wish(&db, 1, "See the aurora");

        let shared = db.publish(PrincipalId(1), wish.id).unwrap().unwrap();
        assert_eq!(shared.original_wish_id, Some(wish.id));
        assert_eq!(shared.shared_by_id, Some(PrincipalId(1)));
        assert_eq!(shared.event, "See the aurora");
        assert_eq!(shared.description, "one day");

        let wishes: &dyn Repository<Wish> = &db;
        let source = wishes
            .find_one(&WishFilter::one(PrincipalId(1), wish.id))
            .unwrap()
            .unwrap();
        assert!(source.is_shared);
    }

    #[test]
    fn publish_skips_foreign_and_deleted_wishes() {
        let db = Database::open_in_memory().unwrap();
        let wish = private_wish(&db, 1, "Secret");

        assert!(db.publish(PrincipalId(2), wish.id).unwrap().is_none());
        assert!(db.publish(PrincipalId(1), WishId(wish.id.get() + 1)).unwrap().is_none());

        let wishes: &dyn Repository<Wish> = &db;
        wishes
            .soft_delete(&WishFilter::one(PrincipalId(1), wish.id))
            .unwrap();
        assert!(db.publish(PrincipalId(1), wish.id).unwrap().is_none());

        let pool: &dyn Repository<SharedWish> = &db;
        assert_eq!(pool.count(&CommunityFilter::all()).unwrap(), 0);
    }

    #[test]
    fn failed_flag_write_leaves_no_snapshot() {
        let db = Database::open_in_memory().unwrap();
        let wish = private_wish(&db, 1, "Run a marathon");
        db.conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER freeze_wishes BEFORE UPDATE ON wishes
                 BEGIN SELECT RAISE(ABORT, 'wishes are frozen'); END;",
            )
            .unwrap();

        assert!(db.publish(PrincipalId(1), wish.id).is_err());

        let pool: &dyn Repository<SharedWish> = &db;
        assert_eq!(pool.count(&CommunityFilter::all()).unwrap(), 0);
    }
}
