use rusqlite::Connection;

// Owner-scoped lookups back every task and wish query; the timeline
// scans completed tasks by completion time.
const UP_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id, deleted_at);
CREATE INDEX IF NOT EXISTS idx_tasks_owner_completed_at
    ON tasks(owner_id, completed, completed_at DESC);
CREATE INDEX IF NOT EXISTS idx_wishes_owner ON wishes(owner_id, deleted_at);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
