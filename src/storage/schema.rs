use rusqlite::Connection;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS visitors (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    ip_address  TEXT NOT NULL,
    user_agent  TEXT NOT NULL DEFAULT '',
    page        TEXT NOT NULL DEFAULT '/',
    country     TEXT NOT NULL DEFAULT 'Unknown',
    city        TEXT NOT NULL DEFAULT 'Unknown',
    visited_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_visitors_visited_at ON visitors(visited_at);
CREATE INDEX IF NOT EXISTS idx_visitors_country ON visitors(country);
";

/// Create tables and indexes if absent. Safe to run on every startup.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)?;
    tracing::debug!("visitor schema ready");
    Ok(())
}
