//! v001 -- Initial schema creation.
//!
//! Creates the `records` table holding every cached resource.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Records
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS records (
    kind        TEXT NOT NULL,                -- appointment, purchase, ...
    owner_id    TEXT NOT NULL DEFAULT '',     -- customer id, '' when unscoped
    id          TEXT NOT NULL,                -- server-assigned identity
    fields      TEXT NOT NULL,                -- JSON object of server fields
    is_read     INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    is_default  INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    created_at  TEXT NOT NULL,                -- RFC-3339
    updated_at  TEXT NOT NULL,                -- RFC-3339

    PRIMARY KEY (kind, owner_id, id)
);

CREATE INDEX IF NOT EXISTS idx_records_scope_created
    ON records(kind, owner_id, created_at);

-- One default per (kind, owner).
CREATE UNIQUE INDEX IF NOT EXISTS idx_records_single_default
    ON records(kind, owner_id) WHERE is_default = 1;
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
