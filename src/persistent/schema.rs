//! Schema creation and the v1 -> v2 live migration.
//!
//! v1 tables have no `chunk_index` column and hold at most one row per
//! path, with `data` possibly base64 text. v2 is the chunked, binary
//! shape of §3.2. Migration runs inside a single transaction: a partially
//! migrated table is worse than no migration at all.

use rusqlite::{params, Connection, OptionalExtension};

const TABLE: &str = "git_objects";

const CREATE_V2_TABLE: &str = "
    CREATE TABLE git_objects (
        path TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        parent_path TEXT NOT NULL,
        data BLOB,
        is_dir INTEGER NOT NULL,
        size INTEGER NOT NULL,
        mtime INTEGER NOT NULL,
        PRIMARY KEY (path, chunk_index)
    )
";

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_git_objects_parent ON git_objects (parent_path, path)",
    "CREATE INDEX IF NOT EXISTS idx_git_objects_is_dir ON git_objects (is_dir, path)",
];

/// What [`init`] found and did. Logged at `info`; not otherwise observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Fresh,
    MigratedFromV1,
    UpToDate,
}

fn table_exists(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![TABLE],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
}

fn has_chunk_index_column(conn: &Connection) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({TABLE})"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == "chunk_index" {
            return Ok(true);
        }
    }
    Ok(false)
}

fn insert_root_row(conn: &Connection, now_ms: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO git_objects
            (path, chunk_index, parent_path, data, is_dir, size, mtime)
         VALUES ('', 0, '', NULL, 1, 0, ?1)",
        params![now_ms],
    )?;
    Ok(())
}

fn create_v2_schema(conn: &Connection, now_ms: i64) -> rusqlite::Result<()> {
    conn.execute(CREATE_V2_TABLE, [])?;
    for stmt in CREATE_INDEXES {
        conn.execute(stmt, [])?;
    }
    insert_root_row(conn, now_ms)?;
    Ok(())
}

fn migrate_v1_to_v2(conn: &Connection, now_ms: i64) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE git_objects_v2_shadow (
            path TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            parent_path TEXT NOT NULL,
            data BLOB,
            is_dir INTEGER NOT NULL,
            size INTEGER NOT NULL,
            mtime INTEGER NOT NULL,
            PRIMARY KEY (path, chunk_index)
        )",
        [],
    )?;
    conn.execute(
        "INSERT INTO git_objects_v2_shadow
            (path, chunk_index, parent_path, data, is_dir, size, mtime)
         SELECT path, 0, parent_path, data, is_dir, 0, mtime FROM git_objects",
        [],
    )?;
    conn.execute("DROP TABLE git_objects", [])?;
    conn.execute("ALTER TABLE git_objects_v2_shadow RENAME TO git_objects", [])?;
    for stmt in CREATE_INDEXES {
        conn.execute(stmt, [])?;
    }
    insert_root_row(conn, now_ms)?;
    Ok(())
}

/// Detect the table's version and bring it up to v2, idempotently.
/// Runs entirely inside one transaction so a migration either fully
/// completes or leaves the original table untouched.
pub fn init(conn: &mut Connection, now_ms: i64) -> rusqlite::Result<InitOutcome> {
    let tx = conn.transaction()?;

    let outcome = if !table_exists(&tx)? {
        create_v2_schema(&tx, now_ms)?;
        InitOutcome::Fresh
    } else if !has_chunk_index_column(&tx)? {
        migrate_v1_to_v2(&tx, now_ms)?;
        InitOutcome::MigratedFromV1
    } else {
        insert_root_row(&tx, now_ms)?;
        InitOutcome::UpToDate
    };

    tx.commit()?;
    Ok(outcome)
}
