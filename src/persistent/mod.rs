//! The relational-storage-backed filesystem: every file is a sequence of
//! fixed-size chunks in a single `git_objects` table (see [`schema`] and
//! [`chunk`]).
//!
//! The connection is guarded by a [`tokio::sync::Mutex`] purely to make the
//! type `Sync` behind `&self`, the way this codebase's other stateful
//! backends share a single connection; the concurrency model forbids
//! concurrent calls against one instance, so the lock never contends.

mod chunk;
pub mod export;
mod schema;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use export::{ObjectEntry, StorageStats};
pub use schema::InitOutcome;

use crate::error::{ErrorKind, FsError, FsResult};
use crate::path;
use crate::vfs::{mode, FileData, FileStat, FileType, ReadEncoding, Vfs};

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

struct Chunk0 {
    is_dir: bool,
    size: u64,
    data: Value,
    mtime: i64,
}

fn fetch_chunk0(conn: &Connection, path: &str) -> rusqlite::Result<Option<Chunk0>> {
    conn.query_row(
        "SELECT is_dir, size, data, mtime FROM git_objects WHERE path = ?1 AND chunk_index = 0",
        params![path],
        |row| {
            Ok(Chunk0 {
                is_dir: row.get::<_, i64>(0)? != 0,
                size: row.get::<_, i64>(1)? as u64,
                data: row.get(2)?,
                mtime: row.get(3)?,
            })
        },
    )
    .optional()
}

fn ensure_ancestor_dirs(conn: &Connection, canonical: &str, now: i64) -> rusqlite::Result<()> {
    let segs = path::segments(canonical);
    for i in 1..segs.len() {
        let dir_path = segs[..i].join("/");
        let parent = segs[..i - 1].join("/");
        conn.execute(
            "INSERT OR IGNORE INTO git_objects
                (path, chunk_index, parent_path, data, is_dir, size, mtime)
             VALUES (?1, 0, ?2, NULL, 1, 0, ?3)",
            params![dir_path, parent, now],
        )?;
    }
    Ok(())
}

fn log_ok(op: &str, path: &str) {
    debug!(op, path, "persistent fs operation succeeded");
}

fn log_err(op: &str, err: &FsError) {
    warn!(op, code = err.code().unwrap_or("-"), path = err.path(), "persistent fs operation failed");
}

/// The relational-storage-backed [`Vfs`] implementation. One instance
/// corresponds to exactly one repository.
pub struct PersistentFs {
    conn: Mutex<Connection>,
    initialized: AtomicBool,
}

impl PersistentFs {
    /// Wrap an already-open connection. `init()` must still be called
    /// before any other operation.
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn), initialized: AtomicBool::new(false) }
    }

    /// Open (creating if absent) the SQLite database at `path`.
    pub fn open(path: impl AsRef<Path>) -> FsResult<Self> {
        let conn = Connection::open(path).map_err(|e| FsError::storage("open", "", e))?;
        Ok(Self::new(conn))
    }

    /// An in-memory store, used in tests and wherever an `EphemeralFs`-style
    /// lifetime is wanted but the `PersistentFs` code path is under test.
    pub fn open_in_memory() -> FsResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| FsError::storage("open_in_memory", "", e))?;
        Ok(Self::new(conn))
    }

    /// Detect the schema version and migrate v1 to v2 if needed. Must be
    /// awaited before any other operation.
    pub async fn init(&self) -> FsResult<()> {
        let mut conn = self.conn.lock().await;
        let outcome = schema::init(&mut conn, now_ms()).map_err(|e| FsError::storage("init", "", e))?;
        match outcome {
            InitOutcome::Fresh => info!("created fresh git_objects schema"),
            InitOutcome::MigratedFromV1 => info!("migrated git_objects schema from v1 to v2"),
            InitOutcome::UpToDate => info!("git_objects schema already at v2"),
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn ensure_initialized(&self, op: &'static str) -> FsResult<()> {
        if self.initialized.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FsError::precondition(format!("PersistentFs::init must be called before {op}"), ""))
        }
    }

    async fn read_bytes(&self, path: &str, op: &'static str) -> FsResult<Vec<u8>> {
        let conn = self.conn.lock().await;
        let chunk0 = fetch_chunk0(&conn, path).map_err(|e| FsError::storage(op, path, e))?;
        match chunk0 {
            None => Err(FsError::posix(ErrorKind::Enoent, op, path)),
            Some(c0) if c0.is_dir => Err(FsError::posix(ErrorKind::Eisdir, op, path)),
            Some(_) => {
                let mut stmt = conn
                    .prepare("SELECT data FROM git_objects WHERE path = ?1 ORDER BY chunk_index ASC")
                    .map_err(|e| FsError::storage(op, path, e))?;
                let rows = stmt
                    .query_map(params![path], |row| row.get::<_, Value>(0))
                    .map_err(|e| FsError::storage(op, path, e))?;
                let mut bytes = Vec::new();
                for row in rows {
                    let value = row.map_err(|e| FsError::storage(op, path, e))?;
                    bytes.extend(chunk::decode_cell(value));
                }
                Ok(bytes)
            }
        }
    }
}

#[async_trait]
impl Vfs for PersistentFs {
    async fn read_file(&self, path: &str, encoding: ReadEncoding) -> FsResult<FileData> {
        self.ensure_initialized("read_file")?;
        let result = self.read_bytes(path, "read_file").await;
        match &result {
            Ok(_) => log_ok("read_file", path),
            Err(err) => log_err("read_file", err),
        }
        let bytes = result?;
        Ok(match encoding {
            ReadEncoding::Bytes => FileData::Bytes(bytes),
            ReadEncoding::Utf8 => FileData::Utf8(String::from_utf8_lossy(&bytes).into_owned()),
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> FsResult<()> {
        if path.is_empty() {
            let err = FsError::precondition("cannot write to root", path);
            log_err("write_file", &err);
            return Err(err);
        }
        self.ensure_initialized("write_file")?;

        let mut conn = self.conn.lock().await;
        let chunk0 = fetch_chunk0(&conn, path).map_err(|e| FsError::storage("write_file", path, e))?;
        if let Some(c0) = chunk0 {
            if c0.is_dir {
                let err = FsError::posix(ErrorKind::Eisdir, "write_file", path);
                log_err("write_file", &err);
                return Err(err);
            }
        }

        let now = now_ms();
        let tx = conn.transaction().map_err(|e| FsError::storage("write_file", path, e))?;
        ensure_ancestor_dirs(&tx, path, now).map_err(|e| FsError::storage("write_file", path, e))?;
        tx.execute("DELETE FROM git_objects WHERE path = ?1", params![path])
            .map_err(|e| FsError::storage("write_file", path, e))?;

        let parent = path::parent_of(path);
        let chunk_count = chunk::chunk_count(data.len());
        for i in 0..chunk_count {
            let start = i * chunk::CHUNK_SIZE;
            let end = ((i + 1) * chunk::CHUNK_SIZE).min(data.len());
            let slice = &data[start..end];
            let row_parent = if i == 0 { parent.as_str() } else { "" };
            let size = if i == 0 { data.len() as i64 } else { 0 };
            tx.execute(
                "INSERT INTO git_objects
                    (path, chunk_index, parent_path, data, is_dir, size, mtime)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
                params![path, i as i64, row_parent, slice, size, now],
            )
            .map_err(|e| FsError::storage("write_file", path, e))?;
        }
        tx.commit().map_err(|e| FsError::storage("write_file", path, e))?;

        log_ok("write_file", path);
        Ok(())
    }

    async fn unlink(&self, path: &str) -> FsResult<()> {
        self.ensure_initialized("unlink")?;
        let conn = self.conn.lock().await;
        let chunk0 = fetch_chunk0(&conn, path).map_err(|e| FsError::storage("unlink", path, e))?;
        match chunk0 {
            None => {
                let err = FsError::posix(ErrorKind::Enoent, "unlink", path);
                log_err("unlink", &err);
                Err(err)
            }
            Some(c0) if c0.is_dir => {
                let err = FsError::posix(ErrorKind::Eperm, "unlink", path);
                log_err("unlink", &err);
                Err(err)
            }
            Some(_) => {
                conn.execute("DELETE FROM git_objects WHERE path = ?1", params![path])
                    .map_err(|e| FsError::storage("unlink", path, e))?;
                log_ok("unlink", path);
                Ok(())
            }
        }
    }

    async fn read_dir(&self, path: &str) -> FsResult<Vec<String>> {
        self.ensure_initialized("read_dir")?;
        let conn = self.conn.lock().await;
        let chunk0 = fetch_chunk0(&conn, path).map_err(|e| FsError::storage("read_dir", path, e))?;
        match chunk0 {
            None => {
                let err = FsError::posix(ErrorKind::Enoent, "read_dir", path);
                log_err("read_dir", &err);
                Err(err)
            }
            Some(c0) if !c0.is_dir => {
                let err = FsError::posix(ErrorKind::Enotdir, "read_dir", path);
                log_err("read_dir", &err);
                Err(err)
            }
            Some(_) => {
                let mut stmt = conn
                    .prepare(
                        "SELECT path FROM git_objects
                         WHERE parent_path = ?1 AND chunk_index = 0 AND path != ?1",
                    )
                    .map_err(|e| FsError::storage("read_dir", path, e))?;
                let rows = stmt
                    .query_map(params![path], |row| row.get::<_, String>(0))
                    .map_err(|e| FsError::storage("read_dir", path, e))?;
                let mut names = Vec::new();
                for row in rows {
                    let child = row.map_err(|e| FsError::storage("read_dir", path, e))?;
                    names.push(path::basename(&child).to_string());
                }
                Ok(names)
            }
        }
    }

    async fn make_dir(&self, path: &str) -> FsResult<()> {
        self.ensure_initialized("make_dir")?;
        if path.is_empty() {
            return Ok(());
        }
        let conn = self.conn.lock().await;

        let segs = path::segments(path);
        if segs.len() > 1 {
            let parent = segs[..segs.len() - 1].join("/");
            match fetch_chunk0(&conn, &parent).map_err(|e| FsError::storage("make_dir", path, e))? {
                Some(c0) if c0.is_dir => {}
                _ => {
                    let err = FsError::posix(ErrorKind::Enoent, "make_dir", path);
                    log_err("make_dir", &err);
                    return Err(err);
                }
            }
        }

        match fetch_chunk0(&conn, path).map_err(|e| FsError::storage("make_dir", path, e))? {
            Some(c0) if c0.is_dir => return Ok(()),
            Some(_) => {
                let err = FsError::posix(ErrorKind::Eexist, "make_dir", path);
                log_err("make_dir", &err);
                return Err(err);
            }
            None => {}
        }

        let parent = path::parent_of(path);
        conn.execute(
            "INSERT INTO git_objects (path, chunk_index, parent_path, data, is_dir, size, mtime)
             VALUES (?1, 0, ?2, NULL, 1, 0, ?3)",
            params![path, parent, now_ms()],
        )
        .map_err(|e| FsError::storage("make_dir", path, e))?;

        log_ok("make_dir", path);
        Ok(())
    }

    async fn remove_dir(&self, path: &str) -> FsResult<()> {
        self.ensure_initialized("remove_dir")?;
        if path.is_empty() {
            let err = FsError::precondition("cannot remove root", path);
            log_err("remove_dir", &err);
            return Err(err);
        }
        let conn = self.conn.lock().await;
        let chunk0 = fetch_chunk0(&conn, path).map_err(|e| FsError::storage("remove_dir", path, e))?;
        match chunk0 {
            None => {
                let err = FsError::posix(ErrorKind::Enoent, "remove_dir", path);
                log_err("remove_dir", &err);
                Err(err)
            }
            Some(c0) if !c0.is_dir => {
                let err = FsError::posix(ErrorKind::Enotdir, "remove_dir", path);
                log_err("remove_dir", &err);
                Err(err)
            }
            Some(_) => {
                let has_child: Option<i64> = conn
                    .query_row(
                        "SELECT 1 FROM git_objects WHERE parent_path = ?1 AND chunk_index = 0 LIMIT 1",
                        params![path],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(|e| FsError::storage("remove_dir", path, e))?;
                if has_child.is_some() {
                    let err = FsError::posix(ErrorKind::Enotempty, "remove_dir", path);
                    log_err("remove_dir", &err);
                    return Err(err);
                }
                conn.execute(
                    "DELETE FROM git_objects WHERE path = ?1 AND chunk_index = 0",
                    params![path],
                )
                .map_err(|e| FsError::storage("remove_dir", path, e))?;
                log_ok("remove_dir", path);
                Ok(())
            }
        }
    }

    async fn stat(&self, path: &str) -> FsResult<FileStat> {
        self.ensure_initialized("stat")?;
        let conn = self.conn.lock().await;
        let chunk0 = fetch_chunk0(&conn, path).map_err(|e| FsError::storage("stat", path, e))?;
        match chunk0 {
            None => Err(FsError::posix(ErrorKind::Enoent, "stat", path)),
            Some(c0) if c0.is_dir => {
                Ok(FileStat { file_type: FileType::Directory, size: 0, mode: mode::DIRECTORY, mtime_ms: c0.mtime })
            }
            Some(c0) => {
                let size = if c0.size > 0 {
                    c0.size
                } else {
                    match &c0.data {
                        Value::Blob(bytes) => bytes.len() as u64,
                        Value::Text(text) if !text.is_empty() => chunk::legacy_decoded_len(text),
                        _ => 0,
                    }
                };
                Ok(FileStat { file_type: FileType::File, size, mode: mode::REGULAR_FILE, mtime_ms: c0.mtime })
            }
        }
    }

    async fn lstat(&self, path: &str) -> FsResult<FileStat> {
        self.stat(path).await
    }

    async fn symlink(&self, target: &str, path: &str) -> FsResult<()> {
        self.write_file(path, target.as_bytes()).await
    }

    async fn read_link(&self, path: &str) -> FsResult<String> {
        self.ensure_initialized("read_link")?;
        let bytes = self.read_bytes(path, "read_link").await?;
        log_ok("read_link", path);
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn chmod(&self, _path: &str, _mode: u32) -> FsResult<()> {
        Ok(())
    }

    async fn rename(&self, old: &str, new: &str) -> FsResult<()> {
        self.ensure_initialized("rename")?;
        let mut conn = self.conn.lock().await;

        struct Row {
            chunk_index: i64,
            parent_path: String,
            data: Value,
            is_dir: i64,
            size: i64,
            mtime: i64,
        }

        let rows = {
            let mut stmt = conn
                .prepare(
                    "SELECT chunk_index, parent_path, data, is_dir, size, mtime
                     FROM git_objects WHERE path = ?1 ORDER BY chunk_index ASC",
                )
                .map_err(|e| FsError::storage("rename", old, e))?;
            let mapped = stmt
                .query_map(params![old], |row| {
                    Ok(Row {
                        chunk_index: row.get(0)?,
                        parent_path: row.get(1)?,
                        data: row.get(2)?,
                        is_dir: row.get(3)?,
                        size: row.get(4)?,
                        mtime: row.get(5)?,
                    })
                })
                .map_err(|e| FsError::storage("rename", old, e))?;
            mapped.collect::<rusqlite::Result<Vec<_>>>().map_err(|e| FsError::storage("rename", old, e))?
        };

        if rows.is_empty() {
            let err = FsError::posix(ErrorKind::Enoent, "rename", old);
            log_err("rename", &err);
            return Err(err);
        }

        let new_parent = path::parent_of(new);
        let tx = conn.transaction().map_err(|e| FsError::storage("rename", old, e))?;
        for row in &rows {
            let parent_path = if row.chunk_index == 0 { new_parent.as_str() } else { row.parent_path.as_str() };
            tx.execute(
                "INSERT OR REPLACE INTO git_objects
                    (path, chunk_index, parent_path, data, is_dir, size, mtime)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![new, row.chunk_index, parent_path, row.data, row.is_dir, row.size, row.mtime],
            )
            .map_err(|e| FsError::storage("rename", new, e))?;
        }
        tx.execute("DELETE FROM git_objects WHERE path = ?1", params![old])
            .map_err(|e| FsError::storage("rename", old, e))?;
        tx.commit().map_err(|e| FsError::storage("rename", old, e))?;

        log_ok("rename", new);
        Ok(())
    }
}
