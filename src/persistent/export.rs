//! Export and observability surface: pulling `.git/` objects back out of
//! storage, and summary statistics over the whole table.

use rusqlite::types::Value;

use super::{chunk, PersistentFs};
use crate::error::FsError;
use crate::FsResult;

/// A single exported object: its path and fully reassembled contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub path: String,
    pub data: Vec<u8>,
}

/// Summary statistics over every stored (non-directory) object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageStats {
    pub total_objects: u64,
    pub total_bytes: u64,
    pub largest_object: Option<(String, u64)>,
}

impl PersistentFs {
    /// Every non-directory row whose path begins with `.git/`, reassembled
    /// and grouped by path in `(path, chunk_index)` order. Deterministic in
    /// path order.
    pub async fn export_git_objects(&self) -> FsResult<Vec<ObjectEntry>> {
        self.ensure_initialized("export_git_objects")?;
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare(
                "SELECT path, data FROM git_objects
                 WHERE is_dir = 0 AND path LIKE '.git/%'
                 ORDER BY path ASC, chunk_index ASC",
            )
            .map_err(|e| FsError::storage("export_git_objects", "", e))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Value>(1)?)))
            .map_err(|e| FsError::storage("export_git_objects", "", e))?;

        let mut entries: Vec<ObjectEntry> = Vec::new();
        for row in rows {
            let (path, data) = row.map_err(|e| FsError::storage("export_git_objects", "", e))?;
            let bytes = chunk::decode_cell(data);
            match entries.last_mut() {
                Some(last) if last.path == path => last.data.extend(bytes),
                _ => entries.push(ObjectEntry { path, data: bytes }),
            }
        }
        Ok(entries)
    }

    /// `total_objects` (distinct non-directory paths), `total_bytes` (sum of
    /// stored `data` lengths, counting legacy base64 text by its character
    /// length rather than its decoded length), and the largest single
    /// object by stored length.
    pub async fn storage_stats(&self) -> FsResult<StorageStats> {
        self.ensure_initialized("storage_stats")?;
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT path, data FROM git_objects WHERE is_dir = 0 ORDER BY path ASC")
            .map_err(|e| FsError::storage("storage_stats", "", e))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Value>(1)?)))
            .map_err(|e| FsError::storage("storage_stats", "", e))?;

        let mut stats = StorageStats::default();
        let mut current_path: Option<String> = None;
        let mut current_len: u64 = 0;

        let mut flush = |path: &str, len: u64, stats: &mut StorageStats| {
            stats.total_objects += 1;
            stats.total_bytes += len;
            let is_larger = stats.largest_object.as_ref().map(|(_, l)| len > *l).unwrap_or(true);
            if is_larger {
                stats.largest_object = Some((path.to_string(), len));
            }
        };

        for row in rows {
            let (path, data) = row.map_err(|e| FsError::storage("storage_stats", "", e))?;
            let len = chunk::raw_cell_len(&data);
            match &current_path {
                Some(p) if *p == path => current_len += len,
                _ => {
                    if let Some(p) = current_path.take() {
                        flush(&p, current_len, &mut stats);
                    }
                    current_path = Some(path);
                    current_len = len;
                }
            }
        }
        if let Some(p) = current_path.take() {
            flush(&p, current_len, &mut stats);
        }

        Ok(stats)
    }
}
