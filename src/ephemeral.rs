//! The in-memory filesystem backing a single clone operation.
//!
//! Directories are never stored explicitly: a directory "exists" exactly
//! when some key in either map has it as a proper path prefix. This mirrors
//! the persistent store's contract closely enough that integration tests
//! run the same scenarios against both.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{ErrorKind, FsError, FsResult};
use crate::vfs::{mode, FileData, FileStat, FileType, ReadEncoding, Vfs};

#[derive(Default)]
struct State {
    files: HashMap<String, Vec<u8>>,
    symlinks: HashMap<String, String>,
}

impl State {
    fn has_descendant(&self, path: &str) -> bool {
        let prefix = format!("{path}/");
        self.files.keys().chain(self.symlinks.keys()).any(|k| k.starts_with(&prefix))
    }

    fn is_directory(&self, path: &str) -> bool {
        path.is_empty() || self.has_descendant(path)
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.symlinks.contains_key(path) || self.is_directory(path)
    }
}

/// In-memory [`Vfs`] implementation; exists for the lifetime of a single
/// clone operation and doubles as the oracle [`crate::PersistentFs`] is
/// tested against.
pub struct EphemeralFs {
    state: Mutex<State>,
}

impl Default for EphemeralFs {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemeralFs {
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()) }
    }

    /// Every tracked file path except `.git` itself and anything under it.
    pub async fn get_working_tree_files(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .files
            .keys()
            .filter(|p| !p.is_empty() && *p != ".git" && !p.starts_with(".git/"))
            .cloned()
            .collect()
    }
}

fn log_ok(op: &str, path: &str) {
    debug!(op, path, "ephemeral fs operation succeeded");
}

fn log_err(op: &str, err: &FsError) {
    warn!(op, code = err.code().unwrap_or("-"), path = err.path(), "ephemeral fs operation failed");
}

#[async_trait]
impl Vfs for EphemeralFs {
    async fn read_file(&self, path: &str, encoding: ReadEncoding) -> FsResult<FileData> {
        let state = self.state.lock().await;
        let bytes = match state.files.get(path) {
            Some(bytes) => bytes.clone(),
            None => {
                let err = if state.is_directory(path) {
                    FsError::posix(ErrorKind::Eisdir, "read_file", path)
                } else {
                    FsError::posix(ErrorKind::Enoent, "read_file", path)
                };
                log_err("read_file", &err);
                return Err(err);
            }
        };
        drop(state);
        log_ok("read_file", path);
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
        let mut state = self.state.lock().await;
        if state.has_descendant(path) {
            let err = FsError::posix(ErrorKind::Eisdir, "write_file", path);
            log_err("write_file", &err);
            return Err(err);
        }
        state.files.insert(path.to_string(), data.to_vec());
        log_ok("write_file", path);
        Ok(())
    }

    async fn unlink(&self, path: &str) -> FsResult<()> {
        let mut state = self.state.lock().await;
        if !state.files.contains_key(path) && !state.symlinks.contains_key(path) {
            let err = if state.is_directory(path) {
                FsError::posix(ErrorKind::Eperm, "unlink", path)
            } else {
                FsError::posix(ErrorKind::Enoent, "unlink", path)
            };
            log_err("unlink", &err);
            return Err(err);
        }
        state.files.remove(path);
        state.symlinks.remove(path);
        log_ok("unlink", path);
        Ok(())
    }

    async fn read_dir(&self, path: &str) -> FsResult<Vec<String>> {
        let state = self.state.lock().await;
        if !path.is_empty() {
            if state.files.contains_key(path) || state.symlinks.contains_key(path) {
                let err = FsError::posix(ErrorKind::Enotdir, "read_dir", path);
                log_err("read_dir", &err);
                return Err(err);
            }
            if !state.has_descendant(path) {
                let err = FsError::posix(ErrorKind::Enoent, "read_dir", path);
                log_err("read_dir", &err);
                return Err(err);
            }
        }

        let prefix = if path.is_empty() { String::new() } else { format!("{path}/") };
        let mut names: Vec<String> = state
            .files
            .keys()
            .chain(state.symlinks.keys())
            .filter_map(|k| {
                let rest = k.strip_prefix(&prefix)?;
                if rest.is_empty() {
                    None
                } else {
                    Some(rest.split('/').next().unwrap().to_string())
                }
            })
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn make_dir(&self, _path: &str) -> FsResult<()> {
        Ok(())
    }

    async fn remove_dir(&self, _path: &str) -> FsResult<()> {
        Ok(())
    }

    async fn stat(&self, path: &str) -> FsResult<FileStat> {
        let state = self.state.lock().await;
        if path.is_empty() {
            return Ok(FileStat { file_type: FileType::Directory, size: 0, mode: mode::DIRECTORY, mtime_ms: 0 });
        }
        if let Some(bytes) = state.files.get(path) {
            return Ok(FileStat {
                file_type: FileType::File,
                size: bytes.len() as u64,
                mode: mode::REGULAR_FILE,
                mtime_ms: 0,
            });
        }
        if let Some(target) = state.symlinks.get(path) {
            let size = state.files.get(target).map(|b| b.len()).unwrap_or(0) as u64;
            return Ok(FileStat { file_type: FileType::File, size, mode: mode::REGULAR_FILE, mtime_ms: 0 });
        }
        if state.has_descendant(path) {
            return Ok(FileStat { file_type: FileType::Directory, size: 0, mode: mode::DIRECTORY, mtime_ms: 0 });
        }
        Err(FsError::posix(ErrorKind::Enoent, "stat", path))
    }

    async fn lstat(&self, path: &str) -> FsResult<FileStat> {
        let state = self.state.lock().await;
        if let Some(_target) = state.symlinks.get(path) {
            return Ok(FileStat { file_type: FileType::Symlink, size: 0, mode: mode::SYMLINK, mtime_ms: 0 });
        }
        drop(state);
        self.stat(path).await
    }

    async fn symlink(&self, target: &str, path: &str) -> FsResult<()> {
        let mut state = self.state.lock().await;
        state.symlinks.insert(path.to_string(), target.to_string());
        log_ok("symlink", path);
        Ok(())
    }

    async fn read_link(&self, path: &str) -> FsResult<String> {
        let state = self.state.lock().await;
        match state.symlinks.get(path) {
            Some(target) => Ok(target.clone()),
            None => {
                let err = FsError::posix(ErrorKind::Enoent, "read_link", path);
                log_err("read_link", &err);
                Err(err)
            }
        }
    }

    async fn chmod(&self, _path: &str, _mode: u32) -> FsResult<()> {
        Ok(())
    }

    async fn rename(&self, old: &str, new: &str) -> FsResult<()> {
        let mut state = self.state.lock().await;
        if !state.exists(old) {
            return Ok(());
        }

        if let Some(bytes) = state.files.remove(old) {
            state.files.insert(new.to_string(), bytes);
        }
        if let Some(target) = state.symlinks.remove(old) {
            state.symlinks.insert(new.to_string(), target);
        }

        let old_prefix = format!("{old}/");
        let descendants: Vec<String> = state
            .files
            .keys()
            .chain(state.symlinks.keys())
            .filter(|k| k.starts_with(&old_prefix))
            .cloned()
            .collect();
        for key in descendants {
            let suffix = key.strip_prefix(&old_prefix).unwrap();
            let new_key = format!("{new}/{suffix}");
            if let Some(bytes) = state.files.remove(&key) {
                state.files.insert(new_key.clone(), bytes);
            }
            if let Some(t) = state.symlinks.remove(&key) {
                state.symlinks.insert(new_key, t);
            }
        }

        log_ok("rename", new);
        Ok(())
    }
}
