//! The filesystem contract shared by [`crate::PersistentFs`] and
//! [`crate::EphemeralFs`].
//!
//! The trait is asynchronous only to match the consuming git library's
//! interface; per the concurrency model, no implementation suspends except
//! at the storage executor boundary (see `persistent::conn`).

use async_trait::async_trait;

use crate::error::FsResult;

/// Requested encoding for [`Vfs::read_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadEncoding {
    /// Return the raw byte sequence.
    #[default]
    Bytes,
    /// Decode the byte sequence as UTF-8 text.
    Utf8,
}

/// The contents returned by [`Vfs::read_file`], shaped by the requested
/// [`ReadEncoding`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileData {
    Bytes(Vec<u8>),
    Utf8(String),
}

impl FileData {
    /// Borrow the contents as bytes regardless of which variant this is.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(b) => b,
            Self::Utf8(s) => s.as_bytes(),
        }
    }

    /// Consume into an owned byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Bytes(b) => b,
            Self::Utf8(s) => s.into_bytes(),
        }
    }
}

/// The type of a filesystem entry as reported by [`Vfs::stat`]/[`Vfs::lstat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// Stat information for a single path. Devices, inodes, and ownership are
/// not modeled and always read zero; `mode` is a reported constant, never
/// an enforced permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub file_type: FileType,
    pub size: u64,
    pub mode: u32,
    pub mtime_ms: i64,
}

impl FileStat {
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }

    pub fn is_symbolic_link(&self) -> bool {
        self.file_type == FileType::Symlink
    }

    /// `ctime` tracks `mtime`; this filesystem does not distinguish them.
    pub fn ctime_ms(&self) -> i64 {
        self.mtime_ms
    }

    pub fn dev(&self) -> u64 {
        0
    }

    pub fn ino(&self) -> u64 {
        0
    }

    pub fn uid(&self) -> u32 {
        0
    }

    pub fn gid(&self) -> u32 {
        0
    }
}

/// Mode bits reported by `stat`/`lstat`. Never enforced.
pub mod mode {
    pub const DIRECTORY: u32 = 0o040755;
    pub const REGULAR_FILE: u32 = 0o100644;
    pub const SYMLINK: u32 = 0o120000;
}

/// A POSIX-shaped file and directory API. Every path argument is expected to
/// already be in canonical form (see [`crate::path::normalize`]); this trait
/// does not normalize on the caller's behalf.
///
/// Implementations are `Send + Sync` and object-safe: both [`PersistentFs`]
/// and [`EphemeralFs`] are consumed through `&dyn Vfs` by the host git
/// library, which also expects a `promises()` handle equivalent to the
/// filesystem itself.
///
/// [`PersistentFs`]: crate::PersistentFs
/// [`EphemeralFs`]: crate::EphemeralFs
#[async_trait]
pub trait Vfs: Send + Sync {
    async fn read_file(&self, path: &str, encoding: ReadEncoding) -> FsResult<FileData>;

    async fn write_file(&self, path: &str, data: &[u8]) -> FsResult<()>;

    async fn unlink(&self, path: &str) -> FsResult<()>;

    async fn read_dir(&self, path: &str) -> FsResult<Vec<String>>;

    async fn make_dir(&self, path: &str) -> FsResult<()>;

    async fn remove_dir(&self, path: &str) -> FsResult<()>;

    async fn stat(&self, path: &str) -> FsResult<FileStat>;

    async fn lstat(&self, path: &str) -> FsResult<FileStat>;

    async fn symlink(&self, target: &str, path: &str) -> FsResult<()>;

    async fn read_link(&self, path: &str) -> FsResult<String>;

    async fn chmod(&self, path: &str, mode: u32) -> FsResult<()>;

    async fn rename(&self, old: &str, new: &str) -> FsResult<()>;

    /// `true` iff `stat` succeeds; any non-`ENOENT` failure propagates.
    async fn exists(&self, path: &str) -> FsResult<bool> {
        use crate::error::ErrorKind;
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == Some(ErrorKind::Enoent) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Self-alias required by the consuming git library's dual-surface
    /// convention; `fs.promises()` and `fs` are expected to be
    /// interchangeable.
    fn promises(&self) -> &dyn Vfs {
        self
    }
}
