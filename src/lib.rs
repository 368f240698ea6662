//! A relational-storage-backed virtual filesystem for a single git repository.
//!
//! [`PersistentFs`] stores every file as a sequence of fixed-size chunks in a
//! `git_objects` table and presents a POSIX-shaped [`Vfs`] surface to a git
//! implementation on top of it. [`EphemeralFs`] implements the same contract
//! over in-process maps and exists for the lifetime of a single clone
//! operation; it doubles as the oracle [`PersistentFs`] is tested against.

pub mod error;
pub mod ephemeral;
pub mod path;
pub mod persistent;
pub mod vfs;

pub use ephemeral::EphemeralFs;
pub use error::{ErrorKind, FsError, FsResult};
pub use persistent::{ObjectEntry, PersistentFs, StorageStats};
pub use vfs::{FileData, FileStat, FileType, ReadEncoding, Vfs};
