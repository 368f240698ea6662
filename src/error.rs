//! The error type returned by every [`crate::Vfs`] operation.
//!
//! Consumers are expected to branch on [`FsError::kind`] the way a git
//! implementation branches on POSIX errno values — that is the published
//! contract. Precondition violations ("cannot write to root") and
//! storage-layer failures both carry `kind() == None`; only the six POSIX
//! kinds below are meant to drive caller logic.

use std::fmt;

use thiserror::Error;

/// Convenient result alias used by every [`crate::Vfs`] operation.
pub type FsResult<T> = Result<T, FsError>;

/// The POSIX error kinds this filesystem's consumers branch on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No such file or directory.
    Enoent,
    /// Illegal operation on a directory.
    Eisdir,
    /// Not a directory.
    Enotdir,
    /// File exists.
    Eexist,
    /// Operation not permitted.
    Eperm,
    /// Directory not empty.
    Enotempty,
}

impl ErrorKind {
    /// The symbolic code as it appears in error messages (`"ENOENT"`, ...).
    pub fn code(self) -> &'static str {
        match self {
            Self::Enoent => "ENOENT",
            Self::Eisdir => "EISDIR",
            Self::Enotdir => "ENOTDIR",
            Self::Eexist => "EEXIST",
            Self::Eperm => "EPERM",
            Self::Enotempty => "ENOTEMPTY",
        }
    }

    /// The numeric errno a consuming git library expects.
    pub fn errno(self) -> i32 {
        match self {
            Self::Eperm => -1,
            Self::Enoent => -2,
            Self::Eexist => -17,
            Self::Enotdir => -20,
            Self::Eisdir => -21,
            Self::Enotempty => -39,
        }
    }

    fn text(self) -> &'static str {
        match self {
            Self::Enoent => "no such file or directory",
            Self::Eisdir => "illegal operation on a directory",
            Self::Enotdir => "not a directory",
            Self::Eexist => "file already exists",
            Self::Eperm => "operation not permitted",
            Self::Enotempty => "directory not empty",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.text())
    }
}

/// Error returned by [`crate::Vfs`] operations.
///
/// [`FsError::Posix`] carries the symbolic kind and errno a git
/// implementation branches on. [`FsError::Precondition`] covers violations
/// that precede any POSIX mapping (writing to the root, operating on an
/// un-initialized store). [`FsError::Storage`] wraps a failure from the
/// underlying `rusqlite` connection and is assumed fatal for the current
/// operation; it carries no POSIX code.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("{kind}, {op} '{path}'")]
    Posix { kind: ErrorKind, op: &'static str, path: String },

    #[error("{message}")]
    Precondition { message: String, path: String },

    #[error("storage error during {op} '{path}': {source}")]
    Storage { op: &'static str, path: String, #[source] source: rusqlite::Error },
}

impl FsError {
    /// Build a POSIX-coded error of the form `CODE: <text>, <op> '<path>'`.
    pub fn posix(kind: ErrorKind, op: &'static str, path: impl Into<String>) -> Self {
        Self::Posix { kind, op, path: path.into() }
    }

    /// Build a precondition-violation error with no POSIX code, e.g.
    /// "cannot write to root" or an operation attempted before `init()`.
    pub fn precondition(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Precondition { message: message.into(), path: path.into() }
    }

    /// Wrap a storage-layer failure. Carries no POSIX code: storage
    /// failures surface unchanged and are assumed fatal for the current
    /// operation.
    pub fn storage(op: &'static str, path: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Storage { op, path: path.into(), source }
    }

    /// The symbolic POSIX kind, if this is a coded error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Posix { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The symbolic code (`"ENOENT"`, ...), if this is a coded error.
    pub fn code(&self) -> Option<&'static str> {
        self.kind().map(ErrorKind::code)
    }

    /// The numeric errno a consuming git library expects; 0 for uncoded
    /// errors.
    pub fn errno(&self) -> i32 {
        self.kind().map(ErrorKind::errno).unwrap_or(0)
    }

    /// The originating (non-normalized) input path.
    pub fn path(&self) -> &str {
        match self {
            Self::Posix { path, .. } | Self::Precondition { path, .. } | Self::Storage { path, .. } => path,
        }
    }
}
