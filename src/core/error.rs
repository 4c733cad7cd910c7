//! Defines the custom error type for the `core` module.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Directory-level and transfer-level failures surface as one of these
/// variants. Per-entry failures during a listing are embedded into the
/// entry itself (see `EntryMetadata::error`) and never reach the caller
/// as a `CoreError`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The path does not exist.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The OS refused access to the path.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A name conflict that conflict resolution did not avoid.
    #[error("An item named '{0}' already exists")]
    AlreadyExists(PathBuf),

    /// The clipboard source vanished before it could be pasted.
    #[error("Source item '{0}' no longer exists")]
    SourceGone(PathBuf),

    /// There is no earlier history entry to go back to.
    #[error("Already at the beginning of history")]
    AtStart,

    /// A search was requested with a blank query.
    #[error("No search query given")]
    NoQuery,

    /// `paste` was called while the clipboard is empty.
    #[error("Nothing to paste")]
    NothingToPaste,

    /// A user-supplied name is empty, unchanged, or contains a path separator.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Uncategorized I/O error for a specific path.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] io::Error, PathBuf),

    /// Anything else, described by a message.
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Maps an `io::Error` raised for `path` onto the taxonomy.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => CoreError::AlreadyExists(path.to_path_buf()),
            _ => CoreError::Io(err, path.to_path_buf()),
        }
    }

    /// Returns a closure suitable for `map_err` that tags the error with `path`.
    pub fn io_at(path: &Path) -> impl FnOnce(io::Error) -> CoreError + '_ {
        move |err| CoreError::from_io(err, path)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_kinds_map_to_dedicated_variants() {
        let path = Path::new("/some/where");
        let not_found = CoreError::from_io(io::Error::from(io::ErrorKind::NotFound), path);
        assert!(matches!(not_found, CoreError::NotFound(p) if p == path));

        let denied = CoreError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), path);
        assert!(matches!(denied, CoreError::PermissionDenied(_)));

        let exists = CoreError::from_io(io::Error::from(io::ErrorKind::AlreadyExists), path);
        assert!(matches!(exists, CoreError::AlreadyExists(_)));

        let other = CoreError::from_io(io::Error::other("disk on fire"), path);
        assert!(matches!(other, CoreError::Io(_, _)));
        assert!(other.to_string().contains("/some/where"));
    }
}
