//! Reads raw filesystem attributes for a single path.

use super::error::{CoreError, CoreResult};
use crate::utils::file_detection::split_extension;
use crate::utils::format::{format_permissions, format_size, format_timestamp};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Whether an entry is a directory or anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// A metadata value that may be missing for two different reasons.
///
/// `Unknown` means the value could not be read (for example the entry is a
/// broken symlink); `Unsupported` means the host platform has no such field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub enum Field<T> {
    Known(T),
    Unknown,
    Unsupported,
}

impl<T> Field<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Field::Known(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Field::Known(_))
    }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Known(value) => Field::Known(f(value)),
            Field::Unknown => Field::Unknown,
            Field::Unsupported => Field::Unsupported,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Known(value) => write!(f, "{}", value),
            Field::Unknown => f.write_str("N/A"),
            Field::Unsupported => f.write_str("Not available"),
        }
    }
}

/// Everything the browser knows about one filesystem entry.
///
/// Built fresh on every request; never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Raw byte count; sorting always uses this, never `size_display`.
    pub size: Field<u64>,
    pub size_display: String,
    pub created: Field<DateTime<Local>>,
    pub modified: Field<DateTime<Local>>,
    pub accessed: Field<DateTime<Local>>,
    pub permissions: Field<u32>,
    pub owner_uid: Field<u32>,
    pub group_gid: Field<u32>,
    pub device_id: Field<u64>,
    pub inode: Field<u64>,
    pub hard_links: Field<u64>,
    pub block_size: Field<u64>,
    pub blocks: Field<u64>,
    /// Extension with its leading dot; empty for directories.
    pub extension: String,
    /// Set when the entry exists in a listing but its attributes could not be read.
    pub error: Option<String>,
}

impl EntryMetadata {
    /// Name as shown in a listing, directories get a trailing slash.
    pub fn display_name(&self) -> String {
        match self.kind {
            EntryKind::Directory => format!("{}/", self.name),
            EntryKind::File => self.name.clone(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Multi-line summary in the layout of the info panel.
    pub fn summary(&self) -> String {
        let stamp = |field: &Field<DateTime<Local>>| field.map(|t| format_timestamp(&t)).to_string();
        let kind = match self.kind {
            EntryKind::Directory => "Folder",
            EntryKind::File => "File",
        };
        let extension = if self.extension.is_empty() {
            "N/A"
        } else {
            self.extension.as_str()
        };
        format!(
            "Name: {}\nFull Path: {}\nType: {}\nExtension: {}\nSize: {}\nCreated: {}\nModified: {}\nAccessed: {}\nPermissions: {}\nOwner UID: {}\nGroup GID: {}\nDevice ID: {}\nInode: {}\nLinks: {}\nBlock Size: {} bytes\nBlocks: {}",
            self.name,
            self.path.display(),
            kind,
            extension,
            self.size_display,
            stamp(&self.created),
            stamp(&self.modified),
            stamp(&self.accessed),
            self.permissions.map(format_permissions),
            self.owner_uid,
            self.group_gid,
            self.device_id,
            self.inode,
            self.hard_links,
            self.block_size,
            self.blocks,
        )
    }

    /// Builds a record for an entry whose attributes could not be read.
    fn unreadable(path: &Path, kind: EntryKind, message: String) -> Self {
        let name = base_name(path);
        // The name still says what the entry is, so filters and type sort can use it.
        let extension = match kind {
            EntryKind::Directory => String::new(),
            EntryKind::File => split_extension(&name).1,
        };
        Self {
            name,
            path: path.to_path_buf(),
            kind,
            size: Field::Unknown,
            size_display: "N/A".to_string(),
            created: Field::Unknown,
            modified: Field::Unknown,
            accessed: Field::Unknown,
            permissions: Field::Unknown,
            owner_uid: Field::Unknown,
            group_gid: Field::Unknown,
            device_id: Field::Unknown,
            inode: Field::Unknown,
            hard_links: Field::Unknown,
            block_size: Field::Unknown,
            blocks: Field::Unknown,
            extension,
            error: Some(message),
        }
    }
}

/// Reads the metadata of `path`, following symlinks.
pub fn read(path: &Path) -> CoreResult<EntryMetadata> {
    let md = fs::metadata(path).map_err(CoreError::io_at(path))?;
    Ok(from_fs_metadata(path, &md))
}

/// Like [`read`], but embeds a failure into the returned record instead of
/// returning it. Used for entries inside a listing.
pub fn read_or_mark(path: &Path) -> EntryMetadata {
    match read(path) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::debug!("Could not read metadata for {:?}: {}", path, e);
            let message = match &e {
                CoreError::NotFound(_) | CoreError::PermissionDenied(_) => {
                    format!("Access Error: {}", e)
                }
                _ => format!("Info Error: {}", e),
            };
            EntryMetadata::unreadable(path, EntryKind::File, message)
        }
    }
}

fn from_fs_metadata(path: &Path, md: &fs::Metadata) -> EntryMetadata {
    let name = base_name(path);
    let kind = if md.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    let extension = match kind {
        EntryKind::Directory => String::new(),
        EntryKind::File => split_extension(&name).1,
    };
    let size = md.len();
    let unix = UnixFields::from_metadata(md);

    EntryMetadata {
        name,
        path: path.to_path_buf(),
        kind,
        size: Field::Known(size),
        size_display: format_size(size),
        created: timestamp(md.created()),
        modified: timestamp(md.modified()),
        accessed: timestamp(md.accessed()),
        permissions: unix.permissions,
        owner_uid: unix.owner_uid,
        group_gid: unix.group_gid,
        device_id: unix.device_id,
        inode: unix.inode,
        hard_links: unix.hard_links,
        block_size: unix.block_size,
        blocks: unix.blocks,
        extension,
        error: None,
    }
}

fn timestamp(result: io::Result<SystemTime>) -> Field<DateTime<Local>> {
    match result {
        Ok(time) => Field::Known(DateTime::<Local>::from(time)),
        Err(e) if e.kind() == io::ErrorKind::Unsupported => Field::Unsupported,
        Err(_) => Field::Unknown,
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

struct UnixFields {
    permissions: Field<u32>,
    owner_uid: Field<u32>,
    group_gid: Field<u32>,
    device_id: Field<u64>,
    inode: Field<u64>,
    hard_links: Field<u64>,
    block_size: Field<u64>,
    blocks: Field<u64>,
}

impl UnixFields {
    #[cfg(unix)]
    fn from_metadata(md: &fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            permissions: Field::Known(md.mode() & 0o777),
            owner_uid: Field::Known(md.uid()),
            group_gid: Field::Known(md.gid()),
            device_id: Field::Known(md.dev()),
            inode: Field::Known(md.ino()),
            hard_links: Field::Known(md.nlink()),
            block_size: Field::Known(md.blksize()),
            blocks: Field::Known(md.blocks()),
        }
    }

    #[cfg(not(unix))]
    fn from_metadata(md: &fs::Metadata) -> Self {
        // Only the read-only bit is portable.
        let permissions = if md.permissions().readonly() { 0o444 } else { 0o666 };
        Self {
            permissions: Field::Known(permissions),
            owner_uid: Field::Unsupported,
            group_gid: Field::Unsupported,
            device_id: Field::Unsupported,
            inode: Field::Unsupported,
            hard_links: Field::Unsupported,
            block_size: Field::Unsupported,
            blocks: Field::Unsupported,
        }
    }
}
