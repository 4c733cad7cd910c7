//! Generates an ASCII representation of a directory tree.

use super::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::vec::IntoIter;

/// Which entries the tree shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeMode {
    #[default]
    All,
    /// Folders only, at every depth.
    Folders,
    /// Files directly under the root; folders are neither shown nor entered.
    Files,
}

impl fmt::Display for TreeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TreeMode::All => "all",
            TreeMode::Folders => "folders",
            TreeMode::Files => "files",
        })
    }
}

impl FromStr for TreeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(TreeMode::All),
            "folders" | "dirs" => Ok(TreeMode::Folders),
            "files" => Ok(TreeMode::Files),
            other => Err(format!("unknown tree mode '{}'", other)),
        }
    }
}

#[derive(Debug)]
struct TreeEntry {
    name: String,
    path: PathBuf,
    is_dir: bool,
    is_link: bool,
}

struct Frame {
    prefix: String,
    entries: Peekable<IntoIter<TreeEntry>>,
}

/// A utility struct for generating an ASCII directory tree.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeGenerator;

impl TreeGenerator {
    /// Renders the tree below `root`.
    ///
    /// Folders come first, then case-insensitive name order. A folder that
    /// cannot be read renders a `[Permission Denied]` leaf instead of failing
    /// the whole tree. Symlinked folders are shown but not entered. The walk
    /// keeps an explicit stack, so depth is bounded by memory only.
    pub fn render(root: &Path, mode: TreeMode) -> CoreResult<String> {
        let md = fs::metadata(root).map_err(CoreError::io_at(root))?;
        if !md.is_dir() {
            return Err(CoreError::Other(format!(
                "'{}' is not a folder",
                root.display()
            )));
        }

        let root_name = root
            .file_name()
            .unwrap_or(root.as_os_str())
            .to_string_lossy();
        let mut result = format!("{}/\n", root_name.trim_end_matches('/'));

        let mut stack = Vec::new();
        Self::descend(&mut stack, &mut result, root, String::new(), mode);

        while let Some(frame) = stack.last_mut() {
            let Some(entry) = frame.entries.next() else {
                stack.pop();
                continue;
            };
            let is_last = frame.entries.peek().is_none();
            let connector = if is_last { "└── " } else { "├── " };
            let prefix = frame.prefix.clone();

            if entry.is_dir {
                result.push_str(&format!("{prefix}{connector}{}/\n", entry.name));
                if mode != TreeMode::Files && !entry.is_link {
                    let child_prefix = if is_last {
                        format!("{prefix}    ")
                    } else {
                        format!("{prefix}│   ")
                    };
                    Self::descend(&mut stack, &mut result, &entry.path, child_prefix, mode);
                }
            } else {
                result.push_str(&format!("{prefix}{connector}{}\n", entry.name));
            }
        }

        Ok(result)
    }

    fn descend(
        stack: &mut Vec<Frame>,
        result: &mut String,
        dir: &Path,
        prefix: String,
        mode: TreeMode,
    ) {
        match Self::read_level(dir, mode) {
            Ok(entries) => stack.push(Frame {
                prefix,
                entries: entries.into_iter().peekable(),
            }),
            Err(marker) => {
                tracing::debug!("Tree stops at {:?}: {}", dir, marker);
                result.push_str(&format!("{prefix}└── {marker}\n"));
            }
        }
    }

    /// Reads and orders one directory level, keeping only entries `mode` shows.
    fn read_level(dir: &Path, mode: TreeMode) -> Result<Vec<TreeEntry>, String> {
        let reader = fs::read_dir(dir).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => "[Permission Denied]".to_string(),
            io::ErrorKind::NotFound => "[Path Not Found]".to_string(),
            _ => format!("[Error: {}]", e),
        })?;

        let mut entries: Vec<TreeEntry> = reader
            .filter_map(|entry| entry.ok())
            .map(|entry| {
                let path = entry.path();
                let is_link = entry.file_type().is_ok_and(|t| t.is_symlink());
                TreeEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    is_dir: path.is_dir(),
                    is_link,
                    path,
                }
            })
            .filter(|entry| match mode {
                TreeMode::All => true,
                TreeMode::Folders => entry.is_dir,
                TreeMode::Files => !entry.is_dir,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.is_dir
                .cmp(&a.is_dir)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(entries)
    }
}
