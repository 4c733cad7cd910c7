//! Item info: full metadata plus a lightweight content preview.

use super::error::{CoreError, CoreResult};
use super::metadata::{self, EntryMetadata};
use crate::utils::file_detection::{classify, ContentClass};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewLimits {
    pub max_chars: usize,
    pub max_folder_entries: usize,
}

impl Default for PreviewLimits {
    fn default() -> Self {
        Self {
            max_chars: 10_000,
            max_folder_entries: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Preview {
    Folder {
        total: usize,
        /// First entries, folders first, each folder with a trailing `/`.
        entries: Vec<String>,
    },
    Text {
        content: String,
        truncated: bool,
    },
    Image,
    Media,
    Unavailable {
        extension: String,
    },
    Unreadable {
        reason: String,
    },
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preview::Folder { total, entries } => {
                writeln!(f, "Folder contains {} items:", total)?;
                for name in entries {
                    writeln!(f, "  {}", name)?;
                }
                if *total > entries.len() {
                    writeln!(f, "  ... and {} more", total - entries.len())?;
                }
                Ok(())
            }
            Preview::Text { content, truncated } => {
                f.write_str(content)?;
                if *truncated {
                    f.write_str("\n... (preview truncated)")?;
                }
                Ok(())
            }
            Preview::Image => f.write_str("[Image file]"),
            Preview::Media => f.write_str("[Media file] Open it with the system player."),
            Preview::Unavailable { extension } if extension.is_empty() => {
                f.write_str("No preview available for this file.")
            }
            Preview::Unavailable { extension } => {
                write!(f, "No preview available for '{}' files.", extension)
            }
            Preview::Unreadable { reason } => write!(f, "Could not preview: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemInfo {
    pub metadata: EntryMetadata,
    pub preview: Preview,
}

/// Reads metadata for `path` and builds its preview.
///
/// Only a missing or inaccessible `path` is an error; a preview that cannot
/// be produced becomes `Preview::Unreadable`.
pub fn inspect(path: &Path, limits: PreviewLimits) -> CoreResult<ItemInfo> {
    let metadata = metadata::read(path)?;
    let preview = if metadata.is_dir() {
        folder_preview(path, limits.max_folder_entries)
    } else {
        file_preview(path, &metadata.extension, limits.max_chars)
    }
    .unwrap_or_else(|e| Preview::Unreadable {
        reason: e.to_string(),
    });
    Ok(ItemInfo { metadata, preview })
}

fn folder_preview(path: &Path, max_entries: usize) -> CoreResult<Preview> {
    let mut names: Vec<(bool, String)> = fs::read_dir(path)
        .map_err(CoreError::io_at(path))?
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let is_dir = entry.path().is_dir();
            (is_dir, entry.file_name().to_string_lossy().into_owned())
        })
        .collect();
    names.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase()))
    });

    let total = names.len();
    let entries = names
        .into_iter()
        .take(max_entries)
        .map(|(is_dir, name)| if is_dir { format!("{}/", name) } else { name })
        .collect();
    Ok(Preview::Folder { total, entries })
}

fn file_preview(path: &Path, extension: &str, max_chars: usize) -> CoreResult<Preview> {
    Ok(match classify(path) {
        ContentClass::Text => {
            let (content, truncated) = read_text_prefix(path, max_chars)?;
            Preview::Text { content, truncated }
        }
        ContentClass::Image => Preview::Image,
        ContentClass::Media => Preview::Media,
        ContentClass::Unknown => Preview::Unavailable {
            extension: extension.to_string(),
        },
    })
}

/// Reads at most `max_chars` characters, decoding invalid UTF-8 lossily.
fn read_text_prefix(path: &Path, max_chars: usize) -> CoreResult<(String, bool)> {
    let file = fs::File::open(path).map_err(CoreError::io_at(path))?;
    // A char is at most 4 bytes, so this always covers max_chars + 1 chars.
    let byte_budget = (max_chars as u64).saturating_add(1).saturating_mul(4);
    let mut bytes = Vec::new();
    file.take(byte_budget)
        .read_to_end(&mut bytes)
        .map_err(CoreError::io_at(path))?;

    let text = String::from_utf8_lossy(&bytes);
    let mut chars = text.chars();
    let content: String = chars.by_ref().take(max_chars).collect();
    let truncated = chars.next().is_some();
    Ok((content, truncated))
}
