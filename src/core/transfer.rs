//! Clipboard-style copy/cut/paste with deterministic conflict renaming.

use super::error::{CoreError, CoreResult};
use crate::utils::file_detection::split_extension;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Whether a paste duplicates or relocates the clipboard source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferMode {
    Copy,
    Cut,
}

impl TransferMode {
    /// Word inserted into conflict names: `"{stem} - Copy (1){ext}"`.
    fn conflict_label(self) -> &'static str {
        match self {
            TransferMode::Copy => "Copy",
            TransferMode::Cut => "Moved",
        }
    }
}

/// The single pending clipboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardItem {
    pub source: PathBuf,
    pub mode: TransferMode,
}

/// A paste captured from the clipboard, ready to run on any thread.
///
/// Executing a plan never touches the clipboard; the outcome is applied back
/// with [`TransferEngine::finish`] by whoever owns the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastePlan {
    pub item: ClipboardItem,
    pub destination_dir: PathBuf,
}

impl PastePlan {
    /// Performs the copy or move and returns the final target path.
    pub fn execute(&self) -> CoreResult<PathBuf> {
        let source = &self.item.source;
        if let Err(e) = fs::symlink_metadata(source) {
            return Err(match e.kind() {
                io::ErrorKind::NotFound => CoreError::SourceGone(source.clone()),
                _ => CoreError::from_io(e, source),
            });
        }

        let dest_md =
            fs::metadata(&self.destination_dir).map_err(CoreError::io_at(&self.destination_dir))?;
        if !dest_md.is_dir() {
            return Err(CoreError::Other(format!(
                "Paste destination is not a folder: {}",
                self.destination_dir.display()
            )));
        }

        let base_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CoreError::Other(format!("Cannot paste '{}': it has no name", source.display()))
            })?;

        let source_is_dir = source.is_dir();
        if source_is_dir && is_within(&self.destination_dir, source) {
            return Err(CoreError::Other(format!(
                "Cannot paste folder '{}' into itself",
                base_name
            )));
        }

        let target = resolve_target(&self.destination_dir, &base_name, self.item.mode);
        match self.item.mode {
            TransferMode::Copy if source_is_dir => copy_tree(source, &target)?,
            TransferMode::Copy => copy_file(source, &target)?,
            TransferMode::Cut => move_entry(source, &target)?,
        }

        tracing::info!(
            "{:?} '{}' -> {:?}",
            self.item.mode,
            source.display(),
            target
        );
        Ok(target)
    }
}

/// Owns the clipboard and runs pastes against it.
#[derive(Debug, Default)]
pub struct TransferEngine {
    clipboard: Option<ClipboardItem>,
}

impl TransferEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clipboard(&self) -> Option<&ClipboardItem> {
        self.clipboard.as_ref()
    }

    /// Replaces any existing clipboard entry.
    pub fn set_clipboard(&mut self, source: impl Into<PathBuf>, mode: TransferMode) {
        let item = ClipboardItem {
            source: source.into(),
            mode,
        };
        tracing::debug!("Clipboard set: {:?}", item);
        self.clipboard = Some(item);
    }

    pub fn clear(&mut self) {
        self.clipboard = None;
    }

    /// Clears the clipboard if its source is `path`. Returns whether it did.
    ///
    /// Must be called around deletes and renames so the clipboard never
    /// points at something that moved away.
    pub fn clear_if_matches(&mut self, path: &Path) -> bool {
        if self.clipboard.as_ref().is_some_and(|item| item.source == path) {
            tracing::debug!("Clipboard cleared, source {:?} changed", path);
            self.clipboard = None;
            true
        } else {
            false
        }
    }

    /// Captures the current clipboard into a plan targeting `destination_dir`.
    pub fn prepare(&self, destination_dir: &Path) -> CoreResult<PastePlan> {
        let item = self.clipboard.clone().ok_or(CoreError::NothingToPaste)?;
        Ok(PastePlan {
            item,
            destination_dir: destination_dir.to_path_buf(),
        })
    }

    /// Applies the outcome of an executed plan to the clipboard.
    ///
    /// A vanished source or a successful cut clears the clipboard; every
    /// other outcome leaves it untouched. Nothing changes if the clipboard was
    /// replaced while the plan was running.
    pub fn finish(&mut self, plan: &PastePlan, outcome: CoreResult<PathBuf>) -> CoreResult<PathBuf> {
        let still_current = self.clipboard.as_ref() == Some(&plan.item);
        let clears = match &outcome {
            Err(CoreError::SourceGone(_)) => true,
            Ok(_) => plan.item.mode == TransferMode::Cut,
            Err(_) => false,
        };
        if still_current && clears {
            self.clipboard = None;
        }
        outcome
    }

    /// Pastes the clipboard into `destination_dir` on the calling thread.
    pub fn paste(&mut self, destination_dir: &Path) -> CoreResult<PathBuf> {
        let plan = self.prepare(destination_dir)?;
        let outcome = plan.execute();
        self.finish(&plan, outcome)
    }
}

/// Builds the `n`-th conflict name for a base name.
pub fn conflict_name(base_name: &str, mode: TransferMode, n: u64) -> String {
    let (stem, ext) = split_extension(base_name);
    format!("{} - {} ({}){}", stem, mode.conflict_label(), n, ext)
}

/// Returns the first free path for `base_name` inside `destination_dir`,
/// trying the plain name first, then conflict names with `n = 1, 2, ...`.
pub fn resolve_target(destination_dir: &Path, base_name: &str, mode: TransferMode) -> PathBuf {
    let mut candidate = destination_dir.join(base_name);
    let mut n = 1u64;
    while entry_exists(&candidate) {
        candidate = destination_dir.join(conflict_name(base_name, mode, n));
        n += 1;
    }
    candidate
}

// Counts dangling symlinks as taken.
fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn is_within(candidate: &Path, ancestor: &Path) -> bool {
    let candidate = fs::canonicalize(candidate).unwrap_or_else(|_| candidate.to_path_buf());
    let ancestor = fs::canonicalize(ancestor).unwrap_or_else(|_| ancestor.to_path_buf());
    candidate.starts_with(ancestor)
}

fn ensure_free(target: &Path) -> CoreResult<()> {
    if entry_exists(target) {
        return Err(CoreError::AlreadyExists(target.to_path_buf()));
    }
    Ok(())
}

/// Copies one file, keeping permissions and timestamps where possible.
fn copy_file(source: &Path, target: &Path) -> CoreResult<()> {
    ensure_free(target)?;
    fs::copy(source, target).map_err(CoreError::io_at(source))?;
    if let Ok(md) = fs::metadata(source) {
        preserve_times(&md, target);
    }
    Ok(())
}

fn preserve_times(source_md: &fs::Metadata, target: &Path) {
    let mut times = fs::FileTimes::new();
    if let Ok(modified) = source_md.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = source_md.accessed() {
        times = times.set_accessed(accessed);
    }
    let result = fs::File::options()
        .write(true)
        .open(target)
        .or_else(|_| fs::File::open(target))
        .and_then(|file| file.set_times(times));
    if let Err(e) = result {
        tracing::debug!("Could not preserve timestamps on {:?}: {}", target, e);
    }
}

/// Recursively copies a directory. The walk is iterative and does not follow
/// symlinks, so link cycles cannot recurse.
fn copy_tree(source: &Path, target: &Path) -> CoreResult<()> {
    ensure_free(target)?;
    fs::create_dir(target).map_err(CoreError::io_at(target))?;

    let mut copied_dirs = vec![(source.to_path_buf(), target.to_path_buf())];
    for entry in WalkDir::new(source).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| walk_error(e, source))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| CoreError::Other(e.to_string()))?;
        let dest = target.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir(&dest).map_err(CoreError::io_at(&dest))?;
            copied_dirs.push((entry.path().to_path_buf(), dest));
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
        } else {
            copy_file(entry.path(), &dest)?;
        }
    }

    // Permissions last, so a read-only source dir does not block its own contents.
    for (src_dir, dst_dir) in copied_dirs.iter().rev() {
        if let Ok(md) = fs::metadata(src_dir) {
            if let Err(e) = fs::set_permissions(dst_dir, md.permissions()) {
                tracing::debug!("Could not copy permissions to {:?}: {}", dst_dir, e);
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> CoreResult<()> {
    ensure_free(target)?;
    let pointee = fs::read_link(link).map_err(CoreError::io_at(link))?;
    std::os::unix::fs::symlink(&pointee, target).map_err(CoreError::io_at(target))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> CoreResult<()> {
    if link.is_dir() {
        fs::create_dir(target).map_err(CoreError::io_at(target))
    } else {
        copy_file(link, target)
    }
}

/// Renames `source` to `target`, falling back to copy-then-delete when the
/// two live on different filesystems.
fn move_entry(source: &Path, target: &Path) -> CoreResult<()> {
    ensure_free(target)?;
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::info!("Cross-device move of {:?}, copying instead", source);
            let md = fs::symlink_metadata(source).map_err(CoreError::io_at(source))?;
            if md.file_type().is_symlink() {
                copy_symlink(source, target)?;
                fs::remove_file(source).map_err(CoreError::io_at(source))
            } else if md.is_dir() {
                copy_tree(source, target)?;
                fs::remove_dir_all(source).map_err(CoreError::io_at(source))
            } else {
                copy_file(source, target)?;
                fs::remove_file(source).map_err(CoreError::io_at(source))
            }
        }
        Err(e) => Err(CoreError::from_io(e, source)),
    }
}

fn walk_error(err: walkdir::Error, root: &Path) -> CoreError {
    let path = err.path().unwrap_or(root).to_path_buf();
    match err.into_io_error() {
        Some(io_err) => CoreError::from_io(io_err, &path),
        None => CoreError::Other(format!("Filesystem loop detected at {}", path.display())),
    }
}
