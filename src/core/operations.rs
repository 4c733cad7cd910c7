//! Thin filesystem pass-throughs: create, rename, delete, open.

use super::error::{CoreError, CoreResult};
use super::transfer::TransferEngine;
use std::fs;
use std::path::{Path, PathBuf};

/// Rejects names that are blank or would escape the target directory.
fn validate_name(name: &str) -> CoreResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidName("name cannot be empty".to_string()));
    }
    if name == "." || name == ".." || name.contains('/') || name.contains(std::path::MAIN_SEPARATOR)
    {
        return Err(CoreError::InvalidName(format!(
            "'{}' is not a valid file or folder name",
            name
        )));
    }
    Ok(name)
}

fn taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Creates an empty file named `name` inside `parent`.
pub fn create_file(parent: &Path, name: &str) -> CoreResult<PathBuf> {
    let path = parent.join(validate_name(name)?);
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(CoreError::io_at(&path))?;
    tracing::info!("Created file {:?}", path);
    Ok(path)
}

/// Creates a folder named `name` inside `parent`.
pub fn create_folder(parent: &Path, name: &str) -> CoreResult<PathBuf> {
    let path = parent.join(validate_name(name)?);
    fs::create_dir(&path).map_err(CoreError::io_at(&path))?;
    tracing::info!("Created folder {:?}", path);
    Ok(path)
}

/// Renames `path` in place and drops it from the clipboard.
pub fn rename_entry(
    transfer: &mut TransferEngine,
    path: &Path,
    new_name: &str,
) -> CoreResult<PathBuf> {
    let new_name = validate_name(new_name)?;
    fs::symlink_metadata(path).map_err(CoreError::io_at(path))?;

    if path.file_name().is_some_and(|old| old == new_name) {
        return Err(CoreError::InvalidName(format!(
            "'{}' already has that name",
            new_name
        )));
    }
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let target = parent.join(new_name);
    if taken(&target) {
        return Err(CoreError::AlreadyExists(target));
    }

    fs::rename(path, &target).map_err(CoreError::io_at(path))?;
    transfer.clear_if_matches(path);
    tracing::info!("Renamed {:?} -> {:?}", path, target);
    Ok(target)
}

/// Deletes a file or, recursively, a folder and drops it from the clipboard.
pub fn delete_entry(transfer: &mut TransferEngine, path: &Path) -> CoreResult<()> {
    let md = fs::symlink_metadata(path).map_err(CoreError::io_at(path))?;
    if md.is_dir() {
        fs::remove_dir_all(path).map_err(CoreError::io_at(path))?;
    } else {
        fs::remove_file(path).map_err(CoreError::io_at(path))?;
    }
    transfer.clear_if_matches(path);
    tracing::info!("Deleted {:?}", path);
    Ok(())
}

/// Hands `path` to the desktop's default application.
pub fn open_with_system_app(path: &Path) -> CoreResult<()> {
    if !taken(path) {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    open::that(path).map_err(|e| {
        CoreError::Other(format!("Could not open '{}': {}", path.display(), e))
    })?;
    tracing::info!("Opened {:?} with the system application", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transfer::TransferMode;
    use crate::utils::test_helpers::TempTree;

    #[test]
    fn create_file_and_folder() {
        let tree = TempTree::new();
        let file = create_file(tree.root(), "notes.txt").unwrap();
        let folder = create_folder(tree.root(), " drafts ").unwrap();

        assert!(file.is_file());
        assert_eq!(folder, tree.root().join("drafts"));
        assert!(folder.is_dir());
    }

    #[test]
    fn create_rejects_taken_and_invalid_names() {
        let tree = TempTree::new();
        tree.text("taken.txt", "keep me");

        assert!(matches!(
            create_file(tree.root(), "taken.txt"),
            Err(CoreError::AlreadyExists(_))
        ));
        assert_eq!(
            fs::read_to_string(tree.root().join("taken.txt")).unwrap(),
            "keep me"
        );
        assert!(matches!(
            create_folder(tree.root(), "taken.txt"),
            Err(CoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            create_file(tree.root(), "   "),
            Err(CoreError::InvalidName(_))
        ));
        assert!(matches!(
            create_folder(tree.root(), "a/b"),
            Err(CoreError::InvalidName(_))
        ));
        assert!(matches!(
            create_folder(tree.root(), ".."),
            Err(CoreError::InvalidName(_))
        ));
    }

    #[test]
    fn rename_clears_matching_clipboard() {
        let tree = TempTree::new();
        let source = tree.text("old.txt", "x");
        let mut transfer = TransferEngine::new();
        transfer.set_clipboard(&source, TransferMode::Cut);

        let renamed = rename_entry(&mut transfer, &source, "new.txt").unwrap();
        assert_eq!(renamed, tree.root().join("new.txt"));
        assert!(!source.exists());
        assert!(transfer.clipboard().is_none());
    }

    #[test]
    fn rename_conflicts_and_same_name() {
        let tree = TempTree::new();
        let a = tree.text("a.txt", "a");
        tree.text("b.txt", "b");
        let mut transfer = TransferEngine::new();
        transfer.set_clipboard(&a, TransferMode::Copy);

        assert!(matches!(
            rename_entry(&mut transfer, &a, "b.txt"),
            Err(CoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            rename_entry(&mut transfer, &a, "a.txt"),
            Err(CoreError::InvalidName(_))
        ));
        assert!(matches!(
            rename_entry(&mut transfer, &tree.root().join("ghost"), "c.txt"),
            Err(CoreError::NotFound(_))
        ));
        assert!(transfer.clipboard().is_some(), "failed renames keep the clipboard");
    }

    #[test]
    fn delete_folder_recursively_and_clear_clipboard() {
        let tree = TempTree::new();
        tree.text("photos/2024/a.jpg", "");
        let folder = tree.root().join("photos");
        let other = tree.text("keep.txt", "");
        let mut transfer = TransferEngine::new();
        transfer.set_clipboard(&folder, TransferMode::Copy);

        delete_entry(&mut transfer, &other).unwrap();
        assert!(transfer.clipboard().is_some());

        delete_entry(&mut transfer, &folder).unwrap();
        assert!(!folder.exists());
        assert!(transfer.clipboard().is_none());
    }

    #[test]
    fn open_missing_path_is_not_found() {
        let tree = TempTree::new();
        assert!(matches!(
            open_with_system_app(&tree.root().join("missing.pdf")),
            Err(CoreError::NotFound(_))
        ));
    }
}
