//! Recursive name search below a scan root.

use super::error::{CoreError, CoreResult};
use super::metadata::EntryKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One hit of a recursive search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Path relative to the scan root; directories end with `/`.
    pub display_name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// A utility struct for searching a directory subtree by name.
///
/// This struct is stateless and provides methods as associated functions.
pub struct SearchEngine;

impl SearchEngine {
    /// Walks `root` and returns every entry whose base name contains `query`,
    /// ignoring case.
    ///
    /// A blank query yields `Err(CoreError::NoQuery)`, which callers must keep
    /// apart from `Ok(vec![])` (a query with no hits). Unreadable
    /// subdirectories are skipped. The result is fully materialized and sorted
    /// directories first, then by case-insensitive relative name.
    pub fn search(root: &Path, query: &str) -> CoreResult<Vec<SearchMatch>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CoreError::NoQuery);
        }
        std::fs::metadata(root).map_err(CoreError::io_at(root))?;

        let query_lower = query.to_lowercase();
        let mut matches = Vec::new();
        let mut skipped = 0usize;

        for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // walkdir keeps going after an unreadable directory; only its subtree is lost.
                    skipped += 1;
                    tracing::warn!("Skipping {:?} during search: {}", e.path(), e);
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy();
            if !Self::matches_query(&name, &query_lower) {
                continue;
            }

            let kind = if entry.file_type().is_dir() || entry.path().is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .into_owned();
            let display_name = match kind {
                EntryKind::Directory => format!("{}/", relative),
                EntryKind::File => relative,
            };

            matches.push(SearchMatch {
                display_name,
                path: entry.into_path(),
                kind,
            });
        }

        Self::sort_matches(&mut matches);
        tracing::info!(
            "Search for '{}' in {:?}: {} matches, {} unreadable entries skipped",
            query,
            root,
            matches.len(),
            skipped
        );
        Ok(matches)
    }

    /// Checks if a base name contains the already lower-cased query.
    pub fn matches_query(name: &str, query_lower: &str) -> bool {
        name.to_lowercase().contains(query_lower)
    }

    fn sort_matches(matches: &mut [SearchMatch]) {
        matches.sort_by(|a, b| {
            b.kind
                .is_dir()
                .cmp(&a.kind.is_dir())
                .then_with(|| {
                    a.display_name
                        .to_lowercase()
                        .cmp(&b.display_name.to_lowercase())
                })
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
    }
}
