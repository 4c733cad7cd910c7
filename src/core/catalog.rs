//! Builds the filtered, sorted view of one directory.

use super::error::{CoreError, CoreResult};
use super::metadata::{self, EntryMetadata};
use crate::utils::file_detection::{
    extension_in, normalize_extension, DEFAULT_CODE_EXTENSIONS, IMAGE_FILTER_EXTENSIONS,
    TEXT_FILTER_EXTENSIONS,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which files survive the filter. Directories always survive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterMode {
    #[default]
    All,
    Images,
    Text,
    Code,
}

impl FilterMode {
    pub const ALL: [FilterMode; 4] = [
        FilterMode::All,
        FilterMode::Images,
        FilterMode::Text,
        FilterMode::Code,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterMode::All => "All Files",
            FilterMode::Images => "Images",
            FilterMode::Text => "Text Files",
            FilterMode::Code => "Code Files",
        }
    }
}

/// Ordering applied after the directories-first grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortMode {
    #[default]
    NameAsc,
    NameDesc,
    SizeAsc,
    SizeDesc,
    DateAsc,
    DateDesc,
    Type,
}

type Comparator = fn(&EntryMetadata, &EntryMetadata) -> Ordering;

impl SortMode {
    pub const ALL: [SortMode; 7] = [
        SortMode::NameAsc,
        SortMode::NameDesc,
        SortMode::SizeAsc,
        SortMode::SizeDesc,
        SortMode::DateAsc,
        SortMode::DateDesc,
        SortMode::Type,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortMode::NameAsc => "Name (A-Z)",
            SortMode::NameDesc => "Name (Z-A)",
            SortMode::SizeAsc => "Size (Asc)",
            SortMode::SizeDesc => "Size (Desc)",
            SortMode::DateAsc => "Date (Old-New)",
            SortMode::DateDesc => "Date (New-Old)",
            SortMode::Type => "Type",
        }
    }

    /// The secondary key for this mode. Adding a mode means adding one arm here.
    fn comparator(self) -> Comparator {
        match self {
            SortMode::NameAsc => by_name,
            SortMode::NameDesc => |a, b| by_name(a, b).reverse(),
            SortMode::SizeAsc => by_size,
            SortMode::SizeDesc => |a, b| by_size(a, b).reverse(),
            SortMode::DateAsc => by_modified,
            SortMode::DateDesc => |a, b| by_modified(a, b).reverse(),
            SortMode::Type => by_extension,
        }
    }
}

fn by_name(a: &EntryMetadata, b: &EntryMetadata) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

// Unknown sizes are `None`, which orders below every `Some`.
fn by_size(a: &EntryMetadata, b: &EntryMetadata) -> Ordering {
    a.size.known().cmp(&b.size.known())
}

fn by_modified(a: &EntryMetadata, b: &EntryMetadata) -> Ordering {
    a.modified.known().cmp(&b.modified.known())
}

fn by_extension(a: &EntryMetadata, b: &EntryMetadata) -> Ordering {
    normalize_extension(&a.extension).cmp(&normalize_extension(&b.extension))
}

macro_rules! impl_mode_text {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            /// Accepts the display label or the serialized (camelCase) name.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .into_iter()
                    .find(|mode| {
                        mode.label().eq_ignore_ascii_case(wanted)
                            || serde_json::to_value(mode)
                                .ok()
                                .and_then(|v| v.as_str().map(|n| n.eq_ignore_ascii_case(wanted)))
                                .unwrap_or(false)
                    })
                    .ok_or_else(|| format!("unknown mode '{}'", s))
            }
        }
    };
}

impl_mode_text!(FilterMode);
impl_mode_text!(SortMode);

/// Filter and sort settings for a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub filter: FilterMode,
    pub sort: SortMode,
    /// Whitelist used by `FilterMode::Code`.
    pub code_extensions: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            filter: FilterMode::All,
            sort: SortMode::NameAsc,
            code_extensions: DEFAULT_CODE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl CatalogConfig {
    /// Returns true if `entry` survives the current filter.
    pub fn keeps(&self, entry: &EntryMetadata) -> bool {
        if entry.is_dir() {
            return true;
        }
        match self.filter {
            FilterMode::All => true,
            FilterMode::Images => extension_in(&entry.extension, IMAGE_FILTER_EXTENSIONS),
            FilterMode::Text => extension_in(&entry.extension, TEXT_FILTER_EXTENSIONS),
            FilterMode::Code => extension_in(&entry.extension, &self.code_extensions),
        }
    }

    /// Total order used for the view: directories first, then the mode's
    /// comparator, then case-insensitive name, then the raw name.
    pub fn compare(&self, a: &EntryMetadata, b: &EntryMetadata) -> Ordering {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| (self.sort.comparator())(a, b))
            .then_with(|| by_name(a, b))
            .then_with(|| a.name.cmp(&b.name))
    }
}

/// The ordered display list for one directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogView {
    pub directory: PathBuf,
    pub filter: FilterMode,
    pub sort: SortMode,
    pub entries: Vec<EntryMetadata>,
}

impl CatalogView {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.display_name()).collect()
    }
}

/// Stateless builder for `CatalogView`s.
pub struct CatalogEngine;

impl CatalogEngine {
    /// Lists `directory`, resolves metadata for each entry, then filters and sorts.
    ///
    /// Failure to open the directory itself is returned; failure on a single
    /// entry is embedded into that entry.
    pub fn build(directory: &Path, config: &CatalogConfig) -> CoreResult<CatalogView> {
        let reader = fs::read_dir(directory).map_err(CoreError::io_at(directory))?;

        let paths: Vec<PathBuf> = reader
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", directory, e);
                    None
                }
            })
            .collect();

        let entries: Vec<EntryMetadata> = paths
            .par_iter()
            .map(|path| metadata::read_or_mark(path))
            .collect();

        let view = Self::arrange(directory, entries, config);
        tracing::debug!(
            "Built catalog for {:?}: {} items ({}, {})",
            directory,
            view.len(),
            config.filter,
            config.sort
        );
        Ok(view)
    }

    /// Applies filter then sort to an already-read set of entries.
    pub fn arrange(
        directory: &Path,
        entries: Vec<EntryMetadata>,
        config: &CatalogConfig,
    ) -> CatalogView {
        let mut entries: Vec<EntryMetadata> =
            entries.into_iter().filter(|e| config.keeps(e)).collect();
        entries.sort_by(|a, b| config.compare(a, b));

        CatalogView {
            directory: directory.to_path_buf(),
            filter: config.filter,
            sort: config.sort,
            entries,
        }
    }
}
