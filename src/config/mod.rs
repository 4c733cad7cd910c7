pub mod settings;

use crate::core::preview::PreviewLimits;
use crate::core::{CatalogConfig, FilterMode, NotificationSettings, SortMode};
use crate::utils::file_detection::DEFAULT_CODE_EXTENSIONS;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub last_directory: Option<PathBuf>,
    pub default_filter: FilterMode,
    pub default_sort: SortMode,
    pub code_extensions: Vec<String>,
    pub notifications: NotificationSettings,
    pub preview_max_chars: usize,
    pub preview_max_folder_entries: usize,
}

impl AppConfig {
    /// Filter and sort a fresh session starts with.
    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            filter: self.default_filter,
            sort: self.default_sort,
            code_extensions: self.code_extensions.clone(),
        }
    }

    pub fn preview_limits(&self) -> PreviewLimits {
        PreviewLimits {
            max_chars: self.preview_max_chars,
            max_folder_entries: self.preview_max_folder_entries,
        }
    }

    /// The directory a session opens in: the remembered one if it still
    /// exists, else the working directory, else home.
    pub fn start_directory(&self) -> PathBuf {
        self.last_directory
            .clone()
            .filter(|dir| dir.is_dir())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(home_directory)
    }
}

/// Where a session persists its config when it ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigStore {
    /// Nothing is written.
    #[default]
    Disabled,
    /// The platform config directory.
    Platform,
    Directory(PathBuf),
}

impl ConfigStore {
    pub fn save(&self, config: &AppConfig) -> Result<()> {
        match self {
            ConfigStore::Disabled => Ok(()),
            ConfigStore::Platform => settings::save_config(config, None),
            ConfigStore::Directory(dir) => settings::save_config(config, Some(dir.as_path())),
        }
    }

    pub fn load(&self) -> Result<AppConfig> {
        match self {
            ConfigStore::Disabled => Ok(AppConfig::default()),
            ConfigStore::Platform => settings::load_config(None),
            ConfigStore::Directory(dir) => settings::load_config(Some(dir.as_path())),
        }
    }
}

/// The user's home directory, or the filesystem root if there is none.
pub fn home_directory() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR))
}

impl Default for AppConfig {
    fn default() -> Self {
        let preview = PreviewLimits::default();
        Self {
            last_directory: None,
            default_filter: FilterMode::All,
            default_sort: SortMode::NameAsc,
            code_extensions: DEFAULT_CODE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            notifications: NotificationSettings::default(),
            preview_max_chars: preview.max_chars,
            preview_max_folder_entries: preview.max_folder_entries,
        }
    }
}
