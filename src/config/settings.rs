use anyhow::Result;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::AppConfig;

const APP_NAME: &str = "FileCatalog";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "filecatalog", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

fn resolve_directory(config_dir: Option<&Path>) -> Result<PathBuf> {
    match config_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => get_config_directory()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory")),
    }
}

/// Loads the configuration from `config_dir`, or the platform directory
/// when `None`.
///
/// A missing file is created with defaults. A corrupt file logs a warning
/// and yields defaults; missing fields are filled from defaults.
pub fn load_config(config_dir: Option<&Path>) -> Result<AppConfig> {
    let config_path = resolve_directory(config_dir)?.join(CONFIG_FILE);

    if !config_path.exists() {
        tracing::info!(
            "Config file not found, creating default config at {:?}",
            config_path
        );
        let default_config = AppConfig::default();
        save_config(&default_config, config_dir)?;
        return Ok(default_config);
    }

    let config_content = fs::read_to_string(&config_path)?;
    match serde_json::from_str::<AppConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(AppConfig::default())
        }
    }
}

/// Saves the configuration into `config_dir`, or the platform directory
/// when `None`.
pub fn save_config(config: &AppConfig, config_dir: Option<&Path>) -> Result<()> {
    let config_dir = resolve_directory(config_dir)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
        tracing::info!("Created config directory: {:?}", config_dir);
    }

    let config_path = config_dir.join(CONFIG_FILE);
    let config_json = serde_json::to_string_pretty(config)?;

    fs::write(&config_path, config_json)?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}

/// Exports the configuration to a user-specified JSON file.
pub fn export_config(config: &AppConfig, export_path: &Path) -> Result<()> {
    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(export_path, config_json)?;
    tracing::info!("Exported config to {:?}", export_path);
    Ok(())
}

/// Imports a configuration from a user-specified JSON file.
///
/// Unlike `load_config`, a file that does not parse is an error.
pub fn import_config(import_path: &Path) -> Result<AppConfig> {
    let config_content = fs::read_to_string(import_path)?;
    let value: serde_json::Value = serde_json::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Invalid config file {:?}: {}", import_path, e))?;
    // `AppConfig` fills missing fields from defaults, which would also accept `[]` or `null`.
    if !value.is_object() {
        anyhow::bail!("Invalid config file {:?}: expected a JSON object", import_path);
    }
    let config = serde_json::from_value::<AppConfig>(value)
        .map_err(|e| anyhow::anyhow!("Invalid config file {:?}: {}", import_path, e))?;
    tracing::info!("Imported config from {:?}", import_path);
    Ok(config)
}

// Platform-specific configuration paths for reference:
// macOS:   ~/Library/Application Support/com.filecatalog.FileCatalog/
// Linux:   ~/.config/filecatalog/
// Windows: %APPDATA%/filecatalog/FileCatalog/config/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FilterMode, SortMode};

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(dir.path())).unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn save_then_load_keeps_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.default_sort = SortMode::SizeDesc;
        config.code_extensions = vec!["zig".into()];
        config.notifications.capacity = 3;

        save_config(&config, Some(dir.path())).unwrap();
        assert_eq!(load_config(Some(dir.path())).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "default_filter": "images", "notifications": { "display_ms": 1000 } }"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path())).unwrap();
        assert_eq!(config.default_filter, FilterMode::Images);
        assert_eq!(config.notifications.display_ms, 1000);
        assert_eq!(config.notifications.capacity, 5);
        assert_eq!(config.preview_max_chars, 10_000);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert_eq!(load_config(Some(dir.path())).unwrap(), AppConfig::default());
    }

    #[test]
    fn import_rejects_garbage_but_accepts_export() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("garbage.json");
        for content in ["[]", "null", "42", "{ not json"] {
            fs::write(&garbage, content).unwrap();
            assert!(import_config(&garbage).is_err(), "accepted {}", content);
        }

        let partial = dir.path().join("partial.json");
        fs::write(&partial, r#"{ "default_sort": "sizeDesc" }"#).unwrap();
        let imported = import_config(&partial).unwrap();
        assert_eq!(imported.default_sort, SortMode::SizeDesc);
        assert_eq!(imported.preview_max_chars, AppConfig::default().preview_max_chars);

        let exported = dir.path().join("exported.json");
        let mut config = AppConfig::default();
        config.last_directory = Some(dir.path().to_path_buf());
        export_config(&config, &exported).unwrap();
        assert_eq!(import_config(&exported).unwrap(), config);
    }
}
