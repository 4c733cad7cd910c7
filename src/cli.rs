use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use file_catalog::config::settings::{export_config, import_config};
use file_catalog::config::{AppConfig, ConfigStore};
use file_catalog::core::preview;
use file_catalog::core::{
    CatalogConfig, CatalogEngine, CoreError, FilterMode, SearchEngine, SortMode, TreeGenerator,
    TreeMode,
};
use file_catalog::utils::format::{format_permissions, format_timestamp};

use crate::shell;

/// file-catalog – browse, filter, search and copy local directories
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read and write config.json in DIR instead of the platform config dir
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// List a directory, folders first
    Ls {
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
        /// All Files, Images, Text Files or Code Files
        #[arg(long, short)]
        filter: Option<FilterMode>,
        /// e.g. nameAsc, sizeDesc, dateDesc, type
        #[arg(long, short)]
        sort: Option<SortMode>,
        /// Show permissions, size and modification time
        #[arg(long, short)]
        long: bool,
    },
    /// Search entry names below a directory (case-insensitive)
    Find {
        query: String,
        #[arg(long, value_name = "DIR", default_value = ".")]
        root: PathBuf,
    },
    /// Print a directory tree
    Tree {
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
        /// all, folders or files
        #[arg(long, short, default_value_t = TreeMode::All)]
        mode: TreeMode,
    },
    /// Show metadata and a preview for one item
    Info { path: PathBuf },
    /// Export or import settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Interactive browser session (the default)
    Shell {
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write the current settings to FILE
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Replace the stored settings with the ones in FILE
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn config_store(&self) -> ConfigStore {
        match &self.config_dir {
            Some(dir) => ConfigStore::Directory(dir.clone()),
            None => ConfigStore::Platform,
        }
    }
}

pub async fn run(command: Option<CliCommand>, config: AppConfig, store: ConfigStore) -> Result<()> {
    match command.unwrap_or(CliCommand::Shell { dir: None }) {
        CliCommand::Ls {
            dir,
            filter,
            sort,
            long,
        } => list(dir, filter, sort, long, &config),
        CliCommand::Find { query, root } => find(&root, &query),
        CliCommand::Tree { dir, mode } => {
            let tree = TreeGenerator::render(&dir, mode)
                .with_context(|| format!("Could not render tree for {}", dir.display()))?;
            print!("{}", tree);
            Ok(())
        }
        CliCommand::Info { path } => {
            let info = preview::inspect(&path, config.preview_limits())
                .with_context(|| format!("Could not inspect {}", path.display()))?;
            println!("{}\n", info.metadata.summary());
            println!("{}", info.preview);
            Ok(())
        }
        CliCommand::Config { action } => configure(action, &config, &store),
        CliCommand::Shell { dir } => {
            let mut config = config;
            if let Some(dir) = dir {
                config.last_directory = Some(std::fs::canonicalize(&dir).unwrap_or(dir));
            }
            shell::run(config, store).await
        }
    }
}

fn list(
    dir: Option<PathBuf>,
    filter: Option<FilterMode>,
    sort: Option<SortMode>,
    long: bool,
    config: &AppConfig,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| config.start_directory());
    let defaults = config.catalog_config();
    let catalog = CatalogConfig {
        filter: filter.unwrap_or(defaults.filter),
        sort: sort.unwrap_or(defaults.sort),
        ..defaults
    };

    let view = CatalogEngine::build(&dir, &catalog)
        .with_context(|| format!("Could not list {}", dir.display()))?;
    for entry in &view.entries {
        if long {
            let permissions = entry
                .permissions
                .known()
                .map(|mode| format_permissions(*mode))
                .unwrap_or_else(|| "---".to_string());
            println!(
                "{:>4} {:>12} {:<19} {}",
                permissions,
                entry.size_display,
                entry
                    .modified
                    .known()
                    .map(format_timestamp)
                    .unwrap_or_else(|| "N/A".to_string()),
                entry.display_name()
            );
        } else {
            println!("{}", entry.display_name());
        }
        if let Some(error) = &entry.error {
            eprintln!("  {}", error);
        }
    }
    eprintln!(
        "{} items. Filter: {}. Sorted by {}.",
        view.len(),
        catalog.filter,
        catalog.sort
    );
    Ok(())
}

fn find(root: &Path, query: &str) -> Result<()> {
    match SearchEngine::search(root, query) {
        Ok(matches) if matches.is_empty() => {
            eprintln!("No items found for '{}'.", query.trim());
            Ok(())
        }
        Ok(matches) => {
            for found in &matches {
                println!("{}", found.display_name);
            }
            eprintln!("Found {} items.", matches.len());
            Ok(())
        }
        Err(CoreError::NoQuery) => anyhow::bail!("Search query must not be blank"),
        Err(e) => Err(e.into()),
    }
}

fn configure(action: ConfigAction, config: &AppConfig, store: &ConfigStore) -> Result<()> {
    match action {
        ConfigAction::Export { file } => {
            export_config(config, &file)?;
            eprintln!("Exported settings to {}", file.display());
        }
        ConfigAction::Import { file } => {
            let imported = import_config(&file)?;
            store.save(&imported)?;
            eprintln!("Imported settings from {}", file.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_export_then_import_round_trips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::Directory(dir.path().join("store"));
        let file = dir.path().join("settings.json");

        let mut config = AppConfig::default();
        config.default_sort = SortMode::DateDesc;
        configure(ConfigAction::Export { file: file.clone() }, &config, &store).unwrap();

        configure(ConfigAction::Import { file }, &AppConfig::default(), &store).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn config_import_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::Directory(dir.path().to_path_buf());
        let file = dir.path().join("bad.json");
        std::fs::write(&file, "[]").unwrap();

        assert!(configure(ConfigAction::Import { file }, &AppConfig::default(), &store).is_err());
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn parses_config_subcommand() {
        let cli = Cli::parse_from(["file-catalog", "config", "import", "saved.json"]);
        assert!(matches!(
            cli.command,
            Some(CliCommand::Config {
                action: ConfigAction::Import { .. }
            })
        ));
    }
}
