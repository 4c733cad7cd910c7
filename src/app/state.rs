//! Defines the session object that owns all mutable browser state.

use crate::config::AppConfig;
use crate::core::{
    CatalogConfig, CatalogView, NavigationHistory, NotificationScheduler, SearchMatch,
    TimerService, TransferEngine,
};
use std::path::{Path, PathBuf};

/// Everything one browser session knows.
///
/// Owned by exactly one task; every command handler takes it by `&mut`.
pub struct Session<T: TimerService> {
    /// Settings this session was started with; `last_directory` tracks navigation.
    pub config: AppConfig,
    /// Current filter and sort.
    pub catalog: CatalogConfig,
    pub history: NavigationHistory,
    pub transfer: TransferEngine,
    pub notifications: NotificationScheduler<T>,
    /// Last successful listing of the current directory.
    pub view: Option<CatalogView>,
    /// Query and matches while a search is shown.
    pub search: Option<(String, Vec<SearchMatch>)>,
    pub selected: Option<PathBuf>,
    /// The status line.
    pub status: String,
}

impl<T: TimerService> Session<T> {
    pub fn new(config: AppConfig, timer: T) -> Self {
        let start = config.start_directory();
        Self::with_start(config, timer, start)
    }

    pub fn with_start(config: AppConfig, timer: T, start: impl Into<PathBuf>) -> Self {
        Self {
            catalog: config.catalog_config(),
            history: NavigationHistory::new(start),
            transfer: TransferEngine::new(),
            notifications: NotificationScheduler::new(config.notifications.clone(), timer),
            view: None,
            search: None,
            selected: None,
            status: "Ready.".to_string(),
            config,
        }
    }

    pub fn current_dir(&self) -> &Path {
        self.history.current()
    }
}
