//! Defines the messages exchanged between the session and its presentation layer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::{
    CatalogView, ClipboardItem, FilterMode, ItemInfo, NotificationEvent, SearchMatch, SortMode,
};

/// Requests sent to a running session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "camelCase")]
pub enum Command {
    /// Re-lists the current directory.
    Refresh,
    ChangeDirectory(PathBuf),
    /// Enters a folder, or hands a file to the system application.
    OpenItem(PathBuf),
    GoBack,
    SetFilter(FilterMode),
    SetSort(SortMode),
    /// Shows metadata and a preview for one item.
    Select(PathBuf),
    /// Searches below the current directory. A blank query clears the search.
    Search(String),
    Copy(PathBuf),
    Cut(PathBuf),
    /// Pastes the clipboard into the current directory.
    Paste,
    Delete(PathBuf),
    Rename {
        path: PathBuf,
        new_name: String,
    },
    CreateFile(String),
    CreateFolder(String),
    Shutdown,
}

/// Events sent from the session to whoever renders it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum UserEvent {
    CatalogUpdated(Box<CatalogView>),
    SearchResults {
        query: String,
        matches: Vec<SearchMatch>,
    },
    /// The search was cleared; the last catalog applies again.
    SearchCleared,
    ItemInfo(Box<ItemInfo>),
    History {
        current: PathBuf,
        can_go_back: bool,
    },
    ClipboardChanged(Option<ClipboardItem>),
    Notification(NotificationEvent),
    Status(String),
}
