//! Contains the command handlers that drive a `Session`.
//!
//! Each `Command` maps to one handler here. Handlers call into `core`, update
//! the session, and report back through `UserEvent`s: a status line for every
//! action and a notification for anything the user should see.
//!
//! Search and paste can take a while, so they are split in two. `dispatch`
//! hands back a `Job` that only touches the filesystem and may run on a
//! worker thread; `complete` applies its outcome on the owning task.

use super::events::{Command, UserEvent};
use super::proxy::EventProxy;
use super::state::Session;
use crate::config::home_directory;
use crate::core::operations;
use crate::core::preview::{self, Preview};
use crate::core::{
    CatalogEngine, CoreError, CoreResult, FilterMode, PastePlan, SearchEngine, SearchMatch,
    Severity, SortMode, TimerService, TransferMode,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Blocking work split off a command.
#[derive(Debug)]
pub enum Job {
    Search { root: PathBuf, query: String },
    Paste(PastePlan),
}

#[derive(Debug)]
pub enum JobOutcome {
    Search {
        query: String,
        result: CoreResult<Vec<SearchMatch>>,
    },
    Paste {
        plan: PastePlan,
        result: CoreResult<PathBuf>,
    },
}

impl Job {
    /// Runs the filesystem part. Never touches the session.
    pub fn run(self) -> JobOutcome {
        match self {
            Job::Search { root, query } => {
                let result = SearchEngine::search(&root, &query);
                JobOutcome::Search { query, result }
            }
            Job::Paste(plan) => {
                let result = plan.execute();
                JobOutcome::Paste { plan, result }
            }
        }
    }
}

/// What the caller has to do after `dispatch`.
#[derive(Debug)]
pub enum Dispatch {
    Done,
    Offload(Job),
    Shutdown,
}

/// Publishes the initial history and listing of a fresh session.
pub fn start<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P) {
    publish_history(session, proxy);
    list_current(session, proxy);
}

pub fn dispatch<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    command: Command,
) -> Dispatch {
    tracing::debug!("Dispatching {:?}", command);
    match command {
        Command::Search(query) => return begin_search(session, proxy, query),
        Command::Paste => return begin_paste(session, proxy),
        Command::Shutdown => return Dispatch::Shutdown,
        Command::Refresh => {
            list_current(session, proxy);
        }
        Command::ChangeDirectory(path) => {
            let path = resolve(session, path);
            change_directory(session, proxy, path)
        }
        Command::OpenItem(path) => {
            let path = resolve(session, path);
            open_item(session, proxy, path)
        }
        Command::GoBack => go_back(session, proxy),
        Command::SetFilter(filter) => set_filter(session, proxy, filter),
        Command::SetSort(sort) => set_sort(session, proxy, sort),
        Command::Select(path) => {
            let path = resolve(session, path);
            select_item(session, proxy, path)
        }
        Command::Copy(path) => {
            let path = resolve(session, path);
            set_clipboard(session, proxy, path, TransferMode::Copy)
        }
        Command::Cut(path) => {
            let path = resolve(session, path);
            set_clipboard(session, proxy, path, TransferMode::Cut)
        }
        Command::Delete(path) => {
            let path = resolve(session, path);
            delete_item(session, proxy, path)
        }
        Command::Rename { path, new_name } => {
            let path = resolve(session, path);
            rename_item(session, proxy, path, &new_name)
        }
        Command::CreateFile(name) => create_item(session, proxy, &name, false),
        Command::CreateFolder(name) => create_item(session, proxy, &name, true),
    }
    Dispatch::Done
}

/// Applies the outcome of an offloaded job.
pub fn complete<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    outcome: JobOutcome,
) {
    match outcome {
        JobOutcome::Search { query, result } => complete_search(session, proxy, query, result),
        JobOutcome::Paste { plan, result } => complete_paste(session, proxy, plan, result),
    }
}

/// Runs a command to completion on the calling thread. Returns `false` on shutdown.
pub fn run_blocking<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    command: Command,
) -> bool {
    match dispatch(session, proxy, command) {
        Dispatch::Done => true,
        Dispatch::Offload(job) => {
            let outcome = job.run();
            complete(session, proxy, outcome);
            true
        }
        Dispatch::Shutdown => false,
    }
}

/// Reports a worker that died without producing an outcome.
pub fn worker_failed<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    reason: &str,
) {
    notify(
        session,
        proxy,
        format!("Background operation failed: {}", reason),
        Severity::Error,
    );
    set_status(session, proxy, "Error: background operation failed.");
}

/// Forwards pending notification layout events to the proxy.
pub fn publish_notifications<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P) {
    for event in session.notifications.take_events() {
        proxy.send_event(UserEvent::Notification(event));
    }
}

fn notify<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    message: impl Into<String>,
    severity: Severity,
) {
    session.notifications.post(message, severity);
    publish_notifications(session, proxy);
}

fn set_status<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    status: impl Into<String>,
) {
    session.status = status.into();
    proxy.send_event(UserEvent::Status(session.status.clone()));
}

fn publish_history<T: TimerService, P: EventProxy>(session: &Session<T>, proxy: &P) {
    proxy.send_event(UserEvent::History {
        current: session.current_dir().to_path_buf(),
        can_go_back: session.history.can_go_back(),
    });
}

fn publish_clipboard<T: TimerService, P: EventProxy>(session: &Session<T>, proxy: &P) {
    proxy.send_event(UserEvent::ClipboardChanged(
        session.transfer.clipboard().cloned(),
    ));
}

/// Relative paths are taken against the current directory.
fn resolve<T: TimerService>(session: &Session<T>, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        session.current_dir().join(path)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Lists the current directory into `session.view`.
///
/// A vanished directory sends the session home and retries once there.
fn list_current<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P) -> bool {
    let dir = session.current_dir().to_path_buf();
    session.search = None;

    match CatalogEngine::build(&dir, &session.catalog) {
        Ok(view) => {
            let status = format!(
                "Displayed {} items. Sorted by {}.",
                view.len(),
                session.catalog.sort
            );
            session.view = Some(view.clone());
            proxy.send_event(UserEvent::CatalogUpdated(Box::new(view)));
            set_status(session, proxy, status);
            true
        }
        Err(CoreError::NotFound(_)) if dir != home_directory() => {
            tracing::warn!("Current directory {:?} vanished, returning home", dir);
            notify(
                session,
                proxy,
                format!("Directory not found: {}. Navigating to home.", dir.display()),
                Severity::Error,
            );
            let home = home_directory();
            session.history.reset(home.clone());
            session.config.last_directory = Some(home);
            publish_history(session, proxy);
            list_current(session, proxy)
        }
        Err(CoreError::PermissionDenied(_)) => {
            session.view = None;
            notify(
                session,
                proxy,
                "Permission denied to access this directory.",
                Severity::Error,
            );
            set_status(session, proxy, "Error: Permission Denied for current directory.");
            false
        }
        Err(e) => {
            session.view = None;
            notify(
                session,
                proxy,
                format!("Could not list directory contents: {}", e),
                Severity::Error,
            );
            set_status(session, proxy, "Error listing directory contents.");
            false
        }
    }
}

fn after_navigation<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P) {
    session.selected = None;
    session.config.last_directory = Some(session.current_dir().to_path_buf());
    tracing::info!("Now browsing {:?}", session.current_dir());
    publish_history(session, proxy);
    list_current(session, proxy);
}

fn navigate_to<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P, path: PathBuf) {
    session.history.visit(path);
    after_navigation(session, proxy);
}

fn change_directory<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    path: PathBuf,
) {
    if path == session.current_dir() {
        set_status(
            session,
            proxy,
            "Directory change cancelled or same directory selected.",
        );
        notify(session, proxy, "Directory change cancelled.", Severity::Error);
        return;
    }
    if !path.is_dir() {
        notify(
            session,
            proxy,
            format!("'{}' is not an accessible folder.", path.display()),
            Severity::Error,
        );
        set_status(session, proxy, "Error: Item not found.");
        return;
    }

    navigate_to(session, proxy, path.clone());
    set_status(
        session,
        proxy,
        format!("Changed directory to: {}", path.display()),
    );
    notify(
        session,
        proxy,
        format!("Changed directory to {}", base_name(&path)),
        Severity::Info,
    );
}

fn open_item<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P, path: PathBuf) {
    let name = base_name(&path);
    let Ok(md) = fs::metadata(&path) else {
        notify(session, proxy, "File or folder does not exist.", Severity::Error);
        set_status(session, proxy, "Error: Item not found.");
        return;
    };

    if md.is_dir() {
        navigate_to(session, proxy, path);
        set_status(session, proxy, format!("Navigated into folder: {}", name));
        notify(session, proxy, format!("Opened folder: {}", name), Severity::Info);
        return;
    }

    match operations::open_with_system_app(&path) {
        Ok(()) => {
            set_status(session, proxy, format!("Opened: {}", name));
            notify(session, proxy, format!("Opened: {}", name), Severity::Info);
        }
        Err(e) => {
            notify(
                session,
                proxy,
                format!("Could not open '{}': {}", name, e),
                Severity::Error,
            );
            set_status(session, proxy, format!("Error opening: {}", name));
        }
    }
}

fn go_back<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P) {
    match session.history.back().map(Path::to_path_buf) {
        Ok(path) => {
            after_navigation(session, proxy);
            set_status(session, proxy, format!("Moved back to: {}", path.display()));
            notify(
                session,
                proxy,
                format!("Navigated back to {}", base_name(&path)),
                Severity::Info,
            );
        }
        Err(_) => {
            set_status(session, proxy, "Already at the beginning of history.");
            notify(session, proxy, "Already at root directory.", Severity::Error);
        }
    }
}

fn set_filter<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    filter: FilterMode,
) {
    session.catalog.filter = filter;
    list_current(session, proxy);
    let message = format!("Filter set to: {}", filter);
    set_status(session, proxy, message.clone());
    notify(session, proxy, message, Severity::Info);
}

fn set_sort<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P, sort: SortMode) {
    session.catalog.sort = sort;
    list_current(session, proxy);
    let message = format!("Sorted by: {}", sort);
    set_status(session, proxy, message.clone());
    notify(session, proxy, message, Severity::Info);
}

fn select_item<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P, path: PathBuf) {
    match preview::inspect(&path, session.config.preview_limits()) {
        Ok(info) => {
            let name = info.metadata.name.clone();
            let status = match info.preview {
                Preview::Folder { .. } => format!("Viewing folder: {}", name),
                Preview::Text { .. } => format!("Viewing text file: {}", name),
                Preview::Image => format!("Viewing image file: {}", name),
                Preview::Media => format!("Viewing media file: {}", name),
                Preview::Unavailable { .. } | Preview::Unreadable { .. } => {
                    format!("Viewing unknown file type: {}", name)
                }
            };
            session.selected = Some(path);
            proxy.send_event(UserEvent::ItemInfo(Box::new(info)));
            set_status(session, proxy, status);
        }
        Err(CoreError::NotFound(_)) => {
            session.selected = None;
            notify(session, proxy, "Selected item not found.", Severity::Error);
            set_status(session, proxy, "Error: Selected item not found.");
        }
        Err(e) => {
            notify(
                session,
                proxy,
                format!("Could not read item info: {}", e),
                Severity::Error,
            );
            set_status(session, proxy, "Error displaying item info.");
        }
    }
}

fn clear_search<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P) {
    list_current(session, proxy);
    proxy.send_event(UserEvent::SearchCleared);
    set_status(session, proxy, "Search cleared. Displaying all items.");
    notify(
        session,
        proxy,
        "Search cleared. Displaying all items.",
        Severity::Info,
    );
}

fn begin_search<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    query: String,
) -> Dispatch {
    let query = query.trim().to_string();
    if query.is_empty() {
        clear_search(session, proxy);
        return Dispatch::Done;
    }

    session.selected = None;
    set_status(session, proxy, format!("Searching for '{}'...", query));
    Dispatch::Offload(Job::Search {
        root: session.current_dir().to_path_buf(),
        query,
    })
}

fn complete_search<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    query: String,
    result: CoreResult<Vec<SearchMatch>>,
) {
    match result {
        Ok(matches) => {
            if matches.is_empty() {
                set_status(session, proxy, format!("No items found for '{}'.", query));
                notify(
                    session,
                    proxy,
                    format!("No items found for '{}'.", query),
                    Severity::Error,
                );
            } else {
                set_status(
                    session,
                    proxy,
                    format!("Found {} items for '{}'.", matches.len(), query),
                );
                notify(
                    session,
                    proxy,
                    format!("Found {} items.", matches.len()),
                    Severity::Info,
                );
            }
            session.search = Some((query.clone(), matches.clone()));
            proxy.send_event(UserEvent::SearchResults { query, matches });
        }
        Err(CoreError::NoQuery) => clear_search(session, proxy),
        Err(e) => {
            notify(
                session,
                proxy,
                format!("An error occurred during search: {}", e),
                Severity::Error,
            );
            set_status(session, proxy, "Search completed with errors.");
        }
    }
}

fn set_clipboard<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    path: PathBuf,
    mode: TransferMode,
) {
    let name = base_name(&path);
    session.transfer.set_clipboard(path, mode);
    let verb = match mode {
        TransferMode::Copy => "Copied",
        TransferMode::Cut => "Cut",
    };
    set_status(session, proxy, format!("{} '{}' to clipboard.", verb, name));
    notify(session, proxy, format!("{} '{}'.", verb, name), Severity::Info);
    publish_clipboard(session, proxy);
}

fn begin_paste<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P) -> Dispatch {
    let destination = session.current_dir().to_path_buf();
    match session.transfer.prepare(&destination) {
        Ok(plan) => {
            set_status(
                session,
                proxy,
                format!("Pasting '{}'...", base_name(&plan.item.source)),
            );
            Dispatch::Offload(Job::Paste(plan))
        }
        Err(_) => {
            notify(session, proxy, "Nothing to paste.", Severity::Error);
            Dispatch::Done
        }
    }
}

fn complete_paste<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    plan: PastePlan,
    result: CoreResult<PathBuf>,
) {
    let clipboard_before = session.transfer.clipboard().cloned();
    let result = session.transfer.finish(&plan, result);
    let name = base_name(&plan.item.source);

    match result {
        Ok(target) => {
            let target_name = base_name(&target);
            list_current(session, proxy);
            let (status, notice) = match plan.item.mode {
                TransferMode::Copy => (
                    format!("Copied '{}' to '{}'.", name, target_name),
                    format!("Pasted: '{}'.", target_name),
                ),
                TransferMode::Cut => (
                    format!("Moved '{}' to '{}'.", name, target_name),
                    format!("Moved: '{}'.", target_name),
                ),
            };
            set_status(session, proxy, status);
            notify(session, proxy, notice, Severity::Info);
        }
        Err(CoreError::SourceGone(_)) => {
            list_current(session, proxy);
            notify(
                session,
                proxy,
                format!("Source item '{}' no longer exists.", name),
                Severity::Error,
            );
        }
        Err(CoreError::PermissionDenied(_)) => {
            notify(
                session,
                proxy,
                "Permission denied for paste operation.",
                Severity::Error,
            );
            set_status(session, proxy, "Error: Permission denied for paste.");
        }
        Err(e) => {
            tracing::warn!("Paste of {:?} failed: {}", plan.item.source, e);
            notify(session, proxy, format!("Paste error: {}", e), Severity::Error);
            set_status(session, proxy, "Error during paste operation.");
        }
    }

    if session.transfer.clipboard() != clipboard_before.as_ref() {
        publish_clipboard(session, proxy);
    }
}

fn delete_item<T: TimerService, P: EventProxy>(session: &mut Session<T>, proxy: &P, path: PathBuf) {
    let name = base_name(&path);
    let is_dir = fs::symlink_metadata(&path).is_ok_and(|md| md.is_dir());
    let clipboard_before = session.transfer.clipboard().cloned();

    match operations::delete_entry(&mut session.transfer, &path) {
        Ok(()) => {
            if session.selected.as_deref() == Some(path.as_path()) {
                session.selected = None;
            }
            list_current(session, proxy);
            let noun = if is_dir { "Folder" } else { "File" };
            notify(
                session,
                proxy,
                format!("{} '{}' deleted successfully.", noun, name),
                Severity::Info,
            );
            set_status(session, proxy, format!("Deleted: {}", name));
        }
        Err(e) => {
            notify(
                session,
                proxy,
                format!("Could not delete '{}': {}", name, e),
                Severity::Error,
            );
            set_status(session, proxy, format!("Error deleting: {}", name));
        }
    }

    if session.transfer.clipboard() != clipboard_before.as_ref() {
        publish_clipboard(session, proxy);
    }
}

fn rename_item<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    path: PathBuf,
    new_name: &str,
) {
    let old_name = base_name(&path);
    let new_name = new_name.trim();
    if new_name == old_name {
        set_status(
            session,
            proxy,
            "Rename cancelled: New name is the same as old name.",
        );
        notify(session, proxy, "Rename cancelled: Same name.", Severity::Error);
        return;
    }

    let clipboard_before = session.transfer.clipboard().cloned();
    match operations::rename_entry(&mut session.transfer, &path, new_name) {
        Ok(target) => {
            if session.selected.as_deref() == Some(path.as_path()) {
                session.selected = Some(target);
            }
            list_current(session, proxy);
            notify(
                session,
                proxy,
                format!("'{}' renamed to '{}'.", old_name, new_name),
                Severity::Info,
            );
            set_status(
                session,
                proxy,
                format!("Renamed: {} to {}", old_name, new_name),
            );
        }
        Err(CoreError::AlreadyExists(_)) => {
            notify(
                session,
                proxy,
                format!("An item named '{}' already exists.", new_name),
                Severity::Error,
            );
            set_status(session, proxy, "Error: Name already exists.");
        }
        Err(e) => {
            notify(
                session,
                proxy,
                format!("Could not rename: {}", e),
                Severity::Error,
            );
            set_status(session, proxy, format!("Error renaming: {}", old_name));
        }
    }

    if session.transfer.clipboard() != clipboard_before.as_ref() {
        publish_clipboard(session, proxy);
    }
}

fn create_item<T: TimerService, P: EventProxy>(
    session: &mut Session<T>,
    proxy: &P,
    name: &str,
    folder: bool,
) {
    let name = name.trim();
    let dir = session.current_dir().to_path_buf();
    let (noun, result) = if folder {
        ("Folder", operations::create_folder(&dir, name))
    } else {
        ("File", operations::create_file(&dir, name))
    };

    match result {
        Ok(_) => {
            list_current(session, proxy);
            notify(
                session,
                proxy,
                format!("{} '{}' created successfully.", noun, name),
                Severity::Info,
            );
            set_status(
                session,
                proxy,
                format!("Created new {}: {}", noun.to_lowercase(), name),
            );
        }
        Err(CoreError::AlreadyExists(_)) => {
            notify(
                session,
                proxy,
                format!("{} '{}' already exists.", noun, name),
                Severity::Error,
            );
            set_status(session, proxy, format!("Error: {} already exists.", noun));
        }
        Err(e) => {
            notify(
                session,
                proxy,
                format!("Could not create {}: {}", noun.to_lowercase(), e),
                Severity::Error,
            );
            set_status(
                session,
                proxy,
                format!("Error creating new {}.", noun.to_lowercase()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::{ManualTimer, NotificationEvent};
    use crate::utils::test_helpers::TempTree;
    use tokio::sync::mpsc;

    struct Fixture {
        tree: TempTree,
        session: Session<ManualTimer>,
        proxy: mpsc::UnboundedSender<UserEvent>,
        events: mpsc::UnboundedReceiver<UserEvent>,
    }

    impl Fixture {
        fn new() -> Self {
            let tree = TempTree::new();
            let session =
                Session::with_start(AppConfig::default(), ManualTimer::new(), tree.root());
            let (proxy, events) = mpsc::unbounded_channel();
            Self {
                tree,
                session,
                proxy,
                events,
            }
        }

        fn run(&mut self, command: Command) {
            assert!(run_blocking(&mut self.session, &self.proxy, command));
        }

        fn drain(&mut self) -> Vec<UserEvent> {
            let mut out = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                out.push(event);
            }
            out
        }

        fn notices(&mut self) -> Vec<String> {
            self.drain()
                .into_iter()
                .filter_map(|event| match event {
                    UserEvent::Notification(NotificationEvent::Entered { message, .. }) => {
                        Some(message)
                    }
                    _ => None,
                })
                .collect()
        }

        fn listed(&self) -> Vec<String> {
            self.session.view.as_ref().map(|v| v.names()).unwrap_or_default()
        }
    }

    #[test]
    fn start_lists_and_reports_history() {
        let mut fx = Fixture::new();
        fx.tree.text("a.txt", "a");
        fx.tree.dir("sub");
        start(&mut fx.session, &fx.proxy);

        assert_eq!(fx.listed(), vec!["sub/", "a.txt"]);
        let events = fx.drain();
        assert!(matches!(
            &events[0],
            UserEvent::History { can_go_back: false, .. }
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, UserEvent::CatalogUpdated(_))));
        assert_eq!(fx.session.status, "Displayed 2 items. Sorted by Name (A-Z).");
    }

    #[test]
    fn navigate_and_go_back() {
        let mut fx = Fixture::new();
        let sub = fx.tree.dir("projects");
        fx.tree.text("projects/plan.md", "");

        fx.run(Command::OpenItem(sub.clone()));
        assert_eq!(fx.session.current_dir(), sub);
        assert_eq!(fx.listed(), vec!["plan.md"]);
        assert_eq!(fx.session.config.last_directory.as_deref(), Some(sub.as_path()));
        assert_eq!(fx.notices(), vec!["Opened folder: projects"]);

        fx.run(Command::GoBack);
        assert_eq!(fx.session.current_dir(), fx.tree.root());
        let root_name = base_name(fx.tree.root());
        assert_eq!(fx.notices(), vec![format!("Navigated back to {}", root_name)]);

        fx.run(Command::GoBack);
        assert_eq!(fx.session.status, "Already at the beginning of history.");
        assert_eq!(fx.notices(), vec!["Already at root directory."]);
    }

    #[test]
    fn change_to_same_directory_is_cancelled() {
        let mut fx = Fixture::new();
        let root = fx.tree.root().to_path_buf();
        fx.run(Command::ChangeDirectory(root));
        assert_eq!(fx.notices(), vec!["Directory change cancelled."]);
        assert!(!fx.session.history.can_go_back());
    }

    #[test]
    fn relative_names_resolve_against_current_directory() {
        let mut fx = Fixture::new();
        let sub = fx.tree.dir("work");
        fx.tree.text("work/todo.txt", "x");

        fx.run(Command::ChangeDirectory(PathBuf::from("work")));
        assert_eq!(fx.session.current_dir(), sub);

        fx.run(Command::Copy(PathBuf::from("todo.txt")));
        assert_eq!(
            fx.session.transfer.clipboard().map(|item| item.source.clone()),
            Some(sub.join("todo.txt"))
        );
    }

    #[test]
    fn search_then_clear() {
        let mut fx = Fixture::new();
        fx.tree.text("docs/report.txt", "");
        fx.tree.text("report-final.txt", "");

        fx.run(Command::Search("REPORT".into()));
        let (query, matches) = fx.session.search.clone().unwrap();
        assert_eq!(query, "REPORT");
        assert_eq!(matches.len(), 2);
        assert_eq!(fx.notices(), vec!["Found 2 items."]);

        fx.run(Command::Search("zzz-nomatch".into()));
        assert_eq!(fx.session.search.as_ref().map(|s| s.1.len()), Some(0));
        assert_eq!(fx.notices(), vec!["No items found for 'zzz-nomatch'."]);

        fx.run(Command::Search("  ".into()));
        assert!(fx.session.search.is_none());
        let events = fx.drain();
        assert!(events.iter().any(|e| matches!(e, UserEvent::SearchCleared)));
        assert_eq!(fx.session.status, "Search cleared. Displaying all items.");
    }

    #[test]
    fn copy_paste_twice_then_cut() {
        let mut fx = Fixture::new();
        let source = fx.tree.text("report.txt", "data");

        fx.run(Command::Copy(source.clone()));
        fx.run(Command::Paste);
        fx.run(Command::Paste);
        assert_eq!(
            fx.listed(),
            vec!["report - Copy (1).txt", "report - Copy (2).txt", "report.txt"]
        );
        let notices = fx.notices();
        assert_eq!(
            notices,
            vec![
                "Copied 'report.txt'.",
                "Pasted: 'report - Copy (1).txt'.",
                "Pasted: 'report - Copy (2).txt'."
            ]
        );
        assert!(fx.session.transfer.clipboard().is_some());

        let dest = fx.tree.dir("archive");
        fx.run(Command::Cut(source.clone()));
        fx.run(Command::OpenItem(dest.clone()));
        fx.run(Command::Paste);
        assert!(dest.join("report.txt").exists());
        assert!(!source.exists());
        assert!(fx.session.transfer.clipboard().is_none());
        let events = fx.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, UserEvent::ClipboardChanged(None))));
    }

    #[test]
    fn paste_with_empty_clipboard_or_gone_source() {
        let mut fx = Fixture::new();
        fx.run(Command::Paste);
        assert_eq!(fx.notices(), vec!["Nothing to paste."]);

        let doomed = fx.tree.text("doomed.txt", "");
        fx.run(Command::Copy(doomed.clone()));
        fs::remove_file(&doomed).unwrap();
        fx.drain();
        fx.run(Command::Paste);
        assert_eq!(fx.notices(), vec!["Source item 'doomed.txt' no longer exists."]);
        assert!(fx.session.transfer.clipboard().is_none());
    }

    #[test]
    fn delete_and_rename_keep_clipboard_consistent() {
        let mut fx = Fixture::new();
        let a = fx.tree.text("a.txt", "");
        let b = fx.tree.text("b.txt", "");

        fx.run(Command::Copy(a.clone()));
        fx.run(Command::Rename {
            path: a.clone(),
            new_name: "renamed.txt".into(),
        });
        assert!(fx.session.transfer.clipboard().is_none());

        fx.run(Command::Cut(b.clone()));
        fx.run(Command::Delete(b.clone()));
        assert!(fx.session.transfer.clipboard().is_none());
        assert_eq!(fx.listed(), vec!["renamed.txt"]);

        let notices = fx.notices();
        assert!(notices.contains(&"'a.txt' renamed to 'renamed.txt'.".to_string()));
        assert!(notices.contains(&"File 'b.txt' deleted successfully.".to_string()));
    }

    #[test]
    fn rename_reports_conflicts_and_same_name() {
        let mut fx = Fixture::new();
        let a = fx.tree.text("a.txt", "");
        fx.tree.text("b.txt", "");

        fx.run(Command::Rename {
            path: a.clone(),
            new_name: "a.txt".into(),
        });
        fx.run(Command::Rename {
            path: a,
            new_name: "b.txt".into(),
        });
        assert_eq!(
            fx.notices(),
            vec![
                "Rename cancelled: Same name.",
                "An item named 'b.txt' already exists."
            ]
        );
    }

    #[test]
    fn create_items_and_conflicts() {
        let mut fx = Fixture::new();
        fx.run(Command::CreateFolder("new".into()));
        fx.run(Command::CreateFile("new".into()));
        fx.run(Command::CreateFile("notes.txt".into()));

        assert_eq!(fx.listed(), vec!["new/", "notes.txt"]);
        assert_eq!(
            fx.notices(),
            vec![
                "Folder 'new' created successfully.",
                "File 'new' already exists.",
                "File 'notes.txt' created successfully."
            ]
        );
    }

    #[test]
    fn filter_and_sort_relist() {
        let mut fx = Fixture::new();
        fx.tree.file("small.txt", 10);
        fx.tree.file("big.jpg", 2_000_000);
        fx.tree.dir("B");
        start(&mut fx.session, &fx.proxy);

        fx.drain();

        fx.run(Command::SetSort(SortMode::SizeDesc));
        assert_eq!(fx.listed(), vec!["B/", "big.jpg", "small.txt"]);
        assert_eq!(fx.session.status, "Sorted by: Size (Desc)");
        assert_eq!(fx.notices(), vec!["Sorted by: Size (Desc)"]);

        fx.run(Command::SetFilter(FilterMode::Images));
        assert_eq!(fx.listed(), vec!["B/", "big.jpg"]);
        assert_eq!(fx.session.status, "Filter set to: Images");
        assert_eq!(fx.notices(), vec!["Filter set to: Images"]);
    }

    #[test]
    fn select_reports_item_info() {
        let mut fx = Fixture::new();
        let notes = fx.tree.text("notes.md", "# hi");
        fx.run(Command::Select(notes.clone()));

        assert_eq!(fx.session.selected.as_deref(), Some(notes.as_path()));
        assert_eq!(fx.session.status, "Viewing text file: notes.md");
        let events = fx.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            UserEvent::ItemInfo(info) if matches!(info.preview, Preview::Text { .. })
        )));

        fx.run(Command::Select(fx.tree.root().join("missing")));
        assert_eq!(fx.notices(), vec!["Selected item not found."]);
    }

    #[test]
    fn vanished_directory_returns_home() {
        let mut fx = Fixture::new();
        let gone = fx.tree.dir("temporary");
        fx.run(Command::OpenItem(gone.clone()));
        fs::remove_dir(&gone).unwrap();
        fx.drain();

        fx.run(Command::Refresh);
        assert_eq!(fx.session.current_dir(), home_directory());
        assert!(!fx.session.history.can_go_back());
        let notices = fx.notices();
        assert!(notices[0].starts_with("Directory not found:"));
    }

    #[test]
    fn shutdown_stops_run_blocking() {
        let mut fx = Fixture::new();
        assert!(!run_blocking(&mut fx.session, &fx.proxy, Command::Shutdown));
    }
}
