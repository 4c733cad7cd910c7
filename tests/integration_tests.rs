//! Integration tests for a running browser session.
//!
//! The session runs on its own tokio task exactly as the binary drives it;
//! these tests talk to it only through `Command`s and the events it emits.

use file_catalog::app::{spawn_session, Command, EventProxy, SessionHandle, UserEvent};
use file_catalog::config::{AppConfig, ConfigStore};
use file_catalog::core::{NotificationEvent, TransferMode};
use file_catalog::utils::test_helpers::setup_test_logging;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Contains the test infrastructure.
mod helpers {
    use super::*;
    use std::fs;

    /// Forwards session events into a channel the test reads from.
    #[derive(Clone)]
    pub struct TestEventProxy {
        pub sender: mpsc::UnboundedSender<UserEvent>,
    }

    impl EventProxy for TestEventProxy {
        fn send_event(&self, event: UserEvent) {
            // The receiver may be gone while the session winds down after a test.
            let _ = self.sender.send(event);
        }
    }

    /// An isolated directory plus a running session rooted in it.
    pub struct TestHarness {
        pub session: Option<SessionHandle>,
        pub event_rx: mpsc::UnboundedReceiver<UserEvent>,
        pub root_path: PathBuf,
        _temp_dir: TempDir,
    }

    impl TestHarness {
        pub fn new() -> Self {
            Self::with_store(ConfigStore::Disabled)
        }

        /// Starts a session that persists its config to `store`.
        pub fn with_store(store: ConfigStore) -> Self {
            setup_test_logging();
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let root_path = temp_dir
                .path()
                .canonicalize()
                .expect("Failed to canonicalize temp dir");
            Self::setup_basic_layout(&root_path);

            let (event_tx, event_rx) = mpsc::unbounded_channel();
            let config = AppConfig {
                last_directory: Some(root_path.clone()),
                ..Default::default()
            };
            let session = spawn_session(config, store, TestEventProxy { sender: event_tx });

            Self {
                session: Some(session),
                event_rx,
                root_path,
                _temp_dir: temp_dir,
            }
        }

        fn setup_basic_layout(root: &Path) {
            let write = |relative: &str, content: &str| {
                let path = root.join(relative);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).expect("Failed to create parent dir");
                }
                fs::write(path, content).expect("Failed to write file");
            };
            write("alpha.txt", "first file");
            write("notes.md", "# Notes");
            write("photos/beach.png", "png");
            write("src/alpha_test.rs", "fn main() {}");
            write("src/deep/alpha.log", "log line");
        }

        pub fn send(&self, command: Command) {
            let session = self.session.as_ref().expect("Session already stopped");
            assert!(session.send(command), "Session stopped unexpectedly");
        }

        /// Waits for the first event `pick` accepts, skipping everything else.
        pub async fn wait_for<T>(&mut self, mut pick: impl FnMut(UserEvent) -> Option<T>) -> T {
            loop {
                match tokio::time::timeout(Duration::from_secs(10), self.event_rx.recv()).await {
                    Ok(Some(event)) => {
                        if let Some(found) = pick(event) {
                            return found;
                        }
                    }
                    Ok(None) => panic!("Event channel closed"),
                    Err(_) => panic!("Timed out waiting for event"),
                }
            }
        }

        pub async fn wait_for_notice(&mut self, wanted: &str) {
            self.wait_for(|event| match event {
                UserEvent::Notification(NotificationEvent::Entered { message, .. })
                    if message == wanted =>
                {
                    Some(())
                }
                _ => None,
            })
            .await
        }

        pub async fn wait_for_listing(&mut self) -> Vec<String> {
            self.wait_for(|event| match event {
                UserEvent::CatalogUpdated(view) => Some(view.names()),
                _ => None,
            })
            .await
        }

        pub async fn shutdown(&mut self) -> AppConfig {
            self.session
                .take()
                .expect("Session already stopped")
                .shutdown()
                .await
                .expect("Session task panicked")
        }
    }
}

use helpers::TestHarness;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn session_lists_start_directory() {
    let mut harness = TestHarness::new();

    let current = harness
        .wait_for(|event| match event {
            UserEvent::History { current, can_go_back } => Some((current, can_go_back)),
            _ => None,
        })
        .await;
    assert_eq!(current, (harness.root_path.clone(), false));

    let names = harness.wait_for_listing().await;
    assert_eq!(names, vec!["photos/", "src/", "alpha.txt", "notes.md"]);

    harness.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_runs_off_the_session_task() {
    let mut harness = TestHarness::new();
    harness.wait_for_listing().await;

    harness.send(Command::Search("ALPHA".into()));
    // The notice goes out just before the results.
    harness.wait_for_notice("Found 3 items.").await;
    let (query, mut names) = harness
        .wait_for(|event| match event {
            UserEvent::SearchResults { query, matches } => Some((
                query,
                matches
                    .into_iter()
                    .map(|m| m.display_name)
                    .collect::<Vec<_>>(),
            )),
            _ => None,
        })
        .await;
    names.sort();

    assert_eq!(query, "ALPHA");
    assert_eq!(
        names,
        vec!["alpha.txt", "src/alpha_test.rs", "src/deep/alpha.log"]
    );

    harness.send(Command::Search("   ".into()));
    harness
        .wait_for(|event| matches!(event, UserEvent::SearchCleared).then_some(()))
        .await;

    harness.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn copy_paste_and_cut_through_the_session() {
    let mut harness = TestHarness::new();
    harness.wait_for_listing().await;
    let source = harness.root_path.join("notes.md");

    harness.send(Command::Copy(source.clone()));
    let item = harness
        .wait_for(|event| match event {
            UserEvent::ClipboardChanged(Some(item)) => Some(item),
            _ => None,
        })
        .await;
    assert_eq!(item.mode, TransferMode::Copy);

    // Commands sent while the paste job runs are queued behind it.
    harness.send(Command::Paste);
    harness.send(Command::Paste);
    harness.wait_for_notice("Pasted: 'notes - Copy (1).md'.").await;
    harness.wait_for_notice("Pasted: 'notes - Copy (2).md'.").await;
    assert!(harness.root_path.join("notes - Copy (2).md").is_file());

    harness.send(Command::Cut(source.clone()));
    harness.send(Command::ChangeDirectory(PathBuf::from("photos")));
    harness.send(Command::Paste);
    harness.wait_for_notice("Moved: 'notes.md'.").await;
    harness
        .wait_for(|event| matches!(event, UserEvent::ClipboardChanged(None)).then_some(()))
        .await;

    assert!(!source.exists());
    assert!(harness.root_path.join("photos/notes.md").is_file());

    harness.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn paste_with_empty_clipboard_is_reported() {
    let mut harness = TestHarness::new();
    harness.wait_for_listing().await;

    harness.send(Command::Paste);
    harness.wait_for_notice("Nothing to paste.").await;

    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn notifications_keep_five_and_expire() {
    let mut harness = TestHarness::new();
    harness.wait_for_listing().await;

    for _ in 0..6 {
        harness.send(Command::GoBack);
    }

    let mut entered = Vec::new();
    let mut evicted = None;
    let mut removed = Vec::new();
    while removed.len() < 6 {
        let event = harness
            .wait_for(|event| match event {
                UserEvent::Notification(event) => Some(event),
                _ => None,
            })
            .await;
        match event {
            NotificationEvent::Entered { id, message, .. } => {
                assert_eq!(message, "Already at root directory.");
                entered.push(id);
            }
            NotificationEvent::Exiting { id, duration_ms } if evicted.is_none() => {
                evicted = Some((id, duration_ms));
            }
            NotificationEvent::Removed { id } => removed.push(id),
            _ => {}
        }
    }

    assert_eq!(entered.len(), 6);
    // The oldest one is pushed out early with the short slide-out.
    assert_eq!(evicted, Some((entered[0], 200)));
    assert_eq!(removed[0], entered[0]);
    removed.sort();
    assert_eq!(removed, entered);

    harness.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_saves_last_directory() {
    let config_dir = tempfile::tempdir().expect("Failed to create config dir");
    let store = ConfigStore::Directory(config_dir.path().to_path_buf());
    let mut harness = TestHarness::with_store(store.clone());
    harness.wait_for_listing().await;

    harness.send(Command::OpenItem(PathBuf::from("src")));
    harness.wait_for_notice("Opened folder: src").await;

    let final_config = harness.shutdown().await;
    let expected = harness.root_path.join("src");
    assert_eq!(final_config.last_directory.as_deref(), Some(expected.as_path()));

    let reloaded = store.load().expect("Saved config should load");
    assert_eq!(reloaded.last_directory, Some(expected));
}
