use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Initializes the tracing subscriber for tests.
///
/// Wrapped in a `Once` block so the global subscriber is set exactly one time,
/// even when tests run in parallel. Unit tests that assert on log output use
/// `#[traced_test]` instead and must not call this.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Returns true when the current process runs as root (UID 0).
/// Permission-sensitive tests are skipped in that case.
#[cfg(test)]
#[inline]
pub fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: libc call has no side effects; used for testing only.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// A temporary directory with helpers to lay out fixture files.
#[cfg(test)]
pub struct TempTree {
    pub dir: tempfile::TempDir,
}

#[cfg(test)]
impl TempTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Creates a file (and its parents) with `size` bytes of content.
    pub fn file(&self, relative: &str, size: usize) -> std::path::PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, vec![b'x'; size]).expect("Failed to write file");
        path
    }

    /// Creates a file with the given text content.
    pub fn text(&self, relative: &str, content: &str) -> std::path::PathBuf {
        let path = self.file(relative, 0);
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn dir(&self, relative: &str) -> std::path::PathBuf {
        let path = self.root().join(relative);
        std::fs::create_dir_all(&path).expect("Failed to create dir");
        path
    }
}
