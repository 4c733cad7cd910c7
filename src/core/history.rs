//! Back/forward path stack with truncate-on-branch semantics.

use super::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Visited directories plus a cursor into them.
///
/// Invariant: `entries` is never empty and `index < entries.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationHistory {
    entries: Vec<PathBuf>,
    index: usize,
}

impl NavigationHistory {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            entries: vec![start.into()],
            index: 0,
        }
    }

    /// Records a visit. Anything after the cursor is discarded first.
    pub fn visit(&mut self, path: impl Into<PathBuf>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(path.into());
        self.index = self.entries.len() - 1;
        tracing::debug!("History: visit -> index {} of {}", self.index, self.entries.len());
    }

    /// Moves the cursor one step back and returns the path there.
    pub fn back(&mut self) -> CoreResult<&Path> {
        if self.index == 0 {
            return Err(CoreError::AtStart);
        }
        self.index -= 1;
        Ok(&self.entries[self.index])
    }

    pub fn current(&self) -> &Path {
        &self.entries[self.index]
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    /// Drops all history and starts over at `path`.
    pub fn reset(&mut self, path: impl Into<PathBuf>) {
        self.entries = vec![path.into()];
        self.index = 0;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_at_start_fails() {
        let mut history = NavigationHistory::new("/start");
        assert!(matches!(history.back(), Err(CoreError::AtStart)));
        assert_eq!(history.current(), Path::new("/start"));
        assert!(!history.can_go_back());
    }

    #[test]
    fn visit_then_back_returns_previous() {
        let mut history = NavigationHistory::new("/start");
        history.visit("/a");
        history.visit("/b");
        assert_eq!(history.back().unwrap(), Path::new("/a"));
        assert_eq!(history.current(), Path::new("/a"));
        assert_eq!(history.back().unwrap(), Path::new("/start"));
        assert!(history.back().is_err());
    }

    #[test]
    fn branching_discards_forward_entries() {
        let mut history = NavigationHistory::new("/start");
        history.visit("/a");
        history.visit("/b");
        history.back().unwrap();
        history.visit("/c");

        assert_eq!(
            history.entries(),
            &[PathBuf::from("/start"), PathBuf::from("/a"), PathBuf::from("/c")]
        );
        assert_eq!(history.index(), 2);

        history.visit("/d");
        assert!(!history.entries().contains(&PathBuf::from("/b")));
        assert_eq!(history.back().unwrap(), Path::new("/c"));
        assert_eq!(history.back().unwrap(), Path::new("/a"));
    }

    #[test]
    fn reset_starts_over() {
        let mut history = NavigationHistory::new("/start");
        history.visit("/a");
        history.reset("/home");
        assert_eq!(history.entries(), &[PathBuf::from("/home")]);
        assert_eq!(history.current(), Path::new("/home"));
    }
}
