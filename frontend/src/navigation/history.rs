use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded route visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationEntry {
    pub pathname: String,
    pub search: String,
    pub state: Option<Value>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl NavigationEntry {
    pub fn new(pathname: impl Into<String>, search: impl Into<String>, state: Option<Value>) -> Self {
        Self {
            pathname: pathname.into(),
            search: search.into(),
            state,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Visited routes, oldest first, capped at a fixed capacity.
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    entries: VecDeque<NavigationEntry>,
    capacity: usize,
}

impl NavigationHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `entry` unless it repeats the last pathname. Returns whether it
    /// was recorded.
    pub fn push(&mut self, entry: NavigationEntry) -> bool {
        if self
            .entries
            .back()
            .is_some_and(|last| last.pathname == entry.pathname)
        {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        true
    }

    pub fn last(&self) -> Option<&NavigationEntry> {
        self.entries.back()
    }

    /// The entry visited just before the current one
    pub fn previous(&self) -> Option<&NavigationEntry> {
        self.entries.len().checked_sub(2).and_then(|i| self.entries.get(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &NavigationEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit(path: &str) -> NavigationEntry {
        NavigationEntry::new(path, "", None)
    }

    #[test]
    fn consecutive_duplicates_are_skipped() {
        let mut history = NavigationHistory::with_capacity(10);
        assert!(history.push(visit("/students")));
        assert!(!history.push(visit("/students")));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn revisits_are_recorded() {
        let mut history = NavigationHistory::with_capacity(10);
        history.push(visit("/a"));
        history.push(visit("/b"));
        history.push(visit("/a"));
        let paths: Vec<_> = history.iter().map(|e| e.pathname.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/b", "/a"]);
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let mut history = NavigationHistory::with_capacity(3);
        for path in ["/1", "/2", "/3", "/4"] {
            history.push(visit(path));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().next().unwrap().pathname, "/2");
        assert_eq!(history.previous().unwrap().pathname, "/3");
        assert_eq!(history.last().unwrap().pathname, "/4");
    }

    #[test]
    fn zero_capacity_still_keeps_current_route() {
        let mut history = NavigationHistory::with_capacity(0);
        history.push(visit("/a"));
        history.push(visit("/b"));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.last().unwrap().pathname, "/b");
        assert!(history.previous().is_none());
    }
}
