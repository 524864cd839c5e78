//! Back-stack resolution for the admin console.
//!
//! Views call [`NavigationStack::go_back`] instead of hard-coding their
//! parent route. Detail views opened from a filtered list remember that
//! list through a [`PreviousPathBinding`] so "back" restores the filter.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::NavigationConfig;
use tracing::debug;

use super::history::{NavigationEntry, NavigationHistory};

/// Where a navigation should land
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationTarget {
    pub pathname: String,
    pub search: String,
    pub state: Option<Value>,
}

impl NavigationTarget {
    pub fn path(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            search: String::new(),
            state: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_state(mut self, state: Option<Value>) -> Self {
        self.state = state;
        self
    }
}

/// Host routing mechanism
pub trait Router {
    fn navigate(&mut self, target: &NavigationTarget);
}

/// Query string and state to restore when returning to a screen
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnData {
    pub search: String,
    pub state: Option<Value>,
}

/// Screen to return to when leaving a particular target path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousPathBinding {
    pub path: String,
    pub data: ReturnData,
    pub timestamp: i64,
}

/// Navigation history plus per-target return bindings.
///
/// Created once at the application root and handed to view controllers.
#[derive(Debug, Clone)]
pub struct NavigationStack {
    history: NavigationHistory,
    bindings: HashMap<String, PreviousPathBinding>,
    default_path: String,
}

impl NavigationStack {
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            history: NavigationHistory::with_capacity(config.history_capacity),
            bindings: HashMap::new(),
            default_path: config.default_path.clone(),
        }
    }

    /// Record a route change reported by the router
    pub fn record_visit(&mut self, pathname: &str, search: &str, state: Option<Value>) -> bool {
        let recorded = self
            .history
            .push(NavigationEntry::new(pathname, search, state));
        if recorded {
            debug!("Recorded visit to {}{} ({} in history)", pathname, search, self.history.len());
        }
        recorded
    }

    /// Remember that leaving `target_path` should return to `source_path`
    pub fn bind_return_path(&mut self, target_path: &str, source_path: &str, extra: ReturnData) {
        debug!("Binding return path {} -> {}", target_path, source_path);
        self.bindings.insert(
            target_path.to_string(),
            PreviousPathBinding {
                path: source_path.to_string(),
                data: extra,
                timestamp: Utc::now().timestamp_millis(),
            },
        );
    }

    /// Plain navigation, recorded in history
    pub fn navigate_to<R: Router + ?Sized>(&mut self, router: &mut R, target: NavigationTarget) {
        router.navigate(&target);
        self.record_visit(&target.pathname, &target.search, target.state);
    }

    /// Open a detail view, binding it to the current screen first
    pub fn navigate_to_detail<R: Router + ?Sized>(
        &mut self,
        router: &mut R,
        target_path: &str,
        state: Option<Value>,
    ) {
        if let Some(current) = self.history.last().cloned() {
            self.bind_return_path(
                target_path,
                &current.pathname,
                ReturnData {
                    search: current.search,
                    state: current.state,
                },
            );
        }
        self.navigate_to(router, NavigationTarget::path(target_path).with_state(state));
    }

    /// Work out where "back" leads from the current screen without moving
    pub fn resolve_back(&self, default_path: Option<&str>) -> NavigationTarget {
        if let Some(binding) = self
            .history
            .last()
            .and_then(|current| self.bindings.get(&current.pathname))
        {
            return NavigationTarget::path(&binding.path)
                .with_search(&binding.data.search)
                .with_state(binding.data.state.clone());
        }

        if let Some(previous) = self.history.previous() {
            return NavigationTarget::path(&previous.pathname)
                .with_search(&previous.search)
                .with_state(previous.state.clone());
        }

        NavigationTarget::path(default_path.unwrap_or(&self.default_path))
    }

    /// Navigate back. Always performs exactly one navigation.
    pub fn go_back<R: Router + ?Sized>(
        &mut self,
        router: &mut R,
        default_path: Option<&str>,
    ) -> NavigationTarget {
        let target = self.resolve_back(default_path);
        debug!("Going back to {}{}", target.pathname, target.search);
        self.navigate_to(router, target.clone());
        target
    }

    pub fn clear_binding(&mut self, path: &str) -> Option<PreviousPathBinding> {
        self.bindings.remove(path)
    }

    pub fn clear_all(&mut self) {
        self.bindings.clear();
    }

    /// Forget everything, e.g. on logout
    pub fn reset(&mut self) {
        self.history.clear();
        self.bindings.clear();
    }

    pub fn current(&self) -> Option<&NavigationEntry> {
        self.history.last()
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn binding(&self, path: &str) -> Option<&PreviousPathBinding> {
        self.bindings.get(path)
    }

    /// Number of recorded visits
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn default_path(&self) -> &str {
        &self.default_path
    }
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new(&NavigationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingRouter {
        visited: Vec<NavigationTarget>,
    }

    impl Router for RecordingRouter {
        fn navigate(&mut self, target: &NavigationTarget) {
            self.visited.push(target.clone());
        }
    }

    #[test]
    fn back_with_single_entry_uses_callers_default() {
        let mut stack = NavigationStack::default();
        let mut router = RecordingRouter::default();
        stack.record_visit("/fees", "", None);

        let target = stack.go_back(&mut router, Some("/students"));

        assert_eq!(target.pathname, "/students");
        assert_eq!(router.visited.len(), 1);
        assert_eq!(router.visited[0].pathname, "/students");
    }

    #[test]
    fn back_without_caller_default_uses_configured_route() {
        let mut stack = NavigationStack::default();
        let mut router = RecordingRouter::default();

        let target = stack.go_back(&mut router, None);

        assert_eq!(target.pathname, "/dashboard");
    }

    #[test]
    fn back_uses_history_predecessor() {
        let mut stack = NavigationStack::default();
        let mut router = RecordingRouter::default();
        stack.record_visit("/students", "?class=7", Some(json!({"page": 2})));
        stack.record_visit("/fees", "", None);

        let target = stack.go_back(&mut router, Some("/dashboard"));

        assert_eq!(target.pathname, "/students");
        assert_eq!(target.search, "?class=7");
        assert_eq!(target.state, Some(json!({"page": 2})));
    }

    #[test]
    fn binding_wins_over_history_predecessor() {
        let mut stack = NavigationStack::default();
        let mut router = RecordingRouter::default();
        stack.record_visit("/students", "?class=7", None);
        stack.navigate_to_detail(&mut router, "/students/42", Some(json!({"id": 42})));
        stack.record_visit("/fees", "", None);
        stack.record_visit("/students/42", "", None);

        let target = stack.go_back(&mut router, None);

        assert_eq!(target.pathname, "/students");
        assert_eq!(target.search, "?class=7");
        assert_eq!(router.visited.last().unwrap().pathname, "/students");
    }

    #[test]
    fn detail_navigation_carries_state_and_records_visit() {
        let mut stack = NavigationStack::default();
        let mut router = RecordingRouter::default();
        stack.record_visit("/teachers", "?subject=math", Some(json!({"sort": "name"})));

        stack.navigate_to_detail(&mut router, "/teachers/7", Some(json!({"id": 7})));

        assert_eq!(router.visited[0].state, Some(json!({"id": 7})));
        assert_eq!(stack.current().unwrap().pathname, "/teachers/7");
        let binding = stack.binding("/teachers/7").unwrap();
        assert_eq!(binding.path, "/teachers");
        assert_eq!(binding.data.search, "?subject=math");
        assert_eq!(binding.data.state, Some(json!({"sort": "name"})));
    }

    #[test]
    fn later_binding_overwrites_earlier() {
        let mut stack = NavigationStack::default();
        stack.bind_return_path("/fees/1", "/fees", ReturnData::default());
        stack.bind_return_path("/fees/1", "/students/3", ReturnData::default());
        assert_eq!(stack.binding("/fees/1").unwrap().path, "/students/3");
    }

    #[test]
    fn cleared_binding_falls_back_to_history() {
        let mut stack = NavigationStack::default();
        let mut router = RecordingRouter::default();
        stack.record_visit("/notifications", "", None);
        stack.bind_return_path("/fees/1", "/fees", ReturnData::default());
        stack.record_visit("/fees/1", "", None);

        assert!(stack.clear_binding("/fees/1").is_some());
        let target = stack.go_back(&mut router, None);
        assert_eq!(target.pathname, "/notifications");
    }

    #[test]
    fn reset_forgets_history_and_bindings() {
        let mut stack = NavigationStack::default();
        stack.record_visit("/a", "", None);
        stack.bind_return_path("/b", "/a", ReturnData::default());

        stack.reset();

        assert!(stack.history().is_empty());
        assert!(stack.binding("/b").is_none());
    }
}
