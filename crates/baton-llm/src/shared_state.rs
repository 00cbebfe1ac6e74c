//! Key/value blackboard shared by agents of one invocation
//!
//! Cloning a [`SharedState`] yields another handle to the same map. Whoever
//! creates the state owns its teardown and calls [`SharedState::clear`].

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Mutex-guarded key to JSON value map
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl SharedState {
    /// Create an empty blackboard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Read a value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Write a value, returning the previous one
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.lock().insert(key.into(), value)
    }

    /// Remove a value
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    /// Sorted list of keys
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Copy of the whole map
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.lock().clone()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the blackboard is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Whether two handles point at the same map
    #[must_use]
    pub fn same_as(&self, other: &SharedState) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clones_share_entries() {
        let state = SharedState::new();
        let handle = state.clone();
        handle.set("plan", json!(["a", "b"]));

        assert_eq!(state.get("plan"), Some(json!(["a", "b"])));
        assert!(state.same_as(&handle));
        assert!(!state.same_as(&SharedState::new()));
    }

    #[test]
    fn test_set_returns_previous() {
        let state = SharedState::new();
        assert!(state.set("k", json!(1)).is_none());
        assert_eq!(state.set("k", json!(2)), Some(json!(1)));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_clear() {
        let state = SharedState::new();
        state.set("b", json!(true));
        state.set("a", json!(false));
        assert_eq!(state.keys(), vec!["a".to_string(), "b".to_string()]);

        state.clear();
        assert!(state.is_empty());
    }
}
