//! Shared state store.
//!
//! One [`StateStore`] exists per pipeline run. Tasks never see it directly:
//! a stage reads an immutable [`Snapshot`] and returns a [`StateDelta`] that
//! the pipeline merges in one call once the stage has finished.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Plain key/value view of the state.
pub type StateMap = HashMap<String, Value>;

/// Read access to state values.
pub trait StateView {
    /// Current value of `key`, if present.
    fn lookup(&self, key: &str) -> Option<&Value>;

    /// Whether `key` has a value.
    fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }
}

impl StateView for StateMap {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Journal entry for one write to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateWrite {
    /// Monotonic per-store sequence number, starting at 1
    pub seq: u64,
    pub key: String,
    /// Task name, or `pipeline` for seed values
    pub writer: String,
    pub at: DateTime<Utc>,
}

/// Session-scoped key/value store with a write journal.
#[derive(Debug, Clone)]
pub struct StateStore {
    session_id: String,
    values: StateMap,
    journal: Vec<StateWrite>,
}

impl StateStore {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            values: StateMap::new(),
            journal: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Write `value` under `key`, replacing any earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: Value, writer: impl Into<String>) -> &StateWrite {
        let key = key.into();
        let entry = StateWrite {
            seq: self.journal.len() as u64 + 1,
            key: key.clone(),
            writer: writer.into(),
            at: Utc::now(),
        };
        self.values.insert(key, value);
        self.journal.push(entry);
        &self.journal[self.journal.len() - 1]
    }

    /// Immutable copy of the current values.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            values: Arc::new(self.values.clone()),
        }
    }

    /// Apply every write of `delta` in order. Returns the journal entries added.
    pub fn merge(&mut self, delta: StateDelta) -> &[StateWrite] {
        let start = self.journal.len();
        for write in delta.writes {
            self.set(write.key, write.value, write.writer);
        }
        &self.journal[start..]
    }

    /// Every write since the store was created, oldest first.
    pub fn journal(&self) -> &[StateWrite] {
        &self.journal
    }

    pub fn values(&self) -> &StateMap {
        &self.values
    }

    pub fn into_values(self) -> StateMap {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl StateView for StateStore {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Point-in-time, cheaply clonable copy of the store's values.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    values: Arc<StateMap>,
}

impl Snapshot {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<StateMap> for Snapshot {
    fn from(values: StateMap) -> Self {
        Self {
            values: Arc::new(values),
        }
    }
}

impl StateView for Snapshot {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// A write waiting to be merged.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub key: String,
    pub writer: String,
    pub value: Value,
}

/// Ordered writes produced by one stage.
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    writes: Vec<PendingWrite>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, writer: impl Into<String>, value: Value) {
        self.writes.push(PendingWrite {
            key: key.into(),
            writer: writer.into(),
            value,
        });
    }

    /// Latest pending value of `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.writes.iter().rev().find(|w| w.key == key).map(|w| &w.value)
    }

    /// Keys in write order, duplicates included.
    pub fn keys(&self) -> Vec<&str> {
        self.writes.iter().map(|w| w.key.as_str()).collect()
    }

    pub fn writes(&self) -> &[PendingWrite] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// A snapshot with a stage's pending writes layered on top.
///
/// Sequential stages resolve later tasks against this so they see the
/// outputs of earlier tasks of the same stage.
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    base: &'a Snapshot,
    delta: &'a StateDelta,
}

impl<'a> Overlay<'a> {
    pub fn new(base: &'a Snapshot, delta: &'a StateDelta) -> Self {
        Self { base, delta }
    }
}

impl StateView for Overlay<'_> {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.delta.get(key).or_else(|| self.base.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_overwrites_and_journals() {
        let mut store = StateStore::new("session-1");
        store.set("queries", json!("q1"), "query_formulation");
        store.set("queries", json!("q2"), "query_formulation");

        assert_eq!(store.get("queries"), Some(&json!("q2")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.journal().len(), 2);
        assert_eq!(store.journal()[1].seq, 2);
        assert_eq!(store.journal()[1].writer, "query_formulation");
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let mut store = StateStore::new("s");
        store.set("topic", json!("graphs"), "pipeline");
        let snapshot = store.snapshot();
        store.set("topic", json!("changed"), "pipeline");
        store.set("extra", json!(1), "pipeline");

        assert_eq!(snapshot.get("topic"), Some(&json!("graphs")));
        assert!(!snapshot.contains("extra"));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_merge_applies_delta_in_order() {
        let mut store = StateStore::new("s");
        let mut delta = StateDelta::new();
        delta.push("a", "t1", json!(1));
        delta.push("b", "t2", json!(2));
        delta.push("a", "t3", json!(3));

        let added = store.merge(delta);
        assert_eq!(added.len(), 3);
        assert_eq!(added[2].writer, "t3");
        assert_eq!(store.get("a"), Some(&json!(3)));
        assert_eq!(store.get("b"), Some(&json!(2)));
    }

    #[test]
    fn test_overlay_prefers_pending_writes() {
        let mut base = StateMap::new();
        base.insert("topic".to_string(), json!("t"));
        base.insert("x".to_string(), json!("old"));
        let snapshot = Snapshot::from(base);

        let mut delta = StateDelta::new();
        delta.push("x", "task", json!("new"));
        delta.push("y", "task", json!("fresh"));

        let overlay = Overlay::new(&snapshot, &delta);
        assert_eq!(overlay.lookup("topic"), Some(&json!("t")));
        assert_eq!(overlay.lookup("x"), Some(&json!("new")));
        assert_eq!(overlay.lookup("y"), Some(&json!("fresh")));
        assert!(!overlay.contains("z"));
        assert_eq!(delta.keys(), vec!["x", "y"]);
    }
}
