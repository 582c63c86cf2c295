//! Entity registries (spec.md §3 "Entity registries", C6).
//!
//! Each registry is an insertion-order-preserving mapping from a primary
//! key (tool name, resource URI, template URI-pattern, prompt name) to
//! `(entity-metadata, handler)`. `dashmap`/`parking_lot` (the teacher's
//! usual concurrent-map choice, e.g. `turbomcp-server`'s routing tables)
//! don't preserve insertion order, so this workspace keeps order explicitly
//! with a key vector alongside a lookup map, guarded by one `RwLock` per
//! registry — consistent with `mcp-session`'s session-local `StdMutex`
//! tables rather than reaching for a new dependency (see DESIGN.md).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// An insertion-order-preserving `key -> value` table.
pub struct OrderedRegistry<V> {
    order: RwLock<Vec<String>>,
    entries: RwLock<HashMap<String, Arc<V>>>,
}

impl<V> Default for OrderedRegistry<V> {
    fn default() -> Self {
        Self {
            order: RwLock::new(Vec::new()),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> OrderedRegistry<V> {
    /// Insert or replace the entry for `key`. Replacing an existing key
    /// keeps its original position in iteration order.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut entries = self.entries.write().unwrap();
        let is_new = !entries.contains_key(&key);
        entries.insert(key.clone(), Arc::new(value));
        drop(entries);
        if is_new {
            self.order.write().unwrap().push(key);
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.entries.read().unwrap().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Arc<V>> {
        let removed = self.entries.write().unwrap().remove(key);
        if removed.is_some() {
            self.order.write().unwrap().retain(|k| k != key);
        }
        removed
    }

    /// Snapshot of values in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<V>> {
        let order = self.order.read().unwrap();
        let entries = self.entries.read().unwrap();
        order.iter().filter_map(|k| entries.get(k).cloned()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order_across_replace() {
        let reg: OrderedRegistry<i32> = OrderedRegistry::default();
        reg.insert("b", 2);
        reg.insert("a", 1);
        reg.insert("b", 20);
        let values: Vec<i32> = reg.list().iter().map(|v| **v).collect();
        assert_eq!(values, vec![20, 1]);
    }

    #[test]
    fn remove_drops_from_order() {
        let reg: OrderedRegistry<i32> = OrderedRegistry::default();
        reg.insert("a", 1);
        reg.insert("b", 2);
        reg.remove("a");
        assert_eq!(reg.list().len(), 1);
        assert!(reg.get("a").is_none());
    }
}
