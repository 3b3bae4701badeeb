use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde_json::Value;

/// Append-only list of records consumed by a tag manager.
///
/// Cheap to clone; clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct DataLayer {
    entries: Arc<Mutex<Vec<Value>>>,
}

impl DataLayer {
    fn entries_guard(&self) -> MutexGuard<'_, Vec<Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, record: Value) {
        self.entries_guard().push(record);
    }

    /// Snapshot of all records pushed so far.
    pub fn entries(&self) -> Vec<Value> {
        self.entries_guard().clone()
    }

    /// Removes and returns every record, e.g. to ship them in a batch.
    pub fn drain(&self) -> Vec<Value> {
        std::mem::take(&mut *self.entries_guard())
    }

    pub fn len(&self) -> usize {
        self.entries_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries_guard().is_empty()
    }
}

/// Named data layers shared between drivers and the application.
#[derive(Debug, Clone, Default)]
pub struct DataLayers {
    layers: Arc<Mutex<HashMap<String, DataLayer>>>,
}

impl DataLayers {
    fn layers(&self) -> MutexGuard<'_, HashMap<String, DataLayer>> {
        self.layers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the layer called `id`, creating it if missing.
    pub fn get_or_create(&self, id: &str) -> DataLayer {
        self.layers().entry(id.to_owned()).or_default().clone()
    }

    pub fn get(&self, id: &str) -> Option<DataLayer> {
        self.layers().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.layers().contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_layers_are_shared_by_name() {
        let layers = DataLayers::default();
        assert!(layers.get("dataLayer").is_none());
        layers.get_or_create("dataLayer").push(json!({"event": "a"}));
        layers.get_or_create("dataLayer").push(json!({"event": "b"}));
        assert_eq!(layers.get("dataLayer").map(|l| l.len()), Some(2));
        assert!(!layers.contains("other"));
    }

    #[test]
    fn test_drain_empties_layer() {
        let layer = DataLayer::default();
        layer.push(json!(1));
        assert_eq!(layer.drain(), vec![json!(1)]);
        assert!(layer.is_empty());
    }
}
