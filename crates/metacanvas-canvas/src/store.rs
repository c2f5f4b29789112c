//! Extraction state store
//!
//! Holds the single `CanvasState` behind a `tokio::sync::watch` channel.
//! Writers are serialized. Each mutation clones the current snapshot,
//! applies the change, recomputes derived data and publishes the new
//! snapshot as a whole, so observers never see a partial update.

use crate::state::CanvasState;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Owner of the canvas state
#[derive(Debug)]
pub struct CanvasStore {
    tx: watch::Sender<Arc<CanvasState>>,
    write_lock: Mutex<()>,
}

impl Default for CanvasStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasStore {
    /// Create a store holding the initial state
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(CanvasState::default()));
        Self {
            tx,
            write_lock: Mutex::new(()),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<CanvasState> {
        Arc::clone(&self.tx.borrow())
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<CanvasState>> {
        self.tx.subscribe()
    }

    /// Apply a mutation and publish the result
    ///
    /// Derived data (counters, progress, groups) is recomputed after `f`.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CanvasState) -> R,
    {
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = CanvasState::clone(&self.tx.borrow());
        let result = f(&mut next);
        next.recompute();
        self.tx.send_replace(Arc::new(next));
        result
    }

    /// Replace the state with the initial state
    pub fn reset(&self) {
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.tx.send_replace(Arc::new(CanvasState::default()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CanvasFieldState;
    use metacanvas_domain::FieldDefinition;
    use serde_json::json;

    #[test]
    fn test_update_publishes_new_snapshot() {
        let store = CanvasStore::new();
        let before = store.snapshot();

        store.update(|state| {
            state.source_text = "Workshop".to_string();
            state
                .core_fields
                .push(CanvasFieldState::new(Arc::new(FieldDefinition::new("title", "Titel"))));
        });

        let after = store.snapshot();
        assert_eq!(before.source_text, "");
        assert_eq!(after.source_text, "Workshop");
        assert_eq!(after.total_fields, 1);
        assert_eq!(after.field_groups.len(), 1);
    }

    #[test]
    fn test_update_returns_closure_result() {
        let store = CanvasStore::new();
        let found = store.update(|state| state.field_mut("missing").is_some());
        assert!(!found);
    }

    #[tokio::test]
    async fn test_subscribers_see_whole_snapshots() {
        let store = CanvasStore::new();
        let mut rx = store.subscribe();

        store.update(|state| {
            state
                .core_fields
                .push(CanvasFieldState::new(Arc::new(FieldDefinition::new("title", "Titel"))));
            if let Some(field) = state.field_mut("title") {
                field.set_value(Some(json!("Workshop")), 0.85);
            }
        });

        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.filled_fields, 1);
        assert_eq!(seen.extraction_progress, 100.0);
    }

    #[test]
    fn test_reset() {
        let store = CanvasStore::new();
        store.update(|state| state.is_extracting = true);
        store.reset();
        assert_eq!(*store.snapshot(), CanvasState::default());
    }
}
