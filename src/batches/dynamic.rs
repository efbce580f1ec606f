//! The dynamic batch.
//!
//! Owns the dynamic companion updaters of shapes whose defining
//! properties vary with time and drives their per-frame rebuild. Dynamic
//! primitives are synchronously ready, so `update` always reports fully
//! updated.

use uuid::Uuid;

use crate::core::time::SceneTime;
use crate::updaters::DynamicUpdater;

/// Drives the per-frame update of all dynamic updaters.
#[derive(Default)]
pub struct DynamicBatch {
    items: Vec<(Uuid, Box<dyn DynamicUpdater>)>,
}

impl DynamicBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the dynamic companion for the entity `id`, replacing any
    /// previous registration.
    pub fn add(&mut self, id: Uuid, updater: Box<dyn DynamicUpdater>) {
        self.remove(id);
        self.items.push((id, updater));
    }

    /// Removes the dynamic companion for `id`, discarding its primitives.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let Some(index) = self.items.iter().position(|(item_id, _)| *item_id == id) else {
            return false;
        };
        let (_, mut updater) = self.items.swap_remove(index);
        updater.remove_all_primitives();
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Re-samples every dynamic shape at `time`. Always fully updated.
    pub fn update(&mut self, time: SceneTime) -> bool {
        for (_, updater) in &mut self.items {
            updater.update(time);
        }
        true
    }

    pub fn remove_all_primitives(&mut self) {
        for (_, updater) in &mut self.items {
            updater.remove_all_primitives();
        }
    }
}
