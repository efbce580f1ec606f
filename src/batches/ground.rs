//! The ground color batch.
//!
//! Like the color batch, groups by resolved color and z-index, but
//! targets the terrain-classification primitive collection and exposes
//! its key → primitive table for lookup and removal.

use rustc_hash::FxHashMap;

use crate::core::time::SceneTime;
use crate::scene::{Appearance, SharedPrimitive, SharedPrimitives};
use crate::updaters::SharedUpdater;

use super::Batch;
use super::group::{InstanceKind, PrimitiveGroup};

/// Packed color plus z-index; one ground primitive exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroundKey {
    pub packed_color: u32,
    pub z_index: i64,
}

impl GroundKey {
    #[must_use]
    pub fn new(color: [u8; 4], z_index: i64) -> Self {
        Self {
            packed_color: u32::from_le_bytes(color),
            z_index,
        }
    }
}

/// Groups terrain-clamped updaters by resolved color.
pub struct GroundColorBatch {
    collection: SharedPrimitives,
    groups: FxHashMap<GroundKey, PrimitiveGroup>,
}

impl GroundColorBatch {
    /// `collection` must be the scene's ground-primitive collection.
    #[must_use]
    pub fn new(collection: SharedPrimitives) -> Self {
        Self {
            collection,
            groups: FxHashMap::default(),
        }
    }

    /// Looks up the current primitive for `key`, if one exists.
    #[must_use]
    pub fn primitive_for_key(&self, key: GroundKey) -> Option<SharedPrimitive> {
        self.groups.get(&key).and_then(|group| group.primitive().cloned())
    }

    /// Active keys, for inspection.
    #[must_use]
    pub fn keys(&self) -> Vec<GroundKey> {
        self.groups.keys().copied().collect()
    }
}

impl Batch for GroundColorBatch {
    fn add(&mut self, time: SceneTime, updater: &SharedUpdater) {
        let (instance, z_index) = {
            let updater_ref = updater.borrow();
            (
                updater_ref.create_fill_geometry_instance(time),
                updater_ref.z_index(),
            )
        };
        let color = instance.attributes.color.unwrap_or([255, 255, 255, 255]);
        let key = GroundKey::new(color, z_index);

        self.groups
            .entry(key)
            .or_insert_with(|| {
                PrimitiveGroup::new(
                    std::rc::Rc::clone(&self.collection),
                    Appearance::Classification,
                    InstanceKind::Fill,
                )
            })
            .add(std::rc::Rc::clone(updater), instance);
    }

    fn remove(&mut self, updater: &SharedUpdater) -> bool {
        self.groups.values_mut().any(|group| group.remove(updater))
    }

    fn update(&mut self, time: SceneTime) -> bool {
        let mut updated = true;
        for group in self.groups.values_mut() {
            updated &= group.update(time);
        }
        self.groups.retain(|_, group| !group.is_defunct());
        updated
    }

    fn remove_all_primitives(&mut self) {
        for group in self.groups.values_mut() {
            group.remove_primitives();
        }
        self.groups.clear();
    }
}
