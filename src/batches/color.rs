//! The static color batch.
//!
//! Draws with the per-instance-color appearance, so geometry with the
//! same resolved color and z-index can share one primitive. The grouping
//! key is resolved once when an updater is added; later color changes on
//! non-constant properties are written in place as instance attributes
//! and never regroup.

use rustc_hash::FxHashMap;

use crate::core::time::SceneTime;
use crate::scene::{Appearance, SharedPrimitives};
use crate::updaters::SharedUpdater;

use super::Batch;
use super::group::{InstanceKind, PrimitiveGroup};

/// Packed color plus z-index.
pub type ColorKey = (u32, i64);

/// Groups updaters by resolved per-instance color.
pub struct StaticColorBatch {
    collection: SharedPrimitives,
    kind: InstanceKind,
    groups: FxHashMap<ColorKey, PrimitiveGroup>,
}

impl StaticColorBatch {
    /// A batch of filled geometry.
    #[must_use]
    pub fn new(collection: SharedPrimitives) -> Self {
        Self {
            collection,
            kind: InstanceKind::Fill,
            groups: FxHashMap::default(),
        }
    }

    /// A batch of outline geometry.
    #[must_use]
    pub fn new_outline(collection: SharedPrimitives) -> Self {
        Self {
            collection,
            kind: InstanceKind::Outline,
            groups: FxHashMap::default(),
        }
    }

    /// Number of active groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl Batch for StaticColorBatch {
    fn add(&mut self, time: SceneTime, updater: &SharedUpdater) {
        let (instance, z_index) = {
            let updater_ref = updater.borrow();
            let instance = match self.kind {
                InstanceKind::Fill => updater_ref.create_fill_geometry_instance(time),
                InstanceKind::Outline => updater_ref.create_outline_geometry_instance(time),
            };
            (instance, updater_ref.z_index())
        };
        let color = instance.attributes.color.unwrap_or([255, 255, 255, 255]);
        let key: ColorKey = (u32::from_le_bytes(color), z_index);

        self.groups
            .entry(key)
            .or_insert_with(|| {
                PrimitiveGroup::new(
                    std::rc::Rc::clone(&self.collection),
                    Appearance::PerInstanceColor,
                    self.kind,
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
