//! The per-material batch.
//!
//! Groups updaters whose fill materials are the same property — the same
//! shared handle, or one with an equal definition. Grouping never looks
//! at sampled content; an in-place edit to a shared material is detected
//! through its version counter and forces every group referencing it to
//! redistribute its members, splitting the group when the edit made the
//! definitions diverge.

use log::debug;

use crate::core::time::SceneTime;
use crate::properties::SharedMaterial;
use crate::scene::{Appearance, SharedPrimitives};
use crate::updaters::SharedUpdater;

use super::Batch;
use super::group::{InstanceKind, PrimitiveGroup};

struct MaterialGroup {
    material: SharedMaterial,
    observed_version: u64,
    group: PrimitiveGroup,
}

impl MaterialGroup {
    fn matches(&self, material: &SharedMaterial) -> bool {
        std::rc::Rc::ptr_eq(&self.material, material)
            || self
                .material
                .borrow()
                .definition_equals(&material.borrow())
    }

    fn invalidated(&self) -> bool {
        self.material.borrow().version() != self.observed_version
    }
}

/// Groups updaters by shared material property.
pub struct PerMaterialBatch {
    collection: SharedPrimitives,
    items: Vec<MaterialGroup>,
}

impl PerMaterialBatch {
    #[must_use]
    pub fn new(collection: SharedPrimitives) -> Self {
        Self {
            collection,
            items: Vec::new(),
        }
    }

    /// Number of active material groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.items.len()
    }
}

impl Batch for PerMaterialBatch {
    fn add(&mut self, time: SceneTime, updater: &SharedUpdater) {
        let (instance, material) = {
            let updater_ref = updater.borrow();
            (
                updater_ref.create_fill_geometry_instance(time),
                updater_ref.fill_material(),
            )
        };

        if let Some(item) = self.items.iter_mut().find(|item| item.matches(&material)) {
            item.group.add(std::rc::Rc::clone(updater), instance);
            return;
        }

        let observed_version = material.borrow().version();
        let mut group = PrimitiveGroup::new(
            std::rc::Rc::clone(&self.collection),
            Appearance::Material(std::rc::Rc::clone(&material)),
            InstanceKind::Fill,
        );
        group.add(std::rc::Rc::clone(updater), instance);
        self.items.push(MaterialGroup {
            material,
            observed_version,
            group,
        });
    }

    fn remove(&mut self, updater: &SharedUpdater) -> bool {
        self.items.iter_mut().any(|item| item.group.remove(updater))
    }

    fn update(&mut self, time: SceneTime) -> bool {
        // Redistribute the members of groups whose material was edited in
        // place; re-adding re-evaluates which group each member belongs
        // to, so diverged definitions split.
        let mut orphans: Vec<SharedUpdater> = Vec::new();
        self.items.retain_mut(|item| {
            if item.invalidated() {
                let members = item.group.take_members();
                debug!("material edit invalidated a group of {} members", members.len());
                orphans.extend(members);
                false
            } else {
                true
            }
        });
        for updater in &orphans {
            self.add(time, updater);
        }

        let mut updated = true;
        for item in &mut self.items {
            updated &= item.group.update(time);
        }
        self.items.retain(|item| !item.group.is_defunct());
        updated
    }

    fn remove_all_primitives(&mut self) {
        for item in &mut self.items {
            item.group.remove_primitives();
        }
        self.items.clear();
    }
}
