//! The staged-rebuild state machine shared by all static batches.
//!
//! One [`PrimitiveGroup`] owns the primitive for one grouping key. When
//! membership changes, the next update builds a brand-new primitive with
//! fresh instances for every member, keeps the previous one visible until
//! the replacement reports ready, then swaps — never showing two
//! primitives for the same key at once. A rebuild requested while a
//! previous rebuild is still in flight discards the stale build before it
//! is ever shown.

use log::debug;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::core::time::SceneTime;
use crate::geometry::GeometryInstance;
use crate::scene::{Appearance, Primitive, SharedPrimitive, SharedPrimitives};
use crate::updaters::SharedUpdater;

/// Which instance stream this group renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InstanceKind {
    Fill,
    Outline,
}

pub(crate) struct PrimitiveGroup {
    collection: SharedPrimitives,
    appearance: Appearance,
    kind: InstanceKind,
    members: Vec<SharedUpdater>,
    instances: FxHashMap<Uuid, GeometryInstance>,
    primitive: Option<SharedPrimitive>,
    old_primitive: Option<SharedPrimitive>,
    create_primitive: bool,
}

impl PrimitiveGroup {
    pub(crate) fn new(
        collection: SharedPrimitives,
        appearance: Appearance,
        kind: InstanceKind,
    ) -> Self {
        Self {
            collection,
            appearance,
            kind,
            members: Vec::new(),
            instances: FxHashMap::default(),
            primitive: None,
            old_primitive: None,
            create_primitive: false,
        }
    }

    pub(crate) fn add(&mut self, updater: SharedUpdater, instance: GeometryInstance) {
        self.instances.insert(instance.id, instance);
        self.members.push(updater);
        self.create_primitive = true;
    }

    /// Removes by owning-entity identity; marks the group dirty when a
    /// member was actually removed.
    pub(crate) fn remove(&mut self, updater: &SharedUpdater) -> bool {
        let id = updater.borrow().entity_id();
        let before = self.members.len();
        self.members
            .retain(|member| member.borrow().entity_id() != id);
        let removed = self.members.len() != before;
        if removed {
            self.instances.remove(&id);
            self.create_primitive = true;
        }
        removed
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the group holds neither members nor primitives and can be
    /// dropped.
    pub(crate) fn is_defunct(&self) -> bool {
        self.members.is_empty() && self.primitive.is_none() && self.old_primitive.is_none()
    }

    /// Hands the member set back for redistribution and removes this
    /// group's primitives.
    pub(crate) fn take_members(&mut self) -> Vec<SharedUpdater> {
        self.instances.clear();
        self.remove_primitives();
        std::mem::take(&mut self.members)
    }

    /// Removes every primitive owned by this group from the collection.
    pub(crate) fn remove_primitives(&mut self) {
        let mut collection = self.collection.borrow_mut();
        if let Some(primitive) = self.primitive.take() {
            collection.remove(&primitive);
        }
        if let Some(old) = self.old_primitive.take() {
            collection.remove(&old);
        }
    }

    pub(crate) fn primitive(&self) -> Option<&SharedPrimitive> {
        self.primitive.as_ref()
    }

    /// Advances the group one frame. Returns whether the group is fully
    /// built and non-dirty.
    pub(crate) fn update(&mut self, time: SceneTime) -> bool {
        let mut updated = true;
        if self.create_primitive {
            if self.instances.is_empty() {
                self.remove_primitives();
            } else {
                let instances: Vec<GeometryInstance> = self.instances.values().cloned().collect();
                debug!("rebuilding primitive for {} instances", instances.len());
                let replacement = self.collection.borrow_mut().add(Primitive::new(
                    instances,
                    self.appearance.clone(),
                    true,
                ));
                if let Some(current) = self.primitive.take() {
                    if self.old_primitive.is_none() && current.borrow().show {
                        // Stays visible until the replacement is ready.
                        self.old_primitive = Some(current);
                    } else {
                        // Stale in-flight build; never became visible.
                        self.collection.borrow_mut().remove(&current);
                    }
                }
                self.primitive = Some(replacement);
                updated = false;
            }
            self.create_primitive = false;
        } else if let Some(primitive) = self.primitive.clone() {
            let mut primitive_ref = primitive.borrow_mut();
            primitive_ref.update();
            if primitive_ref.ready() {
                primitive_ref.show = true;
                drop(primitive_ref);
                if let Some(old) = self.old_primitive.take() {
                    self.collection.borrow_mut().remove(&old);
                    debug!("swapped in rebuilt primitive");
                }
                self.refresh_attributes(&primitive, time);
            } else {
                updated = false;
            }
        }
        updated
    }

    /// Re-samples show/color/display-condition attributes for every member
    /// into the ready primitive, without rebuilding geometry.
    fn refresh_attributes(&self, primitive: &SharedPrimitive, time: SceneTime) {
        let mut primitive = primitive.borrow_mut();
        for member in &self.members {
            let member = member.borrow();
            let sampled = match self.kind {
                InstanceKind::Fill => member.fill_attributes(time),
                InstanceKind::Outline => member.outline_attributes(time),
            };
            if let Some(attributes) = primitive.instance_attributes_mut(member.entity_id()) {
                attributes.show = sampled.show;
                if sampled.color.is_some() {
                    attributes.color = sampled.color;
                }
                attributes.distance_display_condition = sampled.distance_display_condition;
                if sampled.offset.is_some() {
                    attributes.offset = sampled.offset;
                }
            }
        }
    }
}
