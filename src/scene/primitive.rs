//! CPU-side primitives with staged readiness.
//!
//! A primitive built asynchronously does not become ready in the frame
//! that created it; it counts down a fixed number of update calls first,
//! standing in for GPU-side geometry upload and pipeline compilation.
//! Batches poll `ready()` each frame and only swap visibility once the
//! replacement has finished building. Synchronous primitives (used by the
//! dynamic updaters) are ready immediately.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::geometry::{DistanceDisplayCondition, GeometryInstance};
use crate::properties::SharedMaterial;

/// Update calls an asynchronous build takes to become ready.
pub const ASYNC_BUILD_FRAMES: u32 = 2;

/// The appearance a primitive draws its instances with.
#[derive(Debug, Clone)]
pub enum Appearance {
    /// Color comes from each instance's color attribute.
    PerInstanceColor,
    /// A shared per-fragment material.
    Material(SharedMaterial),
    /// Terrain classification; color from instance attributes.
    Classification,
}

/// Readable/writable per-instance attribute state after a primitive is
/// ready.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceAttributes {
    pub show: bool,
    pub color: Option<[u8; 4]>,
    pub distance_display_condition: DistanceDisplayCondition,
    pub offset: Option<glam::Vec3>,
}

/// A renderable group of geometry instances.
#[derive(Debug)]
pub struct Primitive {
    /// Whether the primitive is drawn. Batches keep replacements hidden
    /// until they are ready.
    pub show: bool,
    instances: Vec<GeometryInstance>,
    appearance: Appearance,
    frames_remaining: u32,
    ready: bool,
    attributes: FxHashMap<Uuid, InstanceAttributes>,
}

impl Primitive {
    /// Creates a primitive. Asynchronous builds start hidden and not
    /// ready; synchronous builds are shown and ready immediately.
    #[must_use]
    pub fn new(instances: Vec<GeometryInstance>, appearance: Appearance, asynchronous: bool) -> Self {
        let mut primitive = Self {
            show: !asynchronous,
            instances,
            appearance,
            frames_remaining: if asynchronous { ASYNC_BUILD_FRAMES } else { 0 },
            ready: false,
            attributes: FxHashMap::default(),
        };
        if !asynchronous {
            primitive.finish_build();
        }
        primitive
    }

    /// Advances the staged build by one frame.
    pub fn update(&mut self) {
        if self.ready {
            return;
        }
        if self.frames_remaining > 0 {
            self.frames_remaining -= 1;
        }
        if self.frames_remaining == 0 {
            self.finish_build();
        }
    }

    fn finish_build(&mut self) {
        for instance in &self.instances {
            self.attributes.insert(
                instance.id,
                InstanceAttributes {
                    show: instance.attributes.show,
                    color: instance.attributes.color,
                    distance_display_condition: instance.attributes.distance_display_condition,
                    offset: instance.attributes.offset,
                },
            );
        }
        self.ready = true;
    }

    #[must_use]
    pub fn ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    #[must_use]
    pub fn instances(&self) -> &[GeometryInstance] {
        &self.instances
    }

    /// Per-instance attributes for the instance owned by `id`. `None`
    /// until the primitive is ready.
    #[must_use]
    pub fn instance_attributes(&self, id: Uuid) -> Option<&InstanceAttributes> {
        if !self.ready {
            return None;
        }
        self.attributes.get(&id)
    }

    /// Mutable attribute access for in-place updates on a ready primitive.
    #[must_use]
    pub fn instance_attributes_mut(&mut self, id: Uuid) -> Option<&mut InstanceAttributes> {
        if !self.ready {
            return None;
        }
        self.attributes.get_mut(&id)
    }
}

/// Shared handle to a primitive.
pub type SharedPrimitive = Rc<RefCell<Primitive>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::InstanceAttributeSet;

    fn instance(id: Uuid) -> GeometryInstance {
        GeometryInstance::new(id, None, InstanceAttributeSet::default())
    }

    #[test]
    fn async_build_takes_staged_frames() {
        let id = Uuid::new_v4();
        let mut primitive = Primitive::new(vec![instance(id)], Appearance::PerInstanceColor, true);
        assert!(!primitive.ready());
        assert!(primitive.instance_attributes(id).is_none());
        for _ in 0..ASYNC_BUILD_FRAMES {
            primitive.update();
        }
        assert!(primitive.ready());
        assert!(primitive.instance_attributes(id).is_some());
    }

    #[test]
    fn sync_build_is_immediately_ready() {
        let id = Uuid::new_v4();
        let primitive = Primitive::new(vec![instance(id)], Appearance::PerInstanceColor, false);
        assert!(primitive.ready());
        assert!(primitive.show);
    }
}
