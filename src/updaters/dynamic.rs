//! Per-frame dynamic re-sampling.
//!
//! When any geometry-defining property is non-constant, the static
//! batches cannot cache a primitive; a dynamic updater instead rebuilds
//! the shape's primitives every rendered frame from freshly sampled
//! options. Dynamic primitives are built synchronously-ready and replaced
//! wholesale, so no staged-visibility protocol is needed.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::time::SceneTime;
use crate::geometry::GeometryInstance;
use crate::scene::{Appearance, Primitive, SceneContext, SharedPrimitive, SharedPrimitives};

use super::DynamicUpdater;
use super::GeometryUpdater;
use super::ellipse::EllipseGeometryUpdater;

/// Dynamic companion of [`EllipseGeometryUpdater`]. Recreated whenever the
/// geometry updater transitions into the dynamic state.
pub struct DynamicEllipseGeometryUpdater {
    updater: Rc<RefCell<EllipseGeometryUpdater>>,
    primitives: SharedPrimitives,
    ground_primitives: SharedPrimitives,
    fill_primitive: Option<SharedPrimitive>,
    outline_primitive: Option<SharedPrimitive>,
}

impl DynamicEllipseGeometryUpdater {
    #[must_use]
    pub fn new(updater: Rc<RefCell<EllipseGeometryUpdater>>, scene: &SceneContext) -> Self {
        Self {
            updater,
            primitives: Rc::clone(&scene.primitives),
            ground_primitives: Rc::clone(&scene.ground_primitives),
            fill_primitive: None,
            outline_primitive: None,
        }
    }

    fn discard_frame_primitives(&mut self) {
        if let Some(primitive) = self.fill_primitive.take() {
            self.primitives.borrow_mut().remove(&primitive);
            self.ground_primitives.borrow_mut().remove(&primitive);
        }
        if let Some(primitive) = self.outline_primitive.take() {
            self.primitives.borrow_mut().remove(&primitive);
        }
    }
}

impl DynamicUpdater for DynamicEllipseGeometryUpdater {
    fn update(&mut self, time: SceneTime) {
        self.discard_frame_primitives();

        let mut updater = self.updater.borrow_mut();
        updater.set_options(time);
        if updater.dynamic_is_hidden(time) {
            return;
        }

        if updater.fill_enabled() {
            let instance: GeometryInstance = updater.create_fill_geometry_instance(time);
            if instance.geometry.is_some() {
                let material = updater.fill_material();
                let (collection, appearance) = if updater.on_terrain() {
                    (&self.ground_primitives, Appearance::Classification)
                } else if material.borrow().is_color_material() {
                    (&self.primitives, Appearance::PerInstanceColor)
                } else {
                    (&self.primitives, Appearance::Material(material))
                };
                self.fill_primitive = Some(
                    collection
                        .borrow_mut()
                        .add(Primitive::new(vec![instance], appearance, false)),
                );
            }
        }

        if updater.outline_enabled() {
            let instance = updater.create_outline_geometry_instance(time);
            if instance.geometry.is_some() {
                self.outline_primitive = Some(self.primitives.borrow_mut().add(Primitive::new(
                    vec![instance],
                    Appearance::PerInstanceColor,
                    false,
                )));
            }
        }
    }

    fn remove_all_primitives(&mut self) {
        self.discard_frame_primitives();
    }
}
