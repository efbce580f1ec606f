//! Entities and their declarative shape graphics.
//!
//! An entity is a bag of time-varying properties describing something to
//! visualize. The geometry updaters read these properties and translate
//! them into renderable instances; nothing here touches geometry
//! directly.

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec3;
use uuid::Uuid;

use crate::core::color::Color;
use crate::core::time::{SceneTime, TimeIntervalCollection};
use crate::geometry::DistanceDisplayCondition;
use crate::properties::{Property, SharedMaterial};
use crate::scene::HeightReference;

/// Declarative description of an ellipse shape attached to an entity.
///
/// Every field is optional; the updaters substitute documented defaults
/// (fill on, outline off, white fill color, black outline color) for
/// absent properties.
#[derive(Debug, Default)]
pub struct EllipseGraphics {
    pub show: Option<Property<bool>>,
    pub semi_major_axis: Option<Property<f64>>,
    pub semi_minor_axis: Option<Property<f64>>,
    pub height: Option<Property<f64>>,
    pub height_reference: Option<Property<HeightReference>>,
    pub extruded_height: Option<Property<f64>>,
    pub extruded_height_reference: Option<Property<HeightReference>>,
    pub rotation: Option<Property<f64>>,
    pub st_rotation: Option<Property<f64>>,
    pub granularity: Option<Property<f64>>,
    pub fill: Option<Property<bool>>,
    pub material: Option<SharedMaterial>,
    pub outline: Option<Property<bool>>,
    pub outline_color: Option<Property<Color>>,
    pub outline_width: Option<Property<f64>>,
    pub number_of_vertical_lines: Option<Property<u32>>,
    pub distance_display_condition: Option<Property<DistanceDisplayCondition>>,
    pub z_index: Option<Property<i64>>,
}

/// A scene entity.
#[derive(Debug, Default)]
pub struct Entity {
    id: Uuid,
    pub name: Option<String>,
    /// Master visibility switch, independent of the per-shape show
    /// property.
    pub show: bool,
    /// When present, the entity only exists inside these intervals.
    pub availability: Option<TimeIntervalCollection>,
    pub position: Option<Property<DVec3>>,
    pub ellipse: Option<EllipseGraphics>,
}

impl Entity {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            show: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the entity exists at `time`. Entities without availability
    /// exist at every time.
    #[must_use]
    pub fn is_available(&self, time: SceneTime) -> bool {
        self.availability
            .as_ref()
            .is_none_or(|availability| availability.contains(time))
    }
}

/// Shared handle to an entity.
pub type SharedEntity = Rc<RefCell<Entity>>;

/// Wraps an entity in a fresh shared handle.
#[must_use]
pub fn shared(entity: Entity) -> SharedEntity {
    Rc::new(RefCell::new(entity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::TimeInterval;

    #[test]
    fn entity_without_availability_is_always_available() {
        let entity = Entity::new();
        assert!(entity.is_available(SceneTime::from_seconds(0.0)));
        assert!(entity.is_available(SceneTime::MINIMUM));
    }

    #[test]
    fn availability_gates_existence() {
        let mut entity = Entity::new();
        entity.availability = Some(TimeIntervalCollection::new(vec![TimeInterval::new(
            SceneTime::from_seconds(0.0),
            SceneTime::from_seconds(10.0),
        )]));
        assert!(entity.is_available(SceneTime::from_seconds(5.0)));
        assert!(!entity.is_available(SceneTime::from_seconds(20.0)));
    }
}
