//! Geometry updaters.
//!
//! A geometry updater is a per-entity state machine translating
//! declarative shape properties into geometry instances. The
//! [`GeometryUpdater`] trait is the capability surface the batches
//! consume; each shape contributes one strategy type implementing it
//! ([`ellipse::EllipseGeometryUpdater`] is the reference shape). Shared
//! base predicates and the ground-height resolution helpers live here so
//! further shapes stay thin.

pub mod dynamic;
pub mod ellipse;

use std::cell::RefCell;
use std::rc::Rc;

use uuid::Uuid;

use crate::core::time::SceneTime;
use crate::entity::{Entity, SharedEntity};
use crate::geometry::{GeometryInstance, OffsetMode};
use crate::properties::{self, Property, SharedMaterial};
use crate::scene::HeightReference;

/// Capability surface of one per-entity shape updater.
pub trait GeometryUpdater {
    fn entity(&self) -> &SharedEntity;
    fn entity_id(&self) -> Uuid;

    /// Samples the shape's center position at `time`.
    fn compute_center(&self, time: SceneTime) -> Option<glam::DVec3>;

    /// Whether the shape currently has a filled representation.
    fn fill_enabled(&self) -> bool;
    /// Whether the shape currently has an outline representation.
    fn outline_enabled(&self) -> bool;
    /// Whether any geometry-defining property varies with time.
    fn is_dynamic(&self) -> bool;
    /// Whether the fill is routed to the ground-primitive batch.
    fn on_terrain(&self) -> bool;
    /// Whether the built shape is a closed volume.
    fn is_closed(&self) -> bool;

    /// The fill material; a solid white default when the entity declares
    /// none.
    fn fill_material(&self) -> SharedMaterial;
    fn outline_width(&self) -> f64;
    fn z_index(&self) -> i64;

    /// Builds the fill instance at `time`.
    ///
    /// # Panics
    ///
    /// Panics when fill is disabled.
    fn create_fill_geometry_instance(&self, time: SceneTime) -> GeometryInstance;

    /// Builds the outline instance at `time`.
    ///
    /// # Panics
    ///
    /// Panics when outline is disabled.
    fn create_outline_geometry_instance(&self, time: SceneTime) -> GeometryInstance;

    /// Re-samples the fill attributes without rebuilding geometry; used
    /// for in-place attribute refresh on ready primitives.
    fn fill_attributes(&self, time: SceneTime) -> crate::geometry::InstanceAttributeSet;
    /// Outline counterpart of [`Self::fill_attributes`].
    fn outline_attributes(&self, time: SceneTime) -> crate::geometry::InstanceAttributeSet;

    /// Re-evaluates cached state after the entity's properties changed.
    fn on_entity_changed(&mut self);
}

/// Shared handle to a shape updater.
pub type SharedUpdater = Rc<RefCell<dyn GeometryUpdater>>;

/// Per-frame companion of a dynamic updater; owns no persistent GPU
/// state beyond the primitives it replaces every frame.
pub trait DynamicUpdater {
    fn update(&mut self, time: SceneTime);
    fn remove_all_primitives(&mut self);
}

/// Base hidden predicate shared by all shapes: the entity is invisible,
/// or the shape's show property is constant false.
#[must_use]
pub(crate) fn base_is_hidden(entity: &Entity, show: Option<&Property<bool>>) -> bool {
    if !entity.show {
        return true;
    }
    show.is_some_and(|show| {
        show.is_constant() && !show.get_value(SceneTime::MINIMUM).unwrap_or(true)
    })
}

/// A sampled extruded height, possibly deferred to terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ExtrudedHeight {
    Value(f64),
    /// Resolved later by substituting the minimum approximate terrain
    /// height under the geometry.
    ClampToGround,
}

/// Which offset attribute mode the (height-reference, extruded-reference)
/// pair requires, if any.
#[must_use]
pub(crate) fn compute_offset_mode(
    height_reference: HeightReference,
    extruded_height_reference: HeightReference,
) -> Option<OffsetMode> {
    let mut offset_count = 0;
    if height_reference != HeightReference::None {
        offset_count += 1;
    }
    if extruded_height_reference == HeightReference::RelativeToGround {
        offset_count += 1;
    }
    match offset_count {
        2 => Some(OffsetMode::All),
        1 => Some(OffsetMode::Top),
        _ => None,
    }
}

/// Resolves the base height for geometry construction. Clamped surfaces
/// sit at height zero; the offset attribute carries the terrain lift.
#[must_use]
pub(crate) fn geometry_height(height: Option<f64>, reference: HeightReference) -> Option<f64> {
    if reference == HeightReference::ClampToGround {
        if height.is_some() {
            log::warn!("height is ignored for clamp-to-ground geometry");
        }
        return Some(0.0);
    }
    height
}

/// Resolves the extruded height, deferring clamp-to-ground to terrain
/// sampling.
#[must_use]
pub(crate) fn geometry_extruded_height(
    extruded_height: Option<f64>,
    reference: HeightReference,
) -> Option<ExtrudedHeight> {
    if reference == HeightReference::ClampToGround {
        return Some(ExtrudedHeight::ClampToGround);
    }
    extruded_height.map(ExtrudedHeight::Value)
}

/// Samples fill/outline enablement the way all shapes do: fill defaults
/// on, outline exists only when declared, and non-constant properties
/// keep the representation enabled so per-frame attributes can gate it.
#[must_use]
pub(crate) fn sample_enabled(
    fill: Option<&Property<bool>>,
    outline: Option<&Property<bool>>,
) -> (bool, bool) {
    let fill_enabled = match fill {
        Some(fill) if fill.is_constant() => {
            fill.get_value(SceneTime::MINIMUM).unwrap_or(true)
        }
        _ => true,
    };
    let outline_enabled = match outline {
        None => false,
        Some(outline) if outline.is_constant() => {
            outline.get_value(SceneTime::MINIMUM).unwrap_or(false)
        }
        Some(_) => true,
    };
    (fill_enabled, outline_enabled)
}

pub(crate) use properties::{is_constant, value_or, value_or_undefined};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_mode_counts_references() {
        assert_eq!(
            compute_offset_mode(HeightReference::None, HeightReference::None),
            None
        );
        assert_eq!(
            compute_offset_mode(HeightReference::RelativeToGround, HeightReference::None),
            Some(OffsetMode::Top)
        );
        assert_eq!(
            compute_offset_mode(
                HeightReference::RelativeToGround,
                HeightReference::RelativeToGround
            ),
            Some(OffsetMode::All)
        );
        assert_eq!(
            compute_offset_mode(HeightReference::None, HeightReference::RelativeToGround),
            Some(OffsetMode::Top)
        );
    }

    #[test]
    fn clamped_height_is_zero() {
        assert_eq!(
            geometry_height(Some(25.0), HeightReference::ClampToGround),
            Some(0.0)
        );
        assert_eq!(geometry_height(Some(25.0), HeightReference::None), Some(25.0));
        assert_eq!(geometry_height(None, HeightReference::None), None);
    }

    #[test]
    fn clamped_extrusion_defers_to_terrain() {
        assert_eq!(
            geometry_extruded_height(Some(5.0), HeightReference::ClampToGround),
            Some(ExtrudedHeight::ClampToGround)
        );
        assert_eq!(
            geometry_extruded_height(Some(5.0), HeightReference::None),
            Some(ExtrudedHeight::Value(5.0))
        );
    }

    #[test]
    fn enablement_defaults() {
        let (fill, outline) = sample_enabled(None, None);
        assert!(fill);
        assert!(!outline);

        let (fill, outline) = sample_enabled(
            Some(&Property::constant(false)),
            Some(&Property::constant(true)),
        );
        assert!(!fill);
        assert!(outline);
    }
}
