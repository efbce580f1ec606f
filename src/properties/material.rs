//! Material properties.
//!
//! A material property describes how an entity's fill is shaded: either a
//! solid (possibly time-varying) color, or a per-fragment material such as
//! a grid. Material properties are shared between entities through
//! [`SharedMaterial`] handles; batches group on the *property itself*
//! (identity or definition equality), never on its sampled content, and
//! detect in-place edits through the version counter.

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;

use crate::core::color::Color;
use crate::core::time::SceneTime;
use crate::core::tracker::{ChangeTracker, TrackedMut};

use super::Property;

/// A solid-color material definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorMaterial {
    pub color: Option<Property<Color>>,
}

/// A grid material definition (per-fragment; carries no per-instance
/// color).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridMaterial {
    pub color: Option<Property<Color>>,
    pub cell_alpha: Option<Property<f64>>,
    pub line_count: Option<Property<DVec2>>,
    pub line_thickness: Option<Property<DVec2>>,
}

/// The closed set of material definitions the batches understand.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialDef {
    Color(ColorMaterial),
    Grid(GridMaterial),
}

impl MaterialDef {
    /// True when no sub-property can change between frames.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        match self {
            Self::Color(material) => super::is_constant(material.color.as_ref()),
            Self::Grid(material) => {
                super::is_constant(material.color.as_ref())
                    && super::is_constant(material.cell_alpha.as_ref())
                    && super::is_constant(material.line_count.as_ref())
                    && super::is_constant(material.line_thickness.as_ref())
            }
        }
    }
}

/// A shared, versioned material definition.
#[derive(Debug)]
pub struct MaterialProperty {
    def: MaterialDef,
    tracker: ChangeTracker,
}

impl MaterialProperty {
    #[must_use]
    pub fn new(def: MaterialDef) -> Self {
        Self {
            def,
            tracker: ChangeTracker::new(),
        }
    }

    /// A solid-color material with a constant color.
    #[must_use]
    pub fn color(color: Color) -> Self {
        Self::new(MaterialDef::Color(ColorMaterial {
            color: Some(Property::constant(color)),
        }))
    }

    /// A solid-color material backed by an arbitrary color property.
    #[must_use]
    pub fn color_property(color: Property<Color>) -> Self {
        Self::new(MaterialDef::Color(ColorMaterial { color: Some(color) }))
    }

    /// A grid material with default sub-properties.
    #[must_use]
    pub fn grid() -> Self {
        Self::new(MaterialDef::Grid(GridMaterial::default()))
    }

    #[must_use]
    pub fn def(&self) -> &MaterialDef {
        &self.def
    }

    /// Mutable access to the definition; bumps the version when dropped so
    /// batches referencing this material rebuild on their next update.
    pub fn edit(&mut self) -> TrackedMut<'_, MaterialDef> {
        TrackedMut::new(&mut self.def, &mut self.tracker)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.tracker.version()
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.def.is_constant()
    }

    /// True for solid-color materials, whose color travels as a
    /// per-instance attribute instead of shader state.
    #[must_use]
    pub fn is_color_material(&self) -> bool {
        matches!(self.def, MaterialDef::Color(_))
    }

    /// Samples the solid color. `available` gates sampling of
    /// non-constant colors, matching instance-attribute evaluation rules;
    /// per-fragment materials always yield `None`.
    #[must_use]
    pub fn sample_color(&self, time: SceneTime, available: bool) -> Option<Color> {
        match &self.def {
            MaterialDef::Color(material) => {
                let color = material.color.as_ref()?;
                if color.is_constant() || available {
                    color.get_value(time)
                } else {
                    None
                }
            }
            MaterialDef::Grid(_) => None,
        }
    }

    /// Definition-level equality, used by the per-material batch to decide
    /// whether two properties can share a primitive.
    #[must_use]
    pub fn definition_equals(&self, other: &Self) -> bool {
        self.def == other.def
    }
}

impl Default for MaterialProperty {
    /// The default fill material: solid white.
    fn default() -> Self {
        Self::color(Color::WHITE)
    }
}

/// Shared handle to a material property. Identity of the handle is the
/// per-material batch's primary grouping key.
pub type SharedMaterial = Rc<RefCell<MaterialProperty>>;

/// Wraps a definition in a fresh shared handle.
#[must_use]
pub fn shared(def: MaterialDef) -> SharedMaterial {
    Rc::new(RefCell::new(MaterialProperty::new(def)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_bumps_version() {
        let mut material = MaterialProperty::grid();
        let before = material.version();
        {
            let mut def = material.edit();
            if let MaterialDef::Grid(grid) = &mut *def {
                grid.cell_alpha = Some(Property::constant(0.5));
            }
        }
        assert!(material.version() > before);
    }

    #[test]
    fn default_grids_are_definition_equal() {
        let a = MaterialProperty::grid();
        let b = MaterialProperty::grid();
        assert!(a.definition_equals(&b));

        let mut c = MaterialProperty::grid();
        {
            let mut def = c.edit();
            if let MaterialDef::Grid(grid) = &mut *def {
                grid.cell_alpha = Some(Property::constant(0.5));
            }
        }
        assert!(!a.definition_equals(&c));
    }

    #[test]
    fn color_sampling_respects_availability() {
        let property = Property::intervals(vec![(
            crate::core::time::TimeInterval::new(
                SceneTime::from_seconds(0.0),
                SceneTime::from_seconds(10.0),
            ),
            Color::RED,
        )]);
        let material = MaterialProperty::color_property(property);
        assert_eq!(
            material.sample_color(SceneTime::from_seconds(5.0), true),
            Some(Color::RED)
        );
        // Out of range: sampling is attempted but yields nothing.
        assert_eq!(material.sample_color(SceneTime::from_seconds(20.0), true), None);
        // Not available and not constant: sampling is skipped.
        assert_eq!(material.sample_color(SceneTime::from_seconds(5.0), false), None);
    }

    #[test]
    fn grid_material_has_no_instance_color() {
        let material = MaterialProperty::grid();
        assert!(!material.is_color_material());
        assert_eq!(material.sample_color(SceneTime::from_seconds(0.0), true), None);
    }
}
