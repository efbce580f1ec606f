//! The ellipse geometry updater.

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec3;
use log::warn;
use uuid::Uuid;

use crate::core::color::Color;
use crate::core::terrain;
use crate::core::time::SceneTime;
use crate::entity::{EllipseGraphics, Entity, SharedEntity};
use crate::geometry::ellipse as ellipse_geometry;
use crate::geometry::{
    DistanceDisplayCondition, GeometryInstance, InstanceAttributeSet, OffsetMode, VertexFormat,
};
use crate::properties::material::MaterialProperty;
use crate::properties::{Property, SharedMaterial};
use crate::scene::{HeightReference, SceneContext};

use super::{
    ExtrudedHeight, GeometryUpdater, base_is_hidden, compute_offset_mode, geometry_extruded_height,
    geometry_height, is_constant, sample_enabled, value_or, value_or_undefined,
};

/// Reusable geometry-build scratch record. Owned by one updater for its
/// whole lifetime and refreshed in place; never shared across updaters.
#[derive(Debug, Clone, Default)]
pub struct EllipseGeometryOptions {
    pub vertex_format: VertexFormat,
    pub center: Option<DVec3>,
    pub semi_major_axis: Option<f64>,
    pub semi_minor_axis: Option<f64>,
    pub rotation: Option<f64>,
    pub height: Option<f64>,
    pub extruded_height: Option<f64>,
    pub granularity: Option<f64>,
    pub st_rotation: Option<f64>,
    pub number_of_vertical_lines: Option<u32>,
    pub offset_attribute: Option<OffsetMode>,
}

/// Translates an entity's [`EllipseGraphics`] into geometry instances.
#[derive(Debug)]
pub struct EllipseGeometryUpdater {
    entity: SharedEntity,
    scene: SceneContext,
    options: EllipseGeometryOptions,
    /// Stable fallback material used when the graphics declare none.
    default_material: SharedMaterial,
    material: SharedMaterial,
    terrain_offset: Option<Property<DVec3>>,
    fill_enabled: bool,
    outline_enabled: bool,
    dynamic: bool,
    on_terrain: bool,
    closed: bool,
    outline_width: f64,
    z_index: i64,
}

impl EllipseGeometryUpdater {
    #[must_use]
    pub fn new(entity: SharedEntity, scene: SceneContext) -> Self {
        let default_material = Rc::new(RefCell::new(MaterialProperty::default()));
        let mut updater = Self {
            entity,
            scene,
            options: EllipseGeometryOptions::default(),
            material: Rc::clone(&default_material),
            default_material,
            terrain_offset: None,
            fill_enabled: false,
            outline_enabled: false,
            dynamic: false,
            on_terrain: false,
            closed: false,
            outline_width: 1.0,
            z_index: 0,
        };
        updater.on_entity_changed();
        updater
    }

    /// Wraps the updater in the shared handle the batches consume.
    #[must_use]
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub fn options(&self) -> &EllipseGeometryOptions {
        &self.options
    }

    /// Installs the property sampled into the per-instance offset
    /// attribute for ground-offset builds. Absent, the offset is zero.
    pub fn set_terrain_offset(&mut self, property: Option<Property<DVec3>>) {
        self.terrain_offset = property;
    }

    fn disable(&mut self) {
        self.fill_enabled = false;
        self.outline_enabled = false;
        self.dynamic = false;
        self.on_terrain = false;
    }

    /// The shape has no renderable definition without a position and both
    /// axes.
    fn is_hidden(entity: &Entity, ellipse: &EllipseGraphics) -> bool {
        entity.position.is_none()
            || ellipse.semi_major_axis.is_none()
            || ellipse.semi_minor_axis.is_none()
            || base_is_hidden(entity, ellipse.show.as_ref())
    }

    fn compute_on_terrain(&self, ellipse: &EllipseGraphics, fill_enabled: bool) -> bool {
        fill_enabled
            && ellipse.height.is_none()
            && ellipse.extruded_height.is_none()
            && self.scene.is_ground_primitive_supported()
    }

    fn compute_is_dynamic(&self, entity: &Entity, ellipse: &EllipseGraphics, on_terrain: bool) -> bool {
        !is_constant(entity.position.as_ref())
            || !is_constant(ellipse.semi_major_axis.as_ref())
            || !is_constant(ellipse.semi_minor_axis.as_ref())
            || !is_constant(ellipse.rotation.as_ref())
            || !is_constant(ellipse.height.as_ref())
            || !is_constant(ellipse.extruded_height.as_ref())
            || !is_constant(ellipse.granularity.as_ref())
            || !is_constant(ellipse.st_rotation.as_ref())
            || !is_constant(ellipse.outline_width.as_ref())
            || !is_constant(ellipse.number_of_vertical_lines.as_ref())
            || !is_constant(ellipse.z_index.as_ref())
            || (on_terrain && !self.material.borrow().is_constant())
    }

    /// A ring is closed when it sits on the surface or is extruded away
    /// from its base height.
    fn compute_is_closed(options: &EllipseGeometryOptions) -> bool {
        let height = options.height;
        let extruded_height = options.extruded_height;
        height == Some(0.0)
            || extruded_height.is_some_and(|extruded| Some(extruded) != height)
    }

    /// Samples every defining property at `time` into the shared options
    /// record. Both the one-shot static evaluation and the per-frame
    /// dynamic path run through here.
    pub(crate) fn set_options(&mut self, time: SceneTime) {
        let entity = self.entity.borrow();
        let Some(ellipse) = &entity.ellipse else {
            return;
        };

        let options = &mut self.options;
        options.vertex_format = if self.material.borrow().is_color_material() {
            VertexFormat::POSITION_AND_NORMAL
        } else {
            VertexFormat::TEXTURED
        };
        options.center = value_or_undefined(entity.position.as_ref(), time);
        options.semi_major_axis = value_or_undefined(ellipse.semi_major_axis.as_ref(), time);
        options.semi_minor_axis = value_or_undefined(ellipse.semi_minor_axis.as_ref(), time);
        options.rotation = value_or_undefined(ellipse.rotation.as_ref(), time);
        options.granularity = value_or_undefined(ellipse.granularity.as_ref(), time);
        options.st_rotation = value_or_undefined(ellipse.st_rotation.as_ref(), time);
        options.number_of_vertical_lines =
            value_or_undefined(ellipse.number_of_vertical_lines.as_ref(), time);

        let height_reference =
            value_or(ellipse.height_reference.as_ref(), time, HeightReference::None);
        let extruded_height_reference = value_or(
            ellipse.extruded_height_reference.as_ref(),
            time,
            HeightReference::None,
        );
        options.offset_attribute =
            compute_offset_mode(height_reference, extruded_height_reference);
        options.height = geometry_height(
            value_or_undefined(ellipse.height.as_ref(), time),
            height_reference,
        );

        let extruded_height = geometry_extruded_height(
            value_or_undefined(ellipse.extruded_height.as_ref(), time),
            extruded_height_reference,
        );
        options.extruded_height = match extruded_height {
            Some(ExtrudedHeight::Value(value)) => Some(value),
            Some(ExtrudedHeight::ClampToGround) => {
                Some(clamped_extruded_height(options))
            }
            None => None,
        };
    }

    /// Hidden check for the per-frame dynamic path, after options were
    /// refreshed at `time`.
    pub(crate) fn dynamic_is_hidden(&self, time: SceneTime) -> bool {
        if self.options.center.is_none()
            || self.options.semi_major_axis.is_none()
            || self.options.semi_minor_axis.is_none()
        {
            return true;
        }
        let entity = self.entity.borrow();
        if !entity.is_available(time) || !entity.show {
            return true;
        }
        let Some(ellipse) = &entity.ellipse else {
            return true;
        };
        !value_or(ellipse.show.as_ref(), time, true)
    }
}

/// Resolves a clamp-to-ground extrusion by sampling the minimum
/// approximate terrain height under the geometry's footprint.
fn clamped_extruded_height(options: &EllipseGeometryOptions) -> f64 {
    let Some(rectangle) = ellipse_geometry::compute_rectangle(options) else {
        return 0.0;
    };
    match terrain::approximate_heights(&rectangle) {
        Ok(heights) => heights.minimum_terrain_height,
        Err(error) => {
            warn!("clamp-to-ground extrusion fell back to zero: {error}");
            0.0
        }
    }
}

impl GeometryUpdater for EllipseGeometryUpdater {
    fn entity(&self) -> &SharedEntity {
        &self.entity
    }

    fn entity_id(&self) -> Uuid {
        self.entity.borrow().id()
    }

    fn compute_center(&self, time: SceneTime) -> Option<DVec3> {
        value_or_undefined(self.entity.borrow().position.as_ref(), time)
    }

    fn fill_enabled(&self) -> bool {
        self.fill_enabled
    }

    fn outline_enabled(&self) -> bool {
        self.outline_enabled
    }

    fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    fn on_terrain(&self) -> bool {
        self.on_terrain
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn fill_material(&self) -> SharedMaterial {
        Rc::clone(&self.material)
    }

    fn outline_width(&self) -> f64 {
        self.outline_width
    }

    fn z_index(&self) -> i64 {
        self.z_index
    }

    fn fill_attributes(&self, time: SceneTime) -> InstanceAttributeSet {
        let entity = self.entity.borrow();
        let ellipse = entity.ellipse.as_ref().expect("fill implies ellipse graphics");
        let available = entity.is_available(time);

        let mut attributes = InstanceAttributeSet {
            show: available
                && entity.show
                && value_or(ellipse.show.as_ref(), time, true)
                && value_or(ellipse.fill.as_ref(), time, true),
            color: None,
            distance_display_condition: value_or(
                ellipse.distance_display_condition.as_ref(),
                time,
                DistanceDisplayCondition::default(),
            ),
            offset: None,
        };

        let material = self.material.borrow();
        if material.is_color_material() {
            let color = material.sample_color(time, available).unwrap_or(Color::WHITE);
            attributes.set_color(color);
        }
        if self.options.offset_attribute.is_some() {
            attributes.offset =
                Some(value_or(self.terrain_offset.as_ref(), time, DVec3::ZERO).as_vec3());
        }
        attributes
    }

    fn outline_attributes(&self, time: SceneTime) -> InstanceAttributeSet {
        let entity = self.entity.borrow();
        let ellipse = entity
            .ellipse
            .as_ref()
            .expect("outline implies ellipse graphics");
        let available = entity.is_available(time);

        let outline_color = value_or(ellipse.outline_color.as_ref(), time, Color::BLACK);
        let mut attributes = InstanceAttributeSet {
            show: available
                && entity.show
                && value_or(ellipse.show.as_ref(), time, true)
                && value_or(ellipse.outline.as_ref(), time, false),
            color: None,
            distance_display_condition: value_or(
                ellipse.distance_display_condition.as_ref(),
                time,
                DistanceDisplayCondition::default(),
            ),
            offset: None,
        };
        attributes.set_color(outline_color);
        if self.options.offset_attribute.is_some() {
            attributes.offset =
                Some(value_or(self.terrain_offset.as_ref(), time, DVec3::ZERO).as_vec3());
        }
        attributes
    }

    fn create_fill_geometry_instance(&self, time: SceneTime) -> GeometryInstance {
        assert!(
            self.fill_enabled,
            "this updater does not represent a filled geometry"
        );
        GeometryInstance::new(
            self.entity_id(),
            ellipse_geometry::fill_geometry(&self.options),
            self.fill_attributes(time),
        )
    }

    fn create_outline_geometry_instance(&self, time: SceneTime) -> GeometryInstance {
        assert!(
            self.outline_enabled,
            "this updater does not represent an outlined geometry"
        );
        GeometryInstance::new(
            self.entity_id(),
            ellipse_geometry::outline_geometry(&self.options),
            self.outline_attributes(time),
        )
    }

    fn on_entity_changed(&mut self) {
        let entity = Rc::clone(&self.entity);
        let entity_ref = entity.borrow();
        let Some(ellipse) = &entity_ref.ellipse else {
            self.disable();
            return;
        };

        let (fill_enabled, mut outline_enabled) =
            sample_enabled(ellipse.fill.as_ref(), ellipse.outline.as_ref());
        if !fill_enabled && !outline_enabled {
            self.disable();
            return;
        }
        if Self::is_hidden(&entity_ref, ellipse) {
            self.disable();
            return;
        }

        self.material = ellipse
            .material
            .clone()
            .unwrap_or_else(|| Rc::clone(&self.default_material));
        self.outline_width = value_or(ellipse.outline_width.as_ref(), SceneTime::MINIMUM, 1.0);
        self.z_index = value_or(ellipse.z_index.as_ref(), SceneTime::MINIMUM, 0);

        let on_terrain = self.compute_on_terrain(ellipse, fill_enabled);
        if on_terrain && outline_enabled {
            // Ground primitives cannot carry outlines.
            outline_enabled = false;
        }
        self.fill_enabled = fill_enabled;
        self.outline_enabled = outline_enabled;
        self.on_terrain = on_terrain;
        self.dynamic = self.compute_is_dynamic(&entity_ref, ellipse, on_terrain);

        drop(entity_ref);
        if !self.dynamic {
            self.set_options(SceneTime::MINIMUM);
            self.closed = Self::compute_is_closed(&self.options);
        }
    }
}
