//! Geometry Updater Tests
//!
//! Tests for:
//! - Enable flags, hidden predicate, terrain routing, dynamic detection
//! - Static option sampling and clamp-to-ground resolution
//! - Fill/outline instance attributes (show, color, offset, display
//!   condition) and their documented fallbacks
//! - The closed-shape predicate

use std::rc::Rc;

use glam::DVec3;

use gaia::core::color::Color;
use gaia::core::terrain::{self, HeightRange, Rectangle, TerrainHeightTable};
use gaia::core::time::{SceneTime, TimeInterval, TimeIntervalCollection};
use gaia::entity::{self, EllipseGraphics, Entity, SharedEntity};
use gaia::geometry::{DistanceDisplayCondition, OffsetMode};
use gaia::properties::material::MaterialProperty;
use gaia::properties::Property;
use gaia::scene::{HeightReference, SceneContext};
use gaia::updaters::GeometryUpdater;
use gaia::updaters::ellipse::EllipseGeometryUpdater;

fn init_terrain() {
    // First initialization wins; every test installs the same table so
    // ordering does not matter.
    terrain::initialize(TerrainHeightTable::new(vec![(
        Rectangle::new(-10.0, -10.0, 10.0, 10.0),
        HeightRange {
            minimum_terrain_height: -30.0,
            maximum_terrain_height: 120.0,
        },
    )]));
}

fn basic_entity() -> SharedEntity {
    let mut entity = Entity::new();
    entity.position = Some(Property::constant(DVec3::new(1234.0, 5678.0, 9_101_112.0)));
    entity.ellipse = Some(EllipseGraphics {
        semi_major_axis: Some(Property::constant(2.0)),
        semi_minor_axis: Some(Property::constant(1.0)),
        ..Default::default()
    });
    entity::shared(entity)
}

fn with_ellipse(entity: &SharedEntity, edit: impl FnOnce(&mut EllipseGraphics)) {
    edit(entity.borrow_mut().ellipse.as_mut().unwrap());
}

const TIME: SceneTime = SceneTime::from_seconds(0.0);

// ============================================================================
// Enablement and hidden predicate
// ============================================================================

#[test]
fn fill_defaults_on_outline_defaults_off() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert!(updater.fill_enabled());
    assert!(!updater.outline_enabled());
    assert!(!updater.is_dynamic());
}

#[test]
fn missing_defining_properties_disable_everything() {
    let entity = basic_entity();
    entity.borrow_mut().position = None;
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert!(!updater.fill_enabled());
    assert!(!updater.outline_enabled());

    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.semi_minor_axis = None;
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert!(!updater.fill_enabled());
}

#[test]
fn constant_false_show_hides_the_shape() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.show = Some(Property::constant(false));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert!(!updater.fill_enabled());
    assert!(!updater.outline_enabled());
}

#[test]
#[should_panic(expected = "filled geometry")]
fn fill_instance_panics_when_fill_disabled() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.fill = Some(Property::constant(false));
        ellipse.outline = Some(Property::constant(true));
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert!(updater.outline_enabled());
    let _ = updater.create_fill_geometry_instance(TIME);
}

#[test]
#[should_panic(expected = "outlined geometry")]
fn outline_instance_panics_when_outline_disabled() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    let _ = updater.create_outline_geometry_instance(TIME);
}

// ============================================================================
// Terrain routing and dynamic detection
// ============================================================================

#[test]
fn clamped_fill_routes_to_ground_when_supported() {
    let entity = basic_entity();
    let updater = EllipseGeometryUpdater::new(Rc::clone(&entity), SceneContext::new(true));
    assert!(updater.on_terrain());

    // An explicit height keeps the shape off the terrain.
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(10.0));
    });
    let updater = EllipseGeometryUpdater::new(Rc::clone(&entity), SceneContext::new(true));
    assert!(!updater.on_terrain());
}

#[test]
fn unsupported_scene_never_uses_ground_primitives() {
    let updater = EllipseGeometryUpdater::new(basic_entity(), SceneContext::new(false));
    assert!(!updater.on_terrain());
}

#[test]
fn terrain_fill_disables_outline() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.outline = Some(Property::constant(true));
    });
    let updater = EllipseGeometryUpdater::new(Rc::clone(&entity), SceneContext::new(true));
    assert!(updater.on_terrain());
    assert!(!updater.outline_enabled());

    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert!(!updater.on_terrain());
    assert!(updater.outline_enabled());
}

#[test]
fn varying_defining_property_makes_the_shape_dynamic() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.semi_major_axis = Some(Property::callback(|_| Some(4.0), false));
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert!(updater.is_dynamic());
}

#[test]
fn varying_material_is_dynamic_only_on_terrain() {
    let varying_color = Property::callback(|_| Some(Color::RED), false);

    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.material = Some(Rc::new(std::cell::RefCell::new(
            MaterialProperty::color_property(varying_color.clone()),
        )));
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(true));
    assert!(!updater.on_terrain());
    assert!(!updater.is_dynamic());

    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.material = Some(Rc::new(std::cell::RefCell::new(
            MaterialProperty::color_property(varying_color),
        )));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(true));
    assert!(updater.on_terrain());
    assert!(updater.is_dynamic());
}

// ============================================================================
// Static options
// ============================================================================

#[test]
fn static_options_sample_defining_properties() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.rotation = Some(Property::constant(0.5));
        ellipse.height = Some(Property::constant(3.0));
        ellipse.extruded_height = Some(Property::constant(23.0));
        ellipse.granularity = Some(Property::constant(0.1));
        ellipse.number_of_vertical_lines = Some(Property::constant(8));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    let options = updater.options();
    assert_eq!(options.semi_major_axis, Some(2.0));
    assert_eq!(options.semi_minor_axis, Some(1.0));
    assert_eq!(options.rotation, Some(0.5));
    assert_eq!(options.height, Some(3.0));
    assert_eq!(options.extruded_height, Some(23.0));
    assert_eq!(options.granularity, Some(0.1));
    assert_eq!(options.number_of_vertical_lines, Some(8));
    assert_eq!(options.offset_attribute, None);
    assert!(updater.is_closed());
}

#[test]
fn clamp_to_ground_extrusion_uses_minimum_terrain_height() {
    init_terrain();
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(5.0));
        ellipse.extruded_height = Some(Property::constant(0.0));
        ellipse.extruded_height_reference =
            Some(Property::constant(HeightReference::ClampToGround));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert_eq!(updater.options().extruded_height, Some(-30.0));
}

#[test]
fn height_references_select_offset_mode() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(5.0));
        ellipse.height_reference = Some(Property::constant(HeightReference::RelativeToGround));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert_eq!(updater.options().offset_attribute, Some(OffsetMode::Top));

    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(5.0));
        ellipse.height_reference = Some(Property::constant(HeightReference::RelativeToGround));
        ellipse.extruded_height = Some(Property::constant(10.0));
        ellipse.extruded_height_reference =
            Some(Property::constant(HeightReference::RelativeToGround));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert_eq!(updater.options().offset_attribute, Some(OffsetMode::All));
}

#[test]
fn flat_surface_ring_is_closed() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert!(updater.is_closed());

    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(10.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert!(!updater.is_closed());
}

// ============================================================================
// Instance attributes
// ============================================================================

#[test]
fn fill_instance_carries_color_for_color_materials_only() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.material = Some(Rc::new(std::cell::RefCell::new(MaterialProperty::color(
            Color::RED,
        ))));
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    let instance = updater.create_fill_geometry_instance(TIME);
    assert!(instance.attributes.show);
    assert_eq!(instance.attributes.color, Some([255, 0, 0, 255]));
    assert!(instance.geometry.is_some());

    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.material = Some(Rc::new(std::cell::RefCell::new(MaterialProperty::grid())));
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    let instance = updater.create_fill_geometry_instance(TIME);
    assert_eq!(instance.attributes.color, None);
}

#[test]
fn absent_fill_color_defaults_to_white() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    let instance = updater.create_fill_geometry_instance(TIME);
    assert_eq!(instance.attributes.color, Some([255, 255, 255, 255]));
}

#[test]
fn outline_color_defaults_to_black() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.outline = Some(Property::constant(true));
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    let instance = updater.create_outline_geometry_instance(TIME);
    assert_eq!(instance.attributes.color, Some([0, 0, 0, 255]));

    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.outline = Some(Property::constant(true));
        ellipse.outline_color = Some(Property::constant(Color::BLUE));
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    let instance = updater.create_outline_geometry_instance(TIME);
    assert_eq!(instance.attributes.color, Some([0, 0, 255, 255]));
}

#[test]
fn show_attribute_requires_availability_and_show_properties() {
    let entity = basic_entity();
    entity.borrow_mut().availability = Some(TimeIntervalCollection::new(vec![
        TimeInterval::new(SceneTime::from_seconds(0.0), SceneTime::from_seconds(10.0)),
    ]));
    with_ellipse(&entity, |ellipse| {
        ellipse.show = Some(Property::callback(|_| Some(true), false));
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(Rc::clone(&entity), SceneContext::new(false));

    let inside = updater.create_fill_geometry_instance(SceneTime::from_seconds(5.0));
    assert!(inside.attributes.show);
    let outside = updater.create_fill_geometry_instance(SceneTime::from_seconds(20.0));
    assert!(!outside.attributes.show);

    entity.borrow_mut().show = false;
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert!(!updater.fill_enabled());
}

#[test]
fn display_condition_sampled_out_of_range_falls_back_to_default() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.distance_display_condition = Some(Property::intervals(vec![(
            TimeInterval::new(SceneTime::from_seconds(0.0), SceneTime::from_seconds(10.0)),
            DistanceDisplayCondition::new(1.0, 2.0),
        )]));
        ellipse.height = Some(Property::constant(0.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));

    let inside = updater.fill_attributes(SceneTime::from_seconds(5.0));
    assert_eq!(inside.distance_display_condition, DistanceDisplayCondition::new(1.0, 2.0));

    let outside = updater.fill_attributes(SceneTime::from_seconds(20.0));
    assert_eq!(
        outside.distance_display_condition,
        DistanceDisplayCondition::default()
    );
    assert!(outside.distance_display_condition.far.is_infinite());
}

#[test]
fn offset_attribute_present_only_for_ground_offset_builds() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(5.0));
        ellipse.height_reference = Some(Property::constant(HeightReference::RelativeToGround));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    let instance = updater.create_fill_geometry_instance(TIME);
    assert!(instance.attributes.offset.is_some());

    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.height = Some(Property::constant(5.0));
    });
    let updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    let instance = updater.create_fill_geometry_instance(TIME);
    assert!(instance.attributes.offset.is_none());
}

#[test]
fn outline_width_and_terrain_offset_are_sampled() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.outline = Some(Property::constant(true));
        ellipse.outline_width = Some(Property::constant(3.0));
        ellipse.height = Some(Property::constant(5.0));
        ellipse.height_reference = Some(Property::constant(HeightReference::RelativeToGround));
    });
    let mut updater = EllipseGeometryUpdater::new(entity, SceneContext::new(false));
    assert_eq!(updater.outline_width(), 3.0);

    updater.set_terrain_offset(Some(Property::constant(DVec3::new(0.0, 0.0, 40.0))));
    let instance = updater.create_fill_geometry_instance(TIME);
    assert_eq!(instance.attributes.offset, Some(glam::Vec3::new(0.0, 0.0, 40.0)));
}

#[test]
fn entity_change_reevaluates_material_and_flags() {
    let entity = basic_entity();
    with_ellipse(&entity, |ellipse| {
        ellipse.material = Some(Rc::new(std::cell::RefCell::new(MaterialProperty::color(
            Color::RED,
        ))));
        ellipse.height = Some(Property::constant(0.0));
    });
    let mut updater = EllipseGeometryUpdater::new(Rc::clone(&entity), SceneContext::new(false));
    assert_eq!(
        updater.create_fill_geometry_instance(TIME).attributes.color,
        Some([255, 0, 0, 255])
    );

    with_ellipse(&entity, |ellipse| {
        ellipse.material = Some(Rc::new(std::cell::RefCell::new(MaterialProperty::color(
            Color::GREEN,
        ))));
    });
    updater.on_entity_changed();
    assert_eq!(
        updater.create_fill_geometry_instance(TIME).attributes.color,
        Some([0, 128, 0, 255])
    );
}
