//! Scene-facing collaborator surface.
//!
//! The render loop owns the primitive collections; batches only add and
//! remove primitives through them. Everything here runs on the single
//! frame thread.

pub mod primitive;

use std::cell::RefCell;
use std::rc::Rc;

pub use primitive::{Appearance, InstanceAttributes, Primitive, SharedPrimitive};

/// How a height property is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeightReference {
    /// The value is absolute.
    #[default]
    None,
    /// The value is ignored; the surface height comes from terrain.
    ClampToGround,
    /// The value is relative to the terrain height.
    RelativeToGround,
}

/// An ordered collection of primitives owned by the render loop.
#[derive(Debug, Default)]
pub struct PrimitiveCollection {
    items: Vec<SharedPrimitive>,
}

impl PrimitiveCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, primitive: Primitive) -> SharedPrimitive {
        let shared = Rc::new(RefCell::new(primitive));
        self.items.push(Rc::clone(&shared));
        shared
    }

    /// Removes by handle identity. Returns whether the primitive was
    /// present.
    pub fn remove(&mut self, primitive: &SharedPrimitive) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !Rc::ptr_eq(item, primitive));
        self.items.len() != before
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SharedPrimitive> {
        self.items.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedPrimitive> {
        self.items.iter()
    }

    /// Number of primitives currently shown.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.borrow().show)
            .count()
    }
}

/// Shared handle to a primitive collection.
pub type SharedPrimitives = Rc<RefCell<PrimitiveCollection>>;

/// The slice of the scene the updaters and batches interact with.
#[derive(Debug, Clone)]
pub struct SceneContext {
    /// Regular scene primitives.
    pub primitives: SharedPrimitives,
    /// Terrain-classification primitives.
    pub ground_primitives: SharedPrimitives,
    ground_primitive_support: bool,
}

impl SceneContext {
    #[must_use]
    pub fn new(ground_primitive_support: bool) -> Self {
        Self {
            primitives: Rc::new(RefCell::new(PrimitiveCollection::new())),
            ground_primitives: Rc::new(RefCell::new(PrimitiveCollection::new())),
            ground_primitive_support,
        }
    }

    /// Whether terrain-clamped primitives can be rendered at all.
    #[must_use]
    pub fn is_ground_primitive_supported(&self) -> bool {
        self.ground_primitive_support
    }
}

impl Default for SceneContext {
    fn default() -> Self {
        Self::new(true)
    }
}
