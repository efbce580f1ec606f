//! Gaia engine core: technique compilation and dynamic geometry batching
//! for a 3D geospatial visualization engine.
//!
//! Two subsystems live here:
//!
//! - The **technique compiler** ([`technique`]) turns declarative glTF
//!   material descriptions into GLSL shader pairs plus attribute/uniform
//!   binding tables, appended to the document as a technique extension.
//! - The **geometry updater and batching** subsystem ([`updaters`],
//!   [`batches`]) translates time-varying entity properties into geometry
//!   instances and groups them into as few primitives as possible,
//!   rebuilding without ever leaving a visible gap.
//!
//! Everything runs on a single logical frame thread; "asynchronous"
//! primitive construction is staged state advanced by per-frame `update`
//! calls, never a background thread.

pub mod batches;
pub mod core;
pub mod document;
pub mod entity;
pub mod errors;
pub mod geometry;
pub mod properties;
pub mod scene;
pub mod technique;
pub mod updaters;

pub use batches::{Batch, DynamicBatch, GroundColorBatch, PerMaterialBatch, StaticColorBatch};
pub use crate::core::color::Color;
pub use crate::core::time::SceneTime;
pub use document::Document;
pub use entity::{EllipseGraphics, Entity};
pub use errors::{GaiaError, Result};
pub use properties::Property;
pub use scene::SceneContext;
pub use technique::{CompileOptions, PrimitiveInfo, process_materials};
pub use updaters::GeometryUpdater;
pub use updaters::ellipse::EllipseGeometryUpdater;
