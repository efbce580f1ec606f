//! Geometry batches.
//!
//! Batches group many geometry updaters sharing rendering state into as
//! few primitives as possible, rebuilding a primitive only when its
//! member set or shared material changes and guaranteeing uninterrupted
//! visibility across rebuilds.
//!
//! Grouping keys differ deliberately between variants and must stay that
//! way: the color and ground batches key on the *resolved* per-instance
//! color plus z-index, while the per-material batch keys on the material
//! property itself (handle identity or definition equality) — never on
//! sampled content.

pub mod color;
pub mod dynamic;
pub mod ground;
pub mod material;

mod group;

use crate::core::time::SceneTime;
use crate::updaters::SharedUpdater;

pub use color::StaticColorBatch;
pub use dynamic::DynamicBatch;
pub use ground::{GroundColorBatch, GroundKey};
pub use material::PerMaterialBatch;

/// Contract shared by the static batches.
pub trait Batch {
    /// Adds an updater, building its instance at `time`.
    fn add(&mut self, time: SceneTime, updater: &SharedUpdater);
    /// Removes an updater. Returns whether it was a member.
    fn remove(&mut self, updater: &SharedUpdater) -> bool;
    /// Advances all groups one frame. Returns whether every group has
    /// reached a built, non-dirty state. Safe to call every frame; a call
    /// with no pending work is a cheap no-op.
    fn update(&mut self, time: SceneTime) -> bool;
    /// Removes every primitive owned by the batch.
    fn remove_all_primitives(&mut self);
}
