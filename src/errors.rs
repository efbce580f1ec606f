//! Error Types
//!
//! The main error type [`GaiaError`] covers the fallible surfaces of the
//! core: the terrain-heights service and document/technique index lookups.
//!
//! Precondition violations on developer-facing APIs (for example requesting
//! a fill instance from an updater whose fill is disabled) are programming
//! errors and panic instead; degenerate geometry input is reported by
//! returning `None` from the geometry builders.

use thiserror::Error;

/// The main error type for the Gaia engine core.
#[derive(Error, Debug)]
pub enum GaiaError {
    /// The approximate terrain heights table was queried before
    /// [`crate::core::terrain::initialize`] ran.
    #[error("approximate terrain heights have not been initialized")]
    TerrainHeightsUninitialized,

    /// A material index does not exist in the document.
    #[error("material index out of bounds: {index} (document has {count} materials)")]
    MaterialIndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Number of materials in the document
        count: usize,
    },

    /// A technique index does not exist in the technique container.
    #[error("technique index out of bounds: {0}")]
    TechniqueIndexOutOfBounds(usize),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GaiaError>;
