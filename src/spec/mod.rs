//! Spec layer: descriptor schema + validated in-memory structures.
//!
//! This module is intentionally separate from descriptor parsing and rendering.
//! It owns:
//! - Seed and grid types (cell-unit coordinates)
//! - Atlas schema (raw serde shapes and their validation)

pub mod atlas;
pub mod seed;

pub use atlas::{
    AtlasSpec, RawAtlas, RawExplicitSeed, RawGrid, RawSeed, RawSprite, SpriteSeeds, SpriteSpec,
};
pub use seed::{Grid, SeedLocation};
