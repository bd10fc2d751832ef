//! Atlas descriptor schema.
//!
//! Both front ends (the `.sprites.py` text form and JSON) produce a `RawAtlas`.
//!
//! JSON shape:
//! {
//!   "image": "atlas.xcf",
//!   "grid": [8, 8],                                        // rows, cols
//!   "scale": 8,
//!   "sprites": [
//!     { "name": "screen", "seed": [3, 1] },
//!     { "name": "hand", "seed": { "at": [0.6, 4.4], "scale": 16 } },
//!     { "name": "marbles", "frames": [[1, 3], [3, 3]] }     // indexed sprite
//!   ]
//! }
//!
//! We validate the grid and scales, check names and seeds, and keep sprites in
//! declaration order.

use crate::Result;
use crate::diagnostics;
use crate::spec::{Grid, SeedLocation};

use anyhow::bail;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sprite names must be identifiers so both descriptor forms can hold them.
const SPRITE_NAME_RE: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawAtlas {
    pub image: String,
    pub grid: RawGrid,
    pub scale: f64,

    #[serde(default)]
    pub sprites: Vec<RawSprite>,
}

/// Grid as written: `[rows, cols]`. Signed so that bad values reach validation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RawGrid(pub i64, pub i64);

/// Raw sprite row. Exactly one of `seed` / `frames` must be set.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawSprite {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<RawSeed>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<RawSeed>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawSeed {
    // Shape: [x, y]
    Point([f64; 2]),
    // Shape: { "at": [x, y], "scale": 16 }
    Explicit(RawExplicitSeed),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawExplicitSeed {
    pub at: [f64; 2],

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl RawSeed {
    fn location(&self) -> SeedLocation {
        match *self {
            RawSeed::Point([x, y])
            | RawSeed::Explicit(RawExplicitSeed {
                at: [x, y],
                scale: None,
            }) => SeedLocation::new(x, y),
            RawSeed::Explicit(RawExplicitSeed {
                at: [x, y],
                scale: Some(scale),
            }) => SeedLocation::new(x, y).with_scale(scale),
        }
    }
}

impl From<SeedLocation> for RawSeed {
    fn from(seed: SeedLocation) -> Self {
        match seed.scale {
            None => RawSeed::Point([seed.x, seed.y]),
            Some(scale) => RawSeed::Explicit(RawExplicitSeed {
                at: [seed.x, seed.y],
                scale: Some(scale),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpriteSeeds {
    Single(SeedLocation),
    /// Ordered frames of a multi-frame sprite. Never empty.
    Indexed(Vec<SeedLocation>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSpec {
    pub name: String,
    pub seeds: SpriteSeeds,
}

impl SpriteSpec {
    /// All seeds of the sprite; a single seed is a one-frame slice.
    pub fn frames(&self) -> &[SeedLocation] {
        match &self.seeds {
            SpriteSeeds::Single(seed) => std::slice::from_ref(seed),
            SpriteSeeds::Indexed(frames) => frames,
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.seeds, SpriteSeeds::Indexed(_))
    }
}

/// Validated atlas descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasSpec {
    pub image: String,
    pub grid: Grid,
    pub scale: f64,
    /// Declaration order.
    pub sprites: Vec<SpriteSpec>,
}

impl AtlasSpec {
    pub fn sprite(&self, name: &str) -> Option<&SpriteSpec> {
        self.sprites.iter().find(|s| s.name == name)
    }

    pub fn seed_count(&self) -> usize {
        self.sprites.iter().map(|s| s.frames().len()).sum()
    }
}

impl RawAtlas {
    /// Check every schema rule and build the validated atlas.
    ///
    /// Phases:
    /// 1) Atlas header (image, grid, scale).
    /// 2) Sprite table (names, seed shape).
    /// 3) Seeds (finite, inside the grid, positive scale overrides).
    pub fn validate_and_build(&self) -> Result<AtlasSpec> {
        // Phase 1: header.
        let image = self.image.trim();
        if image.is_empty() {
            bail!(
                "{}",
                diagnostics::error_message("descriptor has an empty image name")
            );
        }

        let RawGrid(rows, cols) = self.grid;
        let grid = Grid::new(grid_dimension("rows", rows)?, grid_dimension("cols", cols)?);

        if !is_positive(self.scale) {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "atlas scale must be a positive number (got {})",
                    self.scale
                ))
            );
        }

        if self.sprites.is_empty() {
            bail!(
                "{}",
                diagnostics::error_message("descriptor defines no sprites")
            );
        }

        // Phase 2 + 3: sprites and their seeds.
        let ident = Regex::new(SPRITE_NAME_RE)?;
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut sprites = Vec::with_capacity(self.sprites.len());

        for raw in &self.sprites {
            let name = raw.name.as_str();
            if !ident.is_match(name) {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "sprite name {:?} is not an identifier",
                        name
                    ))
                );
            }
            if !seen.insert(name) {
                bail!(
                    "{}",
                    diagnostics::error_message(format!("duplicate sprite name '{}'", name))
                );
            }

            let seeds = match (&raw.seed, &raw.frames) {
                (Some(seed), None) => {
                    let seed = seed.location();
                    check_seed(&seed, &grid, &format!("sprite '{}' seed", name))?;
                    SpriteSeeds::Single(seed)
                }
                (None, Some(frames)) => {
                    if frames.is_empty() {
                        bail!(
                            "{}",
                            diagnostics::error_message(format!(
                                "sprite '{}' has an empty frame list",
                                name
                            ))
                        );
                    }
                    let mut out = Vec::with_capacity(frames.len());
                    for (idx, frame) in frames.iter().enumerate() {
                        let seed = frame.location();
                        check_seed(&seed, &grid, &format!("sprite '{}' frame {}", name, idx))?;
                        out.push(seed);
                    }
                    SpriteSeeds::Indexed(out)
                }
                (Some(_), Some(_)) => {
                    bail!(
                        "{}",
                        diagnostics::error_message(format!(
                            "sprite '{}' sets both seed and frames",
                            name
                        ))
                    );
                }
                (None, None) => {
                    bail!(
                        "{}",
                        diagnostics::error_message(format!(
                            "sprite '{}' has neither seed nor frames",
                            name
                        ))
                    );
                }
            };

            log::debug!("sprite '{}': {} seed(s)", name, seeds_len(&seeds));
            sprites.push(SpriteSpec {
                name: name.to_string(),
                seeds,
            });
        }

        Ok(AtlasSpec {
            image: image.to_string(),
            grid,
            scale: self.scale,
            sprites,
        })
    }
}

impl From<&AtlasSpec> for RawAtlas {
    fn from(atlas: &AtlasSpec) -> Self {
        let sprites = atlas
            .sprites
            .iter()
            .map(|s| match &s.seeds {
                SpriteSeeds::Single(seed) => RawSprite {
                    name: s.name.clone(),
                    seed: Some((*seed).into()),
                    frames: None,
                },
                SpriteSeeds::Indexed(frames) => RawSprite {
                    name: s.name.clone(),
                    seed: None,
                    frames: Some(frames.iter().map(|f| (*f).into()).collect()),
                },
            })
            .collect();

        RawAtlas {
            image: atlas.image.clone(),
            grid: RawGrid(i64::from(atlas.grid.rows), i64::from(atlas.grid.cols)),
            scale: atlas.scale,
            sprites,
        }
    }
}

fn seeds_len(seeds: &SpriteSeeds) -> usize {
    match seeds {
        SpriteSeeds::Single(_) => 1,
        SpriteSeeds::Indexed(frames) => frames.len(),
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn grid_dimension(axis: &str, value: i64) -> Result<u32> {
    if value <= 0 {
        bail!(
            "{}",
            diagnostics::error_message(format!("grid {} must be positive (got {})", axis, value))
        );
    }
    match u32::try_from(value) {
        Ok(v) => Ok(v),
        Err(_) => bail!(
            "{}",
            diagnostics::error_message(format!("grid {} is too large: {}", axis, value))
        ),
    }
}

fn check_seed(seed: &SeedLocation, grid: &Grid, what: &str) -> Result<()> {
    if !seed.x.is_finite() || !seed.y.is_finite() {
        bail!(
            "{}",
            diagnostics::error_message(format!(
                "{} has a non-finite coordinate ({}, {})",
                what, seed.x, seed.y
            ))
        );
    }
    if !grid.contains(seed.x, seed.y) {
        bail!(
            "{}",
            diagnostics::error_message(format!(
                "{} at ({}, {}) lies outside the grid ({} rows, {} cols)",
                what, seed.x, seed.y, grid.rows, grid.cols
            ))
        );
    }
    if let Some(scale) = seed.scale {
        if !is_positive(scale) {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "{} has a non-positive scale override ({})",
                    what, scale
                ))
            );
        }
    }
    Ok(())
}
