//! Manifest model: the normalized, serializable view of a validated atlas.

use crate::Result;
use crate::diagnostics;
use crate::spec::{AtlasSpec, Grid};

use anyhow::bail;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct SeedView {
    /// Frame index within the sprite (0 for single-seed sprites).
    pub index: usize,
    pub x: f64,
    pub y: f64,
    /// Effective scale: the override if present, else the atlas scale.
    pub scale: f64,
    pub scale_overridden: bool,
    /// Grid cell as [col, row].
    pub cell: [u32; 2],
    /// Position normalized to the grid: [x / cols, y / rows].
    pub uv: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct SpriteView {
    pub name: String,
    pub indexed: bool,
    pub frames: Vec<SeedView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub sprites: usize,
    pub indexed_sprites: usize,
    pub seeds: usize,
    pub overridden_scales: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    /// Where the descriptor was read from.
    pub source: String,
    pub image: String,
    pub grid: Grid,
    pub scale: f64,
    /// Declaration order.
    pub sprites: Vec<SpriteView>,
    pub totals: TotalsView,
    /// Non-fatal findings (seeds sharing a grid cell).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Build the manifest. Warns (does not fail) when a seed lands in a grid cell
/// already seeded by an earlier one.
pub fn build_manifest(source: &str, atlas: &AtlasSpec) -> Manifest {
    let cols = f64::from(atlas.grid.cols);
    let rows = f64::from(atlas.grid.rows);

    let mut owner: BTreeMap<(u32, u32), String> = BTreeMap::new();
    let mut sprites = Vec::with_capacity(atlas.sprites.len());
    let mut overridden_scales = 0usize;
    let mut warnings = Vec::new();

    for sprite in &atlas.sprites {
        let mut frames = Vec::with_capacity(sprite.frames().len());

        for (index, seed) in sprite.frames().iter().enumerate() {
            let label = if sprite.is_indexed() {
                format!("{}[{}]", sprite.name, index)
            } else {
                sprite.name.clone()
            };

            let cell = seed.cell();
            if let Some(prev) = owner.get(&cell) {
                let msg = format!(
                    "{}: seed {} shares grid cell ({}, {}) with {}",
                    source, label, cell.0, cell.1, prev
                );
                diagnostics::warn(&msg);
                warnings.push(msg);
            } else {
                owner.insert(cell, label);
            }

            if seed.scale.is_some() {
                overridden_scales += 1;
            }

            frames.push(SeedView {
                index,
                x: seed.x,
                y: seed.y,
                scale: seed.effective_scale(atlas.scale),
                scale_overridden: seed.scale.is_some(),
                cell: [cell.0, cell.1],
                uv: [seed.x / cols, seed.y / rows],
            });
        }

        sprites.push(SpriteView {
            name: sprite.name.clone(),
            indexed: sprite.is_indexed(),
            frames,
        });
    }

    Manifest {
        source: source.to_string(),
        image: atlas.image.clone(),
        grid: atlas.grid,
        scale: atlas.scale,
        totals: TotalsView {
            sprites: atlas.sprites.len(),
            indexed_sprites: atlas.sprites.iter().filter(|s| s.is_indexed()).count(),
            seeds: atlas.seed_count(),
            overridden_scales,
        },
        sprites,
        warnings,
    }
}

/// Manifest restricted to one sprite; totals and warnings cover only that sprite.
pub fn build_sprite_manifest(source: &str, atlas: &AtlasSpec, name: &str) -> Result<Manifest> {
    let Some(sprite) = atlas.sprite(name) else {
        bail!(
            "{}",
            diagnostics::error_message(format!("{} has no sprite named '{}'", source, name))
        );
    };

    let single = AtlasSpec {
        sprites: vec![sprite.clone()],
        ..atlas.clone()
    };
    Ok(build_manifest(source, &single))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::from_source;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ATLAS: &str = include_str!("../../descriptors/atlas.sprites.py");

    #[test]
    fn totals_for_first_atlas() {
        let atlas = from_source(ATLAS, "atlas.sprites.py").unwrap();
        let manifest = build_manifest("atlas.sprites.py", &atlas);

        assert_eq!(manifest.totals.sprites, 4);
        assert_eq!(manifest.totals.indexed_sprites, 1);
        assert_eq!(manifest.totals.seeds, 11);
        assert_eq!(manifest.totals.overridden_scales, 1);
    }

    #[test]
    fn seed_views_resolve_scale_cell_and_uv() {
        let atlas = from_source(ATLAS, "atlas.sprites.py").unwrap();
        let manifest = build_manifest("atlas.sprites.py", &atlas);

        let hand = &manifest.sprites[2];
        assert_eq!(hand.name, "hand");
        assert!(!hand.indexed);
        let seed = &hand.frames[0];
        assert_eq!(seed.scale, 16.0);
        assert!(seed.scale_overridden);
        assert_eq!(seed.cell, [0, 4]);
        assert_eq!(seed.uv, [0.6 / 8.0, 4.4 / 8.0]);

        let marbles = &manifest.sprites[3];
        assert!(marbles.indexed);
        let indices: Vec<usize> = marbles.frames.iter().map(|f| f.index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
        assert_eq!(marbles.frames[4].cell, [5, 5]);
        assert_eq!(marbles.frames[4].scale, 8.0);
        assert!(!marbles.frames[4].scale_overridden);
    }

    #[test]
    fn serializes_grid_and_frames() {
        let atlas = from_source(
            r#"{ "image": "a.xcf", "grid": [2, 4], "scale": 10,
                 "sprites": [ { "name": "gear", "seed": [2, 1] } ] }"#,
            "a.json",
        )
        .unwrap();
        let value = serde_json::to_value(build_manifest("a.json", &atlas)).unwrap();

        assert_eq!(
            value,
            json!({
                "source": "a.json",
                "image": "a.xcf",
                "grid": { "rows": 2, "cols": 4 },
                "scale": 10.0,
                "sprites": [{
                    "name": "gear",
                    "indexed": false,
                    "frames": [{
                        "index": 0,
                        "x": 2.0,
                        "y": 1.0,
                        "scale": 10.0,
                        "scale_overridden": false,
                        "cell": [2, 1],
                        "uv": [0.5, 0.5]
                    }]
                }],
                "totals": {
                    "sprites": 1,
                    "indexed_sprites": 0,
                    "seeds": 1,
                    "overridden_scales": 0
                }
            })
        );
    }

    #[test]
    fn shared_cells_warn_without_failing() {
        let atlas = from_source(
            "image('a.xcf') grid(4, 4) scale(1) sprites(a=floodfill((1.2, 1.2)), b=[floodfill((3, 0)), floodfill((1.8, 1.8))])",
            "d",
        )
        .unwrap();
        let manifest = build_manifest("d", &atlas);
        assert_eq!(manifest.sprites[0].frames[0].cell, manifest.sprites[1].frames[1].cell);
        assert_eq!(
            manifest.warnings,
            vec!["d: seed b[1] shares grid cell (1, 1) with a".to_string()]
        );
    }

    #[test]
    fn distinct_cells_have_no_warnings() {
        let atlas = from_source(ATLAS, "atlas.sprites.py").unwrap();
        assert!(build_manifest("atlas.sprites.py", &atlas).warnings.is_empty());
    }

    #[test]
    fn sprite_manifest_totals_match_the_sprite() {
        let atlas = from_source(ATLAS, "atlas.sprites.py").unwrap();

        let marbles = build_sprite_manifest("atlas.sprites.py", &atlas, "marbles").unwrap();
        let names: Vec<&str> = marbles.sprites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["marbles"]);
        assert_eq!(marbles.totals.sprites, 1);
        assert_eq!(marbles.totals.indexed_sprites, 1);
        assert_eq!(marbles.totals.seeds, 8);
        assert_eq!(marbles.totals.overridden_scales, 0);

        let hand = build_sprite_manifest("atlas.sprites.py", &atlas, "hand").unwrap();
        assert_eq!(hand.totals.seeds, 1);
        assert_eq!(hand.totals.overridden_scales, 1);
        assert_eq!(hand.image, "atlas.xcf");
    }

    #[test]
    fn sprite_manifest_rejects_unknown_name() {
        let atlas = from_source(ATLAS, "atlas.sprites.py").unwrap();
        let err = build_sprite_manifest("atlas.sprites.py", &atlas, "gear").unwrap_err();
        assert_eq!(
            err.to_string(),
            "error: atlas.sprites.py has no sprite named 'gear'"
        );
    }
}
