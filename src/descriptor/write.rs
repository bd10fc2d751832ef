use crate::Result;
use crate::diagnostics;
use crate::spec::{AtlasSpec, SeedLocation, SpriteSeeds};

use anyhow::bail;

/// Render the canonical text form of an atlas descriptor.
///
/// Layout: header directives, a blank line, then one sprite per line with
/// indexed sprites spread over one frame per line. Trailing commas everywhere.
pub fn to_source(atlas: &AtlasSpec) -> Result<String> {
    let mut out = String::new();

    out.push_str(&format!("image({})\n", quote(&atlas.image)?));
    out.push_str(&format!("grid({}, {})\n", atlas.grid.rows, atlas.grid.cols));
    out.push_str(&format!("scale({})\n", atlas.scale));
    out.push('\n');

    out.push_str("sprites(\n");
    for sprite in &atlas.sprites {
        match &sprite.seeds {
            SpriteSeeds::Single(seed) => {
                out.push_str(&format!("    {}={},\n", sprite.name, seed_call(seed)));
            }
            SpriteSeeds::Indexed(frames) => {
                out.push_str(&format!("    {}=[\n", sprite.name));
                for frame in frames {
                    out.push_str(&format!("        {},\n", seed_call(frame)));
                }
                out.push_str("    ],\n");
            }
        }
    }
    out.push_str(")\n");

    Ok(out)
}

fn seed_call(seed: &SeedLocation) -> String {
    match seed.scale {
        None => format!("floodfill(({}, {}))", seed.x, seed.y),
        Some(scale) => format!("floodfill(({}, {}), scale={})", seed.x, seed.y, scale),
    }
}

/// Strings have no escapes, so pick whichever quote the value does not contain.
fn quote(s: &str) -> Result<String> {
    if s.contains('\n') || (s.contains('\'') && s.contains('"')) {
        bail!(
            "{}",
            diagnostics::error_message(format!("cannot write string {:?} as a descriptor literal", s))
        );
    }
    if s.contains('\'') {
        Ok(format!("\"{}\"", s))
    } else {
        Ok(format!("'{}'", s))
    }
}
