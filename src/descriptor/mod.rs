//! Descriptor front ends: the `.sprites.py` text form and JSON.

pub mod lexer;
pub mod parse;
pub mod write;

pub use parse::parse_descriptor;
pub use write::to_source;

use crate::Result;
use crate::diagnostics;
use crate::spec::{AtlasSpec, RawAtlas};

use anyhow::Context;
use std::fs;
use std::path::Path;

/// Whether `path` names a JSON descriptor (by extension).
pub fn is_json(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Parse and validate descriptor source. `origin` selects the front end and locates errors.
pub fn from_source(text: &str, origin: &str) -> Result<AtlasSpec> {
    let raw: RawAtlas = if is_json(origin) {
        serde_json::from_str(text).with_context(|| {
            diagnostics::error_message(format!("parse JSON descriptor {}", origin))
        })?
    } else {
        parse_descriptor(text, origin)?
    };

    raw.validate_and_build()
        .with_context(|| diagnostics::error_message(format!("invalid descriptor {}", origin)))
}

/// Read, parse and validate a descriptor file.
pub fn load_descriptor(path: &str) -> Result<AtlasSpec> {
    let text = fs::read_to_string(path)
        .with_context(|| diagnostics::error_message(format!("read descriptor file {}", path)))?;
    let atlas = from_source(&text, path)?;
    log::info!(
        "loaded descriptor {}: {} sprite(s), {} seed(s)",
        path,
        atlas.sprites.len(),
        atlas.seed_count()
    );
    Ok(atlas)
}
