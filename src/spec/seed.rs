//! Seed locations and the grid they are expressed in.
//!
//! Example: `floodfill((0.6, 4.4), scale=16)`  =>  SeedLocation { x: 0.6, y: 4.4, scale: Some(16.0) }
//!
//! Coordinates are in grid-cell units: `x` runs along the columns, `y` along the rows.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedLocation {
    pub x: f64,
    pub y: f64,
    /// Per-seed override of the atlas scale.
    pub scale: Option<f64>,
}

impl SeedLocation {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, scale: None }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn effective_scale(&self, atlas_scale: f64) -> f64 {
        self.scale.unwrap_or(atlas_scale)
    }

    /// Grid cell holding this seed as (col, row). Only meaningful for seeds inside the grid.
    pub fn cell(&self) -> (u32, u32) {
        (self.x.floor() as u32, self.y.floor() as u32)
    }
}

/// Logical subdivision of the source image into `rows` x `cols` equal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub rows: u32,
    pub cols: u32,
}

impl Grid {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Half-open bounds: a seed on the right or bottom edge is outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.cols as f64 && y < self.rows as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_scale_prefers_override() {
        let plain = SeedLocation::new(3.0, 1.0);
        let hand = SeedLocation::new(0.6, 4.4).with_scale(16.0);
        assert_eq!(plain.effective_scale(8.0), 8.0);
        assert_eq!(hand.effective_scale(8.0), 16.0);
    }

    #[test]
    fn cell_floors_fractional_coordinates() {
        assert_eq!(SeedLocation::new(0.6, 4.4).cell(), (0, 4));
        assert_eq!(SeedLocation::new(7.0, 7.0).cell(), (7, 7));
    }

    #[test]
    fn grid_bounds_are_half_open() {
        let grid = Grid::new(8, 4);
        assert!(grid.contains(0.0, 0.0));
        assert!(grid.contains(3.99, 7.5));
        assert!(!grid.contains(4.0, 1.0));
        assert!(!grid.contains(1.0, 8.0));
        assert!(!grid.contains(-0.1, 1.0));
    }
}
