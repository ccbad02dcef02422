//! Flat intensity storage
//!
//! Stores the 2D fire intensity field as a flat `Vec<f32>` in row-major order.
//! Coordinates are [`GridPos`] values; anything off the grid reads as zero and
//! ignores writes, so callers never have to bounds-check neighbor offsets.

use crate::core_types::GridPos;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Intensity field in row-major order (`y * width + x`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityGrid {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl IntensityGrid {
    /// Create a new grid with given dimensions, initialized to zero
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    /// Grid width in cells
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    pub fn height(&self) -> usize {
        self.height
    }

    /// Flat index of `pos`, or `None` when it lies off the grid
    #[inline]
    pub fn index(&self, pos: GridPos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    /// Whether `pos` lies on the grid
    #[inline]
    pub fn contains(&self, pos: GridPos) -> bool {
        self.index(pos).is_some()
    }

    /// Intensity at `pos`, zero when off the grid
    #[inline]
    pub fn intensity(&self, pos: GridPos) -> f32 {
        self.index(pos).map_or(0.0, |i| self.data[i])
    }

    /// Overwrite the value at `pos`; off-grid writes are ignored
    pub fn set(&mut self, pos: GridPos, value: f32) {
        if let Some(i) = self.index(pos) {
            self.data[i] = value;
        }
    }

    /// Get reference to the row-major data
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Get mutable reference to the row-major data
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Number of cells strictly above `threshold`
    pub fn count_above(&self, threshold: f32) -> usize {
        self.data.par_iter().filter(|&&v| v > threshold).count()
    }

    /// Cells strictly above `threshold`, in x-major scan order
    pub fn cells_above(&self, threshold: f32) -> Vec<GridPos> {
        let mut cells = Vec::new();
        for x in 0..self.width {
            for y in 0..self.height {
                if self.data[y * self.width + x] > threshold {
                    cells.push(GridPos::new(x as i32, y as i32));
                }
            }
        }
        cells
    }

    /// Largest value on the grid (zero for an empty grid)
    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }

    /// Copy out as nested rows, `rows[y][x]`
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        if self.width == 0 {
            return Vec::new();
        }
        self.data.chunks(self.width).map(<[f32]>::to_vec).collect()
    }
}
