//! Fire grid: intensity storage and the propagation/suppression model

pub mod fire_field;
pub mod intensity_grid;

pub use fire_field::{FireField, SpreadReport, SuppressionReport};
pub use intensity_grid::IntensityGrid;
