//! Vector type alias for planar offsets and distances.

use nalgebra::Vector2;

/// 2D vector type for cell offsets.
///
/// This is a simple alias for `nalgebra::Vector2<f32>`, used for the
/// Euclidean distances behind target selection, movement risk and
/// suppression falloff.
pub type Vec2 = Vector2<f32>;
