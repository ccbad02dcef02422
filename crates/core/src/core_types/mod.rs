//! Core types and utilities

pub mod position;
pub mod vec2;

pub use position::{AgentId, GridPos, SimMillis};
pub use vec2::Vec2;
