//! Emergency Response Simulation Core Library
//!
//! A grid fire spreads probabilistically while autonomous robots coordinated
//! by a central dispatcher find it, report it and put it out, and civilians
//! caught in it are rescued or lost depending on how hot their cell gets.
//!
//! ## Components
//!
//! - Fire field with double-buffered spread and snapshot-then-swap reads
//! - Dispatcher aggregating scout reports, ageing them out and assigning
//!   the nearest unclaimed fire to idle firefighters
//! - Scout and firefighter state machines with energy and suppressant limits
//! - Survivors whose fate follows the intensity of their cell
//! - Two independent real-time schedules, or deterministic manual stepping

// Core types and configuration
pub mod config;
pub mod core_types;
pub mod error;
pub(crate) mod sync;

// Fire model
pub mod grid;

// Coordination and agents
pub mod agents;
pub mod clock;
pub mod dispatcher;
pub mod survivor;

// Outputs and lifecycle
pub mod simulation;
pub mod snapshot;
pub mod statistics;

// Re-export core types
pub use config::{
    AgentPoolConfig, FireDynamics, FireScenario, FirefighterConfig, ScoutConfig,
    SimulationConfig, SurvivorConfig, TimerConfig,
};
pub use core_types::{AgentId, GridPos, SimMillis, Vec2};
pub use error::ConfigError;

// Re-export simulation types
pub use agents::{Agent, AgentKind, AgentState, AgentType};
pub use dispatcher::{Dispatcher, FireSighting};
pub use grid::{FireField, IntensityGrid, SpreadReport, SuppressionReport};
pub use simulation::Simulation;
pub use snapshot::{AgentSnapshot, SurvivorSnapshot};
pub use statistics::FireStatistics;
pub use survivor::{Survivor, SurvivorStatus};
