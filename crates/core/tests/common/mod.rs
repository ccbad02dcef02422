//! Shared helpers for the integration tests

#![allow(dead_code)]

use ctor::ctor;
use rescue_sim_core::{FireScenario, GridPos, SimulationConfig};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness; filter with `RUST_LOG`
#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 10x10 grid, certain spread, no reinforcement
pub fn deterministic_spread_config() -> SimulationConfig {
    let mut config = SimulationConfig {
        width: 10,
        height: 10,
        headquarters: GridPos::new(0, 0),
        safe_radius: 2.0,
        ..SimulationConfig::with_scenario(FireScenario {
            spread_probability: 1.0,
            ..FireScenario::ordinary()
        })
    };
    config.fire.reinforce_probability = 0.0;
    config
}

/// Default 24x24 layout with fast tick intervals for real-time tests
pub fn fast_config() -> SimulationConfig {
    SimulationConfig {
        fire_tick_interval_ms: 20,
        agent_tick_interval_ms: 10,
        ..SimulationConfig::default()
    }
}
