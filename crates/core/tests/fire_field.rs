//! Fire propagation and suppression through the public API

mod common;

use approx::assert_relative_eq;
use common::deterministic_spread_config;
use rescue_sim_core::{FireField, FireScenario, GridPos, Simulation, SimulationConfig};

#[test]
fn test_single_cell_ignites_all_neighbors() {
    let config = deterministic_spread_config();
    let field = FireField::new(&config);
    let center = GridPos::new(5, 5);
    field.set_intensity(center, 80.0);

    let report = field.spread();

    for dx in -1..=1 {
        for dy in -1..=1 {
            let pos = center.offset(dx, dy);
            let value = field.intensity_at(pos);
            if pos == center {
                assert_relative_eq!(value, 80.0);
            } else {
                assert!((20.0..=100.0).contains(&value), "{pos} at {value}");
            }
        }
    }
    assert_eq!(report.newly_ignited, 8);
    assert_eq!(report.burning_cells, 9);
    assert_eq!(report.injected, None);
}

#[test]
fn test_adjacent_suppression_removes_full_amount() {
    let config = deterministic_spread_config();
    let field = FireField::new(&config);
    let fire = GridPos::new(6, 5);
    field.set_intensity(fire, 50.0);

    field.suppress(GridPos::new(5, 5), 10, 40.0);
    assert_relative_eq!(field.intensity_at(fire), 10.0);

    // Floored at zero
    field.suppress(GridPos::new(5, 5), 10, 40.0);
    assert_relative_eq!(field.intensity_at(fire), 0.0);
}

#[test]
fn test_zero_amount_changes_nothing() {
    let config = deterministic_spread_config();
    let field = FireField::new(&config);
    field.set_intensity(GridPos::new(3, 3), 42.0);
    let before = field.snapshot();

    field.decrease_intensity(GridPos::new(3, 3), 0.0);
    field.increase_intensity(GridPos::new(3, 3), 0.0);
    field.decrease_intensity(GridPos::new(-1, 30), 10.0);

    assert_eq!(*field.snapshot(), *before);
}

#[test]
fn test_burned_out_field_reignites_outside_safe_radius() {
    let config = deterministic_spread_config();
    let field = FireField::new(&config);

    let report = field.spread();
    let injected = report.injected.expect("ignition should be injected");
    assert!(injected.distance(config.headquarters) > config.safe_radius);
    assert_eq!(field.burning_count(), 1);
    let value = field.intensity_at(injected);
    assert!((64.0..=80.0).contains(&value), "injected at {value}");
}

#[test]
fn test_intensity_stays_in_range_for_every_scenario() {
    for scenario in [
        FireScenario::electrical(),
        FireScenario::chemical(),
        FireScenario::ordinary(),
        FireScenario::smoldering(),
    ] {
        let max = scenario.max_intensity;
        let mut sim = Simulation::new(SimulationConfig::with_scenario(scenario)).unwrap();
        for _ in 0..15 {
            sim.advance(2000);
            let grid = sim.snapshot_intensity();
            assert!(
                grid.as_slice().iter().all(|v| (0.0..=max).contains(v)),
                "intensity out of [0, {max}]"
            );
        }
    }
}
