//! Fire propagation and suppression on the intensity grid
//!
//! `FireField` owns the only mutable copy of the fire state. Every mutation
//! builds a complete replacement grid and swaps it in under a short write
//! lock, so readers holding a [`FireField::snapshot`] always see a whole
//! grid from before or after a change, never a partially updated one.
//!
//! Writers (the spread step and suppression) are serialized through the
//! field RNG mutex; readers never wait on them beyond the pointer swap.

use crate::config::{FireDynamics, FireScenario, SimulationConfig};
use crate::core_types::GridPos;
use crate::grid::IntensityGrid;
use crate::sync::{lock, read, write};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

/// Ignited neighbors receive between these fractions of the source intensity
const IGNITION_SOURCE_FRACTION: (f32, f32) = (0.6, 0.9);
/// Freshly ignited cells start at least this far above the burning threshold
const IGNITION_MIN_MARGIN: f32 = 10.0;
/// Injected ignition points start between these fractions of the initial intensity
const INJECTION_FRACTION: (f32, f32) = (0.8, 1.0);

/// Outcome of one [`FireField::spread`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpreadReport {
    /// Burning cells after the step
    pub burning_cells: usize,
    /// Cells that went from not burning to burning during the step
    pub newly_ignited: usize,
    /// Ignition point injected because the field had burned out
    pub injected: Option<GridPos>,
}

/// Outcome of one [`FireField::suppress`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuppressionReport {
    /// Burning cells whose intensity was lowered
    pub cells_cooled: usize,
    /// Cells that stopped burning because of this suppression
    pub extinguished: usize,
}

/// Fire intensity field with double-buffered propagation
#[derive(Debug)]
pub struct FireField {
    scenario: FireScenario,
    dynamics: FireDynamics,
    headquarters: GridPos,
    safe_radius: f32,
    current: RwLock<Arc<IntensityGrid>>,
    /// Field RNG; holding it is what serializes writers
    writer: Mutex<StdRng>,
}

impl FireField {
    /// Create an empty (non-burning) field from the configuration
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            scenario: config.scenario.clone(),
            dynamics: config.fire.clone(),
            headquarters: config.headquarters,
            safe_radius: config.safe_radius,
            current: RwLock::new(Arc::new(IntensityGrid::new(config.width, config.height))),
            writer: Mutex::new(StdRng::seed_from_u64(config.seed)),
        }
    }

    /// Create a field and place the configured initial ignition points
    pub fn with_initial_fire(config: &SimulationConfig) -> Self {
        let field = Self::new(config);
        let placed: Vec<GridPos> = (0..config.fire.initial_ignitions)
            .filter_map(|_| field.inject_ignition())
            .collect();
        info!(
            "Fire field initialized: {}x{} grid, ignitions at {:?}",
            config.width, config.height, placed
        );
        field
    }

    /// Immutable view of the whole grid as of the last completed mutation
    pub fn snapshot(&self) -> Arc<IntensityGrid> {
        Arc::clone(&read(&self.current))
    }

    /// Intensity at `pos`, zero when off the grid
    pub fn intensity_at(&self, pos: GridPos) -> f32 {
        read(&self.current).intensity(pos)
    }

    /// Whether `pos` is burning
    pub fn is_burning(&self, pos: GridPos) -> bool {
        self.scenario.is_burning(self.intensity_at(pos))
    }

    /// Number of burning cells
    pub fn burning_count(&self) -> usize {
        self.snapshot().count_above(self.scenario.intensity_threshold)
    }

    /// Set the intensity at `pos`, clamped to `[0, max_intensity]`
    pub fn set_intensity(&self, pos: GridPos, intensity: f32) {
        let value = self.clamp(intensity);
        self.commit(|grid, _| {
            if grid.contains(pos) {
                grid.set(pos, value);
                true
            } else {
                false
            }
        });
    }

    /// Lower the intensity at `pos` by `amount`, floored at zero
    pub fn decrease_intensity(&self, pos: GridPos, amount: f32) {
        self.adjust(pos, -amount);
    }

    /// Raise the intensity at `pos` by `amount`, capped at `max_intensity`
    pub fn increase_intensity(&self, pos: GridPos, amount: f32) {
        self.adjust(pos, amount);
    }

    fn adjust(&self, pos: GridPos, delta: f32) {
        if delta == 0.0 || !delta.is_finite() {
            return;
        }
        let max = self.scenario.max_intensity;
        self.commit(|grid, _| {
            if !grid.contains(pos) {
                return false;
            }
            let value = (grid.intensity(pos) + delta).clamp(0.0, max);
            grid.set(pos, value);
            true
        });
    }

    /// Advance the fire by one tick
    ///
    /// Burning cells may reinforce; every non-burning cell independently
    /// rolls once per burning neighbor to ignite. All reads come from the
    /// pre-tick grid. If nothing burns afterwards, one ignition point is
    /// injected away from headquarters.
    pub fn spread(&self) -> SpreadReport {
        let mut rng = lock(&self.writer);
        let old = self.snapshot();
        let row_seeds: Vec<u64> = (0..old.height()).map(|_| rng.random()).collect();
        let mut next = spread_step(&old, &self.scenario, &self.dynamics, &row_seeds);

        let threshold = self.scenario.intensity_threshold;
        let newly_ignited = old
            .as_slice()
            .par_iter()
            .zip(next.as_slice().par_iter())
            .filter(|&(&before, &after)| before <= threshold && after > threshold)
            .count();

        let mut burning_cells = next.count_above(threshold);
        let mut injected = None;
        if burning_cells == 0 {
            injected = self.place_ignition(&mut next, &mut *rng);
            if injected.is_some() {
                burning_cells = 1;
            }
        }

        *write(&self.current) = Arc::new(next);

        debug!(
            "Fire spread: {} burning, {} newly ignited, injected={:?}",
            burning_cells, newly_ignited, injected
        );
        SpreadReport {
            burning_cells,
            newly_ignited,
            injected,
        }
    }

    /// Inject a single ignition point outside the safe radius
    ///
    /// Returns the ignited cell, or `None` when every attempt landed inside
    /// the safe radius.
    pub fn inject_ignition(&self) -> Option<GridPos> {
        let mut placed = None;
        self.commit(|grid, rng| {
            placed = self.place_ignition(grid, rng);
            placed.is_some()
        });
        placed
    }

    fn place_ignition(&self, grid: &mut IntensityGrid, rng: &mut StdRng) -> Option<GridPos> {
        if grid.width() == 0 || grid.height() == 0 {
            return None;
        }
        for _ in 0..self.dynamics.ignition_attempts {
            let pos = GridPos::new(
                rng.random_range(0..grid.width()) as i32,
                rng.random_range(0..grid.height()) as i32,
            );
            if pos.distance(self.headquarters) <= self.safe_radius {
                continue;
            }
            let fraction = rng.random_range(INJECTION_FRACTION.0..=INJECTION_FRACTION.1);
            grid.set(pos, self.clamp(self.scenario.initial_intensity * fraction));
            info!("Injected ignition point at {}", pos);
            return Some(pos);
        }
        debug!(
            "No ignition placed after {} attempts",
            self.dynamics.ignition_attempts
        );
        None
    }

    /// Cool every cell within `radius` of `center`
    ///
    /// The full `amount` applies at distance one and decays linearly to zero
    /// just past `radius`. Intensities are floored at zero.
    pub fn suppress(&self, center: GridPos, radius: i32, amount: f32) -> SuppressionReport {
        let mut report = SuppressionReport::default();
        if amount <= 0.0 || !amount.is_finite() {
            return report;
        }
        let scenario = &self.scenario;
        self.commit(|grid, _| {
            let mut changed = false;
            for dx in -radius..=radius {
                for dy in -radius..=radius {
                    let pos = center.offset(dx, dy);
                    if !grid.contains(pos) {
                        continue;
                    }
                    let distance = center.distance(pos);
                    if distance > radius as f32 {
                        continue;
                    }
                    let before = grid.intensity(pos);
                    if before <= 0.0 {
                        continue;
                    }
                    let after = (before - amount * suppression_falloff(distance, radius)).max(0.0);
                    grid.set(pos, after);
                    changed = true;
                    if scenario.is_burning(before) {
                        report.cells_cooled += 1;
                        if !scenario.is_burning(after) {
                            report.extinguished += 1;
                        }
                    }
                }
            }
            changed
        });
        report
    }

    /// Apply `mutate` to a private copy of the grid and swap it in if it
    /// reports a change
    fn commit<F>(&self, mutate: F)
    where
        F: FnOnce(&mut IntensityGrid, &mut StdRng) -> bool,
    {
        let mut rng = lock(&self.writer);
        let mut next = (*self.snapshot()).clone();
        if mutate(&mut next, &mut *rng) {
            *write(&self.current) = Arc::new(next);
        }
    }

    #[inline]
    fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, self.scenario.max_intensity)
    }
}

/// Fraction of the suppression amount delivered at `distance`
fn suppression_falloff(distance: f32, radius: i32) -> f32 {
    if radius <= 0 {
        return 1.0;
    }
    (1.0 - (distance - 1.0).max(0.0) / radius as f32).max(0.0)
}

/// Intensity given to a neighbor ignited by a source burning at `source`
fn ignition_intensity(source: f32, scenario: &FireScenario, rng: &mut StdRng) -> f32 {
    let fraction = rng.random_range(IGNITION_SOURCE_FRACTION.0..=IGNITION_SOURCE_FRACTION.1);
    let floor = (scenario.intensity_threshold + IGNITION_MIN_MARGIN).min(scenario.max_intensity);
    (source * fraction).clamp(floor, scenario.max_intensity)
}

/// Compute the post-tick grid from `old` without touching it
///
/// Rows are processed in parallel; each row draws from its own RNG seeded
/// from `row_seeds`, so the result only depends on the seeds.
fn spread_step(
    old: &IntensityGrid,
    scenario: &FireScenario,
    dynamics: &FireDynamics,
    row_seeds: &[u64],
) -> IntensityGrid {
    let mut next = old.clone();
    let width = old.width();
    if width == 0 {
        return next;
    }

    next.as_mut_slice()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let mut rng = StdRng::seed_from_u64(row_seeds[y]);
            for (x, cell) in row.iter_mut().enumerate() {
                let pos = GridPos::new(x as i32, y as i32);
                let value = old.intensity(pos);

                if scenario.is_burning(value) {
                    if rng.random::<f64>() < dynamics.reinforce_probability {
                        let delta = rng.random::<f32>() * dynamics.reinforce_max_delta;
                        *cell = (value + delta).min(scenario.max_intensity);
                    }
                    continue;
                }

                let mut ignited = value;
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let source = old.intensity(pos.offset(dx, dy));
                        if !scenario.is_burning(source) {
                            continue;
                        }
                        if rng.random::<f64>() < scenario.spread_probability {
                            ignited = ignited.max(ignition_intensity(source, scenario, &mut rng));
                        }
                    }
                }
                *cell = ignited;
            }
        });

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn deterministic_config() -> SimulationConfig {
        let mut config = SimulationConfig {
            width: 10,
            height: 10,
            headquarters: GridPos::new(0, 0),
            ..SimulationConfig::default()
        };
        config.scenario.spread_probability = 1.0;
        config.fire.reinforce_probability = 0.0;
        config
    }

    #[test]
    fn test_spread_ignites_all_neighbors() {
        let field = FireField::new(&deterministic_config());
        let center = GridPos::new(5, 5);
        field.set_intensity(center, 80.0);

        let report = field.spread();
        let grid = field.snapshot();

        assert_eq!(grid.intensity(center), 80.0);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let v = grid.intensity(center.offset(dx, dy));
                assert!((20.0..=100.0).contains(&v), "neighbor intensity {v}");
            }
        }
        assert_eq!(report.newly_ignited, 8);
        assert_eq!(report.burning_cells, 9);
        assert_eq!(report.injected, None);
    }

    #[test]
    fn test_spread_reads_pre_tick_grid() {
        let field = FireField::new(&deterministic_config());
        field.set_intensity(GridPos::new(5, 5), 80.0);
        field.spread();

        // Only the ring at distance one may burn after a single tick
        let grid = field.snapshot();
        assert_eq!(grid.intensity(GridPos::new(7, 5)), 0.0);
        assert_eq!(grid.intensity(GridPos::new(3, 3)), 0.0);
        assert_eq!(grid.count_above(10.0), 9);
    }

    #[test]
    fn test_spread_from_corner_stays_in_bounds() {
        let field = FireField::new(&deterministic_config());
        field.set_intensity(GridPos::new(9, 9), 100.0);
        let report = field.spread();
        assert_eq!(report.burning_cells, 4);
    }

    #[test]
    fn test_reinforcement_is_capped() {
        let mut config = deterministic_config();
        config.fire.reinforce_probability = 1.0;
        config.fire.reinforce_max_delta = 50.0;
        let field = FireField::new(&config);
        field.set_intensity(GridPos::new(4, 4), 99.0);
        for _ in 0..5 {
            field.spread();
        }
        let grid = field.snapshot();
        assert!(grid.as_slice().iter().all(|&v| (0.0..=100.0).contains(&v)));
    }

    #[test]
    fn test_burned_out_field_gets_new_ignition() {
        let config = SimulationConfig {
            width: 20,
            height: 20,
            headquarters: GridPos::new(10, 10),
            safe_radius: 3.0,
            ..SimulationConfig::default()
        };
        let field = FireField::new(&config);
        let report = field.spread();

        let pos = report.injected.expect("an ignition point");
        assert!(pos.distance(config.headquarters) > config.safe_radius);
        let intensity = field.intensity_at(pos);
        assert!((64.0..=80.0).contains(&intensity), "intensity {intensity}");
        assert_eq!(report.burning_cells, 1);
    }

    #[test]
    fn test_injection_skipped_when_everything_is_safe() {
        let config = SimulationConfig {
            width: 4,
            height: 4,
            headquarters: GridPos::new(2, 2),
            safe_radius: 10.0,
            ..SimulationConfig::default()
        };
        let field = FireField::new(&config);
        let report = field.spread();
        assert_eq!(report.injected, None);
        assert_eq!(report.burning_cells, 0);
        assert_eq!(field.burning_count(), 0);
    }

    #[test]
    fn test_intensity_clamped() {
        let field = FireField::new(&deterministic_config());
        let pos = GridPos::new(1, 1);
        field.increase_intensity(pos, 500.0);
        assert_eq!(field.intensity_at(pos), 100.0);
        field.decrease_intensity(pos, 500.0);
        assert_eq!(field.intensity_at(pos), 0.0);
        field.set_intensity(pos, -3.0);
        assert_eq!(field.intensity_at(pos), 0.0);
    }

    #[test]
    fn test_zero_amount_and_out_of_bounds_are_noops() {
        let field = FireField::new(&deterministic_config());
        field.set_intensity(GridPos::new(2, 2), 40.0);
        let before = field.snapshot();

        field.decrease_intensity(GridPos::new(2, 2), 0.0);
        field.increase_intensity(GridPos::new(-1, 3), 10.0);
        field.decrease_intensity(GridPos::new(3, 42), 10.0);
        field.set_intensity(GridPos::new(10, 10), 10.0);

        assert_eq!(*before, *field.snapshot());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let field = FireField::new(&deterministic_config());
        let before = field.snapshot();
        field.set_intensity(GridPos::new(3, 3), 50.0);
        assert_eq!(before.intensity(GridPos::new(3, 3)), 0.0);
        assert_eq!(field.intensity_at(GridPos::new(3, 3)), 50.0);
    }

    #[test]
    fn test_suppression_full_amount_at_distance_one() {
        let field = FireField::new(&deterministic_config());
        let fire = GridPos::new(5, 5);
        field.set_intensity(fire, 50.0);

        let report = field.suppress(GridPos::new(4, 5), 10, 40.0);

        assert_relative_eq!(field.intensity_at(fire), 10.0);
        assert_eq!(report.cells_cooled, 1);
        assert_eq!(report.extinguished, 1);
    }

    #[test]
    fn test_suppression_decays_and_floors() {
        let field = FireField::new(&deterministic_config());
        field.set_intensity(GridPos::new(5, 5), 30.0);
        field.set_intensity(GridPos::new(5, 8), 30.0);

        field.suppress(GridPos::new(5, 4), 4, 40.0);

        // distance 1: full amount, floored at zero
        assert_eq!(field.intensity_at(GridPos::new(5, 5)), 0.0);
        // distance 4: 40 * (1 - 3/4) = 10
        assert_relative_eq!(field.intensity_at(GridPos::new(5, 8)), 20.0);
    }

    #[test]
    fn test_falloff() {
        assert_relative_eq!(suppression_falloff(0.0, 10), 1.0);
        assert_relative_eq!(suppression_falloff(1.0, 10), 1.0);
        assert_relative_eq!(suppression_falloff(6.0, 10), 0.5);
        assert_relative_eq!(suppression_falloff(3.0, 0), 1.0);
    }

    #[test]
    fn test_same_seed_same_fire() {
        let mut config = SimulationConfig::default();
        config.scenario.spread_probability = 0.5;
        let a = FireField::with_initial_fire(&config);
        let b = FireField::with_initial_fire(&config);
        for _ in 0..10 {
            a.spread();
            b.spread();
        }
        assert_eq!(*a.snapshot(), *b.snapshot());
    }
}
