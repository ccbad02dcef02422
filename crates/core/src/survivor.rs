//! Civilians caught in the fire
//!
//! Survivors are passive: each agent tick their status is re-evaluated
//! against the intensity of the cell they stand on. Suppression that cools
//! the cell far enough rescues them; letting it flare up kills them.

use crate::config::{SimulationConfig, SurvivorConfig};
use crate::core_types::{GridPos, SimMillis};
use crate::grid::IntensityGrid;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Salt keeping survivor placement independent of the fire's random stream
const SURVIVOR_SEED_SALT: u64 = 0x5EED_0F5A_FE00_0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurvivorStatus {
    Active,
    Rescued,
    Dead,
}

impl SurvivorStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survivor {
    pub id: u32,
    pub pos: GridPos,
    pub status: SurvivorStatus,
}

impl Survivor {
    pub fn new(id: u32, pos: GridPos) -> Self {
        Self {
            id,
            pos,
            status: SurvivorStatus::Active,
        }
    }

    /// Re-evaluate against the intensity at the survivor's cell
    ///
    /// Terminal statuses never change. Returns whether the status changed.
    pub fn update_status(&mut self, intensity: f32, death_threshold: f32, rescue_threshold: f32) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = if intensity >= death_threshold {
            SurvivorStatus::Dead
        } else if intensity <= rescue_threshold {
            SurvivorStatus::Rescued
        } else {
            return false;
        };
        info!("Survivor {} at {} is {:?}", self.id, self.pos, self.status);
        true
    }
}

/// Survivor totals by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivorCounts {
    pub active: usize,
    pub rescued: usize,
    pub dead: usize,
}

impl SurvivorCounts {
    pub fn total(&self) -> usize {
        self.active + self.rescued + self.dead
    }
}

/// Every survivor of one run, spawned once after a fixed delay
#[derive(Debug)]
pub struct SurvivorPopulation {
    settings: SurvivorConfig,
    threshold: f32,
    survivors: Vec<Survivor>,
    spawned: bool,
    rng: StdRng,
}

impl SurvivorPopulation {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            settings: config.survivor.clone(),
            threshold: config.scenario.intensity_threshold,
            survivors: Vec::new(),
            spawned: false,
            rng: StdRng::seed_from_u64(config.seed ^ SURVIVOR_SEED_SALT),
        }
    }

    pub fn survivors(&self) -> &[Survivor] {
        &self.survivors
    }

    pub fn has_spawned(&self) -> bool {
        self.spawned
    }

    /// Place survivors on random burning cells once the spawn delay has passed
    ///
    /// Only cells hot enough to burn but below the death threshold qualify.
    /// When none qualify the spawn is retried on a later call. Returns the
    /// number placed.
    pub fn maybe_spawn(&mut self, now: SimMillis, grid: &IntensityGrid) -> usize {
        if self.spawned || now < self.settings.spawn_delay_ms {
            return 0;
        }

        let death = self.settings.death_threshold;
        let mut candidates: Vec<GridPos> = grid
            .cells_above(self.threshold)
            .into_iter()
            .filter(|pos| grid.intensity(*pos) < death)
            .collect();
        if candidates.is_empty() {
            return 0;
        }

        candidates.shuffle(&mut self.rng);
        candidates.truncate(self.settings.count);
        self.survivors = candidates
            .into_iter()
            .zip(0..)
            .map(|(pos, id)| Survivor::new(id, pos))
            .collect();
        self.spawned = true;
        info!(
            "Spawned {} survivors near fire at t={}ms",
            self.survivors.len(),
            now
        );
        self.survivors.len()
    }

    /// Update every survivor against `grid`; returns how many changed status
    pub fn update(&mut self, grid: &IntensityGrid) -> usize {
        let (death, rescue) = (self.settings.death_threshold, self.settings.rescue_threshold);
        self.survivors
            .iter_mut()
            .map(|s| s.update_status(grid.intensity(s.pos), death, rescue))
            .filter(|changed| *changed)
            .count()
    }

    pub fn counts(&self) -> SurvivorCounts {
        self.survivors
            .iter()
            .fold(SurvivorCounts::default(), |mut counts, s| {
                match s.status {
                    SurvivorStatus::Active => counts.active += 1,
                    SurvivorStatus::Rescued => counts.rescued += 1,
                    SurvivorStatus::Dead => counts.dead += 1,
                }
                counts
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_thresholds() {
        let mut dies = Survivor::new(0, GridPos::new(1, 1));
        assert!(dies.update_status(95.0, 95.0, 10.0));
        assert_eq!(dies.status, SurvivorStatus::Dead);

        let mut rescued = Survivor::new(1, GridPos::new(1, 1));
        assert!(rescued.update_status(10.0, 95.0, 10.0));
        assert_eq!(rescued.status, SurvivorStatus::Rescued);

        let mut waiting = Survivor::new(2, GridPos::new(1, 1));
        assert!(!waiting.update_status(50.0, 95.0, 10.0));
        assert_eq!(waiting.status, SurvivorStatus::Active);
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut survivor = Survivor::new(0, GridPos::new(1, 1));
        survivor.update_status(0.0, 95.0, 10.0);
        assert_eq!(survivor.status, SurvivorStatus::Rescued);
        for intensity in [100.0, 50.0, 0.0] {
            assert!(!survivor.update_status(intensity, 95.0, 10.0));
            assert_eq!(survivor.status, SurvivorStatus::Rescued);
        }

        let mut survivor = Survivor::new(1, GridPos::new(1, 1));
        survivor.update_status(100.0, 95.0, 10.0);
        survivor.update_status(0.0, 95.0, 10.0);
        assert_eq!(survivor.status, SurvivorStatus::Dead);
    }

    #[test]
    fn test_spawn_waits_for_delay_and_fire() {
        let config = SimulationConfig {
            width: 10,
            height: 10,
            headquarters: GridPos::new(0, 0),
            ..SimulationConfig::default()
        };
        let mut population = SurvivorPopulation::new(&config);
        let mut grid = IntensityGrid::new(10, 10);

        assert_eq!(population.maybe_spawn(5000, &grid), 0);
        assert!(!population.has_spawned());

        grid.set(GridPos::new(3, 3), 50.0);
        grid.set(GridPos::new(4, 4), 60.0);
        grid.set(GridPos::new(6, 6), 99.0);
        assert_eq!(population.maybe_spawn(4999, &grid), 0);
        assert_eq!(population.maybe_spawn(5000, &grid), 2);
        assert!(population
            .survivors()
            .iter()
            .all(|s| s.pos != GridPos::new(6, 6)));

        // Only once
        assert_eq!(population.maybe_spawn(9000, &grid), 0);
        assert_eq!(population.counts().active, 2);
    }

    #[test]
    fn test_update_counts() {
        let config = SimulationConfig {
            width: 10,
            height: 10,
            headquarters: GridPos::new(0, 0),
            ..SimulationConfig::default()
        };
        let mut population = SurvivorPopulation::new(&config);
        let mut grid = IntensityGrid::new(10, 10);
        grid.set(GridPos::new(3, 3), 50.0);
        grid.set(GridPos::new(4, 4), 60.0);
        population.maybe_spawn(5000, &grid);

        grid.set(GridPos::new(3, 3), 5.0);
        grid.set(GridPos::new(4, 4), 100.0);
        assert_eq!(population.update(&grid), 2);
        let counts = population.counts();
        assert_eq!((counts.active, counts.rescued, counts.dead), (0, 1, 1));
        assert_eq!(counts.total(), 2);
    }
}
