//! Run-level fire and rescue statistics

use crate::core_types::SimMillis;
use crate::survivor::SurvivorCounts;
use serde::{Deserialize, Serialize};

/// Aggregate outcome of a run so far, refreshed after every tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FireStatistics {
    pub total_survivors: usize,
    pub rescued: usize,
    pub dead: usize,
    pub active: usize,
    /// Percentage of survivors rescued, 0 with no survivors
    pub survival_rate: f32,
    /// First non-zero burning-cell count observed
    pub initial_fire_cells: usize,
    pub current_fire_cells: usize,
    pub max_fire_cells: usize,
    /// How far the fire has been pushed back from its peak, in percent
    pub fire_control_rate: f32,
    pub elapsed_ms: SimMillis,
}

impl FireStatistics {
    pub fn new() -> Self {
        Self {
            fire_control_rate: 100.0,
            ..Self::default()
        }
    }

    pub fn record_fire(&mut self, burning_cells: usize) {
        if self.initial_fire_cells == 0 {
            self.initial_fire_cells = burning_cells;
        }
        self.current_fire_cells = burning_cells;
        self.max_fire_cells = self.max_fire_cells.max(burning_cells);
        self.fire_control_rate = if self.max_fire_cells == 0 {
            100.0
        } else {
            (self.max_fire_cells - self.current_fire_cells) as f32 / self.max_fire_cells as f32
                * 100.0
        };
    }

    pub fn record_survivors(&mut self, counts: SurvivorCounts) {
        self.total_survivors = counts.total();
        self.active = counts.active;
        self.rescued = counts.rescued;
        self.dead = counts.dead;
        self.survival_rate = if self.total_survivors == 0 {
            0.0
        } else {
            self.rescued as f32 / self.total_survivors as f32 * 100.0
        };
    }
}
