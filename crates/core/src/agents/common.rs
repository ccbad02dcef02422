//! Attributes and state-machine primitives shared by every agent
//!
//! Energy drains linearly with simulated time since the last recharge. A
//! recharge (power or suppressant) is a fixed-duration wait at headquarters
//! that completes all at once. Movement is a single greedy 8-directional
//! step that trades distance against known fire danger.

use crate::config::SimulationConfig;
use crate::core_types::{AgentId, GridPos, SimMillis};
use crate::grid::IntensityGrid;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Agent lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Idle at headquarters
    AtBase,
    /// Heading to an assigned target
    MovingToTarget,
    /// Scout roaming the grid
    Exploring,
    /// Firefighter cooling cells around itself
    Suppressing,
    /// Heading home, whatever the reason
    MovingToBase,
    /// Waiting at headquarters for the battery
    RechargingPower,
    /// Waiting at headquarters for suppressant
    RechargingResource,
}

impl AgentState {
    /// Whether the agent is waiting on a recharge timer
    pub fn is_recharging(self) -> bool {
        matches!(self, Self::RechargingPower | Self::RechargingResource)
    }
}

/// Position, energy and knowledge common to scouts and firefighters
#[derive(Debug, Clone)]
pub struct AgentCore {
    id: AgentId,
    pos: GridPos,
    state: AgentState,
    headquarters: GridPos,
    operation_started_at: SimMillis,
    recharge_started_at: SimMillis,
    operation_timeout_ms: SimMillis,
    recharge_duration_ms: SimMillis,
    energy_low_water_pct: f32,
    departure_reserve_pct: f32,
    intensity_threshold: f32,
    local_knowledge: IntensityGrid,
}

impl AgentCore {
    /// New agent at headquarters with a full battery as of `now`
    pub fn new(id: AgentId, config: &SimulationConfig, now: SimMillis) -> Self {
        Self {
            id,
            pos: config.headquarters,
            state: AgentState::AtBase,
            headquarters: config.headquarters,
            operation_started_at: now,
            recharge_started_at: now,
            operation_timeout_ms: config.timers.operation_timeout_ms,
            recharge_duration_ms: config.timers.recharge_duration_ms,
            energy_low_water_pct: config.pool.energy_low_water_pct,
            departure_reserve_pct: config.pool.departure_reserve_pct,
            intensity_threshold: config.scenario.intensity_threshold,
            local_knowledge: IntensityGrid::new(config.width, config.height),
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn pos(&self) -> GridPos {
        self.pos
    }

    /// Place the agent directly, ignoring movement rules; off-grid positions are ignored
    pub fn set_pos(&mut self, pos: GridPos) {
        if self.local_knowledge.contains(pos) {
            self.pos = pos;
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn headquarters(&self) -> GridPos {
        self.headquarters
    }

    pub fn at_base(&self) -> bool {
        self.pos == self.headquarters
    }

    /// Switch state, logging real transitions
    pub fn transition(&mut self, next: AgentState) {
        if self.state != next {
            debug!(
                "Agent {} at {}: {:?} -> {:?}",
                self.id, self.pos, self.state, next
            );
            self.state = next;
        }
    }

    /// Remaining energy in `[0, 1]`; while recharging, the recharge progress
    pub fn energy_fraction(&self, now: SimMillis) -> f32 {
        if self.state == AgentState::RechargingPower {
            return progress(now, self.recharge_started_at, self.recharge_duration_ms);
        }
        1.0 - progress(now, self.operation_started_at, self.operation_timeout_ms)
    }

    /// Whether the battery has hit its low-water mark
    pub fn needs_recharge(&self, now: SimMillis) -> bool {
        self.state != AgentState::RechargingPower
            && self.energy_fraction(now) <= self.energy_low_water_pct
    }

    /// Whether to recharge now rather than take on new work
    ///
    /// Away from headquarters only the low-water mark counts; at headquarters
    /// the agent also tops up once it is down to its departure reserve.
    pub fn should_recharge_at_base(&self, now: SimMillis) -> bool {
        if self.state == AgentState::RechargingPower {
            return false;
        }
        self.needs_recharge(now)
            || (self.at_base() && self.energy_fraction(now) <= self.departure_reserve_pct)
    }

    /// Start waiting at headquarters in `state` (one of the recharge states)
    pub fn begin_recharge(&mut self, state: AgentState, now: SimMillis) {
        debug_assert!(state.is_recharging());
        self.recharge_started_at = now;
        self.transition(state);
    }

    /// Whether a recharge of `duration_ms` begun earlier has elapsed
    pub fn recharge_elapsed(&self, now: SimMillis, duration_ms: SimMillis) -> bool {
        now.saturating_sub(self.recharge_started_at) >= duration_ms
    }

    /// Whether the power recharge is done
    pub fn power_recharged(&self, now: SimMillis) -> bool {
        self.recharge_elapsed(now, self.recharge_duration_ms)
    }

    /// Refill the battery and return to idle
    pub fn finish_recharge(&mut self, now: SimMillis) {
        self.operation_started_at = now;
        self.transition(AgentState::AtBase);
    }

    /// What this agent believes the intensity grid looks like
    pub fn local_knowledge(&self) -> &IntensityGrid {
        &self.local_knowledge
    }

    /// Record every cell within `radius` (square) of the agent from `grid`
    ///
    /// Returns the observed cells with their intensities, in scan order.
    pub fn observe(&mut self, grid: &IntensityGrid, radius: i32) -> Vec<(GridPos, f32)> {
        let mut seen = Vec::new();
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                let pos = self.pos.offset(dx, dy);
                if !grid.contains(pos) {
                    continue;
                }
                let value = grid.intensity(pos);
                self.local_knowledge.set(pos, value);
                seen.push((pos, value));
            }
        }
        seen
    }

    /// Replace local knowledge with the headquarters map
    pub fn sync_knowledge(&mut self, global: &IntensityGrid) {
        if global.width() == self.local_knowledge.width()
            && global.height() == self.local_knowledge.height()
        {
            self.local_knowledge.clone_from(global);
        }
    }

    /// Danger-weighted distance from `pos` to `target`
    pub fn movement_risk(&self, pos: GridPos, target: GridPos) -> f32 {
        let known = self.local_knowledge.intensity(pos);
        let danger = if known > self.intensity_threshold {
            known
        } else {
            0.0
        };
        pos.distance(target) + danger
    }

    /// Take one greedy step towards `target`
    ///
    /// Considers staying put and the 8 neighbors, scanning `dx` then `dy`
    /// from -1 to 1; the first candidate with the lowest risk wins.
    pub fn step_towards(&mut self, target: GridPos) -> GridPos {
        let mut best = self.pos;
        let mut lowest = f32::INFINITY;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let candidate = self.pos.offset(dx, dy);
                if !self.local_knowledge.contains(candidate) {
                    continue;
                }
                let risk = self.movement_risk(candidate, target);
                if risk < lowest {
                    lowest = risk;
                    best = candidate;
                }
            }
        }
        self.pos = best;
        best
    }
}

/// Fraction of `duration` elapsed since `start`, in `[0, 1]`
fn progress(now: SimMillis, start: SimMillis, duration: SimMillis) -> f32 {
    if duration == 0 {
        return 1.0;
    }
    (now.saturating_sub(start) as f32 / duration as f32).clamp(0.0, 1.0)
}
