//! Scout: explores the grid and reports burning cells to the dispatcher

use super::{AgentCore, AgentState, Behavior, TickContext};
use crate::config::{ScoutConfig, SimulationConfig};
use crate::core_types::{AgentId, GridPos, SimMillis};
use crate::dispatcher::FireSighting;
use crate::grid::IntensityGrid;
use crate::sync::lock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Penalty scale for candidates close to recently chosen targets
const REVISIT_PENALTY: f32 = 10.0;
/// Divisor applied to a candidate's distance from headquarters
const HOME_DISTANCE_DIVISOR: f32 = 10.0;

/// Exploration state of a scout
#[derive(Debug, Clone)]
pub struct Scout {
    settings: ScoutConfig,
    threshold: f32,
    width: usize,
    height: usize,
    headquarters: GridPos,
    target: GridPos,
    /// Cells ever seen, row-major; never reset
    explored: Vec<bool>,
    previous_targets: VecDeque<GridPos>,
    /// Fire cells seen, keyed by position, with the time last seen burning
    recheck: BTreeMap<GridPos, SimMillis>,
    rng: StdRng,
}

impl Scout {
    pub fn new(id: AgentId, config: &SimulationConfig) -> Self {
        let mut scout = Self {
            settings: config.scout.clone(),
            threshold: config.scenario.intensity_threshold,
            width: config.width,
            height: config.height,
            headquarters: config.headquarters,
            target: config.headquarters,
            explored: vec![false; config.width * config.height],
            previous_targets: VecDeque::new(),
            recheck: BTreeMap::new(),
            rng: StdRng::seed_from_u64(config.seed ^ (u64::from(id) + 1).rotate_left(32)),
        };
        scout.target = scout.exploration_target();
        scout
    }

    /// Number of distinct cells this scout has seen
    pub fn explored_count(&self) -> usize {
        self.explored.iter().filter(|seen| **seen).count()
    }

    pub fn is_explored(&self, pos: GridPos) -> bool {
        self.cell_index(pos).is_some_and(|i| self.explored[i])
    }

    /// Fire cells awaiting a revisit, with the time each was last seen burning
    pub fn recheck_queue(&self) -> &BTreeMap<GridPos, SimMillis> {
        &self.recheck
    }

    pub fn set_target(&mut self, target: GridPos) {
        self.target = target;
    }

    fn cell_index(&self, pos: GridPos) -> Option<usize> {
        let (x, y) = (usize::try_from(pos.x).ok()?, usize::try_from(pos.y).ok()?);
        (x < self.width && y < self.height).then_some(y * self.width + x)
    }

    /// Look around, remember what was seen and collect burning cells
    fn scan(&mut self, core: &mut AgentCore, grid: &IntensityGrid, now: SimMillis) -> Vec<FireSighting> {
        let mut sightings = Vec::new();
        for (pos, intensity) in core.observe(grid, self.settings.vision_radius) {
            if let Some(i) = self.cell_index(pos) {
                self.explored[i] = true;
            }
            if intensity > self.threshold {
                sightings.push(FireSighting::new(pos, intensity, now));
                self.recheck.insert(pos, now);
            }
        }
        sightings
    }

    /// Drop recheck entries this scout now believes are out
    fn forget_extinguished(&mut self, core: &AgentCore) {
        let knowledge = core.local_knowledge();
        let threshold = self.threshold;
        self.recheck
            .retain(|pos, _| knowledge.intensity(*pos) > threshold);
    }

    fn update_target(&mut self, core: &AgentCore, now: SimMillis) {
        let reached = core.pos().chebyshev(self.target) <= 1;
        if !reached && self.rng.random::<f64>() >= self.settings.target_change_probability {
            return;
        }

        let wants_recheck = self.rng.random::<f64>() < self.settings.recheck_probability;
        let next = match self.due_recheck(now) {
            Some(pos) if wants_recheck => pos,
            _ => self.exploration_target(),
        };
        debug!(
            "Scout {} retargeted {} -> {}",
            core.id(),
            self.target,
            next
        );
        self.target = next;
    }

    /// Oldest fire cell not seen for at least the recheck interval
    fn due_recheck(&self, now: SimMillis) -> Option<GridPos> {
        self.recheck
            .iter()
            .filter(|(_, seen)| now.saturating_sub(**seen) >= self.settings.recheck_interval_ms)
            .min_by_key(|(_, seen)| **seen)
            .map(|(pos, _)| *pos)
    }

    /// Best of a random sample of cells, favouring unexplored ground
    fn exploration_target(&mut self) -> GridPos {
        self.previous_targets.push_back(self.target);
        while self.previous_targets.len() > self.settings.max_previous_targets {
            self.previous_targets.pop_front();
        }

        let mut best = self.target;
        let mut best_score = f32::NEG_INFINITY;
        for _ in 0..self.settings.target_candidates.max(1) {
            let candidate = GridPos::new(
                self.rng.random_range(0..self.width as i32),
                self.rng.random_range(0..self.height as i32),
            );
            let score = self.exploration_score(candidate);
            if score > best_score {
                best_score = score;
                best = candidate;
            }
        }
        best
    }

    fn exploration_score(&self, candidate: GridPos) -> f32 {
        let radius = self.settings.unexplored_radius;
        let mut unexplored = 0;
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if let Some(i) = self.cell_index(candidate.offset(dx, dy)) {
                    if !self.explored[i] {
                        unexplored += 1;
                    }
                }
            }
        }

        let revisit: f32 = self
            .previous_targets
            .iter()
            .map(|previous| REVISIT_PENALTY / (candidate.distance(*previous) + 1.0))
            .sum();

        unexplored as f32 - revisit - candidate.distance(self.headquarters) / HOME_DISTANCE_DIVISOR
    }
}

impl Behavior for Scout {
    fn tick(&mut self, core: &mut AgentCore, ctx: &TickContext<'_>) {
        let now = ctx.now;

        if core.state() == AgentState::RechargingPower {
            if core.power_recharged(now) {
                core.finish_recharge(now);
            }
            return;
        }

        if core.should_recharge_at_base(now) {
            if core.at_base() {
                core.begin_recharge(AgentState::RechargingPower, now);
            } else {
                core.transition(AgentState::MovingToBase);
                core.step_towards(core.headquarters());
            }
            return;
        }

        if core.at_base() {
            core.sync_knowledge(lock(ctx.dispatcher).global_map());
        }

        let sightings = self.scan(core, ctx.grid, now);
        if !sightings.is_empty() {
            lock(ctx.dispatcher).receive_report(core.id(), sightings, now, ctx.grid);
        }

        self.forget_extinguished(core);
        self.update_target(core, now);
        core.transition(AgentState::Exploring);
        core.step_towards(self.target);
    }

    fn target(&self) -> Option<GridPos> {
        Some(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::grid::FireField;
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    fn config() -> SimulationConfig {
        SimulationConfig {
            width: 20,
            height: 20,
            headquarters: GridPos::new(10, 10),
            ..SimulationConfig::default()
        }
    }

    struct Fixture {
        field: FireField,
        dispatcher: Mutex<Dispatcher>,
    }

    impl Fixture {
        fn new(config: &SimulationConfig) -> Self {
            Self {
                field: FireField::new(config),
                dispatcher: Mutex::new(Dispatcher::new(config)),
            }
        }

        fn tick(&self, scout: &mut Scout, core: &mut AgentCore, now: SimMillis) {
            let grid = self.field.snapshot();
            let ctx = TickContext {
                now,
                grid: &grid,
                field: &self.field,
                dispatcher: &self.dispatcher,
            };
            scout.tick(core, &ctx);
        }
    }

    #[test]
    fn test_scout_reports_fire_in_vision() {
        let config = config();
        let fixture = Fixture::new(&config);
        fixture.field.set_intensity(GridPos::new(12, 11), 70.0);
        fixture.field.set_intensity(GridPos::new(19, 19), 70.0);

        let mut core = AgentCore::new(0, &config, 0);
        let mut scout = Scout::new(0, &config);
        fixture.tick(&mut scout, &mut core, 400);

        let dispatcher = fixture.dispatcher.lock().unwrap();
        assert!(dispatcher.is_known(GridPos::new(12, 11)));
        assert!(!dispatcher.is_known(GridPos::new(19, 19)));
        assert_eq!(dispatcher.ledger().reports_from(0).len(), 1);
        assert_eq!(dispatcher.global_map().intensity(GridPos::new(12, 11)), 70.0);
        assert!(scout.recheck_queue().contains_key(&GridPos::new(12, 11)));
    }

    #[test]
    fn test_scout_explores_and_marks_cells() {
        let config = config();
        let fixture = Fixture::new(&config);
        let mut core = AgentCore::new(0, &config, 0);
        let mut scout = Scout::new(0, &config);

        fixture.tick(&mut scout, &mut core, 400);
        assert_eq!(core.state(), AgentState::Exploring);
        // Vision radius 5 from the middle of the grid
        assert_eq!(scout.explored_count(), 121);
        assert!(scout.is_explored(GridPos::new(5, 5)));
        assert!(!scout.is_explored(GridPos::new(0, 0)));
    }

    #[test]
    fn test_scout_recharges_at_base() {
        let config = config();
        let fixture = Fixture::new(&config);
        let mut core = AgentCore::new(0, &config, 0);
        let mut scout = Scout::new(0, &config);

        fixture.tick(&mut scout, &mut core, 3000);
        assert_eq!(core.state(), AgentState::RechargingPower);
        fixture.tick(&mut scout, &mut core, 4000);
        assert_eq!(core.state(), AgentState::RechargingPower);
        fixture.tick(&mut scout, &mut core, 5000);
        assert_eq!(core.state(), AgentState::AtBase);
        assert!(!core.needs_recharge(5000));
    }

    #[test]
    fn test_depleted_scout_heads_home() {
        let config = config();
        let fixture = Fixture::new(&config);
        let mut core = AgentCore::new(0, &config, 0);
        core.set_pos(GridPos::new(14, 14));
        let mut scout = Scout::new(0, &config);

        fixture.tick(&mut scout, &mut core, 3000);
        assert_eq!(core.state(), AgentState::MovingToBase);
        assert_eq!(core.pos(), GridPos::new(13, 13));
        for _ in 0..3 {
            fixture.tick(&mut scout, &mut core, 3000);
        }
        assert!(core.at_base());
        fixture.tick(&mut scout, &mut core, 3000);
        assert_eq!(core.state(), AgentState::RechargingPower);
    }

    #[test]
    fn test_extinguished_cells_leave_recheck_queue() {
        let config = config();
        let fixture = Fixture::new(&config);
        let fire = GridPos::new(11, 10);
        fixture.field.set_intensity(fire, 70.0);

        let mut core = AgentCore::new(0, &config, 0);
        let mut scout = Scout::new(0, &config);
        fixture.tick(&mut scout, &mut core, 400);
        assert!(scout.recheck_queue().contains_key(&fire));

        fixture.field.set_intensity(fire, 0.0);
        scout.set_target(core.pos());
        fixture.tick(&mut scout, &mut core, 800);
        assert!(scout.recheck_queue().is_empty());
    }

    #[test]
    fn test_targets_are_deterministic_per_seed() {
        let config = config();
        let a = Scout::new(0, &config);
        let b = Scout::new(0, &config);
        let c = Scout::new(1, &config);
        assert_eq!(a.target(), b.target());
        assert!(a.target().is_some_and(|t| config.in_bounds(t)));
        assert!(c.target().is_some_and(|t| config.in_bounds(t)));
    }

    #[test]
    fn test_recheck_picks_oldest_due_fire() {
        let mut config = config();
        config.scout.recheck_probability = 1.0;
        let core = AgentCore::new(0, &config, 0);
        let mut scout = Scout::new(0, &config);
        scout.recheck.insert(GridPos::new(2, 2), 3000);
        scout.recheck.insert(GridPos::new(15, 4), 1000);
        scout.recheck.insert(GridPos::new(4, 15), 9000);

        // Recheck interval is 5000 ms
        assert_eq!(scout.due_recheck(5999), None);
        assert_eq!(scout.due_recheck(6000), Some(GridPos::new(15, 4)));

        scout.set_target(core.pos());
        scout.update_target(&core, 9000);
        assert_eq!(scout.target, GridPos::new(15, 4));
    }

    #[test]
    fn test_unexplored_ground_scores_higher() {
        let config = config();
        let mut scout = Scout::new(0, &config);
        scout.previous_targets.clear();

        let open = GridPos::new(5, 10);
        let seen = GridPos::new(15, 10);
        for dx in -2..=2 {
            for dy in -2..=2 {
                if let Some(i) = scout.cell_index(seen.offset(dx, dy)) {
                    scout.explored[i] = true;
                }
            }
        }

        // 25 unexplored cells, 5 cells from headquarters
        assert_relative_eq!(scout.exploration_score(open), 24.5);
        assert_relative_eq!(scout.exploration_score(seen), -0.5);
    }

    #[test]
    fn test_recent_targets_are_penalised() {
        let config = config();
        let mut scout = Scout::new(0, &config);
        scout.previous_targets.clear();

        let visited = GridPos::new(5, 10);
        let fresh = GridPos::new(10, 5);
        scout.previous_targets.push_back(visited);

        assert_relative_eq!(scout.exploration_score(visited), 14.5);
        assert!(scout.exploration_score(fresh) > scout.exploration_score(visited));
    }

    #[test]
    fn test_target_change_probability() {
        let mut config = config();
        config.scout.recheck_probability = 0.0;
        config.scout.target_change_probability = 0.0;
        let core = AgentCore::new(0, &config, 0);
        let far = GridPos::new(0, 0);

        let mut scout = Scout::new(0, &config);
        scout.set_target(far);
        scout.update_target(&core, 400);
        assert_eq!(scout.target, far);

        config.scout.target_change_probability = 1.0;
        let mut scout = Scout::new(0, &config);
        scout.set_target(far);
        scout.update_target(&core, 400);
        assert_eq!(scout.previous_targets.back(), Some(&far));
    }
}
