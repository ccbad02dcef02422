//! Firefighter: takes targets from the dispatcher and suppresses fire around itself

use super::{AgentCore, AgentState, Behavior, TickContext};
use crate::config::{FirefighterConfig, SimulationConfig};
use crate::core_types::{GridPos, SimMillis};
use crate::grid::IntensityGrid;
use crate::sync::lock;
use tracing::debug;

/// Suppressant tank and task timers of a firefighter
#[derive(Debug, Clone)]
pub struct Firefighter {
    settings: FirefighterConfig,
    threshold: f32,
    refill_duration_ms: SimMillis,
    max_moving_ticks: u32,
    max_suppressing_ticks: u32,
    water: f32,
    target: Option<GridPos>,
    moving_ticks: u32,
    suppressing_ticks: u32,
}

impl Firefighter {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            settings: config.firefighter.clone(),
            threshold: config.scenario.intensity_threshold,
            refill_duration_ms: config.timers.resource_refill_duration_ms,
            max_moving_ticks: config.pool.max_task_ticks,
            max_suppressing_ticks: config.pool.max_suppression_ticks,
            water: config.firefighter.max_water,
            target: None,
            moving_ticks: 0,
            suppressing_ticks: 0,
        }
    }

    pub fn water(&self) -> f32 {
        self.water
    }

    pub fn set_water(&mut self, water: f32) {
        self.water = water.clamp(0.0, self.settings.max_water);
    }

    fn has_water_for_a_tick(&self) -> bool {
        self.water >= self.settings.water_per_tick
    }

    /// Refill below the configured fraction, or when a sortie would end at once
    fn needs_refill(&self) -> bool {
        self.water < self.settings.max_water * self.settings.refill_fraction
            || !self.has_water_for_a_tick()
    }

    fn fire_in_vision(&self, pos: GridPos, grid: &IntensityGrid) -> bool {
        let radius = self.settings.vision_radius;
        (-radius..=radius).any(|dx| {
            (-radius..=radius).any(|dy| grid.intensity(pos.offset(dx, dy)) > self.threshold)
        })
    }

    /// Give up the current task and head home
    fn return_to_base(&mut self, core: &mut AgentCore, ctx: &TickContext<'_>) {
        lock(ctx.dispatcher).release_assignment(core.id());
        if let Some(target) = self.target.take() {
            debug!("Firefighter {} abandoning target {}", core.id(), target);
        }
        core.transition(AgentState::MovingToBase);
    }

    fn at_base(&mut self, core: &mut AgentCore, ctx: &TickContext<'_>) {
        core.transition(AgentState::AtBase);
        core.sync_knowledge(lock(ctx.dispatcher).global_map());

        if core.should_recharge_at_base(ctx.now) {
            core.begin_recharge(AgentState::RechargingPower, ctx.now);
            return;
        }
        if self.needs_refill() {
            core.begin_recharge(AgentState::RechargingResource, ctx.now);
            return;
        }

        let assignment =
            lock(ctx.dispatcher).request_assignment(core.id(), core.pos(), ctx.now, ctx.grid);
        if let Some(target) = assignment {
            self.target = Some(target);
            self.moving_ticks = 0;
            core.transition(AgentState::MovingToTarget);
            core.step_towards(target);
        }
    }

    fn move_to_target(&mut self, core: &mut AgentCore, ctx: &TickContext<'_>) {
        self.moving_ticks += 1;
        if self.moving_ticks > self.max_moving_ticks {
            debug!("Firefighter {} ran out of time reaching its target", core.id());
            self.return_to_base(core, ctx);
            return;
        }

        if self.fire_in_vision(core.pos(), ctx.grid) {
            self.suppressing_ticks = 0;
            core.transition(AgentState::Suppressing);
            self.suppress(core, ctx);
            return;
        }

        let Some(target) = self.target else {
            self.return_to_base(core, ctx);
            return;
        };
        let target_visible = core.pos().chebyshev(target) <= self.settings.vision_radius;
        if target_visible && ctx.grid.intensity(target) <= self.threshold {
            self.return_to_base(core, ctx);
            return;
        }
        core.step_towards(target);
    }

    fn keep_suppressing(&mut self, core: &mut AgentCore, ctx: &TickContext<'_>) {
        self.suppressing_ticks += 1;
        if self.suppressing_ticks > self.max_suppressing_ticks
            || !self.fire_in_vision(core.pos(), ctx.grid)
        {
            self.return_to_base(core, ctx);
            return;
        }
        self.suppress(core, ctx);
    }

    /// Spend one tick of suppressant on the cells around the firefighter
    fn suppress(&mut self, core: &mut AgentCore, ctx: &TickContext<'_>) {
        if core.needs_recharge(ctx.now) || !self.has_water_for_a_tick() {
            self.return_to_base(core, ctx);
            return;
        }
        self.water = (self.water - self.settings.water_per_tick).max(0.0);
        let report = ctx.field.suppress(
            core.pos(),
            self.settings.suppression_radius,
            self.settings.suppression_amount,
        );
        debug!(
            "Firefighter {} at {} cooled {} cells ({} extinguished), water {:.0}",
            core.id(),
            core.pos(),
            report.cells_cooled,
            report.extinguished,
            self.water
        );
    }
}

impl Behavior for Firefighter {
    fn tick(&mut self, core: &mut AgentCore, ctx: &TickContext<'_>) {
        let now = ctx.now;

        match core.state() {
            AgentState::RechargingPower => {
                if core.power_recharged(now) {
                    core.finish_recharge(now);
                }
                return;
            }
            AgentState::RechargingResource => {
                if core.recharge_elapsed(now, self.refill_duration_ms) {
                    self.water = self.settings.max_water;
                    core.transition(AgentState::AtBase);
                }
                return;
            }
            _ => {}
        }

        core.observe(ctx.grid, self.settings.vision_radius);

        let exhausted = core.needs_recharge(now) || !self.has_water_for_a_tick();
        if exhausted && !core.at_base() {
            if core.state() != AgentState::MovingToBase {
                self.return_to_base(core, ctx);
            }
            core.step_towards(core.headquarters());
            return;
        }

        match core.state() {
            AgentState::MovingToTarget => self.move_to_target(core, ctx),
            AgentState::Suppressing => self.keep_suppressing(core, ctx),
            AgentState::MovingToBase if !core.at_base() => {
                core.step_towards(core.headquarters());
                if core.at_base() {
                    core.transition(AgentState::AtBase);
                }
            }
            _ => self.at_base(core, ctx),
        }
    }

    fn resource_fraction(&self) -> Option<f32> {
        if self.settings.max_water <= 0.0 {
            return Some(0.0);
        }
        Some(self.water / self.settings.max_water)
    }

    fn target(&self) -> Option<GridPos> {
        self.target
    }
}
