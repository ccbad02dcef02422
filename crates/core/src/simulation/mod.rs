//! Simulation lifecycle and read-only views
//!
//! [`Simulation`] owns one run: the fire field, agents, dispatcher and
//! survivors, plus the scheduler that drives them in real time. It can also
//! be stepped by hand, which is deterministic for a given seed.

mod scheduler;
mod world;

use self::scheduler::Scheduler;
use self::world::World;
use crate::config::SimulationConfig;
use crate::core_types::SimMillis;
use crate::dispatcher::Dispatcher;
use crate::error::ConfigError;
use crate::grid::{FireField, IntensityGrid, SpreadReport};
use crate::snapshot::{AgentSnapshot, SurvivorSnapshot};
use crate::statistics::FireStatistics;
use crate::sync::lock;
use std::io;
use std::sync::Arc;
use tracing::info;

/// One emergency-response simulation run
pub struct Simulation {
    config: SimulationConfig,
    world: Arc<World>,
    scheduler: Option<Scheduler>,
    /// Simulated time since the last fire tick when stepping by hand
    fire_backlog_ms: SimMillis,
}

impl Simulation {
    /// Validate `config` and build the initial state
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] found by [`SimulationConfig::validate`].
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            world: Arc::new(World::new(config.clone())),
            config,
            scheduler: None,
            fire_backlog_ms: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current simulated time
    pub fn now(&self) -> SimMillis {
        self.world.now()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Start both schedules; no-op when already running
    ///
    /// # Errors
    ///
    /// Returns the OS error when a tick thread cannot be spawned. The
    /// simulation is then left stopped with no schedule running.
    pub fn start(&mut self) -> io::Result<()> {
        if self.scheduler.is_none() {
            self.scheduler = Some(Scheduler::start(&self.world)?);
        }
        Ok(())
    }

    /// Halt both schedules after their in-flight ticks; no-op when stopped
    ///
    /// Returns whether the simulation was running.
    pub fn stop(&mut self) -> bool {
        match self.scheduler.take() {
            Some(scheduler) => {
                scheduler.stop();
                true
            }
            None => false,
        }
    }

    /// Rebuild all state from the configuration, resuming if it was running
    ///
    /// # Errors
    ///
    /// Returns the error from [`Simulation::start`] when resuming fails; the
    /// state is reset either way.
    pub fn reset(&mut self) -> io::Result<()> {
        let was_running = self.stop();
        self.world = Arc::new(World::new(self.config.clone()));
        self.fire_backlog_ms = 0;
        info!("Simulation reset (seed {})", self.config.seed);
        if was_running {
            self.start()?;
        }
        Ok(())
    }

    /// Run a single fire tick by hand
    pub fn fire_tick(&self) -> SpreadReport {
        self.world.fire_tick()
    }

    /// Run a single agent tick by hand
    pub fn agent_tick(&self) {
        self.world.agent_tick();
    }

    /// Step both schedules by hand for `duration_ms` of simulated time
    ///
    /// Agent ticks run back to back; a fire tick follows whenever a full
    /// fire interval has accumulated.
    pub fn advance(&mut self, duration_ms: SimMillis) {
        let agent_step = self.config.agent_tick_interval_ms.max(1);
        let fire_step = self.config.fire_tick_interval_ms.max(1);
        let end = self.world.now() + duration_ms;
        while self.world.now() < end {
            self.world.agent_tick();
            self.fire_backlog_ms += agent_step;
            while self.fire_backlog_ms >= fire_step {
                self.world.fire_tick();
                self.fire_backlog_ms -= fire_step;
            }
        }
    }

    /// Number of fire and agent ticks run so far
    pub fn tick_counts(&self) -> (u64, u64) {
        (self.world.fire_ticks(), self.world.agent_ticks())
    }

    /// Copy of the intensity grid, safe to read while ticks run
    pub fn snapshot_intensity(&self) -> Arc<IntensityGrid> {
        self.world.snapshot_intensity()
    }

    pub fn snapshot_agents(&self) -> Vec<AgentSnapshot> {
        self.world.snapshot_agents()
    }

    pub fn snapshot_survivors(&self) -> Vec<SurvivorSnapshot> {
        self.world.snapshot_survivors()
    }

    pub fn statistics(&self) -> FireStatistics {
        self.world.statistics()
    }

    /// Live fire field, for seeding scenarios by hand
    pub fn field(&self) -> &FireField {
        self.world.field()
    }

    /// Inspect the dispatcher under its lock
    pub fn with_dispatcher<R>(&self, f: impl FnOnce(&Dispatcher) -> R) -> R {
        f(&lock(self.world.dispatcher()))
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop();
    }
}
