//! Shared state of one simulation run and the two tick bodies

use crate::agents::{Agent, AgentType, TickContext};
use crate::clock::SimClock;
use crate::config::SimulationConfig;
use crate::core_types::{AgentId, SimMillis};
use crate::dispatcher::Dispatcher;
use crate::grid::{FireField, IntensityGrid, SpreadReport};
use crate::snapshot::{AgentSnapshot, SurvivorSnapshot};
use crate::statistics::FireStatistics;
use crate::survivor::SurvivorPopulation;
use crate::sync::{lock, read, write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

pub(crate) type AgentList = Arc<Vec<Arc<Mutex<Agent>>>>;

/// Everything both schedules touch, shared between them behind `Arc`
pub(crate) struct World {
    config: SimulationConfig,
    clock: SimClock,
    field: FireField,
    /// Replaced wholesale on insertion so ticks iterate a stable list
    agents: RwLock<AgentList>,
    dispatcher: Mutex<Dispatcher>,
    survivors: Mutex<SurvivorPopulation>,
    statistics: Mutex<FireStatistics>,
    fire_ticks: AtomicU64,
    agent_ticks: AtomicU64,
}

impl World {
    pub(crate) fn new(config: SimulationConfig) -> Self {
        let field = FireField::with_initial_fire(&config);
        let scouts: Vec<Arc<Mutex<Agent>>> = (0..config.pool.initial_scouts)
            .map(|id| Arc::new(Mutex::new(Agent::scout(id as AgentId, &config, 0))))
            .collect();

        let mut statistics = FireStatistics::new();
        statistics.record_fire(field.burning_count());

        info!(
            "World created: {}x{} grid, HQ {}, {} scouts, scenario {:?}",
            config.width,
            config.height,
            config.headquarters,
            scouts.len(),
            config.scenario.description
        );

        Self {
            clock: SimClock::new(),
            dispatcher: Mutex::new(Dispatcher::new(&config)),
            survivors: Mutex::new(SurvivorPopulation::new(&config)),
            statistics: Mutex::new(statistics),
            agents: RwLock::new(Arc::new(scouts)),
            fire_ticks: AtomicU64::new(0),
            agent_ticks: AtomicU64::new(0),
            field,
            config,
        }
    }

    pub(crate) fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> SimMillis {
        self.clock.now()
    }

    pub(crate) fn field(&self) -> &FireField {
        &self.field
    }

    pub(crate) fn dispatcher(&self) -> &Mutex<Dispatcher> {
        &self.dispatcher
    }

    pub(crate) fn fire_ticks(&self) -> u64 {
        self.fire_ticks.load(Ordering::Acquire)
    }

    pub(crate) fn agent_ticks(&self) -> u64 {
        self.agent_ticks.load(Ordering::Acquire)
    }

    /// Current agent list; later insertions do not affect the returned list
    pub(crate) fn agents(&self) -> AgentList {
        Arc::clone(&read(&self.agents))
    }

    fn add_agent(&self, agent: Agent) {
        let mut agents = write(&self.agents);
        Arc::make_mut(&mut agents).push(Arc::new(Mutex::new(agent)));
    }

    fn firefighter_count(agents: &AgentList) -> usize {
        agents
            .iter()
            .filter(|agent| lock(agent).agent_type() == AgentType::Firefighter)
            .count()
    }

    /// One fire schedule tick: spread, then refresh fire statistics
    pub(crate) fn fire_tick(&self) -> SpreadReport {
        let report = self.field.spread();
        self.fire_ticks.fetch_add(1, Ordering::AcqRel);

        let mut statistics = lock(&self.statistics);
        statistics.record_fire(report.burning_cells);
        statistics.elapsed_ms = self.clock.now();
        report
    }

    /// One agent schedule tick
    ///
    /// Advances the clock, lets the dispatcher purge and scale the pool,
    /// runs every agent in id order, then re-evaluates survivors.
    pub(crate) fn agent_tick(&self) {
        let now = self.clock.advance(self.config.agent_tick_interval_ms);
        let tick = self.agent_ticks.fetch_add(1, Ordering::AcqRel) + 1;
        let threshold = self.config.scenario.intensity_threshold;

        let grid = self.field.snapshot();
        let burning = grid.count_above(threshold);
        let live_firefighters = Self::firefighter_count(&self.agents());
        let spawned = {
            let mut dispatcher = lock(&self.dispatcher);
            dispatcher.cleanup(now, &grid);
            dispatcher.maybe_spawn_firefighter(burning, live_firefighters)
        };
        if let Some(id) = spawned {
            self.add_agent(Agent::firefighter(id, &self.config, now));
        }

        for agent in self.agents().iter() {
            // Each agent sees suppression done by the agents before it
            let grid = self.field.snapshot();
            let ctx = TickContext {
                now,
                grid: &grid,
                field: &self.field,
                dispatcher: &self.dispatcher,
            };
            lock(agent).tick(&ctx);
        }

        let grid = self.field.snapshot();
        let counts = {
            let mut survivors = lock(&self.survivors);
            survivors.maybe_spawn(now, &grid);
            survivors.update(&grid);
            survivors.counts()
        };

        let mut statistics = lock(&self.statistics);
        statistics.record_fire(grid.count_above(threshold));
        statistics.record_survivors(counts);
        statistics.elapsed_ms = now;
        debug!(
            "Agent tick {} at t={}ms: {} burning, {} survivors active",
            tick, now, statistics.current_fire_cells, statistics.active
        );
    }

    pub(crate) fn snapshot_intensity(&self) -> Arc<IntensityGrid> {
        self.field.snapshot()
    }

    pub(crate) fn snapshot_agents(&self) -> Vec<AgentSnapshot> {
        let now = self.clock.now();
        self.agents()
            .iter()
            .map(|agent| AgentSnapshot::capture(&lock(agent), now))
            .collect()
    }

    pub(crate) fn snapshot_survivors(&self) -> Vec<SurvivorSnapshot> {
        lock(&self.survivors)
            .survivors()
            .iter()
            .map(SurvivorSnapshot::from)
            .collect()
    }

    pub(crate) fn statistics(&self) -> FireStatistics {
        lock(&self.statistics).clone()
    }
}
