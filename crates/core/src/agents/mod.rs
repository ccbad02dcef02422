//! Autonomous robots: scouts that find fire and firefighters that put it out
//!
//! Every agent is an [`AgentCore`] (position, energy, local knowledge and the
//! lifecycle state) plus a kind-specific [`Behavior`]. Agents never hold the
//! fire grid; each tick they read an immutable snapshot and write through the
//! [`FireField`].

mod common;
mod firefighter;
mod scout;

pub use common::{AgentCore, AgentState};
pub use firefighter::Firefighter;
pub use scout::Scout;

use crate::config::SimulationConfig;
use crate::core_types::{AgentId, GridPos, SimMillis};
use crate::dispatcher::Dispatcher;
use crate::grid::{FireField, IntensityGrid};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Everything an agent may consult or touch during one tick
pub struct TickContext<'a> {
    /// Simulated time of this tick
    pub now: SimMillis,
    /// Grid state at the start of this agent's tick
    pub grid: &'a IntensityGrid,
    /// Live fire field, written by suppression
    pub field: &'a FireField,
    pub dispatcher: &'a Mutex<Dispatcher>,
}

/// Kind-specific decision logic run once per agent tick
pub trait Behavior {
    /// Advance the agent's state machine by one tick
    fn tick(&mut self, core: &mut AgentCore, ctx: &TickContext<'_>);

    /// Fraction of carried suppressant left, for kinds that carry any
    fn resource_fraction(&self) -> Option<f32> {
        None
    }

    /// Current movement goal, if any
    fn target(&self) -> Option<GridPos>;
}

/// Agent kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    Scout,
    Firefighter,
}

/// Kind-specific agent state
#[derive(Debug, Clone)]
pub enum AgentKind {
    Scout(Scout),
    Firefighter(Firefighter),
}

/// One robot in the field
#[derive(Debug, Clone)]
pub struct Agent {
    core: AgentCore,
    kind: AgentKind,
}

impl Agent {
    /// New scout at headquarters
    pub fn scout(id: AgentId, config: &SimulationConfig, now: SimMillis) -> Self {
        Self {
            core: AgentCore::new(id, config, now),
            kind: AgentKind::Scout(Scout::new(id, config)),
        }
    }

    /// New firefighter at headquarters with a full tank
    pub fn firefighter(id: AgentId, config: &SimulationConfig, now: SimMillis) -> Self {
        Self {
            core: AgentCore::new(id, config, now),
            kind: AgentKind::Firefighter(Firefighter::new(config)),
        }
    }

    pub fn id(&self) -> AgentId {
        self.core.id()
    }

    pub fn agent_type(&self) -> AgentType {
        match self.kind {
            AgentKind::Scout(_) => AgentType::Scout,
            AgentKind::Firefighter(_) => AgentType::Firefighter,
        }
    }

    pub fn core(&self) -> &AgentCore {
        &self.core
    }

    fn behavior(&self) -> &dyn Behavior {
        match &self.kind {
            AgentKind::Scout(scout) => scout,
            AgentKind::Firefighter(firefighter) => firefighter,
        }
    }

    /// Run one tick of this agent's behavior
    pub fn tick(&mut self, ctx: &TickContext<'_>) {
        let behavior: &mut dyn Behavior = match &mut self.kind {
            AgentKind::Scout(scout) => scout,
            AgentKind::Firefighter(firefighter) => firefighter,
        };
        behavior.tick(&mut self.core, ctx);
    }

    pub fn resource_fraction(&self) -> Option<f32> {
        self.behavior().resource_fraction()
    }

    pub fn target(&self) -> Option<GridPos> {
        self.behavior().target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agents_start_at_headquarters() {
        let config = SimulationConfig::default();
        let scout = Agent::scout(0, &config, 0);
        let firefighter = Agent::firefighter(2, &config, 0);

        assert_eq!(scout.agent_type(), AgentType::Scout);
        assert_eq!(firefighter.agent_type(), AgentType::Firefighter);
        assert_eq!(scout.core().pos(), config.headquarters);
        assert_eq!(firefighter.core().state(), AgentState::AtBase);
        assert_eq!(scout.resource_fraction(), None);
        assert_eq!(firefighter.resource_fraction(), Some(1.0));
    }
}
