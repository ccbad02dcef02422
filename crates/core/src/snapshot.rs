//! Read-only views handed to renderers and status displays

use crate::agents::{Agent, AgentState, AgentType};
use crate::core_types::{AgentId, SimMillis};
use crate::survivor::{Survivor, SurvivorStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub kind: AgentType,
    pub x: i32,
    pub y: i32,
    pub state: AgentState,
    /// Battery level in percent; recharge progress while recharging power
    pub energy_pct: f32,
    /// Suppressant level in percent, for agents that carry any
    pub resource_pct: Option<f32>,
}

impl AgentSnapshot {
    pub fn capture(agent: &Agent, now: SimMillis) -> Self {
        let core = agent.core();
        Self {
            id: agent.id(),
            kind: agent.agent_type(),
            x: core.pos().x,
            y: core.pos().y,
            state: core.state(),
            energy_pct: core.energy_fraction(now) * 100.0,
            resource_pct: agent.resource_fraction().map(|f| f * 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivorSnapshot {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub status: SurvivorStatus,
}

impl From<&Survivor> for SurvivorSnapshot {
    fn from(survivor: &Survivor) -> Self {
        Self {
            id: survivor.id,
            x: survivor.pos.x,
            y: survivor.pos.y,
            status: survivor.status,
        }
    }
}
