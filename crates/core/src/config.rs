//! Simulation configuration
//!
//! A [`SimulationConfig`] is built once per run, validated, and then passed by
//! reference to every component. Nothing in the crate reads global constants;
//! headquarters position, thresholds and timers all come from here.

use crate::core_types::{GridPos, SimMillis};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Fire scenario parameters
///
/// Presets mirror common fire classes; all values are in abstract intensity
/// units on the `[0, max_intensity]` scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireScenario {
    /// Upper bound for every cell
    pub max_intensity: f32,
    /// Intensity of freshly injected ignition points (scaled 80-100%)
    pub initial_intensity: f32,
    /// A cell is burning iff its intensity is strictly above this
    pub intensity_threshold: f32,
    /// Per-neighbor ignition probability for each burning cell and fire tick
    pub spread_probability: f64,
    /// Human-readable summary
    pub description: String,
}

impl FireScenario {
    /// Electrical fire: high intensity, fast spread
    pub fn electrical() -> Self {
        Self {
            max_intensity: 120.0,
            initial_intensity: 90.0,
            intensity_threshold: 10.0,
            spread_probability: 0.4,
            description: "Electrical fire: high intensity, fast spread".to_string(),
        }
    }

    /// Chemical fire: very high intensity, moderate spread
    pub fn chemical() -> Self {
        Self {
            max_intensity: 150.0,
            initial_intensity: 100.0,
            intensity_threshold: 15.0,
            spread_probability: 0.35,
            description: "Chemical fire: very high intensity, moderate spread".to_string(),
        }
    }

    /// Ordinary combustibles: medium intensity, moderate spread
    pub fn ordinary() -> Self {
        Self {
            max_intensity: 100.0,
            initial_intensity: 80.0,
            intensity_threshold: 10.0,
            spread_probability: 0.3,
            description: "Ordinary fire: medium intensity, moderate spread".to_string(),
        }
    }

    /// Smoldering fire: low intensity, slow spread
    pub fn smoldering() -> Self {
        Self {
            max_intensity: 80.0,
            initial_intensity: 60.0,
            intensity_threshold: 5.0,
            spread_probability: 0.2,
            description: "Smoldering fire: low intensity, slow spread".to_string(),
        }
    }

    /// Look up a preset by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "electrical" => Some(Self::electrical()),
            "chemical" => Some(Self::chemical()),
            "ordinary" => Some(Self::ordinary()),
            "smoldering" | "smouldering" => Some(Self::smoldering()),
            _ => None,
        }
    }

    /// Whether an intensity value counts as burning under this scenario
    #[inline]
    pub fn is_burning(&self, intensity: f32) -> bool {
        intensity > self.intensity_threshold
    }
}

impl Default for FireScenario {
    fn default() -> Self {
        Self::ordinary()
    }
}

/// Fire-tick dynamics that are independent of the scenario class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireDynamics {
    /// Chance per tick that a burning cell grows stronger (0 disables)
    pub reinforce_probability: f64,
    /// Upper bound of the random reinforcement delta
    pub reinforce_max_delta: f32,
    /// Random placements tried when re-igniting an extinguished field
    pub ignition_attempts: u32,
    /// Ignition points placed when the simulation is (re)initialized
    pub initial_ignitions: u32,
}

impl Default for FireDynamics {
    fn default() -> Self {
        Self {
            reinforce_probability: 0.1,
            reinforce_max_delta: 5.0,
            ignition_attempts: 10,
            initial_ignitions: 1,
        }
    }
}

/// Agent pool bounds and shared state-machine limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPoolConfig {
    /// Scouts created at start
    pub initial_scouts: usize,
    /// Upper bound on scouts plus firefighters
    pub max_robots: usize,
    /// Burning cells each firefighter is expected to cover (K)
    pub burning_cells_per_firefighter: usize,
    /// Remaining energy fraction at which an agent heads home
    pub energy_low_water_pct: f32,
    /// Energy fraction at or below which an agent at headquarters recharges
    /// instead of setting out
    pub departure_reserve_pct: f32,
    /// Tick budget for moving towards a target
    pub max_task_ticks: u32,
    /// Tick budget for a single suppression run
    pub max_suppression_ticks: u32,
}

impl Default for AgentPoolConfig {
    fn default() -> Self {
        Self {
            initial_scouts: 2,
            max_robots: 7,
            burning_cells_per_firefighter: 10,
            energy_low_water_pct: 0.0,
            departure_reserve_pct: 0.25,
            max_task_ticks: 60,
            max_suppression_ticks: 40,
        }
    }
}

/// Timers, in simulated milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Operating time a full battery lasts
    pub operation_timeout_ms: SimMillis,
    /// Time spent at headquarters recharging power
    pub recharge_duration_ms: SimMillis,
    /// Time spent at headquarters refilling suppressant
    pub resource_refill_duration_ms: SimMillis,
    /// Age after which an unconfirmed sighting is dropped
    pub report_expiration_ms: SimMillis,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: 3000,
            recharge_duration_ms: 2000,
            resource_refill_duration_ms: 2000,
            report_expiration_ms: 10_000,
        }
    }
}

/// Scout exploration tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutConfig {
    pub vision_radius: i32,
    /// Chance per tick to abandon the current target early
    pub target_change_probability: f64,
    /// Chance to re-visit a known fire instead of exploring
    pub recheck_probability: f64,
    /// Minimum age of a known fire before it is re-visited
    pub recheck_interval_ms: SimMillis,
    /// Random cells sampled when choosing an exploration target
    pub target_candidates: usize,
    /// Radius of the unexplored-cell count around a candidate
    pub unexplored_radius: i32,
    /// Recent targets remembered for the proximity penalty
    pub max_previous_targets: usize,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            vision_radius: 5,
            target_change_probability: 0.05,
            recheck_probability: 0.5,
            recheck_interval_ms: 5000,
            target_candidates: 20,
            unexplored_radius: 2,
            max_previous_targets: 5,
        }
    }
}

/// Firefighter suppression tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirefighterConfig {
    /// Radius within which a burning cell triggers suppression
    pub vision_radius: i32,
    pub suppression_radius: i32,
    /// Intensity removed at distance 1, decaying linearly outwards
    pub suppression_amount: f32,
    pub max_water: f32,
    /// Water consumed per suppression tick
    pub water_per_tick: f32,
    /// Refill at headquarters when water drops below this fraction
    pub refill_fraction: f32,
}

impl Default for FirefighterConfig {
    fn default() -> Self {
        Self {
            vision_radius: 3,
            suppression_radius: 10,
            suppression_amount: 35.0,
            max_water: 100.0,
            water_per_tick: 15.0,
            refill_fraction: 0.5,
        }
    }
}

/// Survivor spawning and status thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivorConfig {
    pub count: usize,
    /// Simulated time after start at which survivors appear
    pub spawn_delay_ms: SimMillis,
    /// Intensity at or above which a survivor dies
    pub death_threshold: f32,
    /// Intensity at or below which a survivor counts as rescued
    pub rescue_threshold: f32,
}

impl Default for SurvivorConfig {
    fn default() -> Self {
        Self {
            count: 5,
            spawn_delay_ms: 5000,
            death_threshold: 95.0,
            rescue_threshold: 10.0,
        }
    }
}

/// Complete configuration for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub width: usize,
    pub height: usize,
    pub headquarters: GridPos,
    /// No ignition is injected within this distance of headquarters
    pub safe_radius: f32,
    pub scenario: FireScenario,
    pub fire: FireDynamics,
    pub pool: AgentPoolConfig,
    pub timers: TimerConfig,
    pub scout: ScoutConfig,
    pub firefighter: FirefighterConfig,
    pub survivor: SurvivorConfig,
    /// Real-time period of the fire schedule
    pub fire_tick_interval_ms: u64,
    /// Real-time period of the agent schedule; also the simulated time per agent tick
    pub agent_tick_interval_ms: u64,
    /// Master seed, `reset()` replays the same initial state from it
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 24,
            height: 24,
            headquarters: GridPos::new(12, 12),
            safe_radius: 4.0,
            scenario: FireScenario::default(),
            fire: FireDynamics::default(),
            pool: AgentPoolConfig::default(),
            timers: TimerConfig::default(),
            scout: ScoutConfig::default(),
            firefighter: FirefighterConfig::default(),
            survivor: SurvivorConfig::default(),
            fire_tick_interval_ms: 800,
            agent_tick_interval_ms: 400,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Default configuration using the given scenario, with survivor
    /// thresholds rescaled to the scenario's intensity range
    pub fn with_scenario(scenario: FireScenario) -> Self {
        let survivor = SurvivorConfig {
            death_threshold: scenario.max_intensity * 0.95,
            rescue_threshold: scenario.intensity_threshold,
            ..SurvivorConfig::default()
        };
        Self {
            scenario,
            survivor,
            ..Self::default()
        }
    }

    /// Whether `pos` lies on the grid
    #[inline]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Largest number of firefighters the pool allows
    pub fn max_firefighters(&self) -> usize {
        self.pool.max_robots.saturating_sub(self.pool.initial_scouts)
    }

    /// Check every parameter for consistency
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if !self.in_bounds(self.headquarters) {
            return Err(ConfigError::HeadquartersOutOfBounds {
                x: self.headquarters.x,
                y: self.headquarters.y,
            });
        }

        let scenario = &self.scenario;
        for (name, value) in [
            ("max_intensity", scenario.max_intensity),
            ("initial_intensity", scenario.initial_intensity),
            ("intensity_threshold", scenario.intensity_threshold),
            ("reinforce_max_delta", self.fire.reinforce_max_delta),
            ("safe_radius", self.safe_radius),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidIntensity { name, value });
            }
        }
        if scenario.intensity_threshold >= scenario.max_intensity {
            return Err(ConfigError::InvalidIntensity {
                name: "intensity_threshold",
                value: scenario.intensity_threshold,
            });
        }
        if scenario.initial_intensity <= scenario.intensity_threshold
            || scenario.initial_intensity > scenario.max_intensity
        {
            return Err(ConfigError::InvalidIntensity {
                name: "initial_intensity",
                value: scenario.initial_intensity,
            });
        }

        for (name, value) in [
            ("spread_probability", scenario.spread_probability),
            ("reinforce_probability", self.fire.reinforce_probability),
            ("target_change_probability", self.scout.target_change_probability),
            ("recheck_probability", self.scout.recheck_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }

        for (name, value) in [
            ("fire_tick_interval_ms", self.fire_tick_interval_ms),
            ("agent_tick_interval_ms", self.agent_tick_interval_ms),
            ("operation_timeout_ms", self.timers.operation_timeout_ms),
            ("recharge_duration_ms", self.timers.recharge_duration_ms),
            (
                "resource_refill_duration_ms",
                self.timers.resource_refill_duration_ms,
            ),
            ("report_expiration_ms", self.timers.report_expiration_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration { name });
            }
        }

        if self.pool.max_robots < self.pool.initial_scouts {
            return Err(ConfigError::RobotPoolTooSmall {
                initial_scouts: self.pool.initial_scouts,
                max_robots: self.pool.max_robots,
            });
        }
        if self.pool.burning_cells_per_firefighter == 0 {
            return Err(ConfigError::NonPositive {
                name: "burning_cells_per_firefighter",
            });
        }
        if !(0.0..1.0).contains(&self.pool.energy_low_water_pct) {
            return Err(ConfigError::InvalidFraction {
                name: "energy_low_water_pct",
                value: self.pool.energy_low_water_pct,
            });
        }
        if !(self.pool.energy_low_water_pct..1.0).contains(&self.pool.departure_reserve_pct) {
            return Err(ConfigError::InvalidFraction {
                name: "departure_reserve_pct",
                value: self.pool.departure_reserve_pct,
            });
        }
        let firefighter = &self.firefighter;
        for (name, value) in [
            ("max_water", firefighter.max_water),
            ("water_per_tick", firefighter.water_per_tick),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { name });
            }
        }
        if firefighter.water_per_tick > firefighter.max_water {
            return Err(ConfigError::TankTooSmall {
                max_water: firefighter.max_water,
                water_per_tick: firefighter.water_per_tick,
            });
        }
        if !(0.0..=1.0).contains(&firefighter.refill_fraction) {
            return Err(ConfigError::InvalidFraction {
                name: "refill_fraction",
                value: firefighter.refill_fraction,
            });
        }
        if self.firefighter.suppression_radius < 0 || self.scout.vision_radius < 0 {
            return Err(ConfigError::NonPositive {
                name: "vision and suppression radii",
            });
        }
        if self.survivor.death_threshold <= self.survivor.rescue_threshold {
            return Err(ConfigError::InvertedSurvivorThresholds {
                rescue: self.survivor.rescue_threshold,
                death: self.survivor.death_threshold,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_presets_are_valid() {
        for name in ["electrical", "chemical", "ordinary", "smoldering"] {
            let scenario = FireScenario::from_name(name).unwrap();
            let config = SimulationConfig::with_scenario(scenario);
            assert_eq!(config.validate(), Ok(()), "preset {name}");
        }
        assert!(FireScenario::from_name("plasma").is_none());
        assert_eq!(
            FireScenario::from_name("CHEMICAL"),
            Some(FireScenario::chemical())
        );
    }

    #[test]
    fn test_burning_is_strictly_above_threshold() {
        let scenario = FireScenario::ordinary();
        assert!(!scenario.is_burning(10.0));
        assert!(scenario.is_burning(10.01));
    }

    #[test]
    fn test_rejects_empty_grid() {
        let config = SimulationConfig {
            width: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn test_rejects_headquarters_off_grid() {
        let config = SimulationConfig {
            headquarters: GridPos::new(30, 2),
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::HeadquartersOutOfBounds { x: 30, y: 2 })
        );
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut config = SimulationConfig::default();
        config.scenario.spread_probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability {
                name: "spread_probability",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_small_pool() {
        let mut config = SimulationConfig::default();
        config.pool.initial_scouts = 8;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RobotPoolTooSmall { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_timer() {
        let mut config = SimulationConfig::default();
        config.timers.report_expiration_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration {
                name: "report_expiration_ms"
            })
        );
    }

    #[test]
    fn test_rejects_unusable_water_settings() {
        for water_per_tick in [0.0, -5.0, f32::NAN] {
            let mut config = SimulationConfig::default();
            config.firefighter.water_per_tick = water_per_tick;
            assert_eq!(
                config.validate(),
                Err(ConfigError::NonPositive {
                    name: "water_per_tick"
                })
            );
        }

        let mut config = SimulationConfig::default();
        config.firefighter.water_per_tick = 150.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TankTooSmall { .. })
        ));

        let mut config = SimulationConfig::default();
        config.firefighter.refill_fraction = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFraction {
                name: "refill_fraction",
                ..
            })
        ));
    }

    #[test]
    fn test_departure_reserve_is_not_below_low_water() {
        let mut config = SimulationConfig::default();
        config.pool.energy_low_water_pct = 0.3;
        config.pool.departure_reserve_pct = 0.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFraction {
                name: "departure_reserve_pct",
                ..
            })
        ));
    }

    #[test]
    fn test_max_firefighters() {
        let config = SimulationConfig::default();
        assert_eq!(config.max_firefighters(), 5);
    }
}
