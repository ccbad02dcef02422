//! Configuration errors.
//!
//! Running simulations never fail: every abnormal runtime condition degrades
//! to a safe default. The only fallible step is validating a
//! [`SimulationConfig`](crate::config::SimulationConfig) before a simulation
//! is built from it.

/// Reason a [`SimulationConfig`](crate::config::SimulationConfig) was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid width or height is zero
    EmptyGrid { width: usize, height: usize },
    /// Headquarters does not lie on the grid
    HeadquartersOutOfBounds { x: i32, y: i32 },
    /// Intensity parameters are non-finite or inconsistent
    InvalidIntensity { name: &'static str, value: f32 },
    /// A probability is outside [0, 1]
    InvalidProbability { name: &'static str, value: f64 },
    /// A timer or tick interval is zero
    ZeroDuration { name: &'static str },
    /// The robot pool cannot hold the initial scouts
    RobotPoolTooSmall { initial_scouts: usize, max_robots: usize },
    /// A positive count or amount was required
    NonPositive { name: &'static str },
    /// A fraction is outside its allowed range
    InvalidFraction { name: &'static str, value: f32 },
    /// One suppression tick needs more water than the tank holds
    TankTooSmall { max_water: f32, water_per_tick: f32 },
    /// Survivor death threshold is not above the rescue threshold
    InvertedSurvivorThresholds { rescue: f32, death: f32 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyGrid { width, height } => {
                write!(f, "grid must be non-empty, got {width}x{height}")
            }
            Self::HeadquartersOutOfBounds { x, y } => {
                write!(f, "headquarters ({x}, {y}) lies outside the grid")
            }
            Self::InvalidIntensity { name, value } => {
                write!(f, "intensity parameter {name} is invalid: {value}")
            }
            Self::InvalidProbability { name, value } => {
                write!(f, "probability {name} must be within [0, 1], got {value}")
            }
            Self::ZeroDuration { name } => write!(f, "{name} must be greater than zero"),
            Self::RobotPoolTooSmall {
                initial_scouts,
                max_robots,
            } => write!(
                f,
                "max_robots ({max_robots}) cannot hold {initial_scouts} initial scouts"
            ),
            Self::NonPositive { name } => write!(f, "{name} must be positive"),
            Self::InvalidFraction { name, value } => {
                write!(f, "fraction {name} is out of range: {value}")
            }
            Self::TankTooSmall {
                max_water,
                water_per_tick,
            } => write!(
                f,
                "water_per_tick ({water_per_tick}) exceeds max_water ({max_water})"
            ),
            Self::InvertedSurvivorThresholds { rescue, death } => write!(
                f,
                "survivor death threshold ({death}) must exceed rescue threshold ({rescue})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
