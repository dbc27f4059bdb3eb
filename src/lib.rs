pub use controller::{ControlOutputs, ControlValues, DrivingController, Readings, RuleBase};
pub use decision::{decide, Action, DecisionOutput};
pub use environment::{DayCycle, EnvironmentConfig, Weather};
pub use error::ConfigError;
pub use kinematics::{ObstacleConfig, SpeedConfig};
pub use random::RandomSource;
pub use simulation::{DemoConfig, Simulation, SimulationConfig};
use slotmap::new_key_type;
pub use slotmap::{Key, KeyData};
pub use state::{Controls, Lane, LogRecord, SimulationState};
pub use util::Interval;

pub mod controller;
mod decision;
pub mod environment;
mod error;
pub mod fuzzy;
pub mod kinematics;
mod random;
mod simulation;
pub mod state;
mod util;

new_key_type! {
    /// Unique ID of a [fuzzy::LinguisticVariable] within an engine.
    pub struct VariableId;
}
