//! Maps crisp controller outputs to discrete driving actions.

use crate::controller::{ControlOutputs, ControlValues};
use std::fmt;

/// A composite action below this value brakes.
const BRAKE_BELOW: f64 = 35.0;

/// A composite action above this value accelerates.
const ACCELERATE_ABOVE: f64 = 65.0;

/// How far brake and throttle must differ for one of them to win.
const DOMINANCE_MARGIN: f64 = 10.0;

/// The horn sounds while its intensity is above this value.
const HORN_ABOVE: f64 = 60.0;

/// A discrete driving action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    Brake,
    Accelerate,
    Maintain,
}

impl Action {
    /// The tag of the action as written to logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Brake => "BRAKE",
            Self::Accelerate => "ACCELERATE",
            Self::Maintain => "MAINTAIN",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The decision taken on one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecisionOutput {
    /// The chosen action.
    pub action: Action,
    /// Whether the horn sounds.
    pub horn: bool,
    /// The crisp values the decision was taken from.
    pub values: ControlValues,
    /// Whether any of the values is a neutral fallback.
    pub fallback: bool,
}

impl DecisionOutput {
    /// The decision in force before the first tick.
    pub fn idle() -> Self {
        Self {
            action: Action::Maintain,
            horn: false,
            values: ControlValues::Composite { action: 50.0 },
            fallback: true,
        }
    }

    /// Whether the brake lights are lit.
    pub fn brake_light(&self) -> bool {
        self.action == Action::Brake
    }
}

/// Maps controller outputs to a decision.
pub fn decide(outputs: &ControlOutputs) -> DecisionOutput {
    let (action, horn) = match outputs.values {
        ControlValues::Composite { action } => (composite_action(action), false),
        ControlValues::Split {
            brake,
            throttle,
            horn,
        } => (split_action(brake, throttle), horn > HORN_ABOVE),
    };
    DecisionOutput {
        action,
        horn,
        values: outputs.values,
        fallback: outputs.fallback,
    }
}

fn composite_action(action: f64) -> Action {
    if action < BRAKE_BELOW {
        Action::Brake
    } else if action > ACCELERATE_ABOVE {
        Action::Accelerate
    } else {
        Action::Maintain
    }
}

fn split_action(brake: f64, throttle: f64) -> Action {
    if brake > throttle + DOMINANCE_MARGIN {
        Action::Brake
    } else if throttle > brake + DOMINANCE_MARGIN {
        Action::Accelerate
    } else {
        Action::Maintain
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn composite(action: f64) -> DecisionOutput {
        decide(&ControlOutputs {
            values: ControlValues::Composite { action },
            fallback: false,
        })
    }

    fn split(brake: f64, throttle: f64, horn: f64) -> DecisionOutput {
        decide(&ControlOutputs {
            values: ControlValues::Split {
                brake,
                throttle,
                horn,
            },
            fallback: false,
        })
    }

    #[test]
    fn composite_dead_band_maintains() {
        for i in 1..300 {
            let action = 35.0 + 0.1 * i as f64;
            if action < 65.0 {
                assert_eq!(composite(action).action, Action::Maintain, "{action}");
            }
        }
        assert_eq!(composite(35.0).action, Action::Maintain);
        assert_eq!(composite(65.0).action, Action::Maintain);
    }

    #[test]
    fn composite_thresholds() {
        assert_eq!(composite(34.9).action, Action::Brake);
        assert_eq!(composite(0.0).action, Action::Brake);
        assert_eq!(composite(65.1).action, Action::Accelerate);
        assert_eq!(composite(100.0).action, Action::Accelerate);
        assert!(!composite(0.0).horn);
        assert!(composite(10.0).brake_light());
    }

    #[test]
    fn split_needs_a_clear_margin() {
        assert_eq!(split(80.0, 20.0, 0.0).action, Action::Brake);
        assert_eq!(split(20.0, 80.0, 0.0).action, Action::Accelerate);
        assert_eq!(split(50.0, 45.0, 0.0).action, Action::Maintain);
        assert_eq!(split(40.0, 50.0, 0.0).action, Action::Maintain);
        assert_eq!(split(50.1, 40.0, 0.0).action, Action::Brake);
    }

    #[test]
    fn horn_is_level_triggered() {
        assert!(split(0.0, 0.0, 60.5).horn);
        assert!(!split(0.0, 0.0, 60.0).horn);
        assert!(split(0.0, 0.0, 99.0).horn);
        assert!(!split(0.0, 0.0, 10.0).horn);
    }

    #[test]
    fn tags() {
        assert_eq!(Action::Brake.to_string(), "BRAKE");
        assert_eq!(Action::Accelerate.tag(), "ACCELERATE");
        assert_eq!(DecisionOutput::idle().action, Action::Maintain);
    }
}
