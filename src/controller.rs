//! The driving controller: the two rule bases used to drive the simulation,
//! expressed as data, and the glue which feeds sensor readings through them.

use crate::error::ConfigError;
use crate::fuzzy::{Antecedent, InferenceEngine, Inputs, LinguisticVariable, Outputs, Rule, Universe};
use crate::VariableId;
use log::trace;

/// The rule base a [DrivingController] is built from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuleBase {
    /// Speed, distance and visibility produce a single `action` in `[0, 100]`,
    /// low meaning brake and high meaning accelerate.
    Composite,
    /// Speed, distance, visibility and grip produce independent `brake`,
    /// `throttle` and `horn` intensities in `[0, 100]`.
    #[default]
    Split,
}

/// The crisp readings fed to the controller each tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Readings {
    /// Ego speed in km/h.
    pub speed: f64,
    /// Distance to the lead obstacle in m.
    pub distance: f64,
    /// Visibility in %.
    pub visibility: f64,
    /// Road grip in %.
    pub grip: f64,
}

/// The crisp values produced by a rule base.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlValues {
    Composite { action: f64 },
    Split { brake: f64, throttle: f64, horn: f64 },
}

/// The outputs of the controller for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlOutputs {
    pub values: ControlValues,
    /// Whether any value is a neutral fallback rather than an inferred value.
    pub fallback: bool,
}

#[derive(Clone, Copy)]
enum OutputIds {
    Composite {
        action: VariableId,
    },
    Split {
        brake: VariableId,
        throttle: VariableId,
        horn: VariableId,
    },
}

/// Feeds [Readings] through a fuzzy engine with one of the [RuleBase] layouts.
pub struct DrivingController {
    engine: InferenceEngine,
    speed: VariableId,
    distance: VariableId,
    visibility: VariableId,
    grip: Option<VariableId>,
    outputs: OutputIds,
}

impl DrivingController {
    /// Creates a controller using one of the built-in rule bases.
    pub fn new(base: RuleBase) -> Result<Self, ConfigError> {
        let engine = match base {
            RuleBase::Composite => composite_engine()?,
            RuleBase::Split => split_engine()?,
        };
        Self::with_engine(engine, base)
    }

    /// Creates a controller around a custom engine.
    ///
    /// The engine must use the variable names of the chosen layout
    /// (`speed`, `distance`, `visibility`, plus `action` for the composite
    /// layout or `grip`, `brake`, `throttle` and `horn` for the split layout),
    /// but may define its own terms and rules.
    pub fn with_engine(engine: InferenceEngine, base: RuleBase) -> Result<Self, ConfigError> {
        let id = |name: &str| {
            engine
                .id(name)
                .ok_or_else(|| ConfigError::MissingVariable(name.to_owned()))
        };
        let (grip, outputs) = match base {
            RuleBase::Composite => (
                None,
                OutputIds::Composite {
                    action: id("action")?,
                },
            ),
            RuleBase::Split => (
                Some(id("grip")?),
                OutputIds::Split {
                    brake: id("brake")?,
                    throttle: id("throttle")?,
                    horn: id("horn")?,
                },
            ),
        };
        let speed = id("speed")?;
        let distance = id("distance")?;
        let visibility = id("visibility")?;
        Ok(Self {
            engine,
            speed,
            distance,
            visibility,
            grip,
            outputs,
        })
    }

    /// The underlying engine.
    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// The layout of the controller's outputs.
    pub fn rule_base(&self) -> RuleBase {
        match self.outputs {
            OutputIds::Composite { .. } => RuleBase::Composite,
            OutputIds::Split { .. } => RuleBase::Split,
        }
    }

    /// Runs the readings through the engine.
    pub fn evaluate(&self, readings: &Readings) -> ControlOutputs {
        let mut inputs = Inputs::new();
        inputs.insert(self.speed, readings.speed);
        inputs.insert(self.distance, readings.distance);
        inputs.insert(self.visibility, readings.visibility);
        if let Some(grip) = self.grip {
            inputs.insert(grip, readings.grip);
        }

        let out = self.engine.infer(&inputs);
        let mut fallback = false;
        let mut read = |id| {
            let (value, is_fallback) = self.read(&out, id);
            fallback |= is_fallback;
            value
        };
        let values = match self.outputs {
            OutputIds::Composite { action } => ControlValues::Composite {
                action: read(action),
            },
            OutputIds::Split {
                brake,
                throttle,
                horn,
            } => ControlValues::Split {
                brake: read(brake),
                throttle: read(throttle),
                horn: read(horn),
            },
        };
        trace!("{readings:?} -> {values:?}");
        ControlOutputs { values, fallback }
    }

    fn read(&self, out: &Outputs, id: VariableId) -> (f64, bool) {
        out.get(id)
            .map(|value| (value.value, value.is_fallback()))
            .unwrap_or_else(|| (self.engine.neutral(id).unwrap_or_default(), true))
    }
}

fn is(variable: &str, term: &str) -> Antecedent {
    Antecedent::is(variable, term)
}

fn speed() -> LinguisticVariable {
    LinguisticVariable::new("speed", Universe::new(0.0, 120.0))
        .term("low", 0.0, 0.0, 50.0)
        .term("medium", 30.0, 60.0, 90.0)
        .term("high", 70.0, 120.0, 120.0)
}

fn distance() -> LinguisticVariable {
    LinguisticVariable::new("distance", Universe::new(0.0, 100.0))
        .term("short", 0.0, 0.0, 30.0)
        .term("medium", 20.0, 50.0, 80.0)
        .term("long", 60.0, 100.0, 100.0)
}

/// Low/medium/high terms over a percentage.
fn percent(name: &str) -> LinguisticVariable {
    LinguisticVariable::new(name, Universe::new(0.0, 100.0))
        .term("low", 0.0, 0.0, 40.0)
        .term("medium", 30.0, 60.0, 90.0)
        .term("high", 70.0, 100.0, 100.0)
}

/// Low/medium/high intensities of an actuator.
fn intensity(name: &str) -> LinguisticVariable {
    LinguisticVariable::new(name, Universe::new(0.0, 100.0))
        .term("low", 0.0, 0.0, 40.0)
        .term("medium", 30.0, 50.0, 70.0)
        .term("high", 60.0, 100.0, 100.0)
}

/// The rules of the composite rule base.
pub fn composite_rules() -> Vec<Rule> {
    let moving = || is("speed", "medium").or(is("speed", "high"));
    let slow = || is("speed", "low").or(is("speed", "medium"));
    vec![
        Rule::new(is("visibility", "low")).then("action", "brake"),
        Rule::new(is("distance", "short").and(moving())).then("action", "brake"),
        Rule::new(is("distance", "short").and(is("speed", "low"))).then("action", "maintain"),
        Rule::new(is("distance", "medium").and(is("speed", "high"))).then("action", "brake"),
        Rule::new(is("distance", "medium").and(is("speed", "medium"))).then("action", "maintain"),
        Rule::new(is("distance", "medium").and(is("speed", "low"))).then("action", "maintain"),
        Rule::new(is("distance", "long").and(is("visibility", "high")).and(slow()))
            .then("action", "accelerate"),
        Rule::new(is("distance", "long").and(is("visibility", "high")).and(is("speed", "high")))
            .then("action", "maintain"),
        Rule::new(is("distance", "long").and(is("visibility", "medium"))).then("action", "maintain"),
    ]
}

/// Builds the composite engine: speed, distance, visibility → action.
pub fn composite_engine() -> Result<InferenceEngine, ConfigError> {
    let action = LinguisticVariable::new("action", Universe::new(0.0, 100.0))
        .term("brake", 0.0, 0.0, 40.0)
        .term("maintain", 30.0, 50.0, 70.0)
        .term("accelerate", 60.0, 100.0, 100.0);
    InferenceEngine::builder()
        .input(speed())
        .input(distance())
        .input(percent("visibility"))
        .output(action)
        .rules(composite_rules())
        .build()
}

/// The rules of the split rule base.
pub fn split_rules() -> Vec<Rule> {
    let moving = || is("speed", "medium").or(is("speed", "high"));
    let slow = || is("speed", "low").or(is("speed", "medium"));
    let seen = || is("visibility", "medium").or(is("visibility", "high"));
    vec![
        // Braking
        Rule::new(is("visibility", "low")).then("brake", "high"),
        Rule::new(is("distance", "short").and(moving()))
            .then("brake", "high")
            .then("horn", "high"),
        Rule::new(is("distance", "short").and(is("speed", "low"))).then("brake", "medium"),
        Rule::new(is("distance", "medium").and(is("speed", "high"))).then("brake", "medium"),
        Rule::new(is("grip", "low").and(moving())).then("brake", "medium"),
        Rule::new(is("grip", "medium").and(is("speed", "high"))).then_weighted("brake", "medium", 0.6),
        Rule::new(is("grip", "high").and(is("distance", "long")).and(is("visibility", "high")))
            .then("brake", "low"),
        // Throttle
        Rule::new(is("distance", "long").and(is("visibility", "high")).and(slow())).then("throttle", "high"),
        Rule::new(is("distance", "medium").and(is("speed", "low")).and(seen())).then("throttle", "medium"),
        Rule::new(is("distance", "long").and(is("visibility", "medium")))
            .then_weighted("throttle", "medium", 0.8)
            .then("brake", "low"),
        Rule::new(is("distance", "long").and(is("visibility", "high")).and(is("speed", "high")))
            .then("throttle", "low")
            .then("brake", "low"),
        Rule::new(is("distance", "medium").and(is("speed", "medium")).and(seen()))
            .then("throttle", "low")
            .then("brake", "low"),
        // Horn
        Rule::new(is("distance", "medium").or(is("distance", "long")).and(seen())).then("horn", "low"),
        Rule::new(is("distance", "short").and(is("visibility", "low"))).then_weighted("horn", "high", 0.8),
    ]
}

/// Builds the split engine: speed, distance, visibility, grip → brake, throttle, horn.
/// Outputs which no rule concludes on rest at zero.
pub fn split_engine() -> Result<InferenceEngine, ConfigError> {
    InferenceEngine::builder()
        .input(speed())
        .input(distance())
        .input(percent("visibility"))
        .input(percent("grip"))
        .output_with_neutral(intensity("brake"), 0.0)
        .output_with_neutral(intensity("throttle"), 0.0)
        .output_with_neutral(intensity("horn"), 0.0)
        .rules(split_rules())
        .build()
}
