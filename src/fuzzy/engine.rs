use super::rule::{CompiledRule, Rule};
use super::variable::{Degrees, LinguisticVariable};
use crate::error::ConfigError;
use crate::VariableId;
use log::{debug, warn};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashMap;

/// Crisp values for the input variables of an engine.
pub type Inputs = SecondaryMap<VariableId, f64>;

/// Whether a variable is supplied by the caller or produced by inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    Input,
    Output,
}

/// How a crisp output value was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputStatus {
    /// The centroid of the aggregated output set.
    Inferred,
    /// No rule concluding on this output fired; the neutral value was used.
    NoRuleFired,
    /// An input was missing or not finite; the neutral value was used.
    InvalidInput,
}

/// A crisp output value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputValue {
    pub value: f64,
    pub status: OutputStatus,
}

impl OutputValue {
    /// Whether the value is the neutral fallback rather than an inferred value.
    pub fn is_fallback(&self) -> bool {
        self.status != OutputStatus::Inferred
    }
}

/// The crisp values of the output variables of an engine.
#[derive(Clone, Debug, Default)]
pub struct Outputs(SecondaryMap<VariableId, OutputValue>);

impl Outputs {
    /// Gets the output value of a variable.
    pub fn get(&self, id: VariableId) -> Option<OutputValue> {
        self.0.get(id).copied()
    }

    /// Gets the crisp value of a variable.
    pub fn value(&self, id: VariableId) -> Option<f64> {
        self.0.get(id).map(|out| out.value)
    }

    /// Returns an iterator over all output values.
    pub fn iter(&self) -> impl Iterator<Item = (VariableId, OutputValue)> + '_ {
        self.0.iter().map(|(id, out)| (id, *out))
    }
}

struct Slot {
    variable: LinguisticVariable,
    role: Role,
}

/// The sampled universe and term curves of an output variable.
struct OutputShape {
    neutral: f64,
    samples: Vec<f64>,
    curves: Vec<Vec<f64>>,
}

/// A Mamdani fuzzy inference engine.
///
/// Variables and rules are fixed when the engine is built; inference is a
/// pure function of the crisp inputs, so one engine may be shared freely.
pub struct InferenceEngine {
    variables: SlotMap<VariableId, Slot>,
    names: HashMap<String, VariableId>,
    inputs: Vec<VariableId>,
    outputs: Vec<VariableId>,
    shapes: SecondaryMap<VariableId, OutputShape>,
    rules: Vec<Rule>,
    compiled: Vec<CompiledRule>,
}

/// Collects the variables and rules of an [InferenceEngine].
#[derive(Default)]
pub struct EngineBuilder {
    inputs: Vec<LinguisticVariable>,
    outputs: Vec<(LinguisticVariable, Option<f64>)>,
    rules: Vec<Rule>,
}

impl EngineBuilder {
    /// Adds an input variable.
    pub fn input(mut self, variable: LinguisticVariable) -> Self {
        self.inputs.push(variable);
        self
    }

    /// Adds an output variable whose neutral value is the midpoint of its universe.
    pub fn output(mut self, variable: LinguisticVariable) -> Self {
        self.outputs.push((variable, None));
        self
    }

    /// Adds an output variable with an explicit neutral value.
    pub fn output_with_neutral(mut self, variable: LinguisticVariable, neutral: f64) -> Self {
        self.outputs.push((variable, Some(neutral)));
        self
    }

    /// Adds a rule.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several rules.
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Validates the variables, resolves the rules and builds the engine.
    pub fn build(self) -> Result<InferenceEngine, ConfigError> {
        let mut variables = SlotMap::with_key();
        let mut names = HashMap::new();
        let mut inputs = vec![];
        let mut outputs = vec![];
        let mut shapes = SecondaryMap::new();

        let declared = self
            .inputs
            .into_iter()
            .map(|var| (var, Role::Input, None))
            .chain(self.outputs.into_iter().map(|(var, n)| (var, Role::Output, n)));

        for (variable, role, neutral) in declared {
            variable.validate()?;
            if names.contains_key(variable.name()) {
                return Err(ConfigError::DuplicateVariable(variable.name().to_owned()));
            }
            let name = variable.name().to_owned();
            let shape = match role {
                Role::Input => None,
                Role::Output => {
                    let range = variable.universe().range();
                    let neutral = neutral.unwrap_or_else(|| range.midpoint());
                    if !neutral.is_finite() || !range.contains(neutral) {
                        return Err(ConfigError::InvalidNeutral {
                            variable: name,
                            value: neutral,
                        });
                    }
                    Some(OutputShape {
                        neutral,
                        samples: variable.universe().samples().collect(),
                        curves: (0..variable.terms().len())
                            .map(|idx| variable.sample_term(idx))
                            .collect(),
                    })
                }
            };
            let id = variables.insert(Slot { variable, role });
            names.insert(name, id);
            match shape {
                Some(shape) => {
                    shapes.insert(id, shape);
                    outputs.push(id);
                }
                None => inputs.push(id),
            }
        }

        let compiled = self
            .rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                rule.compile(idx, |name| {
                    names.get(name).map(|id| {
                        let slot = &variables[*id];
                        (*id, &slot.variable, slot.role)
                    })
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (idx, rule) in self.rules.iter().enumerate() {
            debug!("rule {idx}: {rule}");
        }

        Ok(InferenceEngine {
            variables,
            names,
            inputs,
            outputs,
            shapes,
            rules: self.rules,
            compiled,
        })
    }
}

impl InferenceEngine {
    /// Starts defining a new engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Finds the ID of a variable by name.
    pub fn id(&self, name: &str) -> Option<VariableId> {
        self.names.get(name).copied()
    }

    /// Gets a variable by ID.
    pub fn variable(&self, id: VariableId) -> Option<&LinguisticVariable> {
        self.variables.get(id).map(|slot| &slot.variable)
    }

    /// The IDs of the input variables, in declaration order.
    pub fn inputs(&self) -> &[VariableId] {
        &self.inputs
    }

    /// The IDs of the output variables, in declaration order.
    pub fn outputs(&self) -> &[VariableId] {
        &self.outputs
    }

    /// The rule base.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The value an output falls back to when it cannot be inferred.
    pub fn neutral(&self, id: VariableId) -> Option<f64> {
        self.shapes.get(id).map(|shape| shape.neutral)
    }

    /// Builds an input map from `(name, value)` pairs.
    /// Names which are not input variables of this engine are ignored.
    pub fn named_inputs<'n>(&self, values: impl IntoIterator<Item = (&'n str, f64)>) -> Inputs {
        let mut inputs = Inputs::new();
        for (name, value) in values {
            match self.id(name) {
                Some(id) if self.variables[id].role == Role::Input => {
                    inputs.insert(id, value);
                }
                _ => debug!("ignoring value for unknown input `{name}`"),
            }
        }
        inputs
    }

    /// Computes the firing strength of every rule, in rule order.
    ///
    /// Returns `None` if an input is missing or not finite.
    pub fn firing_strengths(&self, inputs: &Inputs) -> Option<Vec<f64>> {
        let degrees = self.fuzzify(inputs)?;
        Some(
            self.compiled
                .iter()
                .map(|rule| rule.condition.strength(&degrees))
                .collect(),
        )
    }

    /// Infers crisp outputs from crisp inputs.
    ///
    /// Never fails: an output no rule concludes on, or every output when an
    /// input is missing or not finite, takes its neutral value instead.
    pub fn infer(&self, inputs: &Inputs) -> Outputs {
        let Some(degrees) = self.fuzzify(inputs) else {
            return self.fallback(OutputStatus::InvalidInput);
        };

        // Aggregate the clipped consequents of every rule
        let mut aggregated: SecondaryMap<VariableId, Vec<f64>> = self
            .shapes
            .iter()
            .map(|(id, shape)| (id, vec![0.0; shape.samples.len()]))
            .collect();
        for rule in &self.compiled {
            let strength = rule.condition.strength(&degrees);
            if strength <= 0.0 {
                continue;
            }
            for consequent in &rule.consequents {
                let level = strength * consequent.weight;
                if level <= 0.0 {
                    continue;
                }
                let curve = &self.shapes[consequent.variable].curves[consequent.term];
                for (mu, term_mu) in aggregated[consequent.variable].iter_mut().zip(curve) {
                    *mu = f64::max(*mu, f64::min(*term_mu, level));
                }
            }
        }

        // Defuzzify each output by its centroid
        let mut outputs = SecondaryMap::new();
        for (id, shape) in &self.shapes {
            let out = match centroid(&shape.samples, &aggregated[id]) {
                Some(value) => OutputValue {
                    value,
                    status: OutputStatus::Inferred,
                },
                None => OutputValue {
                    value: shape.neutral,
                    status: OutputStatus::NoRuleFired,
                },
            };
            outputs.insert(id, out);
        }
        Outputs(outputs)
    }

    /// Fuzzifies every input variable.
    fn fuzzify(&self, inputs: &Inputs) -> Option<SecondaryMap<VariableId, Degrees>> {
        let mut degrees = SecondaryMap::new();
        for &id in &self.inputs {
            let variable = &self.variables[id].variable;
            match inputs.get(id) {
                Some(value) if value.is_finite() => {
                    degrees.insert(id, variable.fuzzify(*value));
                }
                value => {
                    warn!("invalid value {:?} for input `{}`", value, variable.name());
                    return None;
                }
            }
        }
        Some(degrees)
    }

    /// Sets every output to its neutral value.
    fn fallback(&self, status: OutputStatus) -> Outputs {
        Outputs(
            self.shapes
                .iter()
                .map(|(id, shape)| {
                    let value = shape.neutral;
                    (id, OutputValue { value, status })
                })
                .collect(),
        )
    }
}

/// Computes the centre of gravity of a sampled fuzzy set.
/// Returns `None` if the set is empty.
fn centroid(samples: &[f64], mu: &[f64]) -> Option<f64> {
    let (moment, mass) = samples
        .iter()
        .zip(mu)
        .fold((0.0, 0.0), |(moment, mass), (x, mu)| {
            (moment + x * mu, mass + mu)
        });
    if mass > 0.0 {
        Some(moment / mass)
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fuzzy::{Antecedent, Universe};
    use assert_approx_eq::assert_approx_eq;

    fn level() -> LinguisticVariable {
        LinguisticVariable::new("level", Universe::new(0.0, 100.0))
            .term("low", 0.0, 0.0, 40.0)
            .term("high", 60.0, 100.0, 100.0)
    }

    fn valve() -> LinguisticVariable {
        LinguisticVariable::new("valve", Universe::new(0.0, 100.0))
            .term("shut", 0.0, 0.0, 40.0)
            .term("half", 30.0, 50.0, 70.0)
            .term("open", 60.0, 100.0, 100.0)
    }

    fn tank(rules: Vec<Rule>) -> InferenceEngine {
        InferenceEngine::builder()
            .input(level())
            .output(valve())
            .rules(rules)
            .build()
            .unwrap()
    }

    #[test]
    fn symmetric_set_defuzzifies_to_its_peak() {
        let engine = tank(vec![
            Rule::new(Antecedent::is("level", "low").or(Antecedent::is("level", "high")))
                .then("valve", "half"),
        ]);
        let out = engine.infer(&engine.named_inputs([("level", 10.0)]));
        let valve = out.get(engine.id("valve").unwrap()).unwrap();
        assert_eq!(valve.status, OutputStatus::Inferred);
        assert_approx_eq!(valve.value, 50.0);
    }

    #[test]
    fn clipped_set_has_expected_centroid() {
        let engine = tank(vec![Rule::new(Antecedent::is("level", "low")).then("valve", "open")]);
        // low(16) = 0.6, so `open` is clipped at 0.6
        let out = engine.infer(&engine.named_inputs([("level", 16.0)]));
        let valve = out.value(engine.id("valve").unwrap()).unwrap();
        assert!(valve > 80.0 && valve < 90.0, "{valve}");
    }

    #[test]
    fn inference_is_deterministic() {
        let engine = tank(vec![
            Rule::new(Antecedent::is("level", "low")).then("valve", "open"),
            Rule::new(Antecedent::is("level", "high")).then("valve", "shut"),
        ]);
        let id = engine.id("valve").unwrap();
        for level in [0.0, 12.5, 33.3, 50.0, 71.0, 100.0] {
            let inputs = engine.named_inputs([("level", level)]);
            assert_eq!(engine.infer(&inputs).get(id), engine.infer(&inputs).get(id));
        }
    }

    #[test]
    fn rule_order_is_irrelevant() {
        let rules = vec![
            Rule::new(Antecedent::is("level", "low")).then("valve", "open"),
            Rule::new(Antecedent::is("level", "low")).then_weighted("valve", "half", 0.5),
            Rule::new(Antecedent::is("level", "high")).then("valve", "shut"),
        ];
        let forward = tank(rules.clone());
        let reverse = tank(rules.into_iter().rev().collect());
        for level in [5.0, 20.0, 65.0, 90.0] {
            let a = forward.infer(&forward.named_inputs([("level", level)]));
            let b = reverse.infer(&reverse.named_inputs([("level", level)]));
            assert_approx_eq!(
                a.value(forward.id("valve").unwrap()).unwrap(),
                b.value(reverse.id("valve").unwrap()).unwrap()
            );
        }
    }

    #[test]
    fn weight_scales_the_clipping_level() {
        let full = tank(vec![Rule::new(Antecedent::is("level", "low")).then("valve", "shut")]);
        let strengths = full.firing_strengths(&full.named_inputs([("level", 0.0)])).unwrap();
        assert_eq!(strengths, vec![1.0]);

        let engine = tank(vec![
            Rule::new(Antecedent::is("level", "low")).then("valve", "open"),
            Rule::new(Antecedent::is("level", "low")).then_weighted("valve", "shut", 0.0),
        ]);
        let out = engine.infer(&engine.named_inputs([("level", 0.0)]));
        assert!(out.value(engine.id("valve").unwrap()).unwrap() > 60.0);
    }

    #[test]
    fn no_rule_fired_falls_back_to_neutral() {
        let engine = tank(vec![Rule::new(Antecedent::is("level", "low")).then("valve", "open")]);
        let out = engine.infer(&engine.named_inputs([("level", 50.0)]));
        let v = out.get(engine.id("valve").unwrap()).unwrap();
        assert_eq!(v.status, OutputStatus::NoRuleFired);
        assert_eq!(v.value, 50.0);

        let engine = InferenceEngine::builder()
            .input(level())
            .output_with_neutral(valve(), 0.0)
            .rule(Rule::new(Antecedent::is("level", "low")).then("valve", "open"))
            .build()
            .unwrap();
        let out = engine.infer(&engine.named_inputs([("level", 50.0)]));
        assert_eq!(out.value(engine.id("valve").unwrap()), Some(0.0));
    }

    #[test]
    fn invalid_input_falls_back_to_neutral() {
        let engine = tank(vec![Rule::new(Antecedent::is("level", "low")).then("valve", "open")]);
        let id = engine.id("valve").unwrap();

        let out = engine.infer(&Inputs::new());
        assert_eq!(out.get(id).unwrap().status, OutputStatus::InvalidInput);
        assert_eq!(out.value(id), Some(50.0));

        let out = engine.infer(&engine.named_inputs([("level", f64::NAN)]));
        assert!(out.get(id).unwrap().is_fallback());
        assert!(engine.firing_strengths(&Inputs::new()).is_none());
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let engine = tank(vec![Rule::new(Antecedent::is("level", "high")).then("valve", "shut")]);
        let id = engine.id("valve").unwrap();
        let clamped = engine.infer(&engine.named_inputs([("level", 100.0)]));
        let beyond = engine.infer(&engine.named_inputs([("level", 1e6)]));
        assert_eq!(clamped.get(id), beyond.get(id));
    }

    #[test]
    fn malformed_rules_fail_at_build_time() {
        let build = |rule: Rule| {
            InferenceEngine::builder()
                .input(level())
                .output(valve())
                .rule(rule)
                .build()
                .err()
        };

        assert_eq!(
            build(Rule::new(Antecedent::is("pressure", "low")).then("valve", "open")),
            Some(ConfigError::UnknownVariable {
                rule: 0,
                variable: "pressure".into()
            })
        );
        assert_eq!(
            build(Rule::new(Antecedent::is("level", "medium")).then("valve", "open")),
            Some(ConfigError::UnknownTerm {
                rule: 0,
                variable: "level".into(),
                term: "medium".into()
            })
        );
        assert!(matches!(
            build(Rule::new(Antecedent::is("level", "low")).then("valve", "ajar")),
            Some(ConfigError::UnknownTerm { .. })
        ));
        assert!(matches!(
            build(Rule::new(Antecedent::is("valve", "open")).then("valve", "open")),
            Some(ConfigError::WrongDirection { .. })
        ));
        assert!(matches!(
            build(Rule::new(Antecedent::is("level", "low")).then("level", "high")),
            Some(ConfigError::WrongDirection { .. })
        ));
        assert_eq!(
            build(Rule::new(Antecedent::is("level", "low"))),
            Some(ConfigError::NoConsequents(0))
        );
        assert_eq!(
            build(Rule::new(Antecedent::And(vec![])).then("valve", "open")),
            Some(ConfigError::EmptyAntecedent(0))
        );
        assert!(matches!(
            build(Rule::new(Antecedent::is("level", "low")).then_weighted("valve", "open", 1.5)),
            Some(ConfigError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn duplicate_variables_are_rejected() {
        let result = InferenceEngine::builder()
            .input(level())
            .output(level())
            .build();
        assert_eq!(
            result.err(),
            Some(ConfigError::DuplicateVariable("level".into()))
        );

        let result = InferenceEngine::builder()
            .input(level())
            .output_with_neutral(valve(), 150.0)
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidNeutral { .. })));
    }
}
