//! Mamdani fuzzy inference: linguistic variables, rules, and the engine
//! which fuzzifies crisp inputs, fires the rules, aggregates their
//! conclusions and defuzzifies them by centroid.

pub use engine::{EngineBuilder, InferenceEngine, Inputs, OutputStatus, OutputValue, Outputs};
pub use rule::{Antecedent, Consequent, Rule};
pub use variable::{Degrees, LinguisticVariable, Term, Triangle, Universe};

mod engine;
mod rule;
mod variable;
