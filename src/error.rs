use thiserror::Error;

/// An error in the definition of a fuzzy inference engine.
///
/// These are raised once, when the engine is built, and never while it runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The universe of a variable is empty, inverted or not finite.
    #[error("variable `{variable}` has an invalid universe [{min}, {max}] with step {step}")]
    InvalidUniverse {
        variable: String,
        min: f64,
        max: f64,
        step: f64,
    },

    /// A term's breakpoints are not ordered `a <= b <= c`, or not finite.
    #[error("term `{variable}.{term}` has invalid breakpoints ({a}, {b}, {c})")]
    InvalidTriangle {
        variable: String,
        term: String,
        a: f64,
        b: f64,
        c: f64,
    },

    /// A variable was declared without any terms.
    #[error("variable `{0}` has no terms")]
    NoTerms(String),

    /// Two terms of one variable share a name.
    #[error("variable `{variable}` defines term `{term}` more than once")]
    DuplicateTerm { variable: String, term: String },

    /// Two variables share a name.
    #[error("variable `{0}` is defined more than once")]
    DuplicateVariable(String),

    /// A rule references a variable that was never declared.
    #[error("rule {rule} references unknown variable `{variable}`")]
    UnknownVariable { rule: usize, variable: String },

    /// A rule references a term its variable does not have.
    #[error("rule {rule} references unknown term `{variable}.{term}`")]
    UnknownTerm {
        rule: usize,
        variable: String,
        term: String,
    },

    /// A rule's antecedent tests an output variable, or its consequent sets an input.
    #[error("rule {rule} uses `{variable}` on the wrong side")]
    WrongDirection { rule: usize, variable: String },

    /// A rule has an AND/OR node without children.
    #[error("rule {0} has an empty antecedent")]
    EmptyAntecedent(usize),

    /// A rule has no consequents.
    #[error("rule {0} has no consequents")]
    NoConsequents(usize),

    /// A consequent weight lies outside `[0, 1]`.
    #[error("rule {rule} has consequent weight {weight} outside [0, 1]")]
    InvalidWeight { rule: usize, weight: f64 },

    /// A controller layout expects a variable the engine does not define.
    #[error("engine does not define variable `{0}`")]
    MissingVariable(String),

    /// The neutral value of an output lies outside its universe.
    #[error("output `{variable}` has neutral value {value} outside its universe")]
    InvalidNeutral { variable: String, value: f64 },
}
