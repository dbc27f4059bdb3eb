use super::engine::Role;
use super::variable::{Degrees, LinguisticVariable};
use crate::error::ConfigError;
use crate::VariableId;
use itertools::Itertools;
use slotmap::SecondaryMap;
use smallvec::SmallVec;
use std::fmt;

/// The premise of a rule: a tree of `variable IS term` tests joined by
/// AND (minimum) and OR (maximum).
#[derive(Clone, Debug, PartialEq)]
pub enum Antecedent {
    Is { variable: String, term: String },
    And(Vec<Antecedent>),
    Or(Vec<Antecedent>),
}

impl Antecedent {
    /// Tests whether an input variable is in the given term.
    pub fn is(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self::Is {
            variable: variable.into(),
            term: term.into(),
        }
    }

    /// Joins two premises with AND, flattening nested ANDs.
    pub fn and(self, other: Antecedent) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(other);
                Self::And(children)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Joins two premises with OR, flattening nested ORs.
    pub fn or(self, other: Antecedent) -> Self {
        match self {
            Self::Or(mut children) => {
                children.push(other);
                Self::Or(children)
            }
            _ => Self::Or(vec![self, other]),
        }
    }

    /// Compiles the premise against the declared variables.
    fn compile<'a>(
        &self,
        rule: usize,
        lookup: &impl Fn(&str) -> Option<(VariableId, &'a LinguisticVariable, Role)>,
    ) -> Result<Condition, ConfigError> {
        match self {
            Self::Is { variable, term } => {
                let (id, var, role) = lookup(variable).ok_or_else(|| ConfigError::UnknownVariable {
                    rule,
                    variable: variable.clone(),
                })?;
                if role != Role::Input {
                    return Err(ConfigError::WrongDirection {
                        rule,
                        variable: variable.clone(),
                    });
                }
                let term = var.term_index(term).ok_or_else(|| ConfigError::UnknownTerm {
                    rule,
                    variable: variable.clone(),
                    term: term.clone(),
                })?;
                Ok(Condition::Is { variable: id, term })
            }
            Self::And(children) | Self::Or(children) => {
                if children.is_empty() {
                    return Err(ConfigError::EmptyAntecedent(rule));
                }
                let children = children
                    .iter()
                    .map(|child| child.compile(rule, lookup))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match self {
                    Self::And(_) => Condition::And(children),
                    _ => Condition::Or(children),
                })
            }
        }
    }
}

impl fmt::Display for Antecedent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Is { variable, term } => write!(f, "{variable} IS {term}"),
            Self::And(children) => write!(f, "({})", children.iter().join(" AND ")),
            Self::Or(children) => write!(f, "({})", children.iter().join(" OR ")),
        }
    }
}

/// A conclusion of a rule: `variable IS term`, scaled by a weight in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Consequent {
    pub variable: String,
    pub term: String,
    pub weight: f64,
}

impl fmt::Display for Consequent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IS {}", self.variable, self.term)?;
        if self.weight != 1.0 {
            write!(f, " [{}]", self.weight)?;
        }
        Ok(())
    }
}

/// A fuzzy rule, `IF antecedent THEN consequents`.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    antecedent: Antecedent,
    consequents: SmallVec<[Consequent; 3]>,
}

impl Rule {
    /// Creates a rule with the given premise and no consequents.
    pub fn new(antecedent: Antecedent) -> Self {
        Self {
            antecedent,
            consequents: SmallVec::new(),
        }
    }

    /// Adds a consequent with full weight.
    pub fn then(self, variable: impl Into<String>, term: impl Into<String>) -> Self {
        self.then_weighted(variable, term, 1.0)
    }

    /// Adds a consequent whose clipping level is scaled by `weight`.
    pub fn then_weighted(
        mut self,
        variable: impl Into<String>,
        term: impl Into<String>,
        weight: f64,
    ) -> Self {
        self.consequents.push(Consequent {
            variable: variable.into(),
            term: term.into(),
            weight,
        });
        self
    }

    /// The premise of the rule.
    pub fn antecedent(&self) -> &Antecedent {
        &self.antecedent
    }

    /// The conclusions of the rule.
    pub fn consequents(&self) -> &[Consequent] {
        &self.consequents
    }

    /// Resolves variable and term names to IDs and indices.
    pub(crate) fn compile<'a>(
        &self,
        rule: usize,
        lookup: impl Fn(&str) -> Option<(VariableId, &'a LinguisticVariable, Role)>,
    ) -> Result<CompiledRule, ConfigError> {
        let condition = self.antecedent.compile(rule, &lookup)?;
        if self.consequents.is_empty() {
            return Err(ConfigError::NoConsequents(rule));
        }
        let consequents = self
            .consequents
            .iter()
            .map(|consequent| {
                let (id, var, role) =
                    lookup(&consequent.variable).ok_or_else(|| ConfigError::UnknownVariable {
                        rule,
                        variable: consequent.variable.clone(),
                    })?;
                if role != Role::Output {
                    return Err(ConfigError::WrongDirection {
                        rule,
                        variable: consequent.variable.clone(),
                    });
                }
                let term = var.term_index(&consequent.term).ok_or_else(|| ConfigError::UnknownTerm {
                    rule,
                    variable: consequent.variable.clone(),
                    term: consequent.term.clone(),
                })?;
                if !(0.0..=1.0).contains(&consequent.weight) {
                    return Err(ConfigError::InvalidWeight {
                        rule,
                        weight: consequent.weight,
                    });
                }
                Ok(CompiledConsequent {
                    variable: id,
                    term,
                    weight: consequent.weight,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(CompiledRule {
            condition,
            consequents,
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IF {} THEN {}",
            self.antecedent,
            self.consequents.iter().join(", ")
        )
    }
}

/// A premise with its names resolved.
#[derive(Clone, Debug)]
pub(crate) enum Condition {
    Is { variable: VariableId, term: usize },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    /// Computes the firing strength of the premise from fuzzified inputs.
    pub fn strength(&self, degrees: &SecondaryMap<VariableId, Degrees>) -> f64 {
        match self {
            Self::Is { variable, term } => degrees
                .get(*variable)
                .and_then(|d| d.get(*term))
                .copied()
                .unwrap_or(0.0),
            Self::And(children) => children
                .iter()
                .map(|child| child.strength(degrees))
                .fold(1.0, f64::min),
            Self::Or(children) => children
                .iter()
                .map(|child| child.strength(degrees))
                .fold(0.0, f64::max),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CompiledConsequent {
    pub variable: VariableId,
    pub term: usize,
    pub weight: f64,
}

#[derive(Clone, Debug)]
pub(crate) struct CompiledRule {
    pub condition: Condition,
    pub consequents: SmallVec<[CompiledConsequent; 3]>,
}
