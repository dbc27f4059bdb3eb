use crate::error::ConfigError;
use crate::util::Interval;
use smallvec::SmallVec;

/// The degrees of membership of one crisp value in each term of a variable,
/// in the order the terms were declared.
pub type Degrees = SmallVec<[f64; 4]>;

/// A triangular membership function with breakpoints `a <= b <= c`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    /// The foot of the rising edge.
    pub a: f64,
    /// The peak.
    pub b: f64,
    /// The foot of the falling edge.
    pub c: f64,
}

impl Triangle {
    /// Creates a new triangle.
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Evaluates the degree of membership of `x`, a value in `[0, 1]`.
    ///
    /// A coincident `a == b` turns the rising edge into a step at `a`,
    /// a coincident `b == c` turns the falling edge into a step just past `c`.
    pub fn degree(&self, x: f64) -> f64 {
        let Self { a, b, c } = *self;
        if !(a..=c).contains(&x) {
            0.0
        } else if x == b {
            1.0
        } else if x < b {
            (x - a) / (b - a)
        } else {
            (c - x) / (c - b)
        }
    }

    fn is_valid(&self) -> bool {
        [self.a, self.b, self.c].iter().all(|v| v.is_finite()) && self.a <= self.b && self.b <= self.c
    }
}

/// A named fuzzy set of a linguistic variable.
#[derive(Clone, Debug)]
pub struct Term {
    name: String,
    shape: Triangle,
}

impl Term {
    /// The name of the term.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The membership function of the term.
    pub fn shape(&self) -> Triangle {
        self.shape
    }
}

/// The numeric domain of a variable, together with the step at which it is
/// sampled when a fuzzy set over it is defuzzified.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Universe {
    range: Interval<f64>,
    step: f64,
}

impl Universe {
    /// Creates a universe over `[min, max]` sampled at integer steps.
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            range: Interval::new(min, max),
            step: 1.0,
        }
    }

    /// Sets the sampling step.
    pub const fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// The bounds of the universe.
    pub fn range(&self) -> Interval<f64> {
        self.range
    }

    /// The sampling step.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// The sample points `min, min + step, ...` up to and including `max`
    /// when `max` lies on the grid.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        let count = (self.range.length() / self.step + 1e-9).floor() as usize;
        (0..=count).map(move |i| self.range.min + (i as f64) * self.step)
    }

    fn is_valid(&self) -> bool {
        self.range.min.is_finite()
            && self.range.max.is_finite()
            && self.range.min < self.range.max
            && self.step.is_finite()
            && self.step > 0.0
    }
}

/// A named quantity described by overlapping triangular fuzzy sets.
#[derive(Clone, Debug)]
pub struct LinguisticVariable {
    name: String,
    universe: Universe,
    terms: Vec<Term>,
}

impl LinguisticVariable {
    /// Creates a variable without any terms.
    pub fn new(name: impl Into<String>, universe: Universe) -> Self {
        Self {
            name: name.into(),
            universe,
            terms: vec![],
        }
    }

    /// Adds a triangular term with breakpoints `(a, b, c)`.
    pub fn term(mut self, name: impl Into<String>, a: f64, b: f64, c: f64) -> Self {
        self.terms.push(Term {
            name: name.into(),
            shape: Triangle::new(a, b, c),
        });
        self
    }

    /// The name of the variable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The universe of the variable.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// The terms of the variable, in declaration order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Finds the index of the term with the given name.
    pub fn term_index(&self, name: &str) -> Option<usize> {
        self.terms.iter().position(|term| term.name == name)
    }

    /// Computes the degree of membership of `value` in every term.
    /// The value is first clamped to the universe.
    pub fn fuzzify(&self, value: f64) -> Degrees {
        let value = self.universe.range.clamp(value);
        self.terms.iter().map(|term| term.shape.degree(value)).collect()
    }

    /// Computes the degree of membership of `value` in a single named term.
    pub fn degree(&self, term: &str, value: f64) -> Option<f64> {
        let value = self.universe.range.clamp(value);
        self.term_index(term)
            .map(|idx| self.terms[idx].shape.degree(value))
    }

    /// Samples the membership function of a term across the universe.
    pub(crate) fn sample_term(&self, idx: usize) -> Vec<f64> {
        let shape = self.terms[idx].shape;
        self.universe.samples().map(|x| shape.degree(x)).collect()
    }

    /// Checks the universe and terms of the variable.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.universe.is_valid() {
            let Interval { min, max } = self.universe.range;
            return Err(ConfigError::InvalidUniverse {
                variable: self.name.clone(),
                min,
                max,
                step: self.universe.step,
            });
        }
        if self.terms.is_empty() {
            return Err(ConfigError::NoTerms(self.name.clone()));
        }
        for (idx, term) in self.terms.iter().enumerate() {
            if !term.shape.is_valid() {
                let Triangle { a, b, c } = term.shape;
                return Err(ConfigError::InvalidTriangle {
                    variable: self.name.clone(),
                    term: term.name.clone(),
                    a,
                    b,
                    c,
                });
            }
            if self.terms[..idx].iter().any(|other| other.name == term.name) {
                return Err(ConfigError::DuplicateTerm {
                    variable: self.name.clone(),
                    term: term.name.clone(),
                });
            }
        }
        Ok(())
    }
}
