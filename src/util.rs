//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: PartialOrd + Copy> Interval<T> {
    /// Returns true if this interval contains the value.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Saturates the value to the bounds of the interval.
    pub fn clamp(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

impl Interval<f64> {
    /// Gets the magnitude of the interval.
    pub fn length(&self) -> f64 {
        self.max - self.min
    }

    /// Returns the centre/mid-point of the interval.
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    pub fn lerp(&self, t: f64) -> f64 {
        self.min + t * (self.max - self.min)
    }

    pub fn inv_lerp(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

/// Moves `value` towards `target` by the fraction `rate * dt`, never overshooting.
pub fn relax(value: f64, target: f64, rate: f64, dt: f64) -> f64 {
    value + (target - value) * f64::min(1.0, rate * dt)
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn clamp_saturates() {
        let range = Interval::new(0.0, 100.0);
        assert_eq!(range.clamp(-5.0), 0.0);
        assert_eq!(range.clamp(150.0), 100.0);
        assert_eq!(range.clamp(42.0), 42.0);
    }

    #[test]
    fn lerp_round_trips() {
        let range = Interval::new(5.0, 7.0);
        assert_approx_eq!(range.lerp(0.5), 6.0);
        assert_approx_eq!(range.inv_lerp(6.5), 0.75);
        assert_approx_eq!(range.midpoint(), 6.0);
    }

    #[test]
    fn relax_never_overshoots() {
        assert_approx_eq!(relax(0.0, 10.0, 1.8, 0.5), 9.0);
        assert_approx_eq!(relax(0.0, 10.0, 1.8, 5.0), 10.0);
        assert_approx_eq!(relax(10.0, 0.0, 0.5, 1.0), 5.0);
    }
}
