use crate::state::Lane;
use crate::util::Interval;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// The source of randomness for respawns and demo scenarios.
///
/// Implemented for every [rand::Rng]; tests may supply their own sequence.
pub trait RandomSource {
    /// Draws a value uniformly from the interval.
    fn uniform(&mut self, range: Interval<f64>) -> f64;

    /// Picks a lane.
    fn lane(&mut self) -> Lane;
}

impl<R: Rng> RandomSource for R {
    fn uniform(&mut self, range: Interval<f64>) -> f64 {
        if range.min < range.max {
            Uniform::new_inclusive(range.min, range.max).sample(self)
        } else {
            range.min
        }
    }

    fn lane(&mut self) -> Lane {
        Lane::ALL[self.gen_range(0..Lane::ALL.len())]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn draws_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = Interval::new(80.0, 100.0);
        for _ in 0..1000 {
            assert!(range.contains(rng.uniform(range)));
        }
        assert_eq!(rng.uniform(Interval::new(5.0, 5.0)), 5.0);
    }

    #[test]
    fn every_lane_is_picked() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 3];
        for _ in 0..100 {
            let lane = rng.lane();
            seen[Lane::ALL.iter().position(|l| *l == lane).unwrap()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }
}
