//! Advances the ego vehicle, the lead obstacle and the environment by one tick.

use crate::decision::Action;
use crate::environment;
use crate::random::RandomSource;
use crate::simulation::SimulationConfig;
use crate::state::{Controls, SimulationState, DISTANCE, SPEED};
use crate::util::{relax, Interval};
use log::debug;

/// Converts km/h to m/s.
const KMH_TO_MS: f64 = 1.0 / 3.6;

/// The parameters of the ego speed model.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SpeedConfig {
    /// The rate at which the display speed follows the commanded speed, per second.
    pub relax_rate: f64,
    /// The acceleration while braking, in km/h per second.
    pub brake_acceleration: f64,
    /// The acceleration while accelerating, in km/h per second.
    pub throttle_acceleration: f64,
    /// The acceleration while maintaining speed, in km/h per second.
    pub maintain_acceleration: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            relax_rate: 1.8,
            brake_acceleration: -60.0,
            throttle_acceleration: 18.0,
            maintain_acceleration: -6.0,
        }
    }
}

impl SpeedConfig {
    /// The acceleration applied for an action, in km/h per second.
    pub fn acceleration(&self, action: Action) -> f64 {
        match action {
            Action::Brake => self.brake_acceleration,
            Action::Accelerate => self.throttle_acceleration,
            Action::Maintain => self.maintain_acceleration,
        }
    }
}

/// The parameters of the lead obstacle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ObstacleConfig {
    /// The speed of the obstacle, in km/h.
    pub speed: f64,
    /// An overtake starts once the distance falls to this value, in m.
    pub trigger_distance: f64,
    /// The range the obstacle respawns in after an overtake, in m.
    pub respawn: Interval<f64>,
    /// The amount overtake progress decays by each tick.
    pub overtake_step: f64,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            speed: 0.0,
            trigger_distance: 0.5,
            respawn: Interval::new(80.0, 100.0),
            overtake_step: 0.02,
        }
    }
}

/// Advances the state by `dt` seconds.
///
/// This is a pure function of its arguments and the draws taken from `rng`.
/// A `dt` which is not a positive, finite number leaves the state untouched.
pub fn step<R: RandomSource + ?Sized>(
    state: &SimulationState,
    controls: &Controls,
    dt: f64,
    config: &SimulationConfig,
    rng: &mut R,
) -> SimulationState {
    if !(dt > 0.0 && dt.is_finite()) {
        return *state;
    }

    let mut next = *state;
    next.time += dt;
    next.hour = (state.hour + dt * config.environment.hours_per_second).rem_euclid(24.0);
    next.weather = controls.weather;
    if controls.commanded_speed.is_finite() {
        next.commanded_speed = SPEED.clamp(controls.commanded_speed);
    }

    advance_speed(&mut next, controls.action, dt, &config.speed);
    advance_obstacle(&mut next, dt, &config.obstacle, rng);
    environment::advance(&mut next, controls, dt, &config.environment);
    next
}

/// Applies the action's acceleration, then eases the display speed towards
/// the commanded speed.
fn advance_speed(state: &mut SimulationState, action: Action, dt: f64, config: &SpeedConfig) {
    let speed = state.display_speed + config.acceleration(action) * dt;
    let speed = relax(speed, state.commanded_speed, config.relax_rate, dt);
    state.display_speed = SPEED.clamp(speed);
}

/// Closes the gap to the obstacle and respawns it once it has been reached.
fn advance_obstacle<R: RandomSource + ?Sized>(
    state: &mut SimulationState,
    dt: f64,
    config: &ObstacleConfig,
    rng: &mut R,
) {
    state.overtake = f64::max(state.overtake - config.overtake_step, 0.0);

    let closing = (state.display_speed - config.speed) * KMH_TO_MS;
    state.distance = DISTANCE.clamp(state.distance - closing * dt);

    if state.distance <= config.trigger_distance && !state.is_overtaking() {
        state.distance = DISTANCE.clamp(rng.uniform(config.respawn));
        state.lane = rng.lane();
        state.overtake = 1.0;
        debug!(
            "overtake at t={:.2}s, obstacle respawned {:.1}m ahead in {:?} lane",
            state.time, state.distance, state.lane
        );
    }
}
