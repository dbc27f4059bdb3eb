use crate::controller::{DrivingController, RuleBase};
use crate::decision::{decide, DecisionOutput};
use crate::environment::{EnvironmentConfig, Weather};
use crate::error::ConfigError;
use crate::kinematics::{self, ObstacleConfig, SpeedConfig};
use crate::random::RandomSource;
use crate::state::{Controls, LogRecord, SimulationState, DISTANCE};
use crate::util::Interval;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The parameters of a simulation run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SimulationConfig {
    /// The rule base driving the controller.
    pub rule_base: RuleBase,
    pub speed: SpeedConfig,
    pub obstacle: ObstacleConfig,
    pub environment: EnvironmentConfig,
    pub demo: DemoConfig,
}

/// The parameters of demo mode, which periodically draws a random scenario.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DemoConfig {
    /// The simulated time between scenarios, in s.
    pub period: f64,
    /// The range of commanded speeds, in km/h.
    pub speed: Interval<f64>,
    /// The range of obstacle distances, in m.
    pub distance: Interval<f64>,
    /// The range of visibility overrides, in %.
    pub visibility: Interval<f64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            period: 2.0,
            speed: Interval::new(20.0, 100.0),
            distance: Interval::new(5.0, 90.0),
            visibility: Interval::new(20.0, 100.0),
        }
    }
}

/// A driving simulation.
///
/// Each tick feeds the current readings through the fuzzy controller, maps
/// the result to an action and advances the state by that action.
pub struct Simulation<R = StdRng> {
    config: SimulationConfig,
    /// The controller; built once, then only read.
    controller: DrivingController,
    state: SimulationState,
    /// The inputs set by collaborators since the last tick.
    controls: Controls,
    /// The decision taken on the previous tick.
    decision: DecisionOutput,
    /// The current frame of simulation.
    frame: usize,
    /// One record per simulated frame, until taken.
    log: Vec<LogRecord>,
    rng: R,
    demo: bool,
    /// The simulated time since the last demo scenario, in s.
    demo_timer: f64,
}

impl Simulation<StdRng> {
    /// Creates a new simulation seeded from the operating system.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Creates a new simulation whose random draws are reproducible.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: RandomSource> Simulation<R> {
    /// Creates a new simulation drawing from the given random source.
    pub fn with_rng(config: SimulationConfig, rng: R) -> Result<Self, ConfigError> {
        let controller = DrivingController::new(config.rule_base)?;
        Ok(Self {
            config,
            controller,
            state: SimulationState::default(),
            controls: Controls::default(),
            decision: DecisionOutput::idle(),
            frame: 0,
            log: vec![],
            rng,
            demo: false,
            demo_timer: 0.0,
        })
    }

    /// Advances the simulation by `dt` seconds and returns the decision taken.
    ///
    /// A `dt` which is not a positive, finite number does nothing and
    /// returns the previous decision.
    pub fn step(&mut self, dt: f64) -> DecisionOutput {
        if !(dt > 0.0 && dt.is_finite()) {
            return self.decision;
        }
        if self.demo {
            self.update_demo(dt);
        }

        let readings = self.state.readings(self.controls.commanded_speed);
        let outputs = self.controller.evaluate(&readings);
        self.decision = decide(&outputs);
        self.controls.action = self.decision.action;

        self.state = kinematics::step(&self.state, &self.controls, dt, &self.config, &mut self.rng);
        self.frame += 1;
        self.log.push(LogRecord::new(&self.state, &self.decision));

        trace!(
            "frame {}: {} at {:.1} km/h, {:.1} m",
            self.frame,
            self.decision.action,
            self.state.display_speed,
            self.state.distance
        );
        self.decision
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// The decision taken on the previous tick.
    pub fn decision(&self) -> &DecisionOutput {
        &self.decision
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn controller(&self) -> &DrivingController {
        &self.controller
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The records of every frame since the log was last taken.
    pub fn log(&self) -> &[LogRecord] {
        &self.log
    }

    /// Takes the log, leaving it empty.
    pub fn take_log(&mut self) -> Vec<LogRecord> {
        std::mem::take(&mut self.log)
    }

    /// Replaces the controls. The action is overwritten on the next tick.
    pub fn set_controls(&mut self, controls: Controls) {
        self.controls = controls;
    }

    /// Sets the commanded speed in km/h.
    pub fn set_commanded_speed(&mut self, speed: f64) {
        self.controls.commanded_speed = speed;
    }

    pub fn set_weather(&mut self, weather: Weather) {
        self.controls.weather = weather;
    }

    /// Caps visibility at the given value in %, or removes the cap.
    pub fn set_visibility_override(&mut self, visibility: Option<f64>) {
        self.controls.visibility = visibility;
    }

    /// Caps grip at the given value in %, or removes the cap.
    pub fn set_grip_override(&mut self, grip: Option<f64>) {
        self.controls.grip = grip;
    }

    /// Sets the hour of day. Non-finite values are ignored.
    pub fn set_hour(&mut self, hour: f64) {
        if hour.is_finite() {
            self.state.hour = hour.rem_euclid(24.0);
        }
    }

    /// Places the obstacle at the given distance in m. Non-finite values are ignored.
    pub fn set_obstacle_distance(&mut self, distance: f64) {
        if distance.is_finite() {
            self.state.distance = DISTANCE.clamp(distance);
        }
    }

    /// Turns demo mode on or off.
    ///
    /// In demo mode a random scenario is drawn every [DemoConfig::period]
    /// seconds of simulated time.
    pub fn set_demo_mode(&mut self, demo: bool) {
        self.demo = demo;
        self.demo_timer = 0.0;
    }

    pub fn demo_mode(&self) -> bool {
        self.demo
    }

    /// Returns the state, controls and log to their defaults.
    /// The configuration and demo mode are kept.
    pub fn reset(&mut self) {
        self.state = SimulationState::default();
        self.controls = Controls::default();
        self.decision = DecisionOutput::idle();
        self.frame = 0;
        self.log.clear();
        self.demo_timer = 0.0;
    }

    /// Draws a new scenario once the demo period has elapsed.
    fn update_demo(&mut self, dt: f64) {
        self.demo_timer += dt;
        if self.demo_timer < self.config.demo.period {
            return;
        }
        self.demo_timer = 0.0;

        let demo = self.config.demo;
        self.controls.commanded_speed = self.rng.uniform(demo.speed);
        self.state.distance = DISTANCE.clamp(self.rng.uniform(demo.distance));
        self.controls.visibility = Some(self.rng.uniform(demo.visibility));
        debug!(
            "demo scenario: {:.0} km/h, {:.0} m, visibility {:.0}%",
            self.controls.commanded_speed,
            self.state.distance,
            self.controls.visibility.unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decision::Action;

    const DT: f64 = 1.0 / 60.0;

    fn sim(rule_base: RuleBase) -> Simulation {
        let config = SimulationConfig {
            rule_base,
            ..Default::default()
        };
        Simulation::with_seed(config, 42).unwrap()
    }

    #[test]
    fn starts_idle() {
        let sim = sim(RuleBase::Split);
        assert_eq!(sim.frame(), 0);
        assert_eq!(*sim.state(), SimulationState::default());
        assert_eq!(sim.decision().action, Action::Maintain);
        assert!(sim.log().is_empty());
    }

    #[test]
    fn invalid_dt_does_nothing() {
        let mut sim = sim(RuleBase::Split);
        for dt in [0.0, -1.0, f64::NAN] {
            sim.step(dt);
        }
        assert_eq!(sim.frame(), 0);
        assert!(sim.log().is_empty());
        assert_eq!(*sim.state(), SimulationState::default());
    }

    #[test]
    fn each_step_is_logged() {
        let mut sim = sim(RuleBase::Composite);
        for _ in 0..10 {
            sim.step(DT);
        }
        assert_eq!(sim.frame(), 10);
        assert_eq!(sim.log().len(), 10);
        let last = sim.log()[9];
        assert_eq!(last.time, sim.state().time);
        assert_eq!(last.action_tag, sim.decision().action);

        let log = sim.take_log();
        assert_eq!(log.len(), 10);
        assert!(sim.log().is_empty());
    }

    #[test]
    fn close_obstacle_brakes() {
        for rule_base in [RuleBase::Composite, RuleBase::Split] {
            let mut sim = sim(rule_base);
            sim.set_commanded_speed(100.0);
            sim.set_obstacle_distance(10.0);
            let decision = sim.step(DT);
            assert_eq!(decision.action, Action::Brake, "{rule_base:?}");
            assert!(decision.brake_light());
            assert_eq!(sim.controls().action, Action::Brake);
        }
    }

    #[test]
    fn split_honks_at_close_obstacle() {
        let mut sim = sim(RuleBase::Split);
        sim.set_commanded_speed(100.0);
        sim.set_obstacle_distance(10.0);
        assert!(sim.step(DT).horn);
    }

    #[test]
    fn setters_sanitise_values() {
        let mut sim = sim(RuleBase::Split);
        sim.set_obstacle_distance(250.0);
        assert_eq!(sim.state().distance, 100.0);
        sim.set_obstacle_distance(f64::NAN);
        assert_eq!(sim.state().distance, 100.0);
        sim.set_hour(25.0);
        assert_eq!(sim.state().hour, 1.0);
        sim.set_hour(f64::INFINITY);
        assert_eq!(sim.state().hour, 1.0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut sim = sim(RuleBase::Split);
        sim.set_weather(Weather::Fog);
        sim.set_commanded_speed(90.0);
        for _ in 0..120 {
            sim.step(DT);
        }
        sim.reset();
        assert_eq!(*sim.state(), SimulationState::default());
        assert_eq!(*sim.controls(), Controls::default());
        assert_eq!(sim.frame(), 0);
        assert!(sim.log().is_empty());
    }

    #[test]
    fn demo_mode_draws_scenarios() {
        let mut sim = sim(RuleBase::Split);
        sim.set_demo_mode(true);
        assert!(sim.demo_mode());
        for _ in 0..3 {
            sim.step(0.5);
        }
        assert_eq!(sim.controls().visibility, None);
        sim.step(0.5);
        let demo = DemoConfig::default();
        let visibility = sim.controls().visibility.unwrap();
        assert!(demo.visibility.contains(visibility));
        assert!(demo.speed.contains(sim.controls().commanded_speed));
    }

    #[test]
    fn seeded_runs_repeat() {
        let run = || {
            let mut sim = sim(RuleBase::Split);
            sim.set_demo_mode(true);
            for _ in 0..600 {
                sim.step(DT);
            }
            sim.take_log()
        };
        assert_eq!(run(), run());
    }
}
