use crate::controller::{ControlValues, Readings};
use crate::decision::{Action, DecisionOutput};
use crate::environment::Weather;
use crate::util::Interval;

/// The range of ego speeds, in km/h.
pub const SPEED: Interval<f64> = Interval::new(0.0, 120.0);

/// The range of obstacle distances, in m.
pub const DISTANCE: Interval<f64> = Interval::new(0.0, 100.0);

/// The range of visibility and grip, in %.
pub const PERCENT: Interval<f64> = Interval::new(0.0, 100.0);

/// The lane the lead obstacle occupies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lane {
    Left,
    #[default]
    Center,
    Right,
}

impl Lane {
    /// Every lane, left to right.
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Center, Lane::Right];

    /// The lateral offset of the lane in lane widths, negative to the left.
    pub fn offset(&self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Center => 0.0,
            Self::Right => 1.0,
        }
    }
}

/// The state of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationState {
    /// The simulated time since the start of the run, in s.
    pub time: f64,
    /// The externally commanded speed, in km/h.
    pub commanded_speed: f64,
    /// The smoothed speed of the ego vehicle, in km/h.
    pub display_speed: f64,
    /// The distance to the lead obstacle, in m.
    pub distance: f64,
    /// The displayed visibility, in %.
    pub visibility: f64,
    /// The displayed road grip, in %.
    pub grip: f64,
    pub weather: Weather,
    /// The simulated hour of day, in `[0, 24)`.
    pub hour: f64,
    /// The progress of an overtake manoeuvre, 1 when it starts and 0 when idle.
    pub overtake: f64,
    /// The lane of the lead obstacle.
    pub lane: Lane,
    /// Whether the headlights are on.
    pub headlights: bool,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            time: 0.0,
            commanded_speed: 40.0,
            display_speed: 40.0,
            distance: 40.0,
            visibility: 100.0,
            grip: 100.0,
            weather: Weather::Clear,
            hour: 12.0,
            overtake: 0.0,
            lane: Lane::Center,
            headlights: false,
        }
    }
}

impl SimulationState {
    /// Whether an overtake manoeuvre is in progress.
    pub fn is_overtaking(&self) -> bool {
        self.overtake > 0.0
    }

    /// The readings the controller sees, given the current speed reading.
    pub fn readings(&self, speed: f64) -> Readings {
        Readings {
            speed,
            distance: self.distance,
            visibility: self.visibility,
            grip: self.grip,
        }
    }
}

/// The inputs pushed into the simulation by its collaborators.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Controls {
    /// The commanded speed, in km/h.
    pub commanded_speed: f64,
    /// The action decided on for this tick.
    pub action: Action,
    /// An upper limit on visibility, in %.
    pub visibility: Option<f64>,
    /// An upper limit on grip, in %.
    pub grip: Option<f64>,
    pub weather: Weather,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            commanded_speed: 40.0,
            action: Action::Maintain,
            visibility: None,
            grip: None,
            weather: Weather::Clear,
        }
    }
}

/// One row of the simulation log.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogRecord {
    pub time: f64,
    pub commanded_speed: f64,
    pub display_speed: f64,
    pub distance_m: f64,
    pub visibility: f64,
    pub grip: f64,
    pub action_tag: Action,
    pub action_values: ControlValues,
    pub horn: bool,
    pub headlights: bool,
    pub hour: f64,
}

impl LogRecord {
    /// Records the state after a tick and the decision taken on it.
    pub fn new(state: &SimulationState, decision: &DecisionOutput) -> Self {
        Self {
            time: state.time,
            commanded_speed: state.commanded_speed,
            display_speed: state.display_speed,
            distance_m: state.distance,
            visibility: state.visibility,
            grip: state.grip,
            action_tag: decision.action,
            action_values: decision.values,
            horn: decision.horn,
            headlights: state.headlights,
            hour: state.hour,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn readings_use_the_given_speed() {
        let state = SimulationState {
            distance: 12.0,
            visibility: 55.0,
            grip: 70.0,
            ..Default::default()
        };
        let readings = state.readings(90.0);
        assert_eq!(readings.speed, 90.0);
        assert_eq!(readings.distance, 12.0);
        assert_eq!(readings.visibility, 55.0);
        assert_eq!(readings.grip, 70.0);
    }

    #[test]
    fn lanes_run_left_to_right() {
        let offsets = Lane::ALL.map(|lane| lane.offset());
        assert_eq!(offsets, [-1.0, 0.0, 1.0]);
        assert_eq!(Lane::default().offset(), 0.0);
    }
}
