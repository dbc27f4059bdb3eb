//! Visibility and grip: a day/night cycle sets the baseline visibility,
//! the weather caps visibility and grip, and the displayed values ease
//! towards their targets.

use crate::state::{Controls, SimulationState, PERCENT};
use crate::util::{relax, Interval};

/// Full visibility, in %.
const FULL: f64 = 100.0;

/// The weather mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Fog,
    Dust,
}

impl Weather {
    /// Every weather mode.
    pub const ALL: [Weather; 4] = [Weather::Clear, Weather::Rain, Weather::Fog, Weather::Dust];

    /// The highest visibility possible in this weather, in %.
    pub fn visibility_ceiling(&self) -> f64 {
        match self {
            Self::Clear => FULL,
            Self::Rain => 60.0,
            Self::Fog => 25.0,
            Self::Dust => 35.0,
        }
    }

    /// The highest grip possible in this weather, in %.
    pub fn grip_ceiling(&self) -> f64 {
        match self {
            Self::Clear => FULL,
            Self::Rain => 55.0,
            Self::Fog => 85.0,
            Self::Dust => 75.0,
        }
    }
}

/// The hours of dawn and dusk and how dark the night is.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DayCycle {
    /// Visibility rises from the night floor to full over these hours.
    pub dawn: Interval<f64>,
    /// Visibility falls from full to the night floor over these hours.
    pub dusk: Interval<f64>,
    /// Visibility at night, in %.
    pub night_visibility: f64,
}

impl Default for DayCycle {
    fn default() -> Self {
        Self {
            dawn: Interval::new(5.0, 7.0),
            dusk: Interval::new(18.0, 20.0),
            night_visibility: 30.0,
        }
    }
}

impl DayCycle {
    /// The visibility afforded by daylight at the given hour, in %.
    pub fn baseline_visibility(&self, hour: f64) -> f64 {
        let hour = hour.rem_euclid(24.0);
        let light = Interval::new(self.night_visibility, FULL);
        if self.dawn.contains(hour) {
            light.lerp(self.dawn.inv_lerp(hour))
        } else if self.dusk.contains(hour) {
            light.lerp(1.0 - self.dusk.inv_lerp(hour))
        } else if hour > self.dawn.max && hour < self.dusk.min {
            FULL
        } else {
            self.night_visibility
        }
    }

    /// Whether it is night, i.e. before the middle of dawn or after the middle of dusk.
    pub fn is_night(&self, hour: f64) -> bool {
        let hour = hour.rem_euclid(24.0);
        hour < self.dawn.midpoint() || hour >= self.dusk.midpoint()
    }
}

/// Parameters of the environment model.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EnvironmentConfig {
    pub day: DayCycle,
    /// Simulated hours which pass per second of simulation.
    pub hours_per_second: f64,
    /// The rate at which visibility recovers, per second.
    pub visibility_rise_rate: f64,
    /// The rate at which visibility worsens, per second.
    pub visibility_fall_rate: f64,
    /// The rate at which grip follows its target, per second.
    pub grip_rate: f64,
    /// Headlights are switched on below this visibility, in %.
    pub headlight_visibility: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            day: DayCycle::default(),
            hours_per_second: 0.1,
            visibility_rise_rate: 0.5,
            visibility_fall_rate: 1.5,
            grip_rate: 1.0,
            headlight_visibility: 40.0,
        }
    }
}

/// The visibility the display eases towards: the least of the daylight
/// baseline, the weather ceiling and any external override.
pub fn visibility_target(day: &DayCycle, hour: f64, weather: Weather, limit: Option<f64>) -> f64 {
    let target = f64::min(day.baseline_visibility(hour), weather.visibility_ceiling());
    PERCENT.clamp(limit.map_or(target, |limit| f64::min(target, limit)))
}

/// The grip the display eases towards: the weather ceiling, or any lower override.
pub fn grip_target(weather: Weather, limit: Option<f64>) -> f64 {
    let target = weather.grip_ceiling();
    PERCENT.clamp(limit.map_or(target, |limit| f64::min(target, limit)))
}

/// Whether the headlights should be on.
pub fn headlights(config: &EnvironmentConfig, visibility: f64, hour: f64, weather: Weather) -> bool {
    visibility < config.headlight_visibility || config.day.is_night(hour) || weather != Weather::Clear
}

/// Eases visibility and grip towards their targets and updates the headlights.
pub(crate) fn advance(state: &mut SimulationState, controls: &Controls, dt: f64, config: &EnvironmentConfig) {
    let limit = |value: Option<f64>| value.filter(|v| v.is_finite());

    let target = visibility_target(&config.day, state.hour, state.weather, limit(controls.visibility));
    let rate = if target > state.visibility {
        config.visibility_rise_rate
    } else {
        config.visibility_fall_rate
    };
    state.visibility = PERCENT.clamp(relax(state.visibility, target, rate, dt));

    let target = grip_target(state.weather, limit(controls.grip));
    state.grip = PERCENT.clamp(relax(state.grip, target, config.grip_rate, dt));

    state.headlights = headlights(config, state.visibility, state.hour, state.weather);
}
