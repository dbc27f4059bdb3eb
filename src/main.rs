use std::error::Error;
use std::io::{self, Write};

use fuzzy_drive::{Simulation, SimulationConfig, Weather};

/// Frames per simulated second.
const FPS: usize = 60;

/// Simulated seconds per weather.
const SECONDS_PER_WEATHER: usize = 8;

fn main() -> Result<(), Box<dyn Error>> {
    let config: SimulationConfig = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => SimulationConfig::default(),
    };
    let mut sim = Simulation::new(config)?;
    sim.set_demo_mode(true);

    let dt = 1.0 / FPS as f64;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for weather in Weather::ALL {
        sim.set_weather(weather);
        for _ in 0..SECONDS_PER_WEATHER * FPS {
            sim.step(dt);
        }
        // one record per simulated second
        for record in sim.take_log().iter().step_by(FPS) {
            writeln!(out, "{}", serde_json::to_string(record)?)?;
        }
    }
    Ok(())
}
