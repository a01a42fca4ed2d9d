//! Brain-state presets for synthetic EEG

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::str::FromStr;

/// Centre frequency (Hz) of the oscillator used for each band
pub const BAND_FREQUENCIES: [f64; 5] = [2.0, 6.0, 10.0, 20.0, 38.0];

/// Oscillator amplitudes in raw ADC units, delta first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandAmplitudes {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl BandAmplitudes {
    pub fn as_array(&self) -> [f64; 5] {
        [self.delta, self.theta, self.alpha, self.beta, self.gamma]
    }

    /// Sum of all oscillators at time `t` with the given phase offsets
    pub fn sample(&self, t: f64, phases: &[f64; 5]) -> f64 {
        self.as_array()
            .iter()
            .zip(BAND_FREQUENCIES)
            .zip(phases)
            .map(|((amp, freq), phase)| amp * (2.0 * PI * freq * t + phase).sin())
            .sum()
    }
}

/// Mental state the simulated wearer is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrainState {
    /// Eyes closed, strong alpha
    Relaxed,
    /// Concentrating, beta dominated
    Focused,
    /// Falling asleep, slow waves
    Drowsy,
    /// Deep meditation, theta and alpha
    Meditative,
}

impl BrainState {
    pub const ALL: [BrainState; 4] = [
        BrainState::Relaxed,
        BrainState::Focused,
        BrainState::Drowsy,
        BrainState::Meditative,
    ];

    pub fn amplitudes(&self) -> BandAmplitudes {
        match self {
            BrainState::Relaxed => BandAmplitudes {
                delta: 30.0,
                theta: 25.0,
                alpha: 120.0,
                beta: 20.0,
                gamma: 6.0,
            },
            BrainState::Focused => BandAmplitudes {
                delta: 25.0,
                theta: 20.0,
                alpha: 30.0,
                beta: 90.0,
                gamma: 20.0,
            },
            BrainState::Drowsy => BandAmplitudes {
                delta: 150.0,
                theta: 60.0,
                alpha: 25.0,
                beta: 10.0,
                gamma: 4.0,
            },
            BrainState::Meditative => BandAmplitudes {
                delta: 35.0,
                theta: 100.0,
                alpha: 80.0,
                beta: 12.0,
                gamma: 5.0,
            },
        }
    }

    /// Typical `(attention, meditation)` eSense levels
    pub fn esense_levels(&self) -> (u8, u8) {
        match self {
            BrainState::Relaxed => (40, 70),
            BrainState::Focused => (80, 35),
            BrainState::Drowsy => (20, 50),
            BrainState::Meditative => (45, 85),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BrainState::Relaxed => "relaxed",
            BrainState::Focused => "focused",
            BrainState::Drowsy => "drowsy",
            BrainState::Meditative => "meditative",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BrainState::Relaxed => "Eyes closed, dominant alpha rhythm",
            BrainState::Focused => "Active concentration, elevated beta",
            BrainState::Drowsy => "Drowsiness, slow delta waves",
            BrainState::Meditative => "Meditation, strong theta",
        }
    }
}

impl std::fmt::Display for BrainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BrainState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BrainState::ALL
            .into_iter()
            .find(|state| state.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<_> = BrainState::ALL.iter().map(|s| s.name()).collect();
                format!("unknown brain state '{}', expected one of: {}", s, names.join(", "))
            })
    }
}
