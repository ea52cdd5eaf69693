//! Stateless oscillators: `(frequency, time) -> amplitude`.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
}

/// A pure waveform generator. Holds no phase, so any sample can be
/// computed independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oscillator {
    pub waveform: Waveform,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Oscillator { waveform }
    }

    /// Amplitude in [-1, 1] at `time` seconds for a tone of `frequency` Hz.
    pub fn sample(&self, frequency: f64, time: f64) -> f64 {
        match self.waveform {
            Waveform::Sine => sine(frequency, time),
            Waveform::Square => square(frequency, time),
            Waveform::Sawtooth => sawtooth(frequency, time),
        }
    }
}

fn sine(frequency: f64, time: f64) -> f64 {
    (2.0 * PI * frequency * time).sin()
}

/// +1 for the first half-period, -1 for the second. The zero crossing
/// itself counts as +1.
fn square(frequency: f64, time: f64) -> f64 {
    if sine(frequency, time) >= 0.0 { 1.0 } else { -1.0 }
}

/// Rises linearly from -1 to +1 over each period. A 0 Hz tone holds at -1.
fn sawtooth(frequency: f64, time: f64) -> f64 {
    // Euclidean remainder: slot-local times can dip a hair below zero.
    let phase = (frequency * time).rem_euclid(1.0);
    (2.0 * phase - 1.0).clamp(-1.0, 1.0)
}
