//! Engine configuration, mapping methods, and per-call options.
//!
//! The configuration is flat on purpose: partial configs merge over a base
//! field by field, never recursively.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::error::{Result, SonifyError};

/// Waveform used for synthesis. Same set as [`Waveform`].
pub type WaveType = Waveform;

/// Effective engine configuration. Every field has a default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonifierConfig {
    /// Samples per second.
    pub sample_rate: u32,
    /// Length of the generated buffer in seconds, independent of input length.
    pub duration: f64,
    pub wave_type: WaveType,
    /// Base tone in Hz, used by the volume and rhythm methods.
    pub frequency: f64,
    pub min_frequency: f64,
    pub max_frequency: f64,
    /// Fixed amplitude for the frequency, rhythm, and melody methods [0, 1].
    pub volume: f64,
    pub min_volume: f64,
    pub max_volume: f64,
    /// Base rhythm [0, 1].
    pub rhythm: f64,
    pub min_rhythm: f64,
    pub max_rhythm: f64,
}

impl Default for SonifierConfig {
    fn default() -> Self {
        SonifierConfig {
            sample_rate: 44_100,
            duration: 2.0,
            wave_type: Waveform::Sine,
            frequency: 825.0,
            min_frequency: 150.0,
            max_frequency: 1500.0,
            volume: 0.3,
            min_volume: 0.1,
            max_volume: 0.5,
            rhythm: 0.5,
            min_rhythm: 0.1,
            max_rhythm: 1.0,
        }
    }
}

impl SonifierConfig {
    /// Number of samples in a full buffer: `round(sample_rate * duration)`.
    pub fn buffer_length(&self) -> usize {
        (self.sample_rate as f64 * self.duration).round() as usize
    }
}

/// A partial configuration. `None` fields keep the base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SonifierConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_type: Option<WaveType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rhythm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rhythm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rhythm: Option<f64>,
}

impl SonifierConfigPatch {
    /// Parse a JSON object holding any subset of the config fields.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            SonifyError::validation("config", format!("Invalid configuration: {e}")).with_cause(e)
        })
    }

    /// Shallow merge over `base`.
    pub fn apply(&self, base: &SonifierConfig) -> SonifierConfig {
        SonifierConfig {
            sample_rate: self.sample_rate.unwrap_or(base.sample_rate),
            duration: self.duration.unwrap_or(base.duration),
            wave_type: self.wave_type.unwrap_or(base.wave_type),
            frequency: self.frequency.unwrap_or(base.frequency),
            min_frequency: self.min_frequency.unwrap_or(base.min_frequency),
            max_frequency: self.max_frequency.unwrap_or(base.max_frequency),
            volume: self.volume.unwrap_or(base.volume),
            min_volume: self.min_volume.unwrap_or(base.min_volume),
            max_volume: self.max_volume.unwrap_or(base.max_volume),
            rhythm: self.rhythm.unwrap_or(base.rhythm),
            min_rhythm: self.min_rhythm.unwrap_or(base.min_rhythm),
            max_rhythm: self.max_rhythm.unwrap_or(base.max_rhythm),
        }
    }
}

impl From<SonifierConfig> for SonifierConfigPatch {
    fn from(c: SonifierConfig) -> Self {
        SonifierConfigPatch {
            sample_rate: Some(c.sample_rate),
            duration: Some(c.duration),
            wave_type: Some(c.wave_type),
            frequency: Some(c.frequency),
            min_frequency: Some(c.min_frequency),
            max_frequency: Some(c.max_frequency),
            volume: Some(c.volume),
            min_volume: Some(c.min_volume),
            max_volume: Some(c.max_volume),
            rhythm: Some(c.rhythm),
            min_rhythm: Some(c.min_rhythm),
            max_rhythm: Some(c.max_rhythm),
        }
    }
}

/// How data values are mapped onto sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SonifierMethod {
    /// Value drives pitch.
    Frequency,
    /// Value drives loudness of a fixed tone.
    Volume,
    /// Value drives the length of short ticks.
    Rhythm,
    /// Value picks a note from a seven-tone scale.
    #[default]
    Melody,
}

impl SonifierMethod {
    pub const ALL: [SonifierMethod; 4] = [
        SonifierMethod::Frequency,
        SonifierMethod::Volume,
        SonifierMethod::Rhythm,
        SonifierMethod::Melody,
    ];

    /// Resolve a method name. Unknown names fall back to `Melody`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "frequency" => SonifierMethod::Frequency,
            "volume" => SonifierMethod::Volume,
            "rhythm" => SonifierMethod::Rhythm,
            _ => SonifierMethod::Melody,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SonifierMethod::Frequency => "frequency",
            SonifierMethod::Volume => "volume",
            SonifierMethod::Rhythm => "rhythm",
            SonifierMethod::Melody => "melody",
        }
    }
}

impl FromStr for SonifierMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(SonifierMethod::from_name(s))
    }
}

impl From<String> for SonifierMethod {
    fn from(s: String) -> Self {
        SonifierMethod::from_name(&s)
    }
}

impl From<SonifierMethod> for String {
    fn from(m: SonifierMethod) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for SonifierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call options for [`crate::Sonifier::sonify`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SonifierOptions {
    /// Play the buffer before returning.
    pub auto_play: bool,
}
