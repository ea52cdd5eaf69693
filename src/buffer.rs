//! Output types: per-point mapping metadata and the finished audio buffer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dsp::renderer;
use crate::error::{Result, SonifyError};

/// How one input value was mapped onto sound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// The original input value.
    pub value: f64,
    /// Seconds from the start of the buffer.
    pub timestamp: f64,
    pub volume: f64,
    pub frequency: f64,
    /// Note name. Only the melody method sets this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Immutable mono audio buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap generated samples into a buffer of exactly `length` frames,
    /// padding with silence when fewer samples were produced.
    pub fn from_samples(mut samples: Vec<f32>, sample_rate: u32, length: usize) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SonifyError::audio_context(
                "Cannot create an audio buffer with a sample rate of 0",
            ));
        }
        if samples.len() > length {
            return Err(SonifyError::audio_context(format!(
                "Generated {} samples for a buffer of {length}",
                samples.len()
            )));
        }
        samples.resize(length, 0.0);
        Ok(AudioBuffer {
            samples: samples.into(),
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Shared handle to the sample data, for handing to playback threads.
    pub fn shared_samples(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        1
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Encode as a 16-bit mono PCM WAV file.
    pub fn to_wav(&self) -> Vec<u8> {
        renderer::encode_wav(self)
    }
}

/// The outcome of one sonification call.
#[derive(Debug, Clone, PartialEq)]
pub struct SonificationResult {
    pub audio_buffer: AudioBuffer,
    /// Configured duration in seconds.
    pub duration: f64,
    pub data_points: Vec<DataPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_input_with_silence() {
        let buf = AudioBuffer::from_samples(vec![0.5, -0.5], 8_000, 5).unwrap();
        assert_eq!(buf.samples(), &[0.5, -0.5, 0.0, 0.0, 0.0]);
        assert_eq!(buf.channels(), 1);
    }

    #[test]
    fn empty_samples_become_full_length_buffer() {
        let buf = AudioBuffer::from_samples(Vec::new(), 44_100, 88_200).unwrap();
        assert_eq!(buf.len(), 88_200);
        assert!((buf.duration() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let err = AudioBuffer::from_samples(vec![0.0; 4], 0, 4).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::AudioContext);
    }

    #[test]
    fn rejects_overlong_sample_data() {
        let err = AudioBuffer::from_samples(vec![0.0; 6], 8_000, 4).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::AudioContext);
    }

    #[test]
    fn note_omitted_from_json_when_absent() {
        let p = DataPoint {
            value: 1.0,
            timestamp: 0.0,
            volume: 0.3,
            frequency: 825.0,
            note: None,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("note").is_none());

        let with_note = DataPoint {
            note: Some("C".to_string()),
            ..p
        };
        let json = serde_json::to_value(&with_note).unwrap();
        assert_eq!(json["note"], "C");
    }
}
