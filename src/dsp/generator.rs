//! Sound generators: one per mapping method.
//!
//! The output buffer always spans `sample_rate * duration` samples and is
//! cut into one equal slot per input value. Slot `i` starts at
//! `i * duration / n` seconds; each generator decides what sounds inside it.

use std::ops::Range;

use tracing::debug;

use crate::buffer::DataPoint;
use crate::config::{SonifierConfig, SonifierMethod};

use super::mapping::{self, DataRange};
use super::oscillator::Oscillator;

/// Longest tick the rhythm method will emit, in seconds.
const MAX_TICK_SECONDS: f64 = 0.1;

/// Raw generator output, before it is wrapped into an [`crate::AudioBuffer`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundGeneration {
    pub samples: Vec<f32>,
    pub data_points: Vec<DataPoint>,
}

impl SoundGeneration {
    pub fn empty() -> Self {
        SoundGeneration::default()
    }
}

/// The four mapping strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundGenerator {
    Frequency,
    Volume,
    Rhythm,
    Melody,
}

impl From<SonifierMethod> for SoundGenerator {
    fn from(method: SonifierMethod) -> Self {
        match method {
            SonifierMethod::Frequency => SoundGenerator::Frequency,
            SonifierMethod::Volume => SoundGenerator::Volume,
            SonifierMethod::Rhythm => SoundGenerator::Rhythm,
            SonifierMethod::Melody => SoundGenerator::Melody,
        }
    }
}

impl SoundGenerator {
    /// Render `data`. Empty input short-circuits to empty output.
    pub fn generate(
        &self,
        data: &[f64],
        config: &SonifierConfig,
        oscillator: &Oscillator,
    ) -> SoundGeneration {
        if data.is_empty() {
            return SoundGeneration::empty();
        }

        let slots = Slots::new(data.len(), config);
        let range = DataRange::of(data);
        let result = match self {
            SoundGenerator::Frequency => frequency(data, config, oscillator, &slots, &range),
            SoundGenerator::Volume => volume(data, config, oscillator, &slots, &range),
            SoundGenerator::Rhythm => rhythm(data, config, oscillator, &slots, &range),
            SoundGenerator::Melody => melody(data, config, oscillator, &slots, &range),
        };

        debug!(
            generator = ?self,
            points = result.data_points.len(),
            samples = result.samples.len(),
            "generated audio"
        );
        result
    }
}

/// Generate with the oscillator selected by `config.wave_type`.
pub fn generate(data: &[f64], method: SonifierMethod, config: &SonifierConfig) -> SoundGeneration {
    let oscillator = Oscillator::new(config.wave_type);
    SoundGenerator::from(method).generate(data, config, &oscillator)
}

// ── Slot timing ─────────────────────────────────────────────

struct Slots {
    /// Seconds per input value.
    width: f64,
    sample_rate: f64,
    length: usize,
}

impl Slots {
    fn new(count: usize, config: &SonifierConfig) -> Self {
        Slots {
            width: config.duration / count as f64,
            sample_rate: config.sample_rate as f64,
            length: config.buffer_length(),
        }
    }

    fn start_time(&self, index: usize) -> f64 {
        index as f64 * self.width
    }

    /// First sample at or before `time`.
    fn sample_index(&self, time: f64) -> usize {
        (time * self.sample_rate).floor() as usize
    }

    fn samples(&self, index: usize) -> Range<usize> {
        self.sample_index(self.start_time(index))..self.sample_index(self.start_time(index + 1))
    }

    /// Write `tone(local_time)` over `range`, clipped to the buffer.
    /// Local time restarts at zero at the slot boundary `slot_start`.
    fn fill(
        &self,
        buffer: &mut [f32],
        range: Range<usize>,
        slot_start: f64,
        mut tone: impl FnMut(f64) -> f64,
    ) {
        let end = range.end.min(buffer.len());
        for index in range.start.min(end)..end {
            let local_time = index as f64 / self.sample_rate - slot_start;
            buffer[index] = tone(local_time) as f32;
        }
    }

    fn silence(&self, buffer: &mut [f32], range: Range<usize>) {
        let end = range.end.min(buffer.len());
        buffer[range.start.min(end)..end].fill(0.0);
    }
}

fn point(value: f64, timestamp: f64, volume: f64, frequency: f64) -> DataPoint {
    DataPoint {
        value,
        timestamp,
        volume,
        frequency,
        note: None,
    }
}

// ── Strategies ──────────────────────────────────────────────

/// Pitch follows the value; loudness is `config.volume`.
fn frequency(
    data: &[f64],
    config: &SonifierConfig,
    oscillator: &Oscillator,
    slots: &Slots,
    range: &DataRange,
) -> SoundGeneration {
    let mut samples = vec![0.0f32; slots.length];
    let mut data_points = Vec::with_capacity(data.len());

    for (i, &value) in data.iter().enumerate() {
        let n = range.normalize(value);
        let freq = mapping::to_frequency(config, n);
        let start = slots.start_time(i);
        data_points.push(point(value, start, mapping::to_volume(config, n), freq));

        slots.fill(&mut samples, slots.samples(i), start, |t| {
            oscillator.sample(freq, t) * config.volume
        });
    }

    SoundGeneration { samples, data_points }
}

/// Fixed base tone; loudness follows the value.
fn volume(
    data: &[f64],
    config: &SonifierConfig,
    oscillator: &Oscillator,
    slots: &Slots,
    range: &DataRange,
) -> SoundGeneration {
    let mut samples = vec![0.0f32; slots.length];
    let mut data_points = Vec::with_capacity(data.len());
    let base = config.frequency;

    for (i, &value) in data.iter().enumerate() {
        let n = range.normalize(value);
        let gain = mapping::to_volume(config, n);
        let start = slots.start_time(i);
        data_points.push(point(value, start, gain, base));

        slots.fill(&mut samples, slots.samples(i), start, |t| {
            oscillator.sample(base, t) * gain
        });
    }

    SoundGeneration { samples, data_points }
}

/// A short tick at the start of every slot, then silence until the next one.
/// Larger values give shorter ticks.
fn rhythm(
    data: &[f64],
    config: &SonifierConfig,
    oscillator: &Oscillator,
    slots: &Slots,
    range: &DataRange,
) -> SoundGeneration {
    let mut samples = vec![0.0f32; slots.length];
    let mut data_points = Vec::with_capacity(data.len());
    let base = config.frequency;

    for (i, &value) in data.iter().enumerate() {
        let n = range.normalize(value);
        let start = slots.start_time(i);
        data_points.push(point(
            value,
            start,
            mapping::to_volume(config, n),
            mapping::to_frequency(config, n),
        ));

        let tick = MAX_TICK_SECONDS.min(mapping::to_interval(config, n) * MAX_TICK_SECONDS);
        let tick_start = slots.sample_index(start);
        let tick_end = slots.sample_index(start + tick);
        slots.fill(&mut samples, tick_start..tick_end, start, |t| {
            oscillator.sample(base, t) * config.volume
        });

        if i + 1 < data.len() {
            let next = slots.sample_index(slots.start_time(i + 1));
            slots.silence(&mut samples, tick_end..next);
        }
    }

    SoundGeneration { samples, data_points }
}

/// Value picks a degree of the C major scale.
fn melody(
    data: &[f64],
    config: &SonifierConfig,
    oscillator: &Oscillator,
    slots: &Slots,
    range: &DataRange,
) -> SoundGeneration {
    let mut samples = vec![0.0f32; slots.length];
    let mut data_points = Vec::with_capacity(data.len());

    for (i, &value) in data.iter().enumerate() {
        let n = range.normalize(value);
        let note_freq = mapping::to_note_frequency(n);
        let start = slots.start_time(i);
        data_points.push(DataPoint {
            note: Some(mapping::to_note_name(n).to_string()),
            ..point(
                value,
                start,
                mapping::to_volume(config, n),
                mapping::to_frequency(config, n),
            )
        });

        slots.fill(&mut samples, slots.samples(i), start, |t| {
            oscillator.sample(note_freq, t) * config.volume
        });
    }

    SoundGeneration { samples, data_points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::Waveform;
    use approx::assert_relative_eq;

    fn small_config() -> SonifierConfig {
        SonifierConfig {
            sample_rate: 8_000,
            duration: 1.0,
            ..SonifierConfig::default()
        }
    }

    #[test]
    fn empty_input_short_circuits() {
        for method in SonifierMethod::ALL {
            let out = generate(&[], method, &SonifierConfig::default());
            assert!(out.samples.is_empty(), "{method} produced samples");
            assert!(out.data_points.is_empty(), "{method} produced points");
        }
    }

    #[test]
    fn full_length_for_every_method_and_waveform() {
        for wave_type in [Waveform::Sine, Waveform::Square, Waveform::Sawtooth] {
            let config = SonifierConfig { wave_type, ..small_config() };
            for method in SonifierMethod::ALL {
                let out = generate(&[1.0, 5.0, 2.0, 8.0, 3.0], method, &config);
                assert_eq!(out.samples.len(), 8_000, "{method}/{wave_type:?}");
                assert_eq!(out.data_points.len(), 5);
                assert!(
                    out.samples.iter().all(|s| (-1.0..=1.0).contains(s)),
                    "{method}/{wave_type:?} left [-1, 1]"
                );
            }
        }
    }

    #[test]
    fn frequency_method_maps_endpoints() {
        let out = generate(&[0.0, 0.5, 1.0], SonifierMethod::Frequency, &SonifierConfig::default());
        assert_eq!(out.data_points[0].frequency, 150.0);
        assert_eq!(out.data_points[1].frequency, 825.0);
        assert_eq!(out.data_points[2].frequency, 1500.0);
        assert_eq!(out.data_points[0].volume, 0.1);
        assert_eq!(out.data_points[2].volume, 0.5);
    }

    #[test]
    fn timestamps_are_slot_starts() {
        let out = generate(&[1.0, 2.0, 3.0, 4.0], SonifierMethod::Volume, &SonifierConfig::default());
        let stamps: Vec<f64> = out.data_points.iter().map(|p| p.timestamp).collect();
        assert_eq!(stamps, vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn only_melody_sets_note() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0];
        for method in SonifierMethod::ALL {
            let out = generate(&data, method, &small_config());
            let has_notes = out.data_points.iter().all(|p| p.note.is_some());
            let no_notes = out.data_points.iter().all(|p| p.note.is_none());
            if method == SonifierMethod::Melody {
                assert!(has_notes);
            } else {
                assert!(no_notes, "{method} set a note");
            }
        }
    }

    #[test]
    fn melody_notes_span_scale() {
        let out = generate(&[0.0, 1.0], SonifierMethod::Melody, &small_config());
        assert_eq!(out.data_points[0].note.as_deref(), Some("C"));
        assert_eq!(out.data_points[1].note.as_deref(), Some("B"));
    }

    #[test]
    fn volume_method_reports_base_tone() {
        let out = generate(&[0.0, 1.0], SonifierMethod::Volume, &SonifierConfig::default());
        assert!(out.data_points.iter().all(|p| p.frequency == 825.0));
        assert_eq!(out.data_points[0].volume, 0.1);
        assert_eq!(out.data_points[1].volume, 0.5);
    }

    #[test]
    fn flat_series_maps_identically() {
        for method in SonifierMethod::ALL {
            let out = generate(&[10.0, 10.0, 10.0], method, &SonifierConfig::default());
            let first = &out.data_points[0];
            for p in &out.data_points {
                assert_eq!(p.frequency, first.frequency, "{method}");
                assert_eq!(p.volume, first.volume, "{method}");
                assert_eq!(p.note, first.note, "{method}");
            }
        }
        let out = generate(&[10.0, 10.0], SonifierMethod::Frequency, &SonifierConfig::default());
        assert_eq!(out.data_points[0].frequency, 825.0);
    }

    #[test]
    fn single_value_fills_whole_buffer() {
        let config = SonifierConfig { wave_type: Waveform::Square, ..small_config() };
        let out = generate(&[42.0], SonifierMethod::Frequency, &config);
        assert!(out.samples.iter().all(|s| s.abs() > 0.0), "square tone has no gaps");
        assert_eq!(out.data_points[0].timestamp, 0.0);
    }

    #[test]
    fn frequency_synthesis_uses_config_volume() {
        let config = SonifierConfig { wave_type: Waveform::Square, ..small_config() };
        let out = generate(&[0.0, 1.0], SonifierMethod::Frequency, &config);
        assert_relative_eq!(out.samples[0], 0.3f32);
    }

    #[test]
    fn volume_synthesis_scales_by_mapped_gain() {
        let config = SonifierConfig { wave_type: Waveform::Square, ..small_config() };
        let out = generate(&[0.0, 1.0], SonifierMethod::Volume, &config);
        assert_relative_eq!(out.samples[0], 0.1f32);
        assert_relative_eq!(out.samples[4_000], 0.5f32);
    }

    #[test]
    fn rhythm_ticks_then_silence() {
        let config = SonifierConfig { wave_type: Waveform::Square, ..small_config() };
        // Two slots of 0.5 s. The low value ticks for 0.1 s, the high one
        // for 0.1 * 0.1 = 0.01 s.
        let out = generate(&[0.0, 1.0], SonifierMethod::Rhythm, &config);
        let s = &out.samples;
        assert!(s[..800].iter().all(|x| x.abs() > 0.0));
        assert!(s[800..4_000].iter().all(|&x| x == 0.0));
        assert!(s[4_000..4_080].iter().all(|x| x.abs() > 0.0));
        assert!(s[4_080..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn deterministic_for_same_input() {
        let data = [0.3, -1.2, 9.9, 4.4];
        let a = generate(&data, SonifierMethod::Melody, &small_config());
        let b = generate(&data, SonifierMethod::Melody, &small_config());
        assert_eq!(a, b);
    }

    #[test]
    fn fractional_slot_boundaries_stay_in_bounds() {
        let config = SonifierConfig {
            sample_rate: 44_100,
            duration: 0.33,
            wave_type: Waveform::Sawtooth,
            ..SonifierConfig::default()
        };
        let data: Vec<f64> = (0..997).map(|i| (i as f64 * 0.37).sin()).collect();
        for method in SonifierMethod::ALL {
            let out = generate(&data, method, &config);
            assert_eq!(out.samples.len(), config.buffer_length());
            assert!(out.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        }
    }
}
