//! Normalization and value-to-parameter mappings shared by every method.

use crate::config::SonifierConfig;

/// The seven-tone C major scale used by the melody method.
pub const SCALE_FREQUENCIES: [f64; 7] = [261.63, 293.66, 329.63, 349.23, 392.00, 440.00, 493.88];
pub const SCALE_NOTE_NAMES: [&str; 7] = ["C", "D", "E", "F", "G", "A", "B"];

/// Min/max/range of one input series, computed once per generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataRange {
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl DataRange {
    pub fn of(data: &[f64]) -> Self {
        if data.is_empty() {
            return DataRange { min: 0.0, max: 0.0, range: 0.0 };
        }
        let (min, max) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        DataRange { min, max, range: max - min }
    }

    /// Rescale `value` into [0, 1]. A flat series maps everything to 0.5.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.range.is_nan() || self.range <= 0.0 {
            return 0.5;
        }
        let n = if self.range.is_finite() {
            (value - self.min) / self.range
        } else {
            // The span overflowed; halved operands stay finite.
            (value / 2.0 - self.min / 2.0) / (self.max / 2.0 - self.min / 2.0)
        };
        if n.is_finite() { n.clamp(0.0, 1.0) } else { 0.5 }
    }
}

// Outside [0, 1] these extrapolate linearly instead of clamping.

pub fn to_frequency(config: &SonifierConfig, normalized: f64) -> f64 {
    config.min_frequency + normalized * (config.max_frequency - config.min_frequency)
}

pub fn to_volume(config: &SonifierConfig, normalized: f64) -> f64 {
    config.min_volume + normalized * (config.max_volume - config.min_volume)
}

/// Higher values give shorter intervals.
pub fn to_interval(config: &SonifierConfig, normalized: f64) -> f64 {
    config.min_rhythm + (1.0 - normalized) * (config.max_rhythm - config.min_rhythm)
}

/// Scale degree for a normalized value. 1.0 lands on the last degree.
pub fn to_note_index(normalized: f64) -> usize {
    let index = (normalized * 7.0).floor();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(6)
    }
}

pub fn to_note_frequency(normalized: f64) -> f64 {
    SCALE_FREQUENCIES[to_note_index(normalized)]
}

pub fn to_note_name(normalized: f64) -> &'static str {
    SCALE_NOTE_NAMES[to_note_index(normalized)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn range_of_series() {
        let r = DataRange::of(&[3.0, -2.0, 7.5, 0.0]);
        assert_eq!(r.min, -2.0);
        assert_eq!(r.max, 7.5);
        assert_eq!(r.range, 9.5);
    }

    #[test]
    fn normalize_endpoints_and_middle() {
        let r = DataRange::of(&[0.0, 0.5, 1.0]);
        assert_eq!(r.normalize(0.0), 0.0);
        assert_eq!(r.normalize(0.5), 0.5);
        assert_eq!(r.normalize(1.0), 1.0);
    }

    #[test]
    fn normalize_clamps_foreign_values() {
        let r = DataRange::of(&[10.0, 20.0]);
        assert_eq!(r.normalize(0.0), 0.0);
        assert_eq!(r.normalize(30.0), 1.0);
    }

    #[test]
    fn overflowing_span_still_normalizes() {
        let range = DataRange::of(&[-1e308, 0.0, 1e308]);
        assert!(range.range.is_infinite());
        assert_relative_eq!(range.normalize(-1e308), 0.0);
        assert_relative_eq!(range.normalize(0.0), 0.5);
        assert_relative_eq!(range.normalize(1e308), 1.0);
        assert_relative_eq!(range.normalize(f64::MAX), 1.0);
    }

    #[test]
    fn flat_and_empty_series_normalize_to_half() {
        assert_eq!(DataRange::of(&[10.0, 10.0, 10.0]).normalize(10.0), 0.5);
        assert_eq!(DataRange::of(&[]).normalize(42.0), 0.5);
    }

    #[test]
    fn frequency_mapping() {
        let c = SonifierConfig::default();
        assert_eq!(to_frequency(&c, 0.0), 150.0);
        assert_eq!(to_frequency(&c, 1.0), 1500.0);
        assert_eq!(to_frequency(&c, 0.5), 825.0);
    }

    #[test]
    fn mappings_extrapolate_outside_unit_range() {
        let c = SonifierConfig::default();
        assert_eq!(to_frequency(&c, -1.0), -1200.0);
        assert_eq!(to_frequency(&c, 2.0), 2850.0);
        assert_relative_eq!(to_volume(&c, 2.0), 0.9, epsilon = 1e-12);
    }

    #[test]
    fn volume_mapping() {
        let c = SonifierConfig::default();
        assert_eq!(to_volume(&c, 0.0), 0.1);
        assert_eq!(to_volume(&c, 1.0), 0.5);
        assert_relative_eq!(to_volume(&c, 0.5), 0.3, epsilon = 1e-10);
    }

    #[test]
    fn interval_mapping_is_inverted() {
        let c = SonifierConfig::default();
        assert_eq!(to_interval(&c, 0.0), 1.0);
        assert_relative_eq!(to_interval(&c, 1.0), 0.1, epsilon = 1e-12);
        assert!(to_interval(&c, 0.8) < to_interval(&c, 0.2));
    }

    #[test]
    fn note_index_edges() {
        assert_eq!(to_note_index(0.0), 0);
        assert_eq!(to_note_index(1.0), 6);
        assert_eq!(to_note_name(0.0), "C");
        assert_eq!(to_note_name(1.0), "B");
        assert_eq!(to_note_frequency(1.0), 493.88);
    }

    #[test]
    fn each_seventh_hits_its_degree() {
        for (i, freq) in SCALE_FREQUENCIES.iter().enumerate() {
            let n = i as f64 / 7.0;
            assert_eq!(to_note_frequency(n), *freq, "degree {i}");
        }
    }
}
