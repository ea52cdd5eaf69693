//! Input and configuration checks. Run before any generation work.

use serde_json::Value;

use crate::config::SonifierConfig;
use crate::error::{Result, SonifyError};

/// Longest accepted input series.
pub const MAX_DATA_LENGTH: usize = 10_000;

/// Reject series that are too long or hold NaN / infinite values.
pub fn validate_data(data: &[f64]) -> Result<()> {
    check_length(data.len())?;
    if let Some(index) = data.iter().position(|v| !v.is_finite()) {
        return Err(SonifyError::validation(
            "data",
            format!("Data contains a non-finite value at index {index}"),
        ));
    }
    Ok(())
}

/// Validate dynamically typed input (JSON or a JS value) and extract the series.
/// `null` and non-numeric elements count as absent and are rejected.
pub fn validate_data_value(value: &Value) -> Result<Vec<f64>> {
    let items = value
        .as_array()
        .ok_or_else(|| SonifyError::validation("data", "Data must be an array of numbers"))?;
    check_length(items.len())?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item.as_f64() {
            Some(v) if v.is_finite() => Ok(v),
            Some(_) => Err(SonifyError::validation(
                "data",
                format!("Data contains a non-finite value at index {index}"),
            )),
            None => Err(SonifyError::validation(
                "data",
                format!("Data is missing a numeric value at index {index}"),
            )),
        })
        .collect()
}

fn check_length(len: usize) -> Result<()> {
    if len > MAX_DATA_LENGTH {
        return Err(SonifyError::validation(
            "data",
            format!("Data length {len} exceeds the maximum of {MAX_DATA_LENGTH}"),
        ));
    }
    Ok(())
}

/// Reject, never clamp, an invalid configuration.
pub fn validate_config(config: &SonifierConfig) -> Result<()> {
    if config.sample_rate == 0 {
        return Err(SonifyError::validation("sampleRate", "Sample rate must be positive"));
    }
    if !(config.duration.is_finite() && config.duration > 0.0) {
        return Err(SonifyError::validation("duration", "Duration must be positive"));
    }

    require_finite("frequency", &[config.frequency, config.min_frequency, config.max_frequency])?;
    require_finite("volume", &[config.volume, config.min_volume, config.max_volume])?;
    require_finite("rhythm", &[config.rhythm, config.min_rhythm, config.max_rhythm])?;

    if config.min_frequency >= config.max_frequency {
        return Err(SonifyError::validation(
            "frequency",
            "Minimum frequency must be less than maximum frequency",
        ));
    }
    if !(0.0..=1.0).contains(&config.volume) {
        return Err(SonifyError::validation("volume", "Volume must be between 0 and 1"));
    }
    if !(0.0..=1.0).contains(&config.min_volume) || !(0.0..=1.0).contains(&config.max_volume) {
        return Err(SonifyError::validation(
            "volume",
            "Minimum and maximum volume must be between 0 and 1",
        ));
    }
    if config.min_volume >= config.max_volume {
        return Err(SonifyError::validation(
            "volume",
            "Minimum volume must be less than maximum volume",
        ));
    }
    if !(0.0..=1.0).contains(&config.rhythm) {
        return Err(SonifyError::validation("rhythm", "Rhythm must be between 0 and 1"));
    }
    if config.min_rhythm >= config.max_rhythm {
        return Err(SonifyError::validation(
            "rhythm",
            "Minimum rhythm must be less than maximum rhythm",
        ));
    }
    Ok(())
}

fn require_finite(field: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SonifyError::validation(field, format!("{field} settings must be finite numbers")))
    }
}
