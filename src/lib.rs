//! Data sonification: turn a numeric series into an audio buffer.
//!
//! ```
//! use sonify_core::{Sonifier, SonifierConfigPatch, SonifierMethod, SonifierOptions};
//!
//! # fn main() -> sonify_core::Result<()> {
//! let sonifier = Sonifier::new(SonifierConfigPatch::default())?;
//! let result = sonifier.sonify(&[3.0, 1.0, 4.0, 1.0, 5.0], SonifierMethod::Melody, SonifierOptions::default())?;
//! assert_eq!(result.data_points[4].note.as_deref(), Some("B"));
//! assert_eq!(result.audio_buffer.len(), 88_200);
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod dsp;
pub mod error;
pub mod output;
pub mod sonifier;
pub mod validation;
pub mod worker;

pub use crate::buffer::{AudioBuffer, DataPoint, SonificationResult};
pub use crate::config::{SonifierConfig, SonifierConfigPatch, SonifierMethod, SonifierOptions, WaveType};
pub use crate::dsp::oscillator::{Oscillator, Waveform};
pub use crate::error::{ErrorKind, Result, SonifyError};
pub use crate::output::{AudioSink, Playback};
pub use crate::sonifier::{Sonifier, SonifierBuilder, WorkerMode};

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::worker::WorkerResponse;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One-shot sonification on the caller's thread. Playback is left to the caller.
pub fn sonify(
    data: &[f64],
    method: SonifierMethod,
    config: SonifierConfigPatch,
) -> Result<SonificationResult> {
    let sonifier = Sonifier::builder()
        .config(config)
        .worker(WorkerMode::Disabled)
        .build()?;
    sonifier.sonify(data, method, SonifierOptions::default())
}

/// Run a sonification from loosely typed input, as the WASM bindings receive it.
pub fn sonify_value(
    data: &serde_json::Value,
    method: &str,
    config: SonifierConfigPatch,
) -> Result<SonificationResult> {
    let data = validation::validate_data_value(data)?;
    sonify(&data, SonifierMethod::from_name(method), config)
}

// ── WASM bindings ───────────────────────────────────────────

fn to_js_error(e: SonifyError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js<T: Serialize>(value: &T) -> std::result::Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&format!("{e}")))
}

fn from_js_args(
    data: JsValue,
    config: JsValue,
) -> std::result::Result<(serde_json::Value, SonifierConfigPatch), JsValue> {
    let data: serde_json::Value = serde_wasm_bindgen::from_value(data)
        .map_err(|e| to_js_error(SonifyError::validation("data", format!("{e}"))))?;
    let config = if config.is_undefined() || config.is_null() {
        SonifierConfigPatch::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| to_js_error(SonifyError::validation("config", format!("{e}"))))?
    };
    Ok((data, config))
}

/// WASM-exposed: return the crate version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: sonify `data` and return an `AUDIO_GENERATED` envelope,
/// the same shape the Web Worker entry point answers with.
#[wasm_bindgen]
pub fn sonify_samples(
    data: JsValue,
    method: &str,
    config: JsValue,
) -> std::result::Result<JsValue, JsValue> {
    let (data, config) = from_js_args(data, config)?;
    let result = sonify_value(&data, method, config).map_err(to_js_error)?;
    let response = WorkerResponse::AudioGenerated {
        audio_samples: result.audio_buffer.samples().to_vec(),
        sample_rate: result.audio_buffer.sample_rate(),
        duration: result.duration,
        data_points: result.data_points,
    };
    to_js(&response)
}

/// WASM-exposed: sonify `data` and return a 16-bit mono WAV file.
#[wasm_bindgen]
pub fn sonify_wav(
    data: JsValue,
    method: &str,
    config: JsValue,
) -> std::result::Result<Vec<u8>, JsValue> {
    let (data, config) = from_js_args(data, config)?;
    let result = sonify_value(&data, method, config).map_err(to_js_error)?;
    Ok(result.audio_buffer.to_wav())
}

/// WASM-exposed: Web Worker entry point. Takes a `GENERATE_AUDIO` envelope
/// as a JSON string and returns the response envelope as a JSON string.
#[wasm_bindgen]
pub fn handle_worker_message(message: &str) -> String {
    worker::handle_message_json(message)
}
