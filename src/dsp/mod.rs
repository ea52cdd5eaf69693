//! DSP: oscillators, value mappings, generators, and WAV rendering.
//!
//! All synthesis is pure Rust and deterministic, so the worker thread, the
//! caller thread, and a WASM build produce bit-identical samples.

pub mod generator;
pub mod mapping;
pub mod oscillator;
pub mod renderer;
