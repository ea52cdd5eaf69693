//! Sonifier: validates input, generates audio, and plays it.
//!
//! Generation is tried on the background worker first. Any worker failure
//! except a timeout falls back to generating on the caller's thread with the
//! same generator code, so both paths produce identical output.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::buffer::{AudioBuffer, SonificationResult};
use crate::config::{SonifierConfig, SonifierConfigPatch, SonifierMethod, SonifierOptions};
use crate::dsp::generator::{self, SoundGeneration};
use crate::error::{Result, SonifyError};
use crate::output::{self, AudioSink, SinkFactory};
use crate::validation::{validate_config, validate_data};
use crate::worker::{self, AudioWorker, PendingReply, WorkerRequest, WorkerResponse};

/// Where generation runs.
pub enum WorkerMode {
    /// Spawn a worker thread if the platform allows it.
    Auto,
    /// Always generate on the caller's thread.
    Disabled,
    /// Use the given worker.
    Custom(AudioWorker),
}

/// Builder for [`Sonifier`].
pub struct SonifierBuilder {
    config: SonifierConfigPatch,
    worker: WorkerMode,
    worker_timeout: Duration,
    sink_factory: SinkFactory,
}

impl Default for SonifierBuilder {
    fn default() -> Self {
        SonifierBuilder {
            config: SonifierConfigPatch::default(),
            worker: WorkerMode::Auto,
            worker_timeout: worker::DEFAULT_TIMEOUT,
            sink_factory: output::default_sink_factory(),
        }
    }
}

impl SonifierBuilder {
    /// Fields to override on top of the defaults.
    pub fn config(mut self, patch: SonifierConfigPatch) -> Self {
        self.config = patch;
        self
    }

    pub fn worker(mut self, mode: WorkerMode) -> Self {
        self.worker = mode;
        self
    }

    pub fn worker_timeout(mut self, timeout: Duration) -> Self {
        self.worker_timeout = timeout;
        self
    }

    /// Install the constructor for the output device. Called lazily on
    /// the first playback.
    pub fn output<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn AudioSink>> + Send + Sync + 'static,
    {
        self.sink_factory = Arc::new(factory);
        self
    }

    /// Merge and validate the configuration, then start the worker.
    pub fn build(self) -> Result<Sonifier> {
        let config = self.config.apply(&SonifierConfig::default());
        validate_config(&config)?;

        let worker = match self.worker {
            WorkerMode::Disabled => None,
            WorkerMode::Custom(worker) => Some(worker),
            WorkerMode::Auto if cfg!(target_arch = "wasm32") => None,
            WorkerMode::Auto => match AudioWorker::spawn() {
                Ok(worker) => Some(worker),
                Err(e) => {
                    warn!(error = %e, "audio worker unavailable, generating on the caller thread");
                    None
                }
            },
        };

        Ok(Sonifier {
            config: RwLock::new(config),
            worker: Mutex::new(worker),
            worker_timeout: self.worker_timeout,
            output: Mutex::new(None),
            sink_factory: self.sink_factory,
        })
    }
}

/// The sonification engine.
///
/// Owns an optional worker thread and a lazily opened output device; both
/// are released by [`Sonifier::cleanup`] or on drop. Safe to share between
/// threads: every call works from its own snapshot of the configuration.
pub struct Sonifier {
    config: RwLock<SonifierConfig>,
    worker: Mutex<Option<AudioWorker>>,
    worker_timeout: Duration,
    output: Mutex<Option<Box<dyn AudioSink>>>,
    sink_factory: SinkFactory,
}

impl Sonifier {
    pub fn builder() -> SonifierBuilder {
        SonifierBuilder::default()
    }

    /// Engine with `patch` merged over the defaults.
    pub fn new(patch: SonifierConfigPatch) -> Result<Self> {
        Sonifier::builder().config(patch).build()
    }

    /// Turn `data` into audio using `method`.
    pub fn sonify(
        &self,
        data: &[f64],
        method: SonifierMethod,
        options: SonifierOptions,
    ) -> Result<SonificationResult> {
        validate_data(data)?;
        let config = self.config();

        let generation = self.generate(data, method, &config)?;
        let audio_buffer =
            AudioBuffer::from_samples(generation.samples, config.sample_rate, config.buffer_length())?;

        if options.auto_play {
            self.play(&audio_buffer)?;
        }

        Ok(SonificationResult {
            audio_buffer,
            duration: config.duration,
            data_points: generation.data_points,
        })
    }

    /// Play `buffer` and block until it has finished.
    pub fn play(&self, buffer: &AudioBuffer) -> Result<()> {
        let playback = {
            let mut output = self.output.lock();
            let sink = match output.take() {
                Some(sink) => sink,
                None => {
                    let sink = (self.sink_factory)()?;
                    debug!("audio output created");
                    sink
                }
            };
            let sink = output.insert(sink);
            if sink.is_suspended() {
                sink.resume()?;
            }
            sink.start(buffer)?
        };
        playback.wait()
    }

    /// Snapshot of the effective configuration.
    pub fn config(&self) -> SonifierConfig {
        *self.config.read()
    }

    /// Merge `patch` over the current configuration. Leaves the engine
    /// untouched if the result is invalid.
    pub fn set_config(&self, patch: SonifierConfigPatch) -> Result<()> {
        let mut config = self.config.write();
        let merged = patch.apply(&config);
        validate_config(&merged)?;
        *config = merged;
        Ok(())
    }

    /// Whether generation is currently offloaded to a worker.
    pub fn has_worker(&self) -> bool {
        self.worker.lock().as_ref().is_some_and(AudioWorker::is_running)
    }

    /// Close the output device and stop the worker. Idempotent.
    pub fn cleanup(&self) {
        if let Some(mut sink) = self.output.lock().take() {
            match sink.close() {
                Ok(()) => debug!("audio output closed"),
                Err(e) => error!(error = %e, "failed to close audio output"),
            }
        }
        if let Some(mut worker) = self.worker.lock().take() {
            worker.terminate();
        }
    }

    fn generate(
        &self,
        data: &[f64],
        method: SonifierMethod,
        config: &SonifierConfig,
    ) -> Result<SoundGeneration> {
        if let Some(pending) = self.post_to_worker(data, method, config) {
            let outcome = pending
                .and_then(|reply| reply.wait(self.worker_timeout))
                .and_then(WorkerResponse::into_generation)
                .and_then(|generation| check_generation(generation, data.len(), config));
            match outcome {
                Ok(generation) => return Ok(generation),
                Err(e) if e.is_timeout() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "worker generation failed, generating on the caller thread");
                }
            }
        }
        Ok(generator::generate(data, method, config))
    }

    /// `None` when there is no worker to post to.
    fn post_to_worker(
        &self,
        data: &[f64],
        method: SonifierMethod,
        config: &SonifierConfig,
    ) -> Option<Result<PendingReply>> {
        let worker = self.worker.lock();
        worker.as_ref().map(|w| {
            w.post(WorkerRequest::GenerateAudio {
                data: data.to_vec(),
                method,
                config: *config,
            })
        })
    }
}

impl Drop for Sonifier {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Reject worker output that does not fit the request.
fn check_generation(
    generation: SoundGeneration,
    points: usize,
    config: &SonifierConfig,
) -> Result<SoundGeneration> {
    let expected = if points == 0 { 0 } else { config.buffer_length() };
    if generation.samples.len() != expected || generation.data_points.len() != points {
        return Err(SonifyError::worker(format!(
            "Worker returned {} samples and {} data points, expected {expected} and {points}",
            generation.samples.len(),
            generation.data_points.len()
        )));
    }
    Ok(generation)
}
