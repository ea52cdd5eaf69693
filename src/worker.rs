//! Background generation worker and its message protocol.
//!
//! Requests and responses are JSON-serializable envelopes of the form
//! `{ "type": ..., "payload": ... }`, so the same handler serves both the
//! in-process [`AudioWorker`] thread and a browser Web Worker hosting the
//! WASM build. The worker keeps no state between requests: configuration
//! and data travel with every message.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::DataPoint;
use crate::config::{SonifierConfig, SonifierMethod};
use crate::dsp::generator::{self, SoundGeneration};
use crate::error::{RemoteFault, Result, SonifyError};
use crate::validation::{validate_config, validate_data};

/// How long a caller waits for the worker before giving up.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Message sent to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerRequest {
    GenerateAudio {
        data: Vec<f64>,
        method: SonifierMethod,
        config: SonifierConfig,
    },
}

/// Message sent back by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerResponse {
    #[serde(rename_all = "camelCase")]
    AudioGenerated {
        audio_samples: Vec<f32>,
        data_points: Vec<DataPoint>,
        sample_rate: u32,
        duration: f64,
    },
    Error { error: RemoteFault },
}

impl WorkerResponse {
    /// Turn the envelope into generator output, or a `WORKER_ERROR`
    /// carrying the remote fault as its cause.
    pub fn into_generation(self) -> Result<SoundGeneration> {
        match self {
            WorkerResponse::AudioGenerated {
                audio_samples,
                data_points,
                ..
            } => Ok(SoundGeneration {
                samples: audio_samples,
                data_points,
            }),
            WorkerResponse::Error { error } => Err(SonifyError::worker(format!(
                "Worker failed to generate audio: {}",
                error.message
            ))
            .with_cause(error)),
        }
    }
}

/// Worker-side handling of one request. Re-validates everything it is given.
pub fn handle_request(request: WorkerRequest) -> WorkerResponse {
    match request {
        WorkerRequest::GenerateAudio { data, method, config } => {
            if let Err(e) = validate_config(&config).and_then(|_| validate_data(&data)) {
                return WorkerResponse::Error {
                    error: RemoteFault::from(&e),
                };
            }
            let SoundGeneration { samples, data_points } =
                generator::generate(&data, method, &config);
            WorkerResponse::AudioGenerated {
                audio_samples: samples,
                data_points,
                sample_rate: config.sample_rate,
                duration: config.duration,
            }
        }
    }
}

/// JSON in, JSON out. Malformed messages get an `ERROR` envelope back.
pub fn handle_message_json(message: &str) -> String {
    let response = match serde_json::from_str::<WorkerRequest>(message) {
        Ok(request) => handle_request(request),
        Err(e) => WorkerResponse::Error {
            error: RemoteFault {
                message: format!("Malformed worker message: {e}"),
                name: "VALIDATION_ERROR".to_string(),
            },
        },
    };
    serde_json::to_string(&response)
        .unwrap_or_else(|e| encoding_failure(&format!("Failed to encode worker response: {e}")))
}

fn encoding_failure(message: &str) -> String {
    serde_json::json!({
        "type": "ERROR",
        "payload": {
            "error": { "message": message, "name": "UNKNOWN_ERROR" },
        },
    })
    .to_string()
}

// ── In-process worker thread ────────────────────────────────

struct Job {
    request: WorkerRequest,
    reply: Sender<WorkerResponse>,
}

/// A dedicated generation thread.
///
/// Each request gets its own reply channel. A caller that times out drops
/// its receiver, so a late answer is discarded instead of being picked up
/// by the next request.
pub struct AudioWorker {
    jobs: Option<Sender<Job>>,
    thread: Option<JoinHandle<()>>,
}

/// A request in flight.
pub struct PendingReply {
    reply: Receiver<WorkerResponse>,
}

impl AudioWorker {
    /// Spawn a worker running [`handle_request`].
    pub fn spawn() -> Result<Self> {
        AudioWorker::spawn_with(handle_request)
    }

    /// Spawn a worker with a custom request handler.
    pub fn spawn_with<F>(handler: F) -> Result<Self>
    where
        F: Fn(WorkerRequest) -> WorkerResponse + Send + 'static,
    {
        let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded::<Job>();

        let thread = thread::Builder::new()
            .name("sonify-worker".into())
            .spawn(move || {
                for job in jobs_rx.iter() {
                    let response = handler(job.request);
                    // Receiver is gone if the caller timed out.
                    let _ = job.reply.send(response);
                }
                debug!("audio worker exited");
            })
            .map_err(|e| SonifyError::worker("Failed to start the audio worker").with_cause(e))?;

        debug!("audio worker started");
        Ok(AudioWorker {
            jobs: Some(jobs_tx),
            thread: Some(thread),
        })
    }

    /// Queue a request without waiting for it.
    pub fn post(&self, request: WorkerRequest) -> Result<PendingReply> {
        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| SonifyError::worker("Audio worker has been terminated"))?;
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        jobs.send(Job {
            request,
            reply: reply_tx,
        })
        .map_err(|_| SonifyError::worker("Audio worker is not accepting messages"))?;
        Ok(PendingReply { reply: reply_rx })
    }

    /// Post and wait up to `timeout` for the answer.
    pub fn request(&self, request: WorkerRequest, timeout: Duration) -> Result<WorkerResponse> {
        self.post(request)?.wait(timeout)
    }

    /// Accepting work and the thread is still alive.
    pub fn is_running(&self) -> bool {
        self.jobs.is_some() && self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop accepting work. The thread exits once its current job is done;
    /// nothing waits for it. Idempotent.
    pub fn terminate(&mut self) {
        if self.jobs.take().is_some() {
            debug!("audio worker terminated");
        }
        self.thread = None;
    }
}

impl Drop for AudioWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl PendingReply {
    pub fn wait(self, timeout: Duration) -> Result<WorkerResponse> {
        match self.reply.recv_timeout(timeout) {
            Ok(response) => Ok(response),
            Err(RecvTimeoutError::Timeout) => Err(SonifyError::timeout(format!(
                "Sonification timed out after {:.1}s",
                timeout.as_secs_f64()
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(SonifyError::worker(
                "Audio worker stopped before answering",
            )),
        }
    }
}
