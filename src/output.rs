//! Audio output sinks.
//!
//! The engine hands finished buffers to an [`AudioSink`]. The default sink
//! plays through the system's output device when the `playback` feature is
//! enabled; hosts with their own audio path install a custom factory.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::buffer::AudioBuffer;
use crate::error::{Result, SonifyError};

/// Creates the engine's output device on first use.
pub type SinkFactory = Arc<dyn Fn() -> Result<Box<dyn AudioSink>> + Send + Sync>;

/// An output device that plays one buffer at a time, start to end.
pub trait AudioSink: Send {
    /// Whether the device must be resumed before it can play.
    fn is_suspended(&self) -> bool {
        false
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    /// Begin playing `buffer`. The returned handle completes when playback ends.
    fn start(&mut self, buffer: &AudioBuffer) -> Result<Playback>;

    /// Release the device. Further `start` calls may fail.
    fn close(&mut self) -> Result<()>;
}

/// Completion handle for one playback.
#[derive(Debug)]
pub struct Playback {
    done: Receiver<Result<()>>,
}

/// Sending half of a [`Playback`], held by whatever drives the audio.
#[derive(Debug)]
pub struct PlaybackNotifier {
    done: Sender<Result<()>>,
}

impl Playback {
    pub fn channel() -> (PlaybackNotifier, Playback) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        (PlaybackNotifier { done: tx }, Playback { done: rx })
    }

    /// A playback that has already finished.
    pub fn finished() -> Playback {
        let (notifier, playback) = Playback::channel();
        notifier.finish(Ok(()));
        playback
    }

    /// Block until playback ends.
    pub fn wait(self) -> Result<()> {
        match self.done.recv() {
            Ok(result) => result,
            Err(_) => Err(SonifyError::audio_context(
                "Playback ended without reporting completion",
            )),
        }
    }
}

impl PlaybackNotifier {
    pub fn finish(self, result: Result<()>) {
        // The waiter may have gone away.
        let _ = self.done.send(result);
    }
}

/// The sink used when no factory is configured.
pub fn default_sink() -> Result<Box<dyn AudioSink>> {
    #[cfg(feature = "playback")]
    {
        Ok(Box::new(cpal_sink::CpalSink::open_default()?))
    }
    #[cfg(not(feature = "playback"))]
    {
        Err(SonifyError::audio_context(
            "No audio output available: built without the `playback` feature",
        ))
    }
}

pub fn default_sink_factory() -> SinkFactory {
    Arc::new(default_sink)
}

#[cfg(feature = "playback")]
pub use cpal_sink::CpalSink;

#[cfg(feature = "playback")]
mod cpal_sink {
    use std::thread;
    use std::time::Duration;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, SizedSample};
    use tracing::{debug, error};

    use super::{AudioSink, Playback, PlaybackNotifier};
    use crate::buffer::AudioBuffer;
    use crate::error::{Result, SonifyError};

    /// Extra time allowed past the buffer's length before playback is
    /// declared stalled.
    const STALL_GRACE: Duration = Duration::from_secs(2);

    /// Plays through the default output device via cpal.
    pub struct CpalSink {
        device: cpal::Device,
        config: cpal::SupportedStreamConfig,
        closed: bool,
    }

    impl CpalSink {
        pub fn open_default() -> Result<Self> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| SonifyError::audio_context("No audio output device found"))?;
            let config = device.default_output_config().map_err(|e| {
                SonifyError::audio_context("Cannot query the output device configuration")
                    .with_cause(e)
            })?;
            debug!(
                device = %device.name().unwrap_or_default(),
                sample_rate = config.sample_rate().0,
                channels = config.channels(),
                "opened audio output"
            );
            Ok(CpalSink {
                device,
                config,
                closed: false,
            })
        }
    }

    impl AudioSink for CpalSink {
        fn start(&mut self, buffer: &AudioBuffer) -> Result<Playback> {
            if self.closed {
                return Err(SonifyError::audio_context("Audio output has been closed"));
            }
            let (notifier, playback) = Playback::channel();
            let device = self.device.clone();
            let config = self.config.clone();
            let buffer = buffer.clone();

            thread::Builder::new()
                .name("sonify-playback".into())
                .spawn(move || notifier.finish(play_blocking(&device, &config, &buffer)))
                .map_err(|e| {
                    SonifyError::audio_context("Cannot start the playback thread").with_cause(e)
                })?;
            Ok(playback)
        }

        fn close(&mut self) -> Result<()> {
            self.closed = true;
            debug!("closed audio output");
            Ok(())
        }
    }

    /// Build a stream on this thread, play the buffer once, tear down.
    fn play_blocking(
        device: &cpal::Device,
        config: &cpal::SupportedStreamConfig,
        buffer: &AudioBuffer,
    ) -> Result<()> {
        let (end_tx, end_rx) = crossbeam_channel::bounded(1);
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(device, &config.config(), buffer, end_tx),
            cpal::SampleFormat::I16 => build_stream::<i16>(device, &config.config(), buffer, end_tx),
            cpal::SampleFormat::U16 => build_stream::<u16>(device, &config.config(), buffer, end_tx),
            other => Err(SonifyError::audio_context(format!(
                "Unsupported output sample format {other:?}"
            ))),
        }?;
        stream.play().map_err(|e| {
            SonifyError::audio_context("Cannot start the output stream").with_cause(e)
        })?;

        let limit = Duration::from_secs_f64(buffer.duration()) + STALL_GRACE;
        end_rx
            .recv_timeout(limit)
            .map_err(|_| SonifyError::audio_context("Playback stalled"))
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        buffer: &AudioBuffer,
        end: crossbeam_channel::Sender<()>,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels as usize;
        // Device rate may differ from the buffer's; step through it accordingly.
        let step = buffer.sample_rate() as f64 / config.sample_rate.0 as f64;
        let samples = buffer.shared_samples();
        let mut position = 0.0f64;
        let mut ended = false;

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let index = position as usize;
                        let value = samples.get(index).copied().unwrap_or(0.0);
                        for out in frame.iter_mut() {
                            *out = T::from_sample(value);
                        }
                        if index < samples.len() {
                            position += step;
                        } else if !ended {
                            ended = true;
                            let _ = end.try_send(());
                        }
                    }
                },
                |err| error!(%err, "audio output stream error"),
                None,
            )
            .map_err(|e| SonifyError::audio_context("Cannot open the output stream").with_cause(e))
    }
}
