//! WAV renderer: encodes an AudioBuffer as a WAV byte buffer.

use crate::buffer::AudioBuffer;

/// Encode a buffer as a 16-bit mono PCM WAV file.
pub fn encode_wav(buffer: &AudioBuffer) -> Vec<u8> {
    let pcm: Vec<i16> = buffer.samples().iter().map(|&s| to_i16(s)).collect();
    encode_pcm(&pcm, buffer.sample_rate(), buffer.channels())
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_pcm(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SonifierConfig, SonifierMethod};
    use crate::dsp::generator;

    fn tone_buffer() -> AudioBuffer {
        let config = SonifierConfig {
            sample_rate: 22_050,
            duration: 0.5,
            ..SonifierConfig::default()
        };
        let generation = generator::generate(&[1.0, 4.0, 2.0], SonifierMethod::Melody, &config);
        AudioBuffer::from_samples(generation.samples, config.sample_rate, config.buffer_length())
            .unwrap()
    }

    #[test]
    fn wav_header_valid() {
        let wav = encode_wav(&tone_buffer());

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 22_050);

        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 1);
    }

    #[test]
    fn wav_size_correct() {
        let wav = encode_wav(&tone_buffer());
        // 0.5 s at 22050 Hz = 11025 mono samples * 2 bytes
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, 22_050);
        assert_eq!(wav.len(), 44 + 22_050);
    }

    #[test]
    fn rendered_tone_is_not_silent() {
        let wav = encode_wav(&tone_buffer());
        let has_nonzero = wav[44..]
            .chunks_exact(2)
            .any(|b| i16::from_le_bytes([b[0], b[1]]) != 0);
        assert!(has_nonzero, "Rendered WAV should contain audio");
    }

    #[test]
    fn full_scale_maps_to_i16_limits() {
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(-1.0), -i16::MAX);
        assert_eq!(to_i16(0.0), 0);
    }
}
