//! # PCM Format Descriptor
//!
//! Describes the shape of a PCM sample stream: how many channels, how many
//! samples per second, and how many bits per sample. The WAV reader produces
//! one of these from the container header, the codec compares it against the
//! format it was configured for.

use serde::{Deserialize, Serialize};

/// Audio format information carried by (or declared for) a PCM stream.
///
/// ## Purpose:
/// Represents the audio format that a client actually sent us. The decoder
/// checks it field by field against the configured codec format before it
/// looks at a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl PcmFormat {
    /// Create a new PCM format descriptor.
    pub fn new(sample_rate: u32, channels: u16, bit_depth: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bit_depth,
        }
    }

    /// Size of one sample frame in bytes (all channels).
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bit_depth as usize / 8)
    }

    /// Duration in seconds of `frame_count` sample frames in this format.
    pub fn duration_seconds(&self, frame_count: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        frame_count as f64 / self.sample_rate as f64
    }

    /// Compare against the expected format and report the first field that differs.
    ///
    /// ## Returns:
    /// - **None**: Formats match
    /// - **Some((field, expected, actual))**: Name of the mismatching field and both values
    ///
    /// Channels are checked first, then bit depth, then sample rate.
    pub fn first_mismatch(&self, expected: &PcmFormat) -> Option<(&'static str, u32, u32)> {
        if self.channels != expected.channels {
            return Some(("channels", expected.channels as u32, self.channels as u32));
        }

        if self.bit_depth != expected.bit_depth {
            return Some(("bit_depth", expected.bit_depth as u32, self.bit_depth as u32));
        }

        if self.sample_rate != expected.sample_rate {
            return Some(("sample_rate", expected.sample_rate, self.sample_rate));
        }

        None
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44100,  // CD-quality rate the channel is specified at
            channels: 1,         // Mono audio
            bit_depth: 16,       // 16-bit PCM
        }
    }
}
