//! # Digit Codec
//!
//! Turns a string of decimal digits into a fixed-length 16-bit PCM buffer and
//! recovers the digits from a (possibly noisy) copy of that buffer.
//!
//! ## Pipeline:
//! ```text
//! text ──► encoder (quantizer) ──► samples ──► [channel] ──► decoder (quantizer) ──► symbols ──► voter ──► text
//! ```
//!
//! ## Key Components:
//! - **quantizer**: Symbol ↔ amplitude map over equal-width bins
//! - **encoder**: Tiles Passes (digits + terminators) of fixed-width cells
//! - **decoder**: Reduces each cell back to one symbol
//! - **voter**: Groups symbols by position within a Pass and majority-votes each group
//!
//! Everything here is a pure function of its inputs and a `CodecParams` value;
//! nothing is shared between calls.

pub mod decoder;
pub mod encoder;
pub mod quantizer;
pub mod voter;

pub use decoder::CellStrategy;
pub use quantizer::Quantizer;

use crate::audio::PcmFormat;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by encode/decode operations.
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("input text is empty")]
    EmptyInput,

    #[error("invalid symbol {character:?} at position {position}: only digits 0-9 can be encoded")]
    InvalidSymbol { character: char, position: usize },

    #[error("audio format mismatch: {field} is {actual}, expected {expected}")]
    FormatMismatch {
        field: &'static str,
        expected: u32,
        actual: u32,
    },

    #[error("truncated input: {actual} samples received, {expected} expected")]
    TruncatedInput { expected: usize, actual: usize },

    #[error("invalid codec parameters: {0}")]
    InvalidParams(String),
}

/// Longest signal whose 16-bit mono WAV still fits the 32-bit RIFF size fields.
pub const MAX_SIGNAL_SAMPLES: usize = (u32::MAX as usize - 44) / 2;

/// Every tunable of the codec, grouped into one value.
///
/// Built from the `[codec]` configuration section; tests construct small ones
/// directly to keep buffers short.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecParams {
    /// Samples per second of the carrier PCM stream
    pub sample_rate: u32,

    /// Bits per sample; the quantizer covers the signed 16-bit domain only
    pub bit_depth: u16,

    /// Channel count of the carrier stream (mono)
    pub channels: u16,

    /// Amplitude bins; ten digits plus the terminator need at least 11
    pub num_bins: u8,

    /// Samples per cell
    pub cell_size: usize,

    /// Terminator cells closing every Pass
    pub terminator_count: usize,

    /// Length of the signal buffer in seconds
    pub duration_seconds: f64,

    /// How a cell's samples are reduced to one symbol
    pub cell_strategy: CellStrategy,

    /// Fail short buffers with `TruncatedInput` instead of decoding them best-effort
    pub strict_length: bool,
}

impl Default for CodecParams {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bit_depth: 16,
            channels: 1,
            num_bins: quantizer::DIGIT_COUNT + 1,
            cell_size: 16,
            terminator_count: 2,
            duration_seconds: 10.0,
            cell_strategy: CellStrategy::Mean,
            strict_length: false,
        }
    }
}

impl CodecParams {
    /// Signal buffer length L = sample_rate × duration, rounded to whole samples.
    pub fn total_samples(&self) -> usize {
        (self.sample_rate as f64 * self.duration_seconds).round() as usize
    }

    /// PCM format the encoder produces and the decoder accepts.
    pub fn pcm_format(&self) -> PcmFormat {
        PcmFormat::new(self.sample_rate, self.channels, self.bit_depth)
    }

    pub fn quantizer(&self) -> Quantizer {
        Quantizer::new(self.num_bins)
    }

    /// Check that every transform is well defined for these parameters.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.bit_depth != 16 {
            return Err(CodecError::InvalidParams(format!(
                "bit depth must be 16, got {}",
                self.bit_depth
            )));
        }

        if self.channels != 1 {
            return Err(CodecError::InvalidParams(format!(
                "only mono is supported, got {} channels",
                self.channels
            )));
        }

        if self.num_bins <= quantizer::DIGIT_COUNT {
            return Err(CodecError::InvalidParams(format!(
                "need at least {} bins for ten digits and a terminator, got {}",
                quantizer::DIGIT_COUNT + 1,
                self.num_bins
            )));
        }

        if self.cell_size == 0 {
            return Err(CodecError::InvalidParams("cell size must be at least 1".to_string()));
        }

        if self.terminator_count == 0 {
            return Err(CodecError::InvalidParams(
                "terminator count must be at least 1".to_string(),
            ));
        }

        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(CodecError::InvalidParams(format!(
                "duration must be a positive number of seconds, got {}",
                self.duration_seconds
            )));
        }

        let samples = self.sample_rate as f64 * self.duration_seconds;
        if samples.round() > MAX_SIGNAL_SAMPLES as f64 {
            return Err(CodecError::InvalidParams(format!(
                "signal of {} samples exceeds the WAV limit of {}",
                samples, MAX_SIGNAL_SAMPLES
            )));
        }

        if self.total_samples() == 0 {
            return Err(CodecError::InvalidParams(
                "sample rate × duration must yield at least one sample".to_string(),
            ));
        }

        Ok(())
    }
}

/// Result of decoding one buffer, with diagnostics for callers that want them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeReport {
    /// Recovered digits
    pub text: String,

    /// Number of cells classified
    pub cells: usize,

    /// Number of delimited Passes seen in the cell stream
    pub passes_observed: usize,

    /// Positions resolved by the first-entry tie-break
    pub ambiguous_positions: Vec<usize>,

    /// Groups discarded as trailing fragments
    pub dropped_groups: usize,

    /// The buffer was shorter than the configured signal length
    pub truncated: bool,
}

/// Encode `text` into a signal buffer of `params.total_samples()` samples.
pub fn encode(text: &str, params: &CodecParams) -> Result<Vec<i16>, CodecError> {
    encoder::encode(text, params)
}

/// Decode samples received in `format` back into text.
///
/// The format is checked before any sample is read. Buffers shorter than the
/// configured length are decoded best-effort unless `strict_length` is set.
pub fn decode(
    format: &PcmFormat,
    samples: &[i16],
    params: &CodecParams,
) -> Result<DecodeReport, CodecError> {
    params.validate()?;

    if let Some((field, expected, actual)) = format.first_mismatch(&params.pcm_format()) {
        return Err(CodecError::FormatMismatch { field, expected, actual });
    }

    let expected = params.total_samples();
    let truncated = samples.len() < expected;
    if truncated && params.strict_length {
        return Err(CodecError::TruncatedInput {
            expected,
            actual: samples.len(),
        });
    }

    let quantizer = params.quantizer();
    let symbols = decoder::decode_cells(samples, &quantizer, params.cell_size, params.cell_strategy);

    let verdict = voter::aggregate(&symbols, quantizer.terminator());

    Ok(DecodeReport {
        text: verdict.text,
        cells: symbols.len(),
        passes_observed: verdict.passes_observed,
        ambiguous_positions: verdict.ambiguous_positions,
        dropped_groups: verdict.dropped_groups,
        truncated,
    })
}
