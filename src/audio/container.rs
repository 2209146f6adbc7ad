//! # WAV Container Framing
//!
//! Wraps raw 16-bit PCM samples in a RIFF/WAVE container and unwraps them
//! again. The heavy lifting (chunk layout, header fields) is done by the `wav`
//! crate; this module only maps between its types and ours.

use crate::audio::format::PcmFormat;
use std::io::Cursor;
use thiserror::Error;

/// Errors raised while reading or writing a WAV container.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The bytes could not be parsed as a RIFF/WAVE file
    #[error("malformed WAV container: {0}")]
    Malformed(#[from] std::io::Error),

    /// The container header does not describe integer PCM
    #[error("unsupported WAV audio format tag {0} (expected PCM)")]
    UnsupportedEncoding(u16),

    /// The header and the decoded payload disagree about the sample width
    #[error("WAV payload is {actual}-bit but only 16-bit PCM can be carried")]
    UnsupportedBitDepth { actual: u16 },
}

/// Serialize samples as a WAV file in the given format.
///
/// ## Parameters:
/// - **samples**: Interleaved 16-bit samples (mono for this service)
/// - **format**: Header values to write; `bit_depth` must be 16
///
/// ## Returns:
/// Complete WAV file bytes (RIFF header, `fmt ` chunk, `data` chunk).
pub fn write_wav(samples: &[i16], format: &PcmFormat) -> Result<Vec<u8>, ContainerError> {
    if format.bit_depth != 16 {
        return Err(ContainerError::UnsupportedBitDepth { actual: format.bit_depth });
    }

    let header = wav::Header::new(
        wav::header::WAV_FORMAT_PCM,
        format.channels,
        format.sample_rate,
        format.bit_depth,
    );

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    wav::write(header, &wav::BitDepth::Sixteen(samples.to_vec()), &mut cursor)?;

    Ok(cursor.into_inner())
}

/// Parse WAV bytes into their declared format and 16-bit samples.
///
/// Format parameters are returned as found; it is up to the caller to decide
/// whether they are acceptable. A payload that is not 16-bit cannot be
/// represented as `i16` samples and fails here instead.
pub fn read_wav(bytes: &[u8]) -> Result<(PcmFormat, Vec<i16>), ContainerError> {
    let mut cursor = Cursor::new(bytes);
    let (header, data) = wav::read(&mut cursor)?;

    if header.audio_format != wav::header::WAV_FORMAT_PCM {
        return Err(ContainerError::UnsupportedEncoding(header.audio_format));
    }

    let format = PcmFormat::new(header.sampling_rate, header.channel_count, header.bits_per_sample);

    let samples = match data {
        wav::BitDepth::Sixteen(samples) => samples,
        wav::BitDepth::Empty => Vec::new(),
        _ => {
            return Err(ContainerError::UnsupportedBitDepth {
                actual: header.bits_per_sample,
            })
        }
    };

    Ok((format, samples))
}
