//! # Audio Container Module
//!
//! Everything that touches audio bytes rather than codec symbols lives here.
//! The codec itself works on plain `i16` sample slices; this module turns those
//! slices into WAV files and back, and describes the PCM format they carry.
//!
//! ## Key Components:
//! - **PcmFormat**: Channel count, sample rate and bit depth of a PCM stream
//! - **Container**: WAV framing (RIFF header + `data` chunk) using the `wav` crate
//!
//! ## Audio Format Requirements:
//! - **Sample Rate**: 44.1kHz (44,100 Hz)
//! - **Bit Depth**: 16-bit PCM
//! - **Channels**: Mono (1 channel)
//! - **Encoding**: Little-endian signed integers

pub mod container;    // WAV read/write
pub mod format;       // PCM format descriptor

pub use container::{read_wav, write_wav, ContainerError};
pub use format::PcmFormat;
