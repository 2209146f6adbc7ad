//! # Configuration Management
//!
//! Settings come from built-in defaults, `config.toml` and `APP_` environment
//! variables.
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (APP_SERVER__PORT, APP_CODEC__CELL_SIZE, etc.)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)
//!
//! Nested keys are separated by a double underscore so that field names which
//! themselves contain underscores (`cell_size`, `terminator_count`) survive.

use crate::codec::{CellStrategy, CodecParams};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub codec: CodecConfig,
    pub performance: PerformanceConfig,
}

/// Server-specific configuration settings.
///
/// ## Fields:
/// - `host`: IP address or hostname to bind the server to (e.g., "127.0.0.1", "0.0.0.0")
/// - `port`: TCP port number to listen on (8000 by default)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Signal format and redundancy settings for the digit codec.
///
/// ## Fields:
/// - `sample_rate`, `bit_depth`, `channels`: PCM format of the generated WAV
/// - `num_bins`: Amplitude bins (ten digits + terminator need at least 11)
/// - `cell_size`: Samples per symbol cell
/// - `terminator_count`: Terminator cells after every Pass
/// - `duration_seconds`: Length of every encoded buffer
/// - `cell_strategy`: "mean" (average then classify) or "vote" (classify then vote)
/// - `strict_length`: Reject short buffers instead of decoding what arrived
///
/// ## Tuning guidelines:
/// - Larger cells and more terminators: more noise margin, fewer Passes
/// - More bins: narrower bins, less noise margin per cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecConfig {
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub channels: u16,
    pub num_bins: u8,
    pub cell_size: usize,
    pub terminator_count: usize,
    pub duration_seconds: f64,
    pub cell_strategy: CellStrategy,
    pub strict_length: bool,
}

/// Request-size limits.
///
/// ## Fields:
/// - `max_payload_bytes`: Largest JSON body accepted (a 10 s WAV is ~1.2 MB once base64-encoded).
///   Fixed at startup because the body limit is installed when the server is built.
/// - `max_text_length`: Longest digit string accepted by `/encode`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    pub max_payload_bytes: usize,
    pub max_text_length: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let codec = CodecParams::default();
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            codec: CodecConfig::from_params(&codec),
            performance: PerformanceConfig {
                max_payload_bytes: 4 * 1024 * 1024,  // 4 MiB, comfortably above one base64 WAV
                // Longer messages never complete a Pass and lose their tail
                max_text_length: crate::codec::encoder::single_pass_capacity(&codec),
            },
        }
    }
}

impl CodecConfig {
    /// Mirror a `CodecParams` value as configuration.
    pub fn from_params(params: &CodecParams) -> Self {
        Self {
            sample_rate: params.sample_rate,
            bit_depth: params.bit_depth,
            channels: params.channels,
            num_bins: params.num_bins,
            cell_size: params.cell_size,
            terminator_count: params.terminator_count,
            duration_seconds: params.duration_seconds,
            cell_strategy: params.cell_strategy,
            strict_length: params.strict_length,
        }
    }

    /// Convert to the parameter value the codec functions take.
    pub fn to_codec_params(&self) -> CodecParams {
        CodecParams {
            sample_rate: self.sample_rate,
            bit_depth: self.bit_depth,
            channels: self.channels,
            num_bins: self.num_bins,
            cell_size: self.cell_size,
            terminator_count: self.terminator_count,
            duration_seconds: self.duration_seconds,
            cell_strategy: self.cell_strategy,
            strict_length: self.strict_length,
        }
    }

    /// Size in bytes of one encoded WAV file once base64-encoded (44-byte header).
    ///
    /// `None` when the size does not fit in `usize`.
    pub fn encoded_payload_bytes(&self) -> Option<usize> {
        let params = self.to_codec_params();
        let wav_bytes = params
            .total_samples()
            .checked_mul(params.pcm_format().bytes_per_frame())?
            .checked_add(44)?;
        wav_bytes.div_ceil(3).checked_mul(4)
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    /// 4. Handle special cases for HOST and PORT environment variables
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__HOST=0.0.0.0`: Override server host
    /// - `APP_CODEC__CELL_SIZE=32`: Override cell size
    /// - `APP_CODEC__CELL_STRATEGY=vote`: Switch cell reduction strategy
    /// - `HOST=0.0.0.0`, `PORT=3000`: Special cases for deployment platforms
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            // 1. Defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // 2. config.toml, optional
            .add_source(config::File::with_name("config").required(false))
            // 3. APP_ environment variables
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        // Handle special environment variables used by deployment platforms
        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Server port is not 0
    /// - Codec parameters describe a well-formed signal (see `CodecParams::validate`)
    /// - Limits are non-zero, and the payload limit can carry one full encoded WAV
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        self.codec
            .to_codec_params()
            .validate()
            .map_err(|e| anyhow::anyhow!("Codec configuration rejected: {}", e))?;

        if self.performance.max_text_length == 0 {
            return Err(anyhow::anyhow!("Max text length must be greater than 0"));
        }

        let needed = self
            .codec
            .encoded_payload_bytes()
            .ok_or_else(|| anyhow::anyhow!("Encoded signal size overflows"))?;
        if self.performance.max_payload_bytes < needed {
            return Err(anyhow::anyhow!(
                "Max payload bytes ({}) cannot carry one encoded signal ({} bytes)",
                self.performance.max_payload_bytes,
                needed
            ));
        }

        Ok(())
    }

    /// Update configuration from a JSON string (used for runtime config updates).
    ///
    /// ## Partial updates:
    /// Only the fields present in the JSON are touched. For example,
    /// `{"codec": {"cell_size": 32}}` changes the cell size and nothing else.
    /// The result is validated before it is accepted. `max_payload_bytes`
    /// cannot change at runtime.
    pub fn update_from_json(&mut self, json_str: &str) -> Result<()> {
        let partial_config: serde_json::Value = serde_json::from_str(json_str)?;

        // Update server configuration if provided
        if let Some(server) = partial_config.get("server") {
            if let Some(host) = server.get("host").and_then(|v| v.as_str()) {
                self.server.host = host.to_string();
            }
            if let Some(port) = server.get("port").and_then(|v| v.as_u64()) {
                self.server.port = u16::try_from(port)
                    .map_err(|_| anyhow::anyhow!("Server port {} is out of range", port))?;
            }
        }

        // Update codec configuration if provided
        if let Some(codec) = partial_config.get("codec") {
            let as_u64 = |key: &str| codec.get(key).and_then(|v| v.as_u64());

            if let Some(rate) = as_u64("sample_rate") {
                self.codec.sample_rate = u32::try_from(rate)?;
            }
            if let Some(depth) = as_u64("bit_depth") {
                self.codec.bit_depth = u16::try_from(depth)?;
            }
            if let Some(channels) = as_u64("channels") {
                self.codec.channels = u16::try_from(channels)?;
            }
            if let Some(bins) = as_u64("num_bins") {
                self.codec.num_bins = u8::try_from(bins)?;
            }
            if let Some(cell_size) = as_u64("cell_size") {
                self.codec.cell_size = cell_size as usize;
            }
            if let Some(count) = as_u64("terminator_count") {
                self.codec.terminator_count = count as usize;
            }
            if let Some(duration) = codec.get("duration_seconds").and_then(|v| v.as_f64()) {
                self.codec.duration_seconds = duration;
            }
            if let Some(strategy) = codec.get("cell_strategy").and_then(|v| v.as_str()) {
                self.codec.cell_strategy = strategy.parse().map_err(anyhow::Error::msg)?;
            }
            if let Some(strict) = codec.get("strict_length").and_then(|v| v.as_bool()) {
                self.codec.strict_length = strict;
            }
        }

        // Update limits if provided
        if let Some(performance) = partial_config.get("performance") {
            if let Some(bytes) = performance.get("max_payload_bytes").and_then(|v| v.as_u64()) {
                if bytes as usize != self.performance.max_payload_bytes {
                    return Err(anyhow::anyhow!(
                        "max_payload_bytes is fixed at startup ({}), restart with the new value instead",
                        self.performance.max_payload_bytes
                    ));
                }
            }
            if let Some(length) = performance.get("max_text_length").and_then(|v| v.as_u64()) {
                self.performance.max_text_length = length as usize;
            }
        }

        self.validate()?;
        Ok(())
    }
}
