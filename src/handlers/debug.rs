//! Debug endpoint for exercising the whole pipeline in one call
//!
//! `POST /debug/roundtrip` encodes the text, frames it as WAV, pushes the
//! samples through a simulated channel, decodes, and reports how much of the
//! message came back. Useful for tuning `cell_size` and `terminator_count`
//! without a client that can do base64 and WAV.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::audio::{read_wav, write_wav};
use crate::channel::{error_rate, levenshtein, Channel, NoiseModel};
use crate::codec::{self, DecodeReport};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

/// Request to run one simulated transmission
#[derive(Debug, Deserialize)]
pub struct RoundtripRequest {
    /// Digits to send
    pub text: String,
    /// Channel distortion (optional, defaults to a clean channel)
    #[serde(default)]
    pub noise: NoiseModel,
    /// Noise seed (optional, defaults to 0)
    #[serde(default)]
    pub seed: u64,
}

/// Outcome of a simulated transmission
#[derive(Debug, Serialize, Deserialize)]
pub struct RoundtripResponse {
    pub sent: String,
    pub received: String,
    pub exact: bool,
    pub edit_distance: usize,
    pub error_rate: f64,
    pub noise: NoiseModel,
    pub seed: u64,
    pub wav_bytes: usize,
    /// Guaranteed margin in full-scale units; cell values that drift no further than this decode correctly
    pub noise_margin: f64,
    pub elapsed_ms: u64,
    pub report: serde_json::Value,
}

/// Simulated transmission endpoint
///
/// POST /debug/roundtrip
/// Body: {"text": "0123", "noise": {"kind": "gaussian", "sigma": 0.1}, "seed": 7}
pub async fn roundtrip(
    state: web::Data<AppState>,
    req: web::Json<RoundtripRequest>,
) -> AppResult<HttpResponse> {
    let start_time = Instant::now();
    let RoundtripRequest { text, noise, seed } = req.into_inner();

    noise
        .validate()
        .map_err(|e| AppError::ValidationError(format!("Invalid noise model: {}", e)))?;

    let config = state.get_config();
    if text.chars().count() > config.performance.max_text_length {
        return Err(AppError::ValidationError(format!(
            "Text longer than {} characters",
            config.performance.max_text_length
        )));
    }
    let params = config.codec.to_codec_params();

    let samples = codec::encode(&text, &params)?;
    let wav = write_wav(&samples, &params.pcm_format())?;

    let (format, framed) = read_wav(&wav)?;
    let received = Channel::new(noise, seed).transmit(&framed);
    let report: DecodeReport = codec::decode(&format, &received, &params)?;

    let edit_distance = levenshtein(&text, &report.text);
    tracing::info!(
        "Debug: roundtrip of {} digits through {:?} (seed {}) recovered {} with distance {}",
        text.len(),
        noise,
        seed,
        report.text.len(),
        edit_distance
    );

    let response = RoundtripResponse {
        exact: report.text == text,
        error_rate: error_rate(&text, &report.text),
        received: report.text.clone(),
        sent: text,
        edit_distance,
        noise,
        seed,
        wav_bytes: wav.len(),
        noise_margin: params.quantizer().noise_margin() as f64 / 32768.0,
        elapsed_ms: start_time.elapsed().as_millis() as u64,
        report: serde_json::to_value(&report)
            .map_err(|e| AppError::Internal(format!("Failed to serialize decode report: {}", e)))?,
    };

    Ok(HttpResponse::Ok().json(response))
}
