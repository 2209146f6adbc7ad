//! # Codec REST API Handlers
//!
//! The two endpoints the service exists for:
//! - `POST /encode` - `{"text": "0123"}` → `{"data": "<base64 WAV>"}`
//! - `POST /decode` - `{"data": "<base64 WAV>"}` → `{"text": "0123"}`
//!
//! Both read the codec parameters from the runtime configuration on every
//! request, so a `PUT /api/v1/config` takes effect immediately.

use crate::audio::{read_wav, write_wav};
use crate::codec;
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};
use actix_web::{web, HttpResponse};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Request body for `/encode`.
#[derive(Debug, Deserialize)]
pub struct EncodeRequest {
    /// Digits to transmit (`0`-`9` only)
    pub text: String,
}

/// Response body for `/encode`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EncodeResponse {
    /// Base64 (standard alphabet, padded) of the complete WAV file
    pub data: String,
}

/// Request body for `/decode`.
#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    /// Base64 of a WAV file, as produced by `/encode`
    pub data: String,
}

/// Response body for `/decode`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DecodeResponse {
    pub text: String,
}

/// Encode a digit string into a base64 WAV.
///
/// ## Errors:
/// - 400 if the text is empty, longer than `performance.max_text_length`, or has a non-digit
pub async fn encode_text(
    state: web::Data<AppState>,
    body: web::Json<EncodeRequest>,
) -> AppResult<HttpResponse> {
    let config = state.get_config();
    let text = body.into_inner().text;

    let length = text.chars().count();
    if length > config.performance.max_text_length {
        return Err(AppError::ValidationError(format!(
            "Text has {} characters, at most {} are accepted",
            length, config.performance.max_text_length
        )));
    }

    let params = config.codec.to_codec_params();
    let samples = codec::encode(&text, &params)?;
    let wav = write_wav(&samples, &params.pcm_format())?;

    let full_passes = codec::encoder::full_passes(length, &params);
    if full_passes == 0 {
        warn!(
            digits = length,
            capacity = codec::encoder::single_pass_capacity(&params),
            "Message does not fit one Pass, only its leading digits will decode"
        );
    }
    debug!(
        digits = length,
        full_passes,
        wav_bytes = wav.len(),
        "Encoded signal"
    );
    state.record_encode(length);

    Ok(HttpResponse::Ok().json(EncodeResponse {
        data: STANDARD.encode(wav),
    }))
}

/// Decode a base64 WAV back into its digit string.
///
/// ## Errors:
/// - 400 if the payload is not base64 or not a WAV file
/// - 422 if the WAV is not mono 16-bit PCM at the configured sample rate
/// - 400 if the buffer is short and `codec.strict_length` is set
pub async fn decode_audio(
    state: web::Data<AppState>,
    body: web::Json<DecodeRequest>,
) -> AppResult<HttpResponse> {
    let params = state.get_config().codec.to_codec_params();

    let bytes = STANDARD.decode(body.data.trim())?;
    let (format, samples) = read_wav(&bytes)?;
    let report = codec::decode(&format, &samples, &params)?;

    if report.truncated {
        warn!(
            received_seconds = format.duration_seconds(samples.len()),
            expected_seconds = params.duration_seconds,
            recovered = report.text.len(),
            "Decoded a truncated signal best-effort"
        );
    }
    if !report.ambiguous_positions.is_empty() {
        warn!(
            positions = ?report.ambiguous_positions,
            "Tied votes resolved to the first observed digit"
        );
    }
    debug!(
        cells = report.cells,
        passes = report.passes_observed,
        dropped_groups = report.dropped_groups,
        "Decoded signal"
    );

    state.record_decode(report.text.len(), report.truncated, report.ambiguous_positions.len());

    Ok(HttpResponse::Ok().json(DecodeResponse { text: report.text }))
}
