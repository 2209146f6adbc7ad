use crate::config::AppConfig;
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};
use actix_web::{web, HttpResponse};
use serde_json::json;

fn config_json(config: &AppConfig) -> serde_json::Value {
    json!({
        "server": {
            "host": config.server.host,
            "port": config.server.port
        },
        "codec": {
            "sample_rate": config.codec.sample_rate,
            "bit_depth": config.codec.bit_depth,
            "channels": config.codec.channels,
            "num_bins": config.codec.num_bins,
            "cell_size": config.codec.cell_size,
            "terminator_count": config.codec.terminator_count,
            "duration_seconds": config.codec.duration_seconds,
            "cell_strategy": config.codec.cell_strategy,
            "strict_length": config.codec.strict_length
        },
        "performance": {
            "max_payload_bytes": config.performance.max_payload_bytes,
            "max_text_length": config.performance.max_text_length
        }
    })
}

pub async fn get_config(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let config = state.get_config();

    Ok(HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "config": config_json(&config)
    })))
}

/// Apply a partial configuration update.
///
/// The JSON body limit is installed when the server starts, so a request that
/// changes `max_payload_bytes` is rejected with 400.
pub async fn update_config(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> AppResult<HttpResponse> {
    let json_str = serde_json::to_string(&body.into_inner())?;

    let mut current_config = state.get_config();
    current_config
        .update_from_json(&json_str)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    state.update_config(current_config.clone())
        .map_err(AppError::ValidationError)?;

    tracing::info!(
        cell_size = current_config.codec.cell_size,
        cell_strategy = %current_config.codec.cell_strategy,
        "Configuration updated"
    );

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Configuration updated successfully",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "updated_config": config_json(&current_config)
    })))
}
