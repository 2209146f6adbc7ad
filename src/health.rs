use crate::config::AppConfig;
use crate::state::{AppMetrics, AppState};
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Liveness check: always the JSON string `"ok"`.
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().json("ok")
}

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let config = state.get_config();
    let uptime_seconds = state.get_uptime_seconds();

    let memory_info = get_memory_info();
    let system_status = get_system_status(&metrics);

    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "service": {
            "name": "digit-audio-codec",
            "version": env!("CARGO_PKG_VERSION"),
            "host": config.server.host,
            "port": config.server.port
        },
        "metrics": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": overall_error_rate(&metrics),
            "signals_encoded": metrics.codec.signals_encoded,
            "signals_decoded": metrics.codec.signals_decoded
        },
        "memory": memory_info,
        "codec": get_codec_info(&config),
        "system": system_status
    }))
}

pub async fn detailed_metrics(state: web::Data<AppState>) -> HttpResponse {
    let metrics = state.get_metrics_snapshot();
    let uptime_seconds = state.get_uptime_seconds();
    let config = state.get_config();

    let mut endpoint_stats = Vec::new();
    for (endpoint, metric) in metrics.endpoint_metrics.iter() {
        endpoint_stats.push(json!({
            "endpoint": endpoint,
            "request_count": metric.request_count,
            "error_count": metric.error_count,
            "error_rate": metric.error_rate(),
            "average_duration_ms": metric.average_duration_ms(),
            "total_duration_ms": metric.total_duration_ms
        }));
    }

    HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "overall": {
            "total_requests": metrics.request_count,
            "total_errors": metrics.error_count,
            "error_rate": overall_error_rate(&metrics),
            "requests_per_second": if uptime_seconds > 0 {
                metrics.request_count as f64 / uptime_seconds as f64
            } else {
                0.0
            }
        },
        "codec": metrics.codec,
        "endpoints": endpoint_stats,
        "memory": get_memory_info(),
        "performance": {
            "max_payload_bytes": config.performance.max_payload_bytes,
            "max_text_length": config.performance.max_text_length
        }
    }))
}

fn overall_error_rate(metrics: &AppMetrics) -> f64 {
    if metrics.request_count > 0 {
        metrics.error_count as f64 / metrics.request_count as f64
    } else {
        0.0
    }
}

/// Signal layout implied by the current configuration.
fn get_codec_info(config: &AppConfig) -> serde_json::Value {
    let params = config.codec.to_codec_params();
    let total_samples = params.total_samples();
    let quantizer = params.quantizer();

    json!({
        "sample_rate": params.sample_rate,
        "bit_depth": params.bit_depth,
        "channels": params.channels,
        "num_bins": params.num_bins,
        "bin_width": quantizer.bin_width(),
        "noise_margin": quantizer.noise_margin(),
        "cell_size": params.cell_size,
        "terminator_count": params.terminator_count,
        "cell_strategy": params.cell_strategy.to_string(),
        "signal_samples": total_samples,
        "cell_capacity": total_samples / params.cell_size.max(1)
    })
}

fn get_memory_info() -> serde_json::Value {
    #[cfg(target_os = "linux")]
    {
        let pid = std::process::id();
        if let Ok(status) = std::fs::read_to_string(format!("/proc/{}/status", pid)) {
            let mut vm_rss = 0;
            let mut vm_size = 0;

            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        vm_rss = kb_str.parse::<u64>().unwrap_or(0) * 1024;
                    }
                } else if line.starts_with("VmSize:") {
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        vm_size = kb_str.parse::<u64>().unwrap_or(0) * 1024;
                    }
                }
            }

            return json!({
                "resident_memory_bytes": vm_rss,
                "virtual_memory_bytes": vm_size,
                "available": true
            });
        }
    }

    json!({
        "resident_memory_bytes": 0,
        "virtual_memory_bytes": 0,
        "available": false,
        "note": "Memory info not available on this platform"
    })
}

fn get_system_status(metrics: &AppMetrics) -> serde_json::Value {
    let error_rate = overall_error_rate(metrics);

    let status = if error_rate > 0.5 {
        "degraded"
    } else if error_rate > 0.1 {
        "elevated_errors"
    } else {
        "normal"
    };

    let mut warnings = Vec::new();
    if metrics.codec.truncated_decodes > 0 {
        warnings.push("Truncated buffers were decoded best-effort");
    }
    if metrics.codec.ambiguous_positions > 0 {
        warnings.push("Some positions were resolved by tie-break");
    }

    json!({
        "status": status,
        "error_rate_percent": (error_rate * 100.0).round(),
        "truncated_decodes": metrics.codec.truncated_decodes,
        "ambiguous_positions": metrics.codec.ambiguous_positions,
        "decode_warnings": warnings
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_ping() {
        let app = test::init_service(App::new().route("/ping", web::get().to(ping))).await;
        let req = test::TestRequest::get().uri("/ping").to_request();
        let body: String = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, "ok");
    }

    #[actix_web::test]
    async fn test_health_check_reports_codec() {
        let state = AppState::new(AppConfig::default());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/health", web::get().to(health_check)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"]["name"], "digit-audio-codec");
        assert_eq!(body["codec"]["signal_samples"], 441_000);
        assert_eq!(body["codec"]["cell_strategy"], "mean");
        assert_eq!(body["codec"]["noise_margin"], 2977);
        assert_eq!(body["system"]["status"], "normal");
    }

    #[actix_web::test]
    async fn test_system_status_thresholds() {
        let mut metrics = AppMetrics::default();
        metrics.request_count = 10;
        metrics.error_count = 6;
        assert_eq!(get_system_status(&metrics)["status"], "degraded");

        metrics.error_count = 2;
        metrics.codec.truncated_decodes = 1;
        let status = get_system_status(&metrics);
        assert_eq!(status["status"], "elevated_errors");
        assert_eq!(status["decode_warnings"].as_array().map(Vec::len), Some(1));
    }
}
