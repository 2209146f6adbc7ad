//! # Application State Management
//!
//! Configuration and metrics shared by every request handler. Both live
//! behind `Arc<RwLock<_>>` so handlers read concurrently while the config
//! endpoint and the middleware write.

use crate::config::AppConfig;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// State handed to every handler through `web::Data`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Runtime configuration, replaced wholesale by `PUT /api/v1/config`
    pub config: Arc<RwLock<AppConfig>>,

    /// Updated by the metrics middleware and the codec handlers
    pub metrics: Arc<RwLock<AppMetrics>>,

    pub start_time: Instant,
}

/// Counters collected across all HTTP requests.
#[derive(Debug, Default)]
pub struct AppMetrics {
    pub request_count: u64,

    pub error_count: u64,

    /// Counters fed by the encode/decode handlers
    pub codec: CodecMetrics,

    /// Keyed by method and route pattern, e.g. "POST /decode"
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

/// Codec activity since server start.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CodecMetrics {
    /// Signals produced by `/encode`
    pub signals_encoded: u64,

    /// Digits carried by those signals
    pub digits_encoded: u64,

    /// Signals decoded by `/decode`
    pub signals_decoded: u64,

    /// Digits recovered by those decodes
    pub digits_decoded: u64,

    /// Decodes of buffers shorter than the configured length
    pub truncated_decodes: u64,

    /// Positions that fell back to the first-entry tie-break
    pub ambiguous_positions: u64,
}

/// Per-endpoint request statistics.
#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,

    /// Cumulative handling time in milliseconds
    pub total_duration_ms: u64,

    pub error_count: u64,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            start_time: Instant::now(),
        }
    }

    /// Copy of the current configuration; the lock is released on return.
    pub fn get_config(&self) -> AppConfig {
        self.config.read().unwrap().clone()
    }

    /// Replace the configuration if it validates.
    pub fn update_config(&self, new_config: AppConfig) -> Result<(), String> {
        match new_config.validate() {
            Ok(_) => {
                *self.config.write().unwrap() = new_config;
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn increment_request_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.request_count += 1;
    }

    /// Called for every 4xx/5xx response and every service error.
    pub fn increment_error_count(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.error_count += 1;
    }

    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.metrics.write().unwrap();

        let endpoint_metric = metrics.endpoint_metrics.entry(endpoint.to_string()).or_default();
        endpoint_metric.request_count += 1;
        endpoint_metric.total_duration_ms += duration_ms;

        if is_error {
            endpoint_metric.error_count += 1;
        }
    }

    /// Record one successful encode of `digit_count` digits.
    pub fn record_encode(&self, digit_count: usize) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.codec.signals_encoded += 1;
        metrics.codec.digits_encoded += digit_count as u64;
    }

    /// Record one successful decode and how clean it was.
    ///
    /// ## Parameters:
    /// - **digit_count**: Length of the recovered text
    /// - **truncated**: Whether the buffer was shorter than expected
    /// - **ambiguous_positions**: Positions decided by the tie-break
    pub fn record_decode(&self, digit_count: usize, truncated: bool, ambiguous_positions: usize) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.codec.signals_decoded += 1;
        metrics.codec.digits_decoded += digit_count as u64;
        metrics.codec.ambiguous_positions += ambiguous_positions as u64;
        if truncated {
            metrics.codec.truncated_decodes += 1;
        }
    }

    /// Consistent copy of the metrics, taken under one read lock.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        let metrics = self.metrics.read().unwrap();
        AppMetrics {
            request_count: metrics.request_count,
            error_count: metrics.error_count,
            codec: metrics.codec.clone(),
            endpoint_metrics: metrics.endpoint_metrics.clone(),
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl EndpointMetric {
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    /// Fraction of requests that failed, 0.0 to 1.0.
    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}
