//! # Digit Audio Codec - Main Application Entry Point
//!
//! HTTP server that turns digit strings into WAV audio and back.
//!
//! ## Application Architecture:
//! - **codec**: The digit ↔ PCM transform (quantizer, encoder, decoder, voter)
//! - **audio**: WAV container framing and PCM format checks
//! - **channel**: Seeded noise models for the debug round-trip endpoint
//! - **config**: Application configuration (TOML file + environment variables)
//! - **state**: Shared application state and metrics
//! - **health**: Health and metrics endpoints
//! - **middleware**: Request logging and metrics collection
//! - **handlers**: HTTP request handlers for API endpoints
//! - **error**: Error type and HTTP error responses

mod audio;
mod channel;
mod codec;
mod config;
mod error;
mod state;
mod health;
mod middleware;
mod handlers;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware::Logger};
use anyhow::Result;
use config::AppConfig;
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Set by the signal handler task once SIGTERM or SIGINT arrives.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

/// Load configuration, start the server, and stop it on SIGTERM/SIGINT.
#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting digit-audio-codec v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);
    info!(
        "Codec: {} Hz, {} bins, {}-sample cells, {} terminators, {} strategy",
        config.codec.sample_rate,
        config.codec.num_bins,
        config.codec.cell_size,
        config.codec.terminator_count,
        config.codec.cell_strategy
    );

    let app_state = AppState::new(config.clone());
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    // A 10 s WAV is ~1.2 MB once base64-encoded, far over Actix's default JSON limit.
    // Fixed for the lifetime of the server; runtime config updates cannot change it.
    let payload_limit = config.performance.max_payload_bytes;

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            // Oversized or malformed bodies get the same JSON error envelope as handler errors
            .app_data(
                web::JsonConfig::default()
                    .limit(payload_limit)
                    .error_handler(|err, _req| error::AppError::BadRequest(err.to_string()).into()),
            )
            // Last wrapped runs first on the request
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(middleware::MetricsMiddleware)
            .wrap(middleware::RequestLogging)
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health::health_check))
                    .route("/metrics", web::get().to(health::detailed_metrics))
                    .route("/config", web::get().to(handlers::get_config))
                    .route("/config", web::put().to(handlers::update_config))
            )
            // Codec endpoints
            .route("/encode", web::post().to(handlers::encode_text))
            .route("/decode", web::post().to(handlers::decode_audio))
            .route("/debug/roundtrip", web::post().to(handlers::roundtrip))
            // Liveness and health at root level for convenience
            .route("/ping", web::get().to(health::ping))
            .route("/health", web::get().to(health::health_check))
            .default_service(web::route().to(handlers::not_found))
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(server_result) => {
                    if let Err(e) = server_result {
                        error!("Server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Server task error: {}", e);
                }
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Console tracing, filtered by `RUST_LOG`
/// (default `digit_audio_codec=debug,actix_web=info`).
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "digit_audio_codec=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Spawn a task that raises `SHUTDOWN_SIGNAL` on SIGTERM or SIGINT.
fn setup_signal_handlers() {
    tokio::spawn(async {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                // Without handlers the server still stops on the default signal action
                error!("Failed to install signal handlers: {}", e);
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

/// Poll `SHUTDOWN_SIGNAL` every 100 ms.
async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
