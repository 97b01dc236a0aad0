use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use revscan_analyzer::sink::CsvSink;
use revscan_analyzer::{Analyzer, Classifier, InferenceContext};
use revscan_common::Config;
use serpapi_client::SerpApiClient;

mod rest;

use rest::{RateLimiter, ANALYSES_PER_HOUR};

pub struct AppState {
    pub analyzer: Analyzer,
    pub rate_limiter: RateLimiter,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .route("/api/analyze", post(rest::api_analyze))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        // Method + path + status + latency only (no body, no IP)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("revscan=info".parse()?))
        .init();

    let config = Config::from_env();
    config.log_redacted();

    // Loaded once; every request shares the same weights.
    let context = InferenceContext::load(&config.model_dir, config.labels_path.as_deref())?;
    let source = SerpApiClient::new(config.serpapi_api_key.clone(), config.serpapi_timeout())?;
    let analyzer = Analyzer::new(
        Arc::new(source),
        Arc::new(Classifier::new(Arc::new(context))),
        Arc::new(CsvSink::new(&config.results_path)),
    )
    .with_review_target(config.review_target);

    let state = Arc::new(AppState {
        analyzer,
        rate_limiter: RateLimiter::new(ANALYSES_PER_HOUR),
    });

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Revscan API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
