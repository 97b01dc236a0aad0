use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use revscan_common::{AnalysisSummary, ChartData, ResultColumns, RevscanError};

use crate::AppState;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    asin: Option<String>,
    pages: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub summary: AnalysisSummary,
    pub chart_data: ChartData,
    pub results: ResultColumns,
    pub asin: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({"error": message.into()}))).into_response()
}

pub async fn api_analyze(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    Json(body): Json<AnalyzeRequest>,
) -> Response {
    let Some(asin) = body.asin.filter(|a| !a.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "No ASIN or URL provided.");
    };

    if !state.rate_limiter.try_acquire(addr.ip(), Instant::now()).await {
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            format!("Rate limit exceeded: max {} analyses per hour", state.rate_limiter.limit()),
        );
    }

    let pages = body.pages.unwrap_or(1);
    let report = match state.analyzer.analyze(&asin, pages).await {
        Ok(report) => report,
        Err(e) => {
            let client_error = e
                .downcast_ref::<RevscanError>()
                .is_some_and(RevscanError::is_client_error);
            if client_error {
                info!(error = %e, "Rejected analysis request");
                return error_response(StatusCode::BAD_REQUEST, e.to_string());
            }
            warn!(error = %e, "Analysis failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    info!(
        product = %report.product,
        total_reviews = report.summary.total_reviews,
        "Analysis served"
    );

    Json(AnalyzeResponse {
        summary: report.summary,
        chart_data: report.chart_data(),
        results: report.columns(),
        asin,
    })
    .into_response()
}
