use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::error;

use ilo_exporter_core::exporter::Exporter;

pub(crate) type AppState = State<Arc<Exporter>>;

// ============================================================
// Metrics
// ============================================================

/// Runs every collector and returns the text exposition.
///
/// Collection does blocking SNMP and HTTPS I/O, so it runs off the async
/// runtime.
pub(crate) async fn handle_metrics(State(exporter): AppState) -> Response {
    let rendered = tokio::task::spawn_blocking(move || exporter.render()).await;

    match rendered {
        Ok(Ok(body)) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            error!(error = %e, "collection task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ============================================================
// Health
// ============================================================

pub(crate) async fn handle_health() -> &'static str {
    "ok"
}
