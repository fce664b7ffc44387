use super::engine::HistoryEngine;
use super::types::{ErrorResponse, HistoryError, HistoryRequest};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form, Json};
use std::sync::Arc;

/// A body that is not a form (or no body at all) is treated as a request
/// without a domain.
pub async fn handle_get_domain_history(
    Extension(engine): Extension<Arc<HistoryEngine>>,
    form: Option<Form<HistoryRequest>>,
) -> Response {
    let token = form.and_then(|Form(req)| req.domain).unwrap_or_default();

    match engine.get_history(&token).await {
        Ok(history) => (StatusCode::OK, Json(history)).into_response(),
        Err(HistoryError::EmptyToken) => {
            tracing::debug!("History request without a domain");
            error_response(StatusCode::BAD_REQUEST, HistoryError::EmptyToken)
        }
        Err(HistoryError::Storage(e)) if e.is_fatal() => {
            tracing::error!("History lookup for '{}' failed: {}", token, e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, HistoryError::Storage(e))
        }
        Err(e) => {
            tracing::error!("History lookup for '{}' failed: {}", token, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

fn error_response(status: StatusCode, error: HistoryError) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}
