use super::ingestor::Ingestor;
use super::source::{DEFAULT_DELIMITER, DelimitedSource, parse_delimiter};
use super::types::{IngestError, IngestOptions};
use crate::history::types::ErrorResponse;
use crate::storage::store::SharedStore;

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct IngestParams {
    pub delimiter: Option<String>,
    pub max_rows: Option<u64>,
    pub batch_size: Option<usize>,
}

impl IngestParams {
    fn options(&self) -> IngestOptions {
        let defaults = IngestOptions::default();
        IngestOptions {
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
            max_rows: self.max_rows,
            ..defaults
        }
    }
}

/// Ingests a delimited text body (header row first) and returns the summary.
///
/// The body is taken as raw bytes; invalid UTF-8 is decoded lossily.
pub async fn handle_ingest(
    Extension(store): Extension<SharedStore>,
    Query(params): Query<IngestParams>,
    body: Bytes,
) -> Response {
    let delimiter = match params.delimiter.as_deref().map(parse_delimiter) {
        None => DEFAULT_DELIMITER,
        Some(Ok(delimiter)) => delimiter,
        Some(Err(e)) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    let ingestor = match Ingestor::new(store, params.options()) {
        Ok(ingestor) => ingestor,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };

    let source = DelimitedSource::from_reader(&body[..], delimiter);
    match ingestor.ingest(source).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e @ IngestError::Storage(_)) => {
            tracing::error!("Ingest aborted: {}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, e)
        }
        Err(e) => {
            tracing::warn!("Ingest rejected: {}", e);
            error_response(StatusCode::BAD_REQUEST, e)
        }
    }
}

fn error_response(status: StatusCode, error: IngestError) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}
