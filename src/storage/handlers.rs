use super::store::SharedStore;

use axum::{Extension, http::StatusCode};

pub async fn handle_health(Extension(store): Extension<SharedStore>) -> (StatusCode, &'static str) {
    match store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
