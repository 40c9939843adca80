// src/api.rs
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::metrics::Metrics;

async fn ok() -> &'static str {
    "OK"
}

/// Liveness routes (`/`, `/health`), plus `/metrics` when a recorder is given.
pub fn router(metrics: Option<&Metrics>) -> Router {
    let base = Router::new()
        .route("/", get(ok))
        .route("/health", get(ok));

    let app = match metrics {
        Some(m) => base.merge(m.router()),
        None => base,
    };
    app.layer(TraceLayer::new_for_http())
}
