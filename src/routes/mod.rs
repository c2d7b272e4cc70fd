mod device;
mod system;

use crate::middlewares::trace_id::{TraceId, TraceIdLayer};
use crate::state::AppState;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::{
    Router,
    routing::{get, patch, post},
};
use std::time::Duration;
use tracing::Span;

pub fn build() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(system::health))
        .route("/api/version", get(system::version))
        // ======== device ========
        .route("/api/devices", post(device::register))
        .route("/api/devices", patch(device::update))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let trace_id = request
                        .extensions()
                        .get::<TraceId>()
                        .map(|it| it.to_string())
                        .unwrap_or_default();
                    tracing::debug_span!("request", trace_id = %trace_id)
                })
                .on_request(|req: &Request<Body>, _span: &Span| {
                    tracing::trace!(
                        method = %req.method(),
                        uri = %req.uri(),
                        version = %format!("{:?}", req.version()),
                        "started processing request"
                    );
                })
                .on_response(|res: &Response, latency: Duration, _span: &Span| {
                    tracing::trace!(
                        status = ?res.status(),
                        latency = %format!("{}ms", latency.as_millis()),
                        "finished processing request"
                    );
                }),
        )
        .layer(TraceIdLayer::new())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .expose_headers(tower_http::cors::Any)
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        )
}
