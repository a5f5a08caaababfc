//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend selection, seeding, service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs, extractors and the JSON envelope
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::http::{Method, header};
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use warta_infra::Settings;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build services from settings and return the full router (used by `main.rs`).
pub async fn build_app(settings: &Settings) -> anyhow::Result<Router> {
    let services = AppServices::from_settings(settings).await?;
    Ok(router(Arc::new(services)))
}

/// Router over already constructed services.
pub fn router(services: Arc<AppServices>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(services.request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(Any),
        );

    routes::router(&services)
        .layer(axum::middleware::from_fn_with_state(
            services.debug,
            errors::reveal_internal_detail,
        ))
        .layer(Extension(services))
        .layer(middleware)
}
