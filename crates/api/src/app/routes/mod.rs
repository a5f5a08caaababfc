use axum::{
    response::Response,
    routing::{get, post},
    Router,
};

use warta_auth::RequiredRoles;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::middleware::{GateState, auth_middleware};

pub mod admin;
pub mod dispositions;
pub mod incoming;
pub mod outgoing;
pub mod session;
pub mod system;

pub type ApiResult = Result<Response, ApiError>;

/// Full route table. Each protected group sits behind its own gate.
///
/// | Group | Required roles |
/// |-------|----------------|
/// | `/health`, `/register`, `/login` | none |
/// | session, outgoing, incoming reads, dispositions | any authenticated identity |
/// | approve / reject | policy approvers |
/// | incoming register / edit | policy intake |
/// | `/admin/...` | policy admins |
pub fn router(services: &AppServices) -> Router {
    let gate = |required: RequiredRoles| {
        axum::middleware::from_fn_with_state(
            GateState::new(services.gate.clone(), required),
            auth_middleware,
        )
    };

    let public = Router::new()
        .route("/health", get(system::health))
        .route("/register", post(session::register))
        .route("/login", post(session::login));

    let authenticated = Router::new()
        .merge(session::router())
        .merge(outgoing::router())
        .merge(incoming::router())
        .merge(dispositions::router())
        .route_layer(gate(RequiredRoles::any()));

    let approvers = outgoing::approver_router().route_layer(gate(services.policy.approvers.clone()));
    let intake = incoming::intake_router().route_layer(gate(services.policy.intake.clone()));
    let admin = admin::router().route_layer(gate(services.policy.admins.clone()));

    public
        .merge(authenticated)
        .merge(approvers)
        .merge(intake)
        .merge(admin)
}
