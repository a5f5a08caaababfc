use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use warta_auth::{AuthGate, RequiredRoles};

use crate::app::errors::ApiError;
use crate::context::RequestCredential;

/// Gate configuration for one route group.
#[derive(Clone)]
pub struct GateState {
    pub gate: AuthGate,
    pub required: RequiredRoles,
}

impl GateState {
    pub fn new(gate: AuthGate, required: RequiredRoles) -> Self {
        Self { gate, required }
    }
}

/// Authenticate the bearer credential and check the group's roles.
///
/// On success the handler sees `AuthorizedContext` and `RequestCredential`
/// in the request extensions.
pub async fn auth_middleware(
    State(state): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let credential = extract_bearer(req.headers()).map(str::to_owned);

    let ctx = match state
        .gate
        .authorize(credential.as_deref(), &state.required)
        .await
    {
        Ok(ctx) => ctx,
        Err(err) => return ApiError::from(err).into_response(),
    };

    req.extensions_mut().insert(ctx);
    if let Some(credential) = credential {
        req.extensions_mut().insert(RequestCredential::new(credential));
    }

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
