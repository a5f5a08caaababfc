use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use warta_auth::{AuthError, SessionError};
use warta_core::DomainError;

const INTERNAL_MESSAGE: &str = "internal server error";

/// An error on its way to becoming a JSON response.
///
/// | Failure | Status |
/// |---------|--------|
/// | unauthenticated | 401 |
/// | forbidden | 403 |
/// | not found | 404 |
/// | conflict, validation, invalid id | 422 |
/// | internal | 500 |
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    required_roles: Option<Vec<String>>,
    detail: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            required_roles: None,
            detail: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", INTERNAL_MESSAGE)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let code = err.code();
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) | DomainError::Conflict(msg) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, msg)
            }
            DomainError::NotFound(what) => Self::new(StatusCode::NOT_FOUND, code, format!("{what} not found")),
            DomainError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, code, msg),
            DomainError::Internal(detail) => Self::internal(detail),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated(reason) => Self::new(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                format!("unauthenticated: {reason}"),
            ),
            AuthError::Forbidden { required } => Self {
                required_roles: Some(required.names()),
                ..Self::new(
                    StatusCode::FORBIDDEN,
                    "forbidden",
                    format!("requires {required}"),
                )
            },
            AuthError::Internal(detail) => Self::internal(detail),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", "invalid credentials")
            }
            SessionError::Domain(err) => err.into(),
        }
    }
}

/// Internal failure detail, carried on the response for [`reveal_internal_detail`].
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "error": self.code,
            "message": self.message,
        });
        if let Some(roles) = self.required_roles {
            body["required_roles"] = json!(roles);
        }

        let mut response = (self.status, axum::Json(body)).into_response();
        if let Some(detail) = self.detail {
            tracing::error!(error = %detail, "request failed with an internal error");
            response.extensions_mut().insert(InternalDetail(detail));
        }
        response
    }
}

/// In debug mode, replace the generic 500 message with the internal detail.
pub async fn reveal_internal_detail(State(debug): State<bool>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if !debug {
        return response;
    }
    match response.extensions().get::<InternalDetail>() {
        Some(InternalDetail(detail)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", detail.clone())
        }
        None => response,
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
