use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};

use warta_auth::{AuthorizedContext, RegisterIdentity};

use crate::app::dto::{self, JsonBody, LoginRequest, SessionResponse};
use crate::app::routes::ApiResult;
use crate::app::services::AppServices;
use crate::context::RequestCredential;

/// Session routes that need an authenticated caller.
pub fn router() -> Router {
    Router::new()
        .route("/logout", post(logout))
        .route("/profile", get(profile))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<RegisterIdentity>,
) -> ApiResult {
    let session = services.sessions.register(body).await?;
    Ok(dto::created(SessionResponse::from(session)))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> ApiResult {
    let session = services.sessions.login(&body.login, &body.password).await?;
    Ok(dto::ok_with_message("login successful", SessionResponse::from(session)))
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Extension(credential): Extension<RequestCredential>,
) -> ApiResult {
    services.sessions.logout(&ctx, credential.as_str()).await?;
    Ok(dto::message("logged out"))
}

pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
) -> ApiResult {
    let profile = services.sessions.profile(&ctx).await?;
    Ok(dto::ok(profile))
}
