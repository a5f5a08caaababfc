use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{patch, post},
    Router,
};

use warta_auth::Role;
use warta_core::IdentityId;

use crate::app::dto::{self, AssignRoleRequest, JsonBody, SetStatusRequest, parse_id};
use crate::app::errors::ApiError;
use crate::app::routes::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/admin/identities/:id/roles", post(assign_role))
        .route("/admin/identities/:id/status", patch(set_status))
}

pub async fn assign_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<AssignRoleRequest>,
) -> ApiResult {
    let id: IdentityId = parse_id(&id)?;
    let name = body.role.trim();
    if name.is_empty() {
        return Err(ApiError::validation("role is required"));
    }
    let profile = services
        .sessions
        .assign_role(id, Role::new(name.to_string()))
        .await?;
    Ok(dto::ok_with_message("role assigned", profile))
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<SetStatusRequest>,
) -> ApiResult {
    let id: IdentityId = parse_id(&id)?;
    let profile = services.sessions.set_status(id, body.status).await?;
    Ok(dto::ok_with_message("status updated", profile))
}
