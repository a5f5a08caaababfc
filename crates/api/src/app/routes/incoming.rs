use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{get, patch, post, put},
    Router,
};

use warta_auth::AuthorizedContext;
use warta_core::IncomingLetterId;
use warta_letters::{IncomingPatch, NewIncomingLetter};

use crate::app::dto::{
    self, IncomingQuery, IncomingStatusRequest, JsonBody, PageResponse, QueryParams, parse_id,
};
use crate::app::routes::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/incoming-letters", get(list_letters))
        .route("/incoming-letters/:id", get(get_letter).delete(delete_letter))
        .route("/incoming-letters/:id/status", patch(update_status))
}

/// Intake routes; registering and editing need the intake roles.
pub fn intake_router() -> Router {
    Router::new()
        .route("/incoming-letters", post(register_letter))
        .route("/incoming-letters/:id", put(edit_letter))
}

pub async fn list_letters(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(query): QueryParams<IncomingQuery>,
) -> ApiResult {
    let (filter, page) = query.into_parts();
    let letters = services.lifecycle.list_incoming(&filter, page).await?;
    Ok(dto::ok(PageResponse::from(letters)))
}

pub async fn register_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    JsonBody(body): JsonBody<NewIncomingLetter>,
) -> ApiResult {
    let letter = services.lifecycle.register_incoming(&ctx, body).await?;
    Ok(dto::created(letter))
}

/// The letter together with its dispositions.
pub async fn get_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: IncomingLetterId = parse_id(&id)?;
    let detail = services.lifecycle.get_incoming(id).await?;
    Ok(dto::ok(detail))
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<IncomingStatusRequest>,
) -> ApiResult {
    let id: IncomingLetterId = parse_id(&id)?;
    let letter = services
        .lifecycle
        .update_incoming_status(&ctx, id, body.status, body.note)
        .await?;
    Ok(dto::ok_with_message("incoming letter status updated", letter))
}

pub async fn edit_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<IncomingPatch>,
) -> ApiResult {
    let id: IncomingLetterId = parse_id(&id)?;
    let letter = services.lifecycle.edit_incoming(&ctx, id, body).await?;
    Ok(dto::ok_with_message("incoming letter updated", letter))
}

pub async fn delete_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: IncomingLetterId = parse_id(&id)?;
    services.lifecycle.delete_incoming(&ctx, id).await?;
    Ok(dto::message("incoming letter deleted"))
}
