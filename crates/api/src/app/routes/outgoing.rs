use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Router,
};

use warta_auth::AuthorizedContext;
use warta_core::OutgoingLetterId;
use warta_letters::{NewOutgoingLetter, OutgoingPatch};

use crate::app::dto::{
    self, JsonBody, NoteRequest, OutgoingQuery, PageResponse, QueryParams, RejectRequest, parse_id,
};
use crate::app::routes::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/outgoing-letters", get(list_letters).post(create_letter))
        .route(
            "/outgoing-letters/:id",
            get(get_letter).put(edit_letter).delete(delete_letter),
        )
        .route("/outgoing-letters/:id/submit", post(submit_letter))
}

/// Decision routes; the gate in front of these checks the approver roles.
pub fn approver_router() -> Router {
    Router::new()
        .route("/outgoing-letters/:id/approve", post(approve_letter))
        .route("/outgoing-letters/:id/reject", post(reject_letter))
}

pub async fn list_letters(
    Extension(services): Extension<Arc<AppServices>>,
    QueryParams(query): QueryParams<OutgoingQuery>,
) -> ApiResult {
    let (filter, page) = query.into_parts();
    let letters = services.lifecycle.list_outgoing(&filter, page).await?;
    Ok(dto::ok(PageResponse::from(letters)))
}

pub async fn create_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    JsonBody(body): JsonBody<NewOutgoingLetter>,
) -> ApiResult {
    let letter = services.lifecycle.create_outgoing(&ctx, body).await?;
    Ok(dto::created(letter))
}

pub async fn get_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: OutgoingLetterId = parse_id(&id)?;
    let letter = services.lifecycle.get_outgoing(id).await?;
    Ok(dto::ok(letter))
}

pub async fn edit_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<OutgoingPatch>,
) -> ApiResult {
    let id: OutgoingLetterId = parse_id(&id)?;
    let letter = services.lifecycle.edit_outgoing(&ctx, id, body).await?;
    Ok(dto::ok_with_message("outgoing letter updated", letter))
}

pub async fn delete_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: OutgoingLetterId = parse_id(&id)?;
    services.lifecycle.delete_outgoing(&ctx, id).await?;
    Ok(dto::message("outgoing letter deleted"))
}

pub async fn submit_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: OutgoingLetterId = parse_id(&id)?;
    let letter = services.lifecycle.submit_outgoing(&ctx, id).await?;
    Ok(dto::ok_with_message("outgoing letter submitted", letter))
}

pub async fn approve_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
    body: Option<JsonBody<NoteRequest>>,
) -> ApiResult {
    let id: OutgoingLetterId = parse_id(&id)?;
    let note = body.and_then(|JsonBody(body)| body.note);
    let letter = services.lifecycle.approve_outgoing(&ctx, id, note).await?;
    Ok(dto::ok_with_message("outgoing letter approved", letter))
}

pub async fn reject_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<RejectRequest>,
) -> ApiResult {
    let id: OutgoingLetterId = parse_id(&id)?;
    let letter = services.lifecycle.reject_outgoing(&ctx, id, body.note).await?;
    Ok(dto::ok_with_message("outgoing letter rejected", letter))
}
