use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Router,
};

use warta_auth::AuthorizedContext;
use warta_core::{DispositionId, IncomingLetterId, PageRequest};
use warta_letters::NewDisposition;

use crate::app::dto::{
    self, JsonBody, NoteRequest, PageQuery, PageResponse, QueryParams, ReceivedQuery, parse_id,
};
use crate::app::routes::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/dispositions", get(list_received).post(create_disposition))
        .route("/dispositions/sent", get(list_sent))
        .route("/dispositions/letter/:id", get(list_for_letter))
        .route(
            "/dispositions/:id",
            get(get_disposition).delete(delete_disposition),
        )
        .route("/dispositions/:id/read", post(mark_read))
        .route("/dispositions/:id/process", post(start_processing))
        .route("/dispositions/:id/complete", post(complete))
}

pub async fn create_disposition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    JsonBody(body): JsonBody<NewDisposition>,
) -> ApiResult {
    let disposition = services.lifecycle.create_disposition(&ctx, body).await?;
    Ok(dto::created(disposition))
}

/// Dispositions addressed to the caller.
pub async fn list_received(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    QueryParams(query): QueryParams<ReceivedQuery>,
) -> ApiResult {
    let page = PageRequest::new(query.page, query.per_page);
    let dispositions = services
        .lifecycle
        .list_received_dispositions(&ctx, query.status, page)
        .await?;
    Ok(dto::ok(PageResponse::from(dispositions)))
}

pub async fn list_sent(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    QueryParams(query): QueryParams<PageQuery>,
) -> ApiResult {
    let dispositions = services
        .lifecycle
        .list_sent_dispositions(&ctx, query.request())
        .await?;
    Ok(dto::ok(PageResponse::from(dispositions)))
}

pub async fn list_for_letter(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let letter: IncomingLetterId = parse_id(&id)?;
    let dispositions = services.lifecycle.list_letter_dispositions(letter).await?;
    Ok(dto::ok(dispositions))
}

pub async fn get_disposition(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: DispositionId = parse_id(&id)?;
    let disposition = services.lifecycle.get_disposition(id).await?;
    Ok(dto::ok(disposition))
}

pub async fn delete_disposition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: DispositionId = parse_id(&id)?;
    services.lifecycle.delete_disposition(&ctx, id).await?;
    Ok(dto::message("disposition deleted"))
}

pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: DispositionId = parse_id(&id)?;
    let disposition = services.lifecycle.mark_disposition_read(&ctx, id).await?;
    Ok(dto::ok_with_message("disposition marked as read", disposition))
}

pub async fn start_processing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: DispositionId = parse_id(&id)?;
    let disposition = services.lifecycle.start_disposition(&ctx, id).await?;
    Ok(dto::ok_with_message("disposition in progress", disposition))
}

pub async fn complete(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthorizedContext>,
    Path(id): Path<String>,
    body: Option<JsonBody<NoteRequest>>,
) -> ApiResult {
    let id: DispositionId = parse_id(&id)?;
    let note = body.and_then(|JsonBody(body)| body.note);
    let disposition = services.lifecycle.complete_disposition(&ctx, id, note).await?;
    Ok(dto::ok_with_message("disposition completed", disposition))
}
