use std::sync::Arc;

use axum::{extract::Extension, response::Response};
use serde_json::json;

use crate::app::dto;
use crate::app::services::AppServices;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> Response {
    dto::ok(json!({
        "status": "ok",
        "storage": services.storage.as_str(),
    }))
}
