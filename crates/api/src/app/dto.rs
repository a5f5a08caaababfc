use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use warta_auth::{IdentityStatus, Profile, Session};
use warta_core::{DomainError, Page, PageRequest};
use warta_letters::{
    DispositionStatus, IncomingFilter, IncomingStatus, OutgoingFilter, OutgoingStatus, Priority,
};

use crate::app::errors::ApiError;

// -------------------------
// Extractors
// -------------------------

/// `Json<T>` whose rejection is a 422 JSON error instead of axum's plain text.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}

/// `Query<T>` with the same 422 rejection.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}

/// Parse a path segment into one of the typed ids.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ApiError::from)
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: IdentityStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct IncomingStatusRequest {
    pub status: IncomingStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OutgoingQuery {
    pub status: Option<OutgoingStatus>,
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OutgoingQuery {
    pub fn into_parts(self) -> (OutgoingFilter, PageRequest) {
        let page = PageRequest::new(self.page, self.per_page);
        let filter = OutgoingFilter {
            status: self.status,
            search: self.search,
            date_from: self.date_from,
            date_to: self.date_to,
        };
        (filter, page)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IncomingQuery {
    pub status: Option<IncomingStatus>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl IncomingQuery {
    pub fn into_parts(self) -> (IncomingFilter, PageRequest) {
        let page = PageRequest::new(self.page, self.per_page);
        let filter = IncomingFilter {
            status: self.status,
            priority: self.priority,
            search: self.search,
            date_from: self.date_from,
            date_to: self.date_to,
        };
        (filter, page)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReceivedQuery {
    pub status: Option<DispositionStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: Profile,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token.credential,
            token_type: "Bearer",
            expires_at: session.token.record.expires_at,
            user: session.profile,
        }
    }
}

#[derive(Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub has_more: bool,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            has_more: page.has_more(),
            items: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
        }
    }
}

// -------------------------
// Envelope helpers
// -------------------------

pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(json!({ "success": true, "data": data }))).into_response()
}

pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message, "data": data })),
    )
        .into_response()
}

pub fn message(message: &str) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "message": message }))).into_response()
}
