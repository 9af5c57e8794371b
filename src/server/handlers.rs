//! HTTP handlers for the read API

use crate::pipeline::context::AppContext;
use crate::pipeline::error::AuthRejection;
use crate::pipeline::types::PageRequest;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Raw pagination params; parsed by hand so bad values map to 400 `{error}`
#[derive(Debug, Default, Deserialize)]
pub struct StoriesQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl StoriesQuery {
    fn page_request(&self) -> Option<PageRequest> {
        let defaults = PageRequest::default();
        let page = parse_positive(self.page.as_deref(), defaults.page)?;
        let limit = parse_positive(self.limit.as_deref(), defaults.limit)?;
        PageRequest::new(page, limit)
    }
}

fn parse_positive(raw: Option<&str>, default: u32) -> Option<u32> {
    match raw {
        None => Some(default),
        Some(s) if s.trim().is_empty() => Some(default),
        Some(s) => s.trim().parse::<u32>().ok().filter(|v| *v > 0),
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /login`
///
/// A body that is not a JSON object with a JSON content type is a 400
/// `{error}`, like every other failure on this surface.
pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            log::warn!("🔒 Malformed login body: {}", rejection.body_text());
            return error_body(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    if ctx.auth.check_credentials(&body.username, &body.password) {
        let token = ctx.auth.issue(&body.username);
        log::info!("🔑 Issued token for {}", body.username);
        return Json(LoginResponse { token }).into_response();
    }

    log::warn!("🔒 Rejected login for {}", body.username);
    error_body(StatusCode::UNAUTHORIZED, "Invalid credentials")
}

/// `GET /stories?page=&limit=`
pub async fn list_stories(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Query(query): Query<StoriesQuery>,
) -> Response {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    match ctx.auth.verify_header(header) {
        Ok(_) => {}
        Err(AuthRejection::Missing) => {
            return error_body(StatusCode::UNAUTHORIZED, "Access Denied");
        }
        Err(AuthRejection::Invalid(reason)) => {
            log::error!("Invalid token: {}", reason);
            return error_body(StatusCode::FORBIDDEN, "Invalid Token");
        }
    }

    let Some(page) = query.page_request() else {
        let message = format!(
            "page and limit must be positive integers, limit at most {}",
            PageRequest::MAX_LIMIT
        );
        return error_body(StatusCode::BAD_REQUEST, &message);
    };

    match ctx.stories_page(page).await {
        Ok((stories, _origin)) => Json(stories).into_response(),
        Err(e) => {
            log::error!("Error fetching stories: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal Server Error",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// `GET /health`
pub async fn health(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "live_connections": ctx.notifier.live_connections(),
    }))
}
