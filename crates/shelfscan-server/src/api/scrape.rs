use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use shelfscan_core::validate_all;
use shelfscan_scraper::ScrapeError;

use super::{ApiError, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeQuery {
    keyword: Option<String>,
}

pub(super) async fn scrape_listings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ScrapeQuery>, QueryRejection>,
) -> Response {
    let keyword = match query {
        Ok(Query(query)) => query.keyword,
        Err(rejection) => {
            tracing::warn!(request_id = %req_id.0, error = %rejection, "malformed scrape query");
            None
        }
    };

    let Some(keyword) = keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
    else {
        return ApiError::new(
            StatusCode::BAD_REQUEST,
            "Invalid keyword parameter",
            Some("invalid_keyword"),
        )
        .into_response();
    };

    tracing::info!(request_id = %req_id.0, keyword, "scrape requested");

    let listings = match state.search.search(keyword).await {
        Ok(listings) => listings,
        Err(e) => return scrape_error_response(&req_id, &e).into_response(),
    };

    if let Err(e) = validate_all(&listings) {
        tracing::warn!(request_id = %req_id.0, error = %e, "listing failed validation");
        return ApiError::new(StatusCode::BAD_REQUEST, e.to_string(), Some("invalid_listing"))
            .into_response();
    }

    if listings.is_empty() {
        return ApiError::new(
            StatusCode::NOT_FOUND,
            "No products found for the given keyword",
            Some("not_found"),
        )
        .into_response();
    }

    tracing::info!(request_id = %req_id.0, count = listings.len(), "scrape succeeded");
    (StatusCode::OK, Json(listings)).into_response()
}

/// Maps a pipeline failure onto the response status.
///
/// Caller and data errors are 400. Otherwise the upstream status is passed
/// through when it is a server error, and anything else becomes 500.
fn scrape_error_response(req_id: &RequestId, error: &ScrapeError) -> ApiError {
    let status = if error.is_validation() {
        StatusCode::BAD_REQUEST
    } else {
        error
            .upstream_status()
            .and_then(|s| StatusCode::from_u16(s).ok())
            .filter(StatusCode::is_server_error)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    };

    if status.is_server_error() {
        tracing::error!(request_id = %req_id.0, error = %error, code = error.code(), "scrape failed");
    } else {
        tracing::warn!(request_id = %req_id.0, error = %error, code = error.code(), "scrape rejected");
    }

    ApiError::new(status, error.to_string(), Some(error.code()))
}
