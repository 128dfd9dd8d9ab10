//! Handlers of the `/links` API.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::types::{AddLinksRequest, LinkView, LinksResponse, ListParams, Pagination, UpdateLinkRequest};
use super::AppState;
use crate::state::CheckStatus;

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Parses an optional positive query value; `None` on garbage or < 1.
fn parse_positive(value: Option<&str>, default: u32) -> Option<u32> {
    match value {
        None => Some(default),
        Some(text) => text.trim().parse::<u32>().ok().filter(|n| *n >= 1),
    }
}

/// Queue URLs for analysis.
pub async fn add_links(
    State(state): State<AppState>,
    payload: Result<Json<AddLinksRequest>, JsonRejection>,
) -> Response {
    let urls = match payload {
        Ok(Json(body)) => body.urls,
        Err(e) => {
            tracing::debug!("Rejected submission: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON or missing URLs");
        }
    };

    if urls.is_empty() || urls.iter().any(|url| url.trim().is_empty()) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid JSON or missing URLs");
    }

    match state.storage.submit_urls(&urls) {
        Ok(ids) => {
            tracing::info!("Queued {} URLs for analysis", ids.len());
            Json(json!({ "status": "added for analysis" })).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to queue URLs: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save links")
        }
    }
}

/// List records, one page at a time.
pub async fn list_links(State(state): State<AppState>, Query(params): Query<ListParams>) -> Response {
    let page_size = match parse_positive(params.amount.as_deref(), state.default_page_size) {
        Some(amount) if amount <= state.max_page_size => amount,
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid amount parameter"),
    };

    let page = match parse_positive(params.page.as_deref(), 1) {
        Some(page) => page,
        None => return error_response(StatusCode::BAD_REQUEST, "Invalid page parameter"),
    };

    match state.storage.list_records(page_size, page) {
        Ok(listing) => Json(LinksResponse {
            links: listing.records.into_iter().map(LinkView::from).collect(),
            pagination: Pagination {
                current_page: page,
                page_size,
                total_count: listing.total_count,
            },
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Failed to list records: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch links")
        }
    }
}

/// Manually set a record to `pending` or `stop`.
pub async fn update_link(
    State(state): State<AppState>,
    payload: Result<Json<UpdateLinkRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(body)) => body,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid request format"),
    };

    let status = match CheckStatus::parse_manual(&request.status) {
        Some(status) => status,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Status must be either 'stop' or 'pending'",
            )
        }
    };

    match state.storage.set_status(request.id, status) {
        Ok(()) => {
            tracing::info!("Record {} set to {}", request.id, status);
            Json(json!({
                "message": "Link status updated successfully",
                "id": request.id,
                "status": status,
            }))
            .into_response()
        }
        Err(e) if e.is_not_found() => error_response(StatusCode::NOT_FOUND, "Record not found"),
        Err(e) => {
            tracing::error!("Failed to update record {}: {}", request.id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update record")
        }
    }
}

/// Delete a record and its details.
pub async fn delete_link(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.storage.delete_record(id) {
        Ok(()) => {
            tracing::info!("Record {} deleted", id);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) if e.is_not_found() => error_response(StatusCode::NOT_FOUND, "Record not found"),
        Err(e) => {
            tracing::error!("Failed to delete record {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete record")
        }
    }
}
