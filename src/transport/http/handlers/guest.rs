//! Read-only reports. Open to guests and admins alike.

use crate::transport::http::types::{domain_response, ApiResponse, AppState, OwnerSearchQuery};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;

#[utoipa::path(
    get,
    path = "/guest/horses-by-owner",
    params(("lname" = String, Query, description = "Fragment of the owner's last name")),
    responses(
        (status = 200, description = "Horses with their stable's trainers", body = ApiResponse),
        (status = 400, description = "Blank search term", body = ApiResponse)
    )
)]
pub async fn horses_by_owner_handler(
    State(state): State<AppState>,
    Query(query): Query<OwnerSearchQuery>,
) -> Response {
    domain_response(StatusCode::OK, state.service.horses_by_owner(&query.lname).await)
}

#[utoipa::path(
    get,
    path = "/guest/winning-trainers",
    responses((status = 200, description = "Trainers of first-place horses, newest race first", body = ApiResponse))
)]
pub async fn winning_trainers_handler(State(state): State<AppState>) -> Response {
    domain_response(StatusCode::OK, state.service.winning_trainers().await)
}

#[utoipa::path(
    get,
    path = "/guest/trainer-winnings",
    responses((status = 200, description = "Total prize money per trainer", body = ApiResponse))
)]
pub async fn trainer_winnings_handler(State(state): State<AppState>) -> Response {
    domain_response(StatusCode::OK, state.service.trainer_winnings().await)
}

#[utoipa::path(
    get,
    path = "/guest/track-stats",
    responses((status = 200, description = "Race and participation counts per track", body = ApiResponse))
)]
pub async fn track_stats_handler(State(state): State<AppState>) -> Response {
    domain_response(StatusCode::OK, state.service.track_stats().await)
}
