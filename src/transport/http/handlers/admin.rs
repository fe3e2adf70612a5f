use crate::domain::model::NewRace;
use crate::transport::http::handlers::common::{json_body, request_context};
use crate::transport::http::types::{
    domain_response, ApiResponse, AppState, MoveHorseRequest, RejectRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;

#[utoipa::path(
    get,
    path = "/admin/owners",
    params(("x-role" = String, Header, description = "Must be `admin`")),
    responses(
        (status = 200, description = "Owners with their horse counts", body = ApiResponse),
        (status = 403, description = "Caller is not an admin", body = ApiResponse)
    )
)]
pub async fn list_owners_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match request_context(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    domain_response(StatusCode::OK, state.service.owners_overview(&ctx).await)
}

#[utoipa::path(
    get,
    path = "/admin/owners/{owner_id}/horses",
    params(
        ("owner_id" = String, Path, description = "Owner whose horses to list"),
        ("x-role" = String, Header, description = "Must be `admin`")
    ),
    responses(
        (status = 200, description = "Owner's horses with their owner counts", body = ApiResponse),
        (status = 403, description = "Caller is not an admin", body = ApiResponse),
        (status = 404, description = "Owner not found", body = ApiResponse)
    )
)]
pub async fn owner_horses_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(owner_id): Path<String>,
) -> Response {
    let ctx = match request_context(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    domain_response(StatusCode::OK, state.service.owner_horses(&ctx, &owner_id).await)
}

#[utoipa::path(
    delete,
    path = "/admin/owners/{owner_id}",
    params(
        ("owner_id" = String, Path, description = "Owner to delete"),
        ("x-role" = String, Header, description = "Must be `admin`")
    ),
    responses(
        (status = 200, description = "Owner deleted; horses left without an owner were removed and archived", body = ApiResponse),
        (status = 403, description = "Caller is not an admin", body = ApiResponse),
        (status = 404, description = "Owner not found", body = ApiResponse),
        (status = 503, description = "Store unavailable, nothing was changed", body = ApiResponse)
    )
)]
pub async fn delete_owner_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(owner_id): Path<String>,
) -> Response {
    let ctx = match request_context(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    domain_response(StatusCode::OK, state.service.delete_owner(&ctx, &owner_id).await)
}

#[utoipa::path(
    delete,
    path = "/admin/horses/{horse_id}",
    params(
        ("horse_id" = String, Path, description = "Horse to delete"),
        ("x-role" = String, Header, description = "Must be `admin`")
    ),
    responses(
        (status = 200, description = "Horse deleted and archived", body = ApiResponse),
        (status = 403, description = "Caller is not an admin", body = ApiResponse),
        (status = 404, description = "Horse not found", body = ApiResponse)
    )
)]
pub async fn delete_horse_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(horse_id): Path<String>,
) -> Response {
    let ctx = match request_context(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let result = state
        .service
        .delete_horse(&ctx, &horse_id)
        .await
        .map(|deleted_results| {
            serde_json::json!({ "horse_id": horse_id, "deleted_results": deleted_results })
        });
    domain_response(StatusCode::OK, result)
}

#[utoipa::path(
    post,
    path = "/admin/horses/{horse_id}/move",
    params(
        ("horse_id" = String, Path, description = "Horse to move"),
        ("x-role" = String, Header, description = "Must be `admin`")
    ),
    request_body = MoveHorseRequest,
    responses(
        (status = 200, description = "Horse moved", body = ApiResponse),
        (status = 400, description = "Horse is already in that stable", body = ApiResponse),
        (status = 404, description = "Horse or stable not found", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse)
    )
)]
pub async fn move_horse_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(horse_id): Path<String>,
    body: Result<Json<MoveHorseRequest>, JsonRejection>,
) -> Response {
    let ctx = match request_context(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let request = match json_body(body, "{\"new_stable_id\": \"...\"}") {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    domain_response(
        StatusCode::OK,
        state
            .service
            .move_horse(&ctx, &horse_id, &request.new_stable_id)
            .await,
    )
}

#[utoipa::path(
    post,
    path = "/admin/races",
    params(("x-role" = String, Header, description = "Must be `admin`")),
    request_body = NewRace,
    responses(
        (status = 201, description = "Race registered with its results", body = ApiResponse),
        (status = 400, description = "Invalid race", body = ApiResponse),
        (status = 404, description = "Unknown track or horse", body = ApiResponse),
        (status = 409, description = "Race id allocation kept conflicting; retry", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse)
    )
)]
pub async fn add_race_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewRace>, JsonRejection>,
) -> Response {
    let ctx = match request_context(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let new_race = match json_body(body, "a race with track_name, race_date, race_time and entries")
    {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    domain_response(StatusCode::CREATED, state.service.add_race(&ctx, &new_race).await)
}

#[utoipa::path(
    get,
    path = "/admin/trainer-applications",
    params(("x-role" = String, Header, description = "Must be `admin`")),
    responses(
        (status = 200, description = "Pending applications, newest first", body = ApiResponse),
        (status = 403, description = "Caller is not an admin", body = ApiResponse)
    )
)]
pub async fn pending_applications_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let ctx = match request_context(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    domain_response(StatusCode::OK, state.service.pending_applications(&ctx).await)
}

#[utoipa::path(
    post,
    path = "/admin/trainer-applications/{app_id}/approve",
    params(
        ("app_id" = i64, Path, description = "Application to approve"),
        ("x-role" = String, Header, description = "Must be `admin`"),
        ("x-actor" = Option<String>, Header, description = "Recorded as the deciding admin")
    ),
    responses(
        (status = 200, description = "Trainer created", body = ApiResponse),
        (status = 404, description = "No pending application with that id", body = ApiResponse),
        (status = 409, description = "Trainer id allocation kept conflicting; retry", body = ApiResponse)
    )
)]
pub async fn approve_application_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(app_id): Path<i64>,
) -> Response {
    let ctx = match request_context(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    domain_response(
        StatusCode::OK,
        state.service.approve_application(&ctx, app_id).await,
    )
}

#[utoipa::path(
    post,
    path = "/admin/trainer-applications/{app_id}/reject",
    params(
        ("app_id" = i64, Path, description = "Application to reject"),
        ("x-role" = String, Header, description = "Must be `admin`"),
        ("x-actor" = Option<String>, Header, description = "Recorded as the deciding admin")
    ),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Application rejected", body = ApiResponse),
        (status = 404, description = "No pending application with that id", body = ApiResponse)
    )
)]
pub async fn reject_application_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(app_id): Path<i64>,
    body: Option<Json<RejectRequest>>,
) -> Response {
    let ctx = match request_context(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let result = state
        .service
        .reject_application(&ctx, app_id, request.reason.as_deref())
        .await
        .map(|()| serde_json::json!({ "app_id": app_id, "status": "rejected" }));
    domain_response(StatusCode::OK, result)
}

#[utoipa::path(
    get,
    path = "/admin/archive/horses",
    params(("x-role" = String, Header, description = "Must be `admin`")),
    responses(
        (status = 200, description = "Archived horse snapshots, oldest first", body = ApiResponse),
        (status = 403, description = "Caller is not an admin", body = ApiResponse)
    )
)]
pub async fn archived_horses_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let ctx = match request_context(&headers) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    domain_response(StatusCode::OK, state.service.archived_horses(&ctx).await)
}
