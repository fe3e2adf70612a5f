use crate::domain::archive::ArchivedHorse;
use crate::domain::cascade::DeletionSummary;
use crate::domain::model::{
    ApplicationStatus, FinishPosition, NewRace, OwnerHorse, OwnerSummary, Race, RaceEntry, Trainer,
    TrainerApplication,
};
use crate::domain::races::RaceRegistration;
use crate::domain::relocation::Relocation;
use crate::domain::reports::{
    OwnedHorseRow, RaceResultView, TrackStatsRow, TrainerWinningsRow, WinningTrainerRow,
};
use crate::transport::http::handlers::{admin, guest, health};
use crate::transport::http::types::{ApiResponse, AppState, MoveHorseRequest, RejectRequest};
use axum::routing::{delete, get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        admin::list_owners_handler,
        admin::owner_horses_handler,
        admin::delete_owner_handler,
        admin::delete_horse_handler,
        admin::move_horse_handler,
        admin::add_race_handler,
        admin::pending_applications_handler,
        admin::approve_application_handler,
        admin::reject_application_handler,
        admin::archived_horses_handler,
        guest::horses_by_owner_handler,
        guest::winning_trainers_handler,
        guest::trainer_winnings_handler,
        guest::track_stats_handler
    ),
    components(schemas(
        ApiResponse,
        MoveHorseRequest,
        RejectRequest,
        NewRace,
        RaceEntry,
        FinishPosition,
        Race,
        RaceRegistration,
        RaceResultView,
        DeletionSummary,
        Relocation,
        OwnerSummary,
        OwnerHorse,
        Trainer,
        TrainerApplication,
        ApplicationStatus,
        ArchivedHorse,
        OwnedHorseRow,
        WinningTrainerRow,
        TrainerWinningsRow,
        TrackStatsRow
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/admin/owners", get(admin::list_owners_handler))
        .route("/admin/owners/:owner_id", delete(admin::delete_owner_handler))
        .route(
            "/admin/owners/:owner_id/horses",
            get(admin::owner_horses_handler),
        )
        .route("/admin/horses/:horse_id", delete(admin::delete_horse_handler))
        .route("/admin/horses/:horse_id/move", post(admin::move_horse_handler))
        .route("/admin/races", post(admin::add_race_handler))
        .route(
            "/admin/trainer-applications",
            get(admin::pending_applications_handler),
        )
        .route(
            "/admin/trainer-applications/:app_id/approve",
            post(admin::approve_application_handler),
        )
        .route(
            "/admin/trainer-applications/:app_id/reject",
            post(admin::reject_application_handler),
        )
        .route("/admin/archive/horses", get(admin::archived_horses_handler))
        .route("/guest/horses-by-owner", get(guest::horses_by_owner_handler))
        .route("/guest/winning-trainers", get(guest::winning_trainers_handler))
        .route("/guest/trainer-winnings", get(guest::trainer_winnings_handler))
        .route("/guest/track-stats", get(guest::track_stats_handler))
        .with_state(app_state)
}
