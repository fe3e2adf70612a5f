// src/bin/api_server.rs

use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use horse_racing_admin::infra::{config, logging, store};
use horse_racing_admin::transport;
use horse_racing_admin::RacingService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging()?;

    // --- Store + service ---
    let store = store::open_store().await?;
    let attempts = config::id_allocation_attempts()?;
    let service = RacingService::with_allocation_attempts(store, attempts);
    tracing::info!(id_allocation_attempts = attempts, "racing service initialized");

    let app_state = transport::http::AppState {
        service: Arc::new(service),
    };

    // --- API server ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);

    let bind_addr = config::api_bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "API server listening; Swagger UI at /swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
            }
        })
        .await?;

    tracing::info!("graceful shutdown complete");
    Ok(())
}
