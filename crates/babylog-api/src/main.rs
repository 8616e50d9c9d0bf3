// Babylog API server
// Decision: In-memory store when DATABASE_URL is unset, Postgres otherwise
// Decision: The interpreter driver is built once at startup from the DriverRegistry

mod activities;
mod common;
mod config;
mod services;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use babylog_core::memory::InMemoryActivityStore;
use babylog_core::{
    ActivityInterpreter, ActivityPage, ActivityRecord, ActivityStore, Clock, DailySummary,
    DriverRegistry, OffsetClock, SystemClock,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::common::{ApiError, ErrorResponse};
use crate::config::AppConfig;
use crate::services::ActivityService;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    provider: String,
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.clone(),
        storage: state.storage,
    })
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    provider: String,
    storage: &'static str,
}

#[derive(Serialize)]
struct StorageCheckResponse {
    status: &'static str,
}

/// GET /v1/storage/check - Store connectivity check
async fn storage_check(
    State(state): State<activities::AppState>,
) -> Result<Json<StorageCheckResponse>, ApiError> {
    state.service.check().await.map_err(|e| {
        tracing::error!("Storage check failed: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(StorageCheckResponse { status: "ok" }))
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        activities::list_activities,
        activities::create_activity,
        activities::get_activity,
        activities::replace_activity,
        activities::delete_activity,
        activities::parse_activities,
        activities::parse_update,
        activities::log_activities,
        activities::amend_activity,
        activities::get_summary,
    ),
    components(
        schemas(
            ActivityRecord, ActivityPage, DailySummary, ErrorResponse,
            activities::ParseRequest,
            activities::ActivitiesResponse,
            activities::ParseUpdateRequest,
            activities::ActivityResponse,
            activities::LogRequest,
            activities::LogResponse,
            activities::AmendRequest,
            activities::CreateActivityResponse,
        )
    ),
    tags(
        (name = "activities", description = "Activity log endpoints"),
        (name = "interpretation", description = "Free-text interpretation endpoints")
    ),
    info(
        title = "Babylog API",
        version = "0.1.0",
        description = "API for logging baby activities from free text",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "babylog_api=debug,babylog_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("babylog-api starting...");

    let config = AppConfig::from_env().context("Invalid configuration")?;
    tracing::debug!(config = ?config, "Configuration loaded");

    // Select the store
    let (store, storage_kind): (Arc<dyn ActivityStore>, &'static str) =
        match &config.database_url {
            Some(url) => {
                let store = babylog_storage::create_db_activity_store(url)
                    .await
                    .context("Failed to initialize Postgres store")?;
                (Arc::new(store), "postgres")
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store (data is not persisted)");
                (Arc::new(InMemoryActivityStore::new()), "memory")
            }
        };

    // Create the interpreter driver
    let mut registry = DriverRegistry::new();
    babylog_openai::register_driver(&mut registry);
    babylog_gemini::register_driver(&mut registry);
    let driver = registry
        .create(&config.provider_config())
        .with_context(|| format!("Failed to create {} driver", config.provider))?;
    tracing::info!(
        provider = %config.provider,
        model = %config.model,
        note_fallback = config.note_fallback,
        "Interpreter configured"
    );

    let clock: Arc<dyn Clock> = match config.utc_offset {
        Some(offset) => {
            tracing::info!(offset = %offset, "Using configured UTC offset");
            Arc::new(OffsetClock::new(offset))
        }
        None => Arc::new(SystemClock),
    };

    let interpreter = ActivityInterpreter::new(Arc::from(driver), config.interpreter_config())
        .with_clock(clock);
    let service = ActivityService::new(store, Arc::new(interpreter))
        .with_note_fallback(config.note_fallback);
    let activities_state = activities::AppState::new(service);

    let health_state = HealthState {
        provider: config.provider.to_string(),
        storage: storage_kind,
    };

    // Example: API_PREFIX="/api" results in routes like /api/v1/activities
    if !config.api_prefix.is_empty() {
        tracing::info!(prefix = %config.api_prefix, "API prefix configured");
    }

    // Only needed when the UI is served from a different origin than the API
    let cors_origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    // Build API routes
    let api_routes = Router::new()
        .route(
            "/v1/storage/check",
            get(storage_check).with_state(activities_state.clone()),
        )
        .merge(activities::routes(activities_state));

    // Health is never prefixed
    let app = Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(build_router_with_prefix(api_routes, &config.api_prefix));

    // Add Swagger UI
    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build router with optional API prefix (extracted for testing)
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
