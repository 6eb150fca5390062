use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{referrals::ReferralService, ServiceError};
use crate::models::referrals::{NewReferral, StatusUpdate};
use crate::settings;

#[derive(Clone)]
struct AppState {
    referrals: ReferralService,
    environment: String,
    started_at: Instant,
}

async fn banner() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to Accredian Refer & Earn API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "referrals": "/api/referrals",
            "health": "/health",
        },
        "status": "active",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "uptime": state.started_at.elapsed().as_secs(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn create_referral(
    State(state): State<AppState>,
    Json(new_referral): Json<NewReferral>,
) -> Response {
    match state.referrals.submit(new_referral).await {
        Ok(referral) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "data": referral,
                "message": "Referral created successfully",
            })),
        )
            .into_response(),
        Err(e) => error_response(&state, e),
    }
}

async fn list_referrals(State(state): State<AppState>) -> Response {
    match state.referrals.list().await {
        Ok(referrals) => ok_data(json!(referrals)),
        Err(e) => error_response(&state, e),
    }
}

async fn referral_stats(State(state): State<AppState>) -> Response {
    match state.referrals.stats().await {
        Ok(stats) => ok_data(json!(stats)),
        Err(e) => error_response(&state, e),
    }
}

async fn referrals_by_referrer(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Response {
    match state.referrals.list_by_referrer(&email).await {
        Ok(referrals) => ok_data(json!(referrals)),
        Err(e) => error_response(&state, e),
    }
}

async fn referral_by_id(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.referrals.get_by_id(&id).await {
        Ok(referral) => ok_data(json!(referral)),
        Err(e) => error_response(&state, e),
    }
}

async fn update_referral_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    match state.referrals.update_status(&id, &update.status).await {
        Ok(referral) => ok_data(json!(referral)),
        Err(e) => error_response(&state, e),
    }
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": "The requested resource does not exist",
            "path": uri.path(),
        })),
    )
}

fn ok_data(data: serde_json::Value) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

fn error_response(state: &AppState, error: ServiceError) -> Response {
    let (status, message) = match error {
        ServiceError::Validation(message) => (StatusCode::BAD_REQUEST, message),
        ServiceError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        ServiceError::Repository(message) => {
            log::error!("Repository failure: {message}");
            // Detailed messages stay out of production responses.
            let message = if state.environment == "production" {
                "Internal server error".to_string()
            } else {
                message
            };
            (StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    };

    (
        status,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/api/referrals", post(create_referral).get(list_referrals))
        .route("/api/referrals/stats", get(referral_stats))
        .route("/api/referrals/referrer/{email}", get(referrals_by_referrer))
        .route("/api/referrals/{id}", get(referral_by_id))
        .route("/api/referrals/{id}/status", patch(update_referral_status))
        .fallback(not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(
    referrals: ReferralService,
    server: &settings::Server,
) -> Result<(), anyhow::Error> {
    let state = AppState {
        referrals,
        environment: server.environment.clone(),
        started_at: Instant::now(),
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", server.port)).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
