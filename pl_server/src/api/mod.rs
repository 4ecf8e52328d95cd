//! HTTP API for the poker ledger.
//!
//! # Modules
//!
//! - [`auth`]: bearer token verification
//! - [`middleware`]: authentication middleware for protected endpoints
//! - [`games`]: game lifecycle, join by code, metrics and profiles
//! - [`players`]: roster moderation and self-service
//! - [`errors`]: mapping of domain errors onto status codes
//! - [`request_id`]: request correlation
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pl_server::api::{AppState, auth::TokenVerifier, create_router};
//! use poker_ledger::{GameManager, db::MemoryLedgerStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState {
//!     game_manager: Arc::new(GameManager::new(Arc::new(MemoryLedgerStore::new()))),
//!     token_verifier: Arc::new(TokenVerifier::new("0123456789abcdef0123456789abcdef")),
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod auth;
pub mod errors;
pub mod games;
pub mod middleware;
pub mod players;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use poker_ledger::GameManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use auth::TokenVerifier;
use request_id::RequestId;

/// Application state shared across all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub game_manager: Arc<GameManager>,
    pub token_verifier: Arc<TokenVerifier>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// ```text
/// GET  /health                                    - Health check (public)
/// POST /api/v1/games                              - Create game
/// GET  /api/v1/games/{id}                         - Game and roster
/// GET  /api/v1/games/{id}/metrics                 - Standings and charts
/// POST /api/v1/games/{id}/status                  - Close or reopen session (host)
/// POST /api/v1/games/{id}/end                     - End game (host)
/// POST /api/v1/games/{id}/host                    - Transfer host (host)
/// POST /api/v1/games/{id}/rejoin                  - Ask to rejoin
/// PUT  /api/v1/games/{id}/requested               - Update own requested amounts
/// POST /api/v1/games/{id}/players/{user}/approve  - Approve (host)
/// POST /api/v1/games/{id}/players/{user}/deny     - Deny (host)
/// POST /api/v1/games/{id}/players/{user}/kick     - Kick (host)
/// PUT  /api/v1/games/{id}/players/{user}/cash     - Record cash (host)
/// POST /api/v1/join/{code}                        - Join by code
/// POST /api/v1/profile                            - Ensure own profile
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Every v1 route requires a bearer token
fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/games", post(games::create_game))
        .route("/games/{game_id}", get(games::get_game))
        .route("/games/{game_id}/metrics", get(games::get_metrics))
        .route("/games/{game_id}/status", post(games::set_status))
        .route("/games/{game_id}/end", post(games::end_game))
        .route("/games/{game_id}/host", post(games::transfer_host))
        .route("/games/{game_id}/rejoin", post(players::request_rejoin))
        .route("/games/{game_id}/requested", put(players::update_requested))
        .route(
            "/games/{game_id}/players/{user_id}/approve",
            post(players::approve_player),
        )
        .route(
            "/games/{game_id}/players/{user_id}/deny",
            post(players::deny_player),
        )
        .route(
            "/games/{game_id}/players/{user_id}/kick",
            post(players::kick_player),
        )
        .route(
            "/games/{game_id}/players/{user_id}/cash",
            put(players::set_cash),
        )
        .route("/join/{short_code}", post(games::join_game))
        .route("/profile", post(games::ensure_profile))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the ledger store answers, `503 Service Unavailable`
/// otherwise.
async fn health_check(State(state): State<AppState>, request_id: RequestId) -> impl IntoResponse {
    let store_healthy = state.game_manager.store().health_check().await.is_ok();

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "request_id": request_id.as_str(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
