//! Game lifecycle handlers.
//!
//! Everything here is host-driven except reading a game, its metrics, and
//! joining by code.

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use poker_ledger::game::{
    Cents, Game, GameError, GameId, GameView, PlayerStatus, Profile, SessionStatus, StatusChange,
    UserId, normalize_short_code,
};
use poker_ledger::standings::{GameMetrics, y_domain};
use serde::{Deserialize, Serialize};

use super::{AppState, auth::AuthenticatedUser, errors::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct CreateGameRequest {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: SessionStatus,
}

#[derive(Debug, Deserialize)]
pub struct TransferHostRequest {
    pub new_host: UserId,
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub requested_cash_in: Cents,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub game_id: GameId,
    pub status: PlayerStatus,
    /// Caller already had an entry; the client should open the game instead
    pub already_member: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub metrics: GameMetrics,
    /// Y-axis bounds in whole dollars
    pub session_domain: (i64, i64),
    pub cumulative_domain: (i64, i64),
}

/// Create a game hosted by the caller
///
/// # Response
///
/// `201 Created` with the new game, including its join code.
pub async fn create_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Option<Json<CreateGameRequest>>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let game = state
        .game_manager
        .create_game(Some(user.user_id), payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Game and roster, visible to participants only
pub async fn get_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(game_id): Path<GameId>,
) -> Result<Json<GameView>, ApiError> {
    let view = state
        .game_manager
        .game_view(Some(user.user_id), game_id)
        .await?;
    Ok(Json(view))
}

/// Current-session and all-time standings for the caller
pub async fn get_metrics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(game_id): Path<GameId>,
) -> Result<Json<MetricsResponse>, ApiError> {
    let metrics = state
        .game_manager
        .game_metrics(Some(user.user_id), game_id)
        .await?;

    let session: Vec<Cents> = metrics.session_chart.iter().map(|p| p.net).collect();
    let cumulative: Vec<Cents> = metrics.cumulative_chart.iter().map(|p| p.net).collect();

    Ok(Json(MetricsResponse {
        session_domain: y_domain(&session),
        cumulative_domain: y_domain(&cumulative),
        metrics,
    }))
}

/// Close or reopen the current session
///
/// # Request Body
///
/// ```json
/// { "status": "closed" }
/// ```
pub async fn set_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(game_id): Path<GameId>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<StatusChange>, ApiError> {
    let change = state
        .game_manager
        .set_game_status(Some(user.user_id), game_id, payload.status)
        .await?;
    Ok(Json(change))
}

/// End the game for good
pub async fn end_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(game_id): Path<GameId>,
) -> Result<StatusCode, ApiError> {
    state
        .game_manager
        .close_game(Some(user.user_id), game_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Hand hosting to another approved player
pub async fn transfer_host(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(game_id): Path<GameId>,
    Json(payload): Json<TransferHostRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .game_manager
        .transfer_host(Some(user.user_id), game_id, payload.new_host)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ask to join a game by its join code
///
/// Callers already on the roster get `200 OK` with `already_member` set so
/// the client can send them to the game.
pub async fn join_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(short_code): Path<String>,
    payload: Option<Json<JoinRequest>>,
) -> Result<(StatusCode, Json<JoinResponse>), ApiError> {
    let Json(payload) = payload.unwrap_or_default();

    match state
        .game_manager
        .request_join(Some(user.user_id), &short_code, payload.requested_cash_in)
        .await
    {
        Ok(entry) => Ok((
            StatusCode::CREATED,
            Json(JoinResponse {
                game_id: entry.game_id,
                status: entry.status,
                already_member: false,
            }),
        )),
        Err(GameError::AlreadyMember) => {
            let store = state.game_manager.store();
            let game = store
                .find_game_by_code(&normalize_short_code(&short_code))
                .await?
                .ok_or(GameError::NotFound("game"))?;
            let entry = store
                .find_player(game.id, user.user_id)
                .await?
                .ok_or(GameError::NotFound("player"))?;

            Ok((
                StatusCode::OK,
                Json(JoinResponse {
                    game_id: game.id,
                    status: entry.status,
                    already_member: true,
                }),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

/// Fetch the caller's profile, creating it from the token's email if needed
pub async fn ensure_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state
        .game_manager
        .ensure_profile(Some(user.user_id), user.email)
        .await?;
    Ok(Json(profile))
}
