//! Roster handlers: host moderation and players' self-service.

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use poker_ledger::game::{Cents, GameId, RosterEntry, UserId};
use serde::{Deserialize, Serialize};

use super::{AppState, auth::AuthenticatedUser, errors::ApiError};

#[derive(Debug, Deserialize)]
pub struct SetCashRequest {
    pub cash_in: Cents,
    pub cash_out: Cents,
}

#[derive(Debug, Deserialize)]
pub struct RequestedAmountsRequest {
    pub requested_cash_in: Cents,
    pub requested_cash_out: Cents,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RejoinResponse {
    /// False when the caller was not denied, so nothing moved
    pub changed: bool,
}

/// Kick an approved player; their history stays
pub async fn kick_player(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((game_id, target)): Path<(GameId, UserId)>,
) -> Result<StatusCode, ApiError> {
    state
        .game_manager
        .kick_player(Some(user.user_id), game_id, target)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve_player(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((game_id, target)): Path<(GameId, UserId)>,
) -> Result<Json<RosterEntry>, ApiError> {
    let entry = state
        .game_manager
        .approve_player(Some(user.user_id), game_id, target)
        .await?;
    Ok(Json(entry))
}

pub async fn deny_player(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((game_id, target)): Path<(GameId, UserId)>,
) -> Result<Json<RosterEntry>, ApiError> {
    let entry = state
        .game_manager
        .deny_player(Some(user.user_id), game_id, target)
        .await?;
    Ok(Json(entry))
}

/// Record a player's actual cash-in and cash-out, in cents
pub async fn set_cash(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((game_id, target)): Path<(GameId, UserId)>,
    Json(payload): Json<SetCashRequest>,
) -> Result<Json<RosterEntry>, ApiError> {
    let entry = state
        .game_manager
        .set_player_cash(
            Some(user.user_id),
            game_id,
            target,
            payload.cash_in,
            payload.cash_out,
        )
        .await?;
    Ok(Json(entry))
}

/// Ask to be let back in after a kick or denial
pub async fn request_rejoin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(game_id): Path<GameId>,
) -> Result<Json<RejoinResponse>, ApiError> {
    let changed = state
        .game_manager
        .request_rejoin(Some(user.user_id), game_id)
        .await?;
    Ok(Json(RejoinResponse { changed }))
}

/// Update the caller's own requested amounts
pub async fn update_requested(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(game_id): Path<GameId>,
    Json(payload): Json<RequestedAmountsRequest>,
) -> Result<Json<RosterEntry>, ApiError> {
    let entry = state
        .game_manager
        .update_requested_amounts(
            Some(user.user_id),
            game_id,
            payload.requested_cash_in,
            payload.requested_cash_out,
        )
        .await?;
    Ok(Json(entry))
}
