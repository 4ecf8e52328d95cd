//! Mapping of domain errors onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use poker_ledger::GameError;
use serde::{Deserialize, Serialize};

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable machine-readable kind, e.g. `already_member`
    pub code: String,
}

/// A [`GameError`] on its way out of a handler
#[derive(Debug)]
pub struct ApiError(pub GameError);

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GameError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GameError::Unauthorized | GameError::NotAPlayer => StatusCode::FORBIDDEN,
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::InvalidTarget(_) | GameError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            GameError::AlreadyMember | GameError::GameNotJoinable | GameError::GameEnded => {
                StatusCode::CONFLICT
            }
            GameError::Database(_) | GameError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match &self.0 {
            GameError::Database(_) | GameError::Store(_) => "store_failure",
            GameError::Unauthenticated => "unauthenticated",
            GameError::Unauthorized => "unauthorized",
            GameError::NotFound(_) => "not_found",
            GameError::InvalidTarget(_) => "invalid_target",
            GameError::AlreadyMember => "already_member",
            GameError::GameNotJoinable => "game_not_joinable",
            GameError::NotAPlayer => "not_a_player",
            GameError::GameEnded => "game_ended",
            GameError::InvalidAmount(_) => "invalid_amount",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_store_failure() {
            tracing::error!(error = %self.0, "Store failure while handling request");
        }

        let body = ErrorResponse {
            error: self.0.client_message(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GameError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (GameError::Unauthorized, StatusCode::FORBIDDEN),
            (GameError::NotFound("game"), StatusCode::NOT_FOUND),
            (
                GameError::InvalidTarget("cannot kick yourself".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (GameError::InvalidAmount(-1), StatusCode::BAD_REQUEST),
            (GameError::AlreadyMember, StatusCode::CONFLICT),
            (GameError::GameEnded, StatusCode::CONFLICT),
            (
                GameError::Store("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }
}
