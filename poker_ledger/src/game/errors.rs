//! Game error types.

use thiserror::Error;

use super::models::Cents;

/// Game, roster and standings errors
#[derive(Debug, Error)]
pub enum GameError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Persistence failure reported by a store implementation
    #[error("Store failure: {0}")]
    Store(String),

    /// No caller identity
    #[error("Not authenticated")]
    Unauthenticated,

    /// Caller lacks the required role
    #[error("Not the host")]
    Unauthorized,

    /// Referenced game or roster entry is absent
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Self-targeting or wrong-status target
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Duplicate join request
    #[error("Already a member of this game")]
    AlreadyMember,

    /// Join attempted on a game that is not active
    #[error("Game is not accepting join requests")]
    GameNotJoinable,

    /// Caller has no eligible roster status
    #[error("Not a player in this game")]
    NotAPlayer,

    /// Transition attempted on an ended game
    #[error("Game has ended")]
    GameEnded,

    /// Negative or out-of-range money amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(Cents),
}

impl GameError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database errors are sanitized so SQL details never reach callers.
    pub fn client_message(&self) -> String {
        match self {
            GameError::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the error came from the persistence layer
    pub fn is_store_failure(&self) -> bool {
        matches!(self, GameError::Database(_) | GameError::Store(_))
    }
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
