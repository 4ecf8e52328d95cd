//! Game, roster and snapshot data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::GameError;

/// User ID type (issued by the external auth provider)
pub type UserId = Uuid;

/// Game ID type
pub type GameId = Uuid;

/// Money amount in cents
pub type Cents = i64;

/// Largest amount accepted for a single buy-in or cash-out ($10M)
pub const MAX_AMOUNT_CENTS: Cents = 1_000_000_000;

/// Game lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Session in progress, accepting join requests
    Active,
    /// Session closed and snapshotted, may be reopened
    Closed,
    /// Terminal
    Ended,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Closed => "closed",
            GameStatus::Ended => "ended",
        }
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GameStatus {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GameStatus::Active),
            "closed" => Ok(GameStatus::Closed),
            "ended" => Ok(GameStatus::Ended),
            other => Err(GameError::Store(format!("unknown game status '{other}'"))),
        }
    }
}

/// Target of a host-driven session transition.
///
/// `Ended` is deliberately absent: ending a game goes through
/// [`GameManager::close_game`](super::GameManager::close_game).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Closed,
}

impl From<SessionStatus> for GameStatus {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Active => GameStatus::Active,
            SessionStatus::Closed => GameStatus::Closed,
        }
    }
}

/// Roster membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Pending,
    Approved,
    Denied,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Pending => "pending",
            PlayerStatus::Approved => "approved",
            PlayerStatus::Denied => "denied",
        }
    }
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlayerStatus {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PlayerStatus::Pending),
            "approved" => Ok(PlayerStatus::Approved),
            "denied" => Ok(PlayerStatus::Denied),
            other => Err(GameError::Store(format!("unknown player status '{other}'"))),
        }
    }
}

/// Game model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub short_code: String,
    pub host_id: UserId,
    pub status: GameStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Roster entry model (one per game and user)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub game_id: GameId,
    pub user_id: UserId,
    pub status: PlayerStatus,
    pub requested_cash_in: Cents,
    pub requested_cash_out: Cents,
    pub cash_in: Option<Cents>,
    pub cash_out: Option<Cents>,
    pub created_at: DateTime<Utc>,
}

impl RosterEntry {
    /// New pending join request
    pub fn pending(game_id: GameId, user_id: UserId, requested_cash_in: Cents) -> Self {
        Self {
            game_id,
            user_id,
            status: PlayerStatus::Pending,
            requested_cash_in,
            requested_cash_out: 0,
            cash_in: None,
            cash_out: None,
            created_at: Utc::now(),
        }
    }

    /// Actual cash-in, missing treated as zero
    pub fn cash_in(&self) -> Cents {
        self.cash_in.unwrap_or(0)
    }

    /// Actual cash-out, missing treated as zero
    pub fn cash_out(&self) -> Cents {
        self.cash_out.unwrap_or(0)
    }

    /// Live net for the in-progress session
    pub fn session_net(&self) -> Cents {
        self.cash_out().saturating_sub(self.cash_in())
    }
}

/// Immutable per-player result recorded when a session closes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: i64,
    pub game_id: GameId,
    pub user_id: UserId,
    pub cash_in: Cents,
    pub cash_out: Cents,
    pub session_net: Cents,
    pub created_at: DateTime<Utc>,
}

/// Public profile used to label players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub venmo_handle: Option<String>,
    pub email: Option<String>,
}

impl Profile {
    /// Profile seeded from an email address, named after its local part
    pub fn from_email(user_id: UserId, email: Option<String>) -> Self {
        let display_name = email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Self {
            user_id,
            display_name,
            venmo_handle: None,
            email,
        }
    }
}

/// Outcome of a session transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StatusChange {
    /// Game moved to closed and snapshots were written
    Closed { snapshots: usize },
    /// Game moved from closed back to active
    Reopened,
    /// Game was already in the requested status
    Unchanged,
}

/// A game together with its roster, as seen by a participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameView {
    pub game: Game,
    pub players: Vec<RosterEntry>,
    pub is_host: bool,
}

/// Normalize a user-typed join code for lookup
pub fn normalize_short_code(code: &str) -> String {
    code.trim().to_lowercase()
}
