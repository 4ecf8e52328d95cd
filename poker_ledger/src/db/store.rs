//! Ledger store trait for dependency injection.
//!
//! Implementations are the sole arbiter of consistency. Every conditional
//! write here is a compare-and-swap: the boolean results report whether a row
//! actually changed, and callers decide whether that is an error.

use async_trait::async_trait;

use crate::game::{
    Cents, Game, GameId, GameResult, PlayerStatus, Profile, RosterEntry, SessionSnapshot, UserId,
};

/// Trait for game, roster, snapshot and profile persistence
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Check the backing store is reachable
    async fn health_check(&self) -> GameResult<()>;

    /// Insert a game together with its host as an approved roster entry.
    ///
    /// Returns `false` without writing anything if the short code is taken.
    async fn insert_game(&self, game: &Game) -> GameResult<bool>;

    /// Find game by ID
    async fn find_game(&self, game_id: GameId) -> GameResult<Option<Game>>;

    /// Find game by normalized short code
    async fn find_game_by_code(&self, short_code: &str) -> GameResult<Option<Game>>;

    /// Rewrite the game's host
    async fn update_host(&self, game_id: GameId, host_id: UserId) -> GameResult<()>;

    /// Move the game to `ended`, returning whether the status changed
    async fn end_game(&self, game_id: GameId) -> GameResult<bool>;

    /// Move the game from `closed` back to `active`
    async fn reopen_game(&self, game_id: GameId) -> GameResult<bool>;

    /// Atomically flip `active` to `closed` and snapshot every approved entry.
    ///
    /// Returns `None` when the game was not active (nothing written), or the
    /// number of snapshots appended. If the snapshot insert fails the status
    /// flip must not be visible.
    async fn close_session(&self, game_id: GameId) -> GameResult<Option<usize>>;

    /// Find a roster entry
    async fn find_player(&self, game_id: GameId, user_id: UserId)
    -> GameResult<Option<RosterEntry>>;

    /// All roster entries of a game in join order
    async fn list_players(&self, game_id: GameId) -> GameResult<Vec<RosterEntry>>;

    /// Insert a roster entry, returning `false` if one already exists for the pair
    async fn insert_player(&self, entry: &RosterEntry) -> GameResult<bool>;

    /// Unconditionally set an entry's status
    async fn set_player_status(
        &self,
        game_id: GameId,
        user_id: UserId,
        status: PlayerStatus,
    ) -> GameResult<bool>;

    /// Set an entry's status only if it currently equals `from`
    async fn transition_player_status(
        &self,
        game_id: GameId,
        user_id: UserId,
        from: PlayerStatus,
        to: PlayerStatus,
    ) -> GameResult<bool>;

    /// Approve a pending entry, seeding `cash_in` from the requested buy-in
    ///
    /// Returns `false` when the entry is missing or no longer pending.
    async fn approve_player(&self, game_id: GameId, user_id: UserId) -> GameResult<bool>;

    /// Update the player's requested amounts
    async fn update_requested_amounts(
        &self,
        game_id: GameId,
        user_id: UserId,
        requested_cash_in: Cents,
        requested_cash_out: Cents,
    ) -> GameResult<bool>;

    /// Update the host-maintained actual amounts
    async fn update_cash(
        &self,
        game_id: GameId,
        user_id: UserId,
        cash_in: Cents,
        cash_out: Cents,
    ) -> GameResult<bool>;

    /// All snapshots of a game, ordered by close time then insertion
    async fn list_snapshots(&self, game_id: GameId) -> GameResult<Vec<SessionSnapshot>>;

    /// Find a profile
    async fn find_profile(&self, user_id: UserId) -> GameResult<Option<Profile>>;

    /// Profiles for the given users (missing users are skipped)
    async fn find_profiles(&self, user_ids: &[UserId]) -> GameResult<Vec<Profile>>;

    /// Insert a profile unless one exists
    async fn insert_profile(&self, profile: &Profile) -> GameResult<()>;
}
