//! In-memory implementation of [`LedgerStore`].
//!
//! All state sits behind one mutex, so every conditional write is atomic in
//! the same way the PostgreSQL statements are. Used by tests and by the
//! server's `--memory` mode.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::store::LedgerStore;
use crate::game::{
    Cents, Game, GameError, GameId, GameResult, GameStatus, PlayerStatus, Profile, RosterEntry,
    SessionSnapshot, UserId,
};

#[derive(Default)]
struct MemoryState {
    games: HashMap<GameId, Game>,
    /// Kept in insertion order
    players: Vec<RosterEntry>,
    snapshots: Vec<SessionSnapshot>,
    profiles: HashMap<UserId, Profile>,
    next_snapshot_id: i64,
}

impl MemoryState {
    fn player_mut(&mut self, game_id: GameId, user_id: UserId) -> Option<&mut RosterEntry> {
        self.players
            .iter_mut()
            .find(|p| p.game_id == game_id && p.user_id == user_id)
    }
}

/// Mutex-guarded store holding everything in process memory
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Mutex<MemoryState>,
    fail_snapshot_insert: AtomicBool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next session close fail while writing snapshots.
    ///
    /// Lets callers observe that a failed close leaves the game untouched.
    pub fn fail_next_snapshot_insert(&self) {
        self.fail_snapshot_insert.store(true, Ordering::SeqCst);
    }

    fn state(&self) -> GameResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| GameError::Store("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn health_check(&self) -> GameResult<()> {
        self.state().map(|_| ())
    }

    async fn insert_game(&self, game: &Game) -> GameResult<bool> {
        let mut state = self.state()?;

        let code_taken = state
            .games
            .values()
            .any(|g| g.short_code.eq_ignore_ascii_case(&game.short_code));
        if code_taken || state.games.contains_key(&game.id) {
            return Ok(false);
        }

        state.games.insert(game.id, game.clone());
        state.players.push(RosterEntry {
            status: PlayerStatus::Approved,
            ..RosterEntry::pending(game.id, game.host_id, 0)
        });

        Ok(true)
    }

    async fn find_game(&self, game_id: GameId) -> GameResult<Option<Game>> {
        Ok(self.state()?.games.get(&game_id).cloned())
    }

    async fn find_game_by_code(&self, short_code: &str) -> GameResult<Option<Game>> {
        Ok(self
            .state()?
            .games
            .values()
            .find(|g| g.short_code.eq_ignore_ascii_case(short_code))
            .cloned())
    }

    async fn update_host(&self, game_id: GameId, host_id: UserId) -> GameResult<()> {
        if let Some(game) = self.state()?.games.get_mut(&game_id) {
            game.host_id = host_id;
        }
        Ok(())
    }

    async fn end_game(&self, game_id: GameId) -> GameResult<bool> {
        let mut state = self.state()?;
        match state.games.get_mut(&game_id) {
            Some(game) if game.status != GameStatus::Ended => {
                game.status = GameStatus::Ended;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reopen_game(&self, game_id: GameId) -> GameResult<bool> {
        let mut state = self.state()?;
        match state.games.get_mut(&game_id) {
            Some(game) if game.status == GameStatus::Closed => {
                game.status = GameStatus::Active;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn close_session(&self, game_id: GameId) -> GameResult<Option<usize>> {
        let mut state = self.state()?;

        let is_active = state
            .games
            .get(&game_id)
            .is_some_and(|g| g.status == GameStatus::Active);
        if !is_active {
            return Ok(None);
        }

        // Nothing has been written yet, so failing here leaves the game active
        if self.fail_snapshot_insert.swap(false, Ordering::SeqCst) {
            return Err(GameError::Store("snapshot insert failed".to_string()));
        }

        let closed_at = Utc::now();
        let approved: Vec<(UserId, Cents, Cents)> = state
            .players
            .iter()
            .filter(|p| p.game_id == game_id && p.status == PlayerStatus::Approved)
            .map(|p| (p.user_id, p.cash_in(), p.cash_out()))
            .collect();

        for (user_id, cash_in, cash_out) in &approved {
            state.next_snapshot_id += 1;
            let id = state.next_snapshot_id;
            state.snapshots.push(SessionSnapshot {
                id,
                game_id,
                user_id: *user_id,
                cash_in: *cash_in,
                cash_out: *cash_out,
                session_net: cash_out - cash_in,
                created_at: closed_at,
            });
        }

        if let Some(game) = state.games.get_mut(&game_id) {
            game.status = GameStatus::Closed;
        }

        Ok(Some(approved.len()))
    }

    async fn find_player(
        &self,
        game_id: GameId,
        user_id: UserId,
    ) -> GameResult<Option<RosterEntry>> {
        Ok(self
            .state()?
            .players
            .iter()
            .find(|p| p.game_id == game_id && p.user_id == user_id)
            .cloned())
    }

    async fn list_players(&self, game_id: GameId) -> GameResult<Vec<RosterEntry>> {
        Ok(self
            .state()?
            .players
            .iter()
            .filter(|p| p.game_id == game_id)
            .cloned()
            .collect())
    }

    async fn insert_player(&self, entry: &RosterEntry) -> GameResult<bool> {
        let mut state = self.state()?;
        if state.player_mut(entry.game_id, entry.user_id).is_some() {
            return Ok(false);
        }
        state.players.push(entry.clone());
        Ok(true)
    }

    async fn set_player_status(
        &self,
        game_id: GameId,
        user_id: UserId,
        status: PlayerStatus,
    ) -> GameResult<bool> {
        let mut state = self.state()?;
        Ok(match state.player_mut(game_id, user_id) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        })
    }

    async fn transition_player_status(
        &self,
        game_id: GameId,
        user_id: UserId,
        from: PlayerStatus,
        to: PlayerStatus,
    ) -> GameResult<bool> {
        let mut state = self.state()?;
        Ok(match state.player_mut(game_id, user_id) {
            Some(entry) if entry.status == from => {
                entry.status = to;
                true
            }
            _ => false,
        })
    }

    async fn approve_player(&self, game_id: GameId, user_id: UserId) -> GameResult<bool> {
        let mut state = self.state()?;
        Ok(match state.player_mut(game_id, user_id) {
            Some(entry) if entry.status == PlayerStatus::Pending => {
                entry.status = PlayerStatus::Approved;
                entry.cash_in = Some(entry.requested_cash_in);
                true
            }
            _ => false,
        })
    }

    async fn update_requested_amounts(
        &self,
        game_id: GameId,
        user_id: UserId,
        requested_cash_in: Cents,
        requested_cash_out: Cents,
    ) -> GameResult<bool> {
        let mut state = self.state()?;
        Ok(match state.player_mut(game_id, user_id) {
            Some(entry) => {
                entry.requested_cash_in = requested_cash_in;
                entry.requested_cash_out = requested_cash_out;
                true
            }
            None => false,
        })
    }

    async fn update_cash(
        &self,
        game_id: GameId,
        user_id: UserId,
        cash_in: Cents,
        cash_out: Cents,
    ) -> GameResult<bool> {
        let mut state = self.state()?;
        Ok(match state.player_mut(game_id, user_id) {
            Some(entry) => {
                entry.cash_in = Some(cash_in);
                entry.cash_out = Some(cash_out);
                true
            }
            None => false,
        })
    }

    async fn list_snapshots(&self, game_id: GameId) -> GameResult<Vec<SessionSnapshot>> {
        // Appended in close order already
        Ok(self
            .state()?
            .snapshots
            .iter()
            .filter(|s| s.game_id == game_id)
            .cloned()
            .collect())
    }

    async fn find_profile(&self, user_id: UserId) -> GameResult<Option<Profile>> {
        Ok(self.state()?.profiles.get(&user_id).cloned())
    }

    async fn find_profiles(&self, user_ids: &[UserId]) -> GameResult<Vec<Profile>> {
        let state = self.state()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.profiles.get(id).cloned())
            .collect())
    }

    async fn insert_profile(&self, profile: &Profile) -> GameResult<()> {
        self.state()?
            .profiles
            .entry(profile.user_id)
            .or_insert_with(|| profile.clone());
        Ok(())
    }
}
