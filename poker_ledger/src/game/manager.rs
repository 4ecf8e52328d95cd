//! Game manager: session lifecycle, host transitions and roster operations.

use chrono::Utc;
use log::{info, warn};
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    capability::{require_amount, require_caller},
    errors::{GameError, GameResult},
    models::{
        Cents, Game, GameId, GameStatus, GameView, PlayerStatus, Profile, RosterEntry, SessionStatus,
        StatusChange, UserId, normalize_short_code,
    },
};
use crate::db::LedgerStore;
use crate::standings::{GameMetrics, StandingsInput, compute_metrics};

/// Characters used in join codes (no 0/o, 1/l/i lookalikes)
const SHORT_CODE_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

/// Length of generated join codes
pub const SHORT_CODE_LEN: usize = 6;

/// Attempts at finding an unused join code before giving up
const SHORT_CODE_ATTEMPTS: usize = 8;

/// Generate a random lowercase join code
pub fn generate_short_code() -> String {
    let mut rng = rand::rng();
    (0..SHORT_CODE_LEN)
        .map(|_| SHORT_CODE_ALPHABET[rng.random_range(0..SHORT_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Game manager
///
/// Every operation takes the authenticated caller explicitly; `None` means
/// the request carried no identity and fails with
/// [`GameError::Unauthenticated`]. Authorization and precondition checks
/// always run before any write.
#[derive(Clone)]
pub struct GameManager {
    store: Arc<dyn LedgerStore>,
}

impl GameManager {
    /// Create a new game manager
    ///
    /// # Arguments
    ///
    /// * `store` - Ledger store handle
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Access the underlying store
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    async fn load_game(&self, game_id: GameId) -> GameResult<Game> {
        self.store
            .find_game(game_id)
            .await?
            .ok_or(GameError::NotFound("game"))
    }

    async fn load_player(&self, game_id: GameId, user_id: UserId) -> GameResult<RosterEntry> {
        self.store
            .find_player(game_id, user_id)
            .await?
            .ok_or(GameError::NotFound("player"))
    }

    /// Load a game the caller hosts
    async fn hosted_game(&self, caller: UserId, game_id: GameId) -> GameResult<Game> {
        let game = self.load_game(game_id).await?;
        game.require_host(caller)?;
        Ok(game)
    }

    /// Create a new game hosted by the caller
    ///
    /// The creator is recorded as the first approved player.
    pub async fn create_game(
        &self,
        caller: Option<UserId>,
        description: Option<String>,
    ) -> GameResult<Game> {
        let host_id = require_caller(caller)?;
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        for _ in 0..SHORT_CODE_ATTEMPTS {
            let game = Game {
                id: Uuid::new_v4(),
                short_code: generate_short_code(),
                host_id,
                status: GameStatus::Active,
                description: description.clone(),
                created_at: Utc::now(),
            };

            if self.store.insert_game(&game).await? {
                info!("Game {} created by {} with code {}", game.id, host_id, game.short_code);
                return Ok(game);
            }

            warn!("Join code {} already taken, retrying", game.short_code);
        }

        Err(GameError::Store(
            "could not allocate a unique join code".to_string(),
        ))
    }

    /// Move a game between `active` and `closed`
    ///
    /// Closing snapshots every approved player's session net in the same
    /// atomic write that flips the status, so a failed snapshot insert leaves
    /// the game active. Closing an already-closed game is a no-op and writes
    /// no snapshots; reopening never writes snapshots.
    ///
    /// # Errors
    ///
    /// * `GameError::NotFound` - Game does not exist
    /// * `GameError::Unauthorized` - Caller is not the host
    /// * `GameError::GameEnded` - Game has ended
    pub async fn set_game_status(
        &self,
        caller: Option<UserId>,
        game_id: GameId,
        status: SessionStatus,
    ) -> GameResult<StatusChange> {
        let caller = require_caller(caller)?;
        let game = self.hosted_game(caller, game_id).await?;
        game.require_not_ended()?;

        match status {
            SessionStatus::Closed => match self.store.close_session(game_id).await? {
                Some(snapshots) => {
                    info!("Game {game_id} closed, {snapshots} snapshot(s) recorded");
                    Ok(StatusChange::Closed { snapshots })
                }
                None => {
                    // Lost a race, or already closed
                    self.load_game(game_id).await?.require_not_ended()?;
                    Ok(StatusChange::Unchanged)
                }
            },
            SessionStatus::Active => {
                if self.store.reopen_game(game_id).await? {
                    info!("Game {game_id} reopened");
                    Ok(StatusChange::Reopened)
                } else {
                    self.load_game(game_id).await?.require_not_ended()?;
                    Ok(StatusChange::Unchanged)
                }
            }
        }
    }

    /// End a game for good, without snapshotting
    ///
    /// Ending an already-ended game succeeds without changes. Returns whether
    /// this call ended the game.
    pub async fn close_game(&self, caller: Option<UserId>, game_id: GameId) -> GameResult<bool> {
        let caller = require_caller(caller)?;
        self.hosted_game(caller, game_id).await?;

        let ended = self.store.end_game(game_id).await?;
        if ended {
            info!("Game {game_id} ended by {caller}");
        } else {
            info!("Game {game_id} already ended");
        }
        Ok(ended)
    }

    /// Hand hosting to another approved player
    ///
    /// # Errors
    ///
    /// * `GameError::Unauthorized` - Caller is not the host
    /// * `GameError::InvalidTarget` - Target is the caller or not approved
    pub async fn transfer_host(
        &self,
        caller: Option<UserId>,
        game_id: GameId,
        new_host: UserId,
    ) -> GameResult<()> {
        let caller = require_caller(caller)?;
        self.hosted_game(caller, game_id).await?;

        if new_host == caller {
            return Err(GameError::InvalidTarget("already the host".to_string()));
        }

        match self.store.find_player(game_id, new_host).await? {
            Some(entry) => entry.require_approved_target("new host must be an approved player")?,
            None => {
                return Err(GameError::InvalidTarget(
                    "new host must be an approved player".to_string(),
                ));
            }
        }

        self.store.update_host(game_id, new_host).await?;
        info!("Game {game_id} host transferred from {caller} to {new_host}");
        Ok(())
    }

    /// Remove a player from play; their history is kept
    ///
    /// Self-kicks are rejected before anything else is checked.
    pub async fn kick_player(
        &self,
        caller: Option<UserId>,
        game_id: GameId,
        target: UserId,
    ) -> GameResult<()> {
        let caller = require_caller(caller)?;
        if target == caller {
            return Err(GameError::InvalidTarget("cannot kick yourself".to_string()));
        }

        self.hosted_game(caller, game_id).await?;
        self.load_player(game_id, target).await?;

        self.store
            .set_player_status(game_id, target, PlayerStatus::Denied)
            .await?;
        info!("Player {target} kicked from game {game_id}");
        Ok(())
    }

    /// Approve a join request, seeding the actual buy-in from the request
    ///
    /// Only `pending` entries can be approved. A kicked player has to ask to
    /// rejoin first, and an approved player's recorded cash-in is never
    /// reseeded.
    ///
    /// # Errors
    ///
    /// * `GameError::NotFound` - Game or entry does not exist
    /// * `GameError::Unauthorized` - Caller is not the host
    /// * `GameError::InvalidTarget` - Entry is not pending
    pub async fn approve_player(
        &self,
        caller: Option<UserId>,
        game_id: GameId,
        target: UserId,
    ) -> GameResult<RosterEntry> {
        let caller = require_caller(caller)?;
        self.hosted_game(caller, game_id).await?;
        self.load_player(game_id, target)
            .await?
            .require_pending_target()?;

        if !self.store.approve_player(game_id, target).await? {
            // Status moved between the read and the conditional write
            return Err(GameError::InvalidTarget("player is not pending".to_string()));
        }
        info!("Player {target} approved in game {game_id}");
        self.load_player(game_id, target).await
    }

    /// Deny a pending join request
    ///
    /// Approved players leave through [`GameManager::kick_player`].
    pub async fn deny_player(
        &self,
        caller: Option<UserId>,
        game_id: GameId,
        target: UserId,
    ) -> GameResult<RosterEntry> {
        let caller = require_caller(caller)?;
        if target == caller {
            return Err(GameError::InvalidTarget("cannot deny yourself".to_string()));
        }

        self.hosted_game(caller, game_id).await?;
        self.load_player(game_id, target)
            .await?
            .require_pending_target()?;

        let changed = self
            .store
            .transition_player_status(
                game_id,
                target,
                PlayerStatus::Pending,
                PlayerStatus::Denied,
            )
            .await?;
        if !changed {
            return Err(GameError::InvalidTarget("player is not pending".to_string()));
        }
        self.load_player(game_id, target).await
    }

    /// Record a player's actual cash-in and cash-out (host only)
    pub async fn set_player_cash(
        &self,
        caller: Option<UserId>,
        game_id: GameId,
        target: UserId,
        cash_in: Cents,
        cash_out: Cents,
    ) -> GameResult<RosterEntry> {
        let caller = require_caller(caller)?;
        require_amount(cash_in)?;
        require_amount(cash_out)?;

        let game = self.hosted_game(caller, game_id).await?;
        game.require_not_ended()?;
        self.load_player(game_id, target)
            .await?
            .require_approved_target("player is not approved")?;

        self.store
            .update_cash(game_id, target, cash_in, cash_out)
            .await?;
        self.load_player(game_id, target).await
    }

    /// Ask to be let back in after being denied or kicked
    ///
    /// Only a `denied` entry moves to `pending`. Any other state is left
    /// alone and is not an error; the return value tells whether the entry
    /// changed.
    pub async fn request_rejoin(&self, caller: Option<UserId>, game_id: GameId) -> GameResult<bool> {
        let caller = require_caller(caller)?;

        let changed = self
            .store
            .transition_player_status(
                game_id,
                caller,
                PlayerStatus::Denied,
                PlayerStatus::Pending,
            )
            .await?;

        if changed {
            info!("Player {caller} requested to rejoin game {game_id}");
        }
        Ok(changed)
    }

    /// Update the caller's own requested buy-in and cash-out
    ///
    /// # Errors
    ///
    /// * `GameError::NotAPlayer` - Caller has no pending or approved entry
    /// * `GameError::InvalidAmount` - Negative or above `MAX_AMOUNT_CENTS`
    pub async fn update_requested_amounts(
        &self,
        caller: Option<UserId>,
        game_id: GameId,
        requested_cash_in: Cents,
        requested_cash_out: Cents,
    ) -> GameResult<RosterEntry> {
        let caller = require_caller(caller)?;
        require_amount(requested_cash_in)?;
        require_amount(requested_cash_out)?;

        self.store
            .find_player(game_id, caller)
            .await?
            .ok_or(GameError::NotAPlayer)?
            .require_self_service()?;

        self.store
            .update_requested_amounts(game_id, caller, requested_cash_in, requested_cash_out)
            .await?;
        self.load_player(game_id, caller).await
    }

    /// Ask to join a game by its join code
    ///
    /// # Errors
    ///
    /// * `GameError::NotFound` - No game with that code
    /// * `GameError::AlreadyMember` - Caller already has an entry (redirect, not a failure)
    /// * `GameError::GameNotJoinable` - Game is not active
    pub async fn request_join(
        &self,
        caller: Option<UserId>,
        short_code: &str,
        requested_cash_in: Cents,
    ) -> GameResult<RosterEntry> {
        let caller = require_caller(caller)?;
        require_amount(requested_cash_in)?;

        let game = self
            .store
            .find_game_by_code(&normalize_short_code(short_code))
            .await?
            .ok_or(GameError::NotFound("game"))?;

        if self.store.find_player(game.id, caller).await?.is_some() {
            return Err(GameError::AlreadyMember);
        }
        game.require_joinable()?;

        let entry = RosterEntry::pending(game.id, caller, requested_cash_in);
        if !self.store.insert_player(&entry).await? {
            return Err(GameError::AlreadyMember);
        }

        info!("Player {caller} requested to join game {}", game.id);
        Ok(entry)
    }

    /// Game and roster, visible to the host and anyone on the roster
    pub async fn game_view(&self, caller: Option<UserId>, game_id: GameId) -> GameResult<GameView> {
        let caller = require_caller(caller)?;
        let game = self.load_game(game_id).await?;
        let players = self.store.list_players(game_id).await?;
        game.require_viewer(caller, &players)?;

        Ok(GameView {
            is_host: game.is_host(caller),
            game,
            players,
        })
    }

    /// Live and historical profit/loss metrics for the caller
    pub async fn game_metrics(
        &self,
        caller: Option<UserId>,
        game_id: GameId,
    ) -> GameResult<GameMetrics> {
        let viewer = require_caller(caller)?;
        let view = self.game_view(Some(viewer), game_id).await?;
        let snapshots = self.store.list_snapshots(game_id).await?;

        let mut user_ids: Vec<UserId> = view.players.iter().map(|p| p.user_id).collect();
        for snapshot in &snapshots {
            if !user_ids.contains(&snapshot.user_id) {
                user_ids.push(snapshot.user_id);
            }
        }
        let profiles = self.store.find_profiles(&user_ids).await?;

        Ok(compute_metrics(StandingsInput {
            status: view.game.status,
            roster: &view.players,
            snapshots: &snapshots,
            profiles: &profiles,
            viewer,
        }))
    }

    /// Fetch the caller's profile, creating it from their email on first use
    pub async fn ensure_profile(
        &self,
        caller: Option<UserId>,
        email: Option<String>,
    ) -> GameResult<Profile> {
        let caller = require_caller(caller)?;

        if let Some(profile) = self.store.find_profile(caller).await? {
            return Ok(profile);
        }

        self.store
            .insert_profile(&Profile::from_email(caller, email))
            .await?;

        // Re-read in case a concurrent request created it first
        self.store
            .find_profile(caller)
            .await?
            .ok_or(GameError::NotFound("profile"))
    }
}
