//! Capability checks shared by every game and roster operation.
//!
//! Each operation states what it needs from the caller in terms of these
//! checks instead of comparing ids and statuses inline.

use super::{
    errors::{GameError, GameResult},
    models::{Cents, Game, GameStatus, MAX_AMOUNT_CENTS, PlayerStatus, RosterEntry, UserId},
};

/// Resolve the authenticated caller
pub fn require_caller(caller: Option<UserId>) -> GameResult<UserId> {
    caller.ok_or(GameError::Unauthenticated)
}

/// Reject negative or implausibly large money amounts
pub fn require_amount(amount: Cents) -> GameResult<Cents> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&amount) {
        return Err(GameError::InvalidAmount(amount));
    }
    Ok(amount)
}

impl Game {
    pub fn is_host(&self, user_id: UserId) -> bool {
        self.host_id == user_id
    }

    /// Caller must be the current host
    pub fn require_host(&self, caller: UserId) -> GameResult<()> {
        if !self.is_host(caller) {
            return Err(GameError::Unauthorized);
        }
        Ok(())
    }

    /// Game must still accept status transitions
    pub fn require_not_ended(&self) -> GameResult<()> {
        if self.status == GameStatus::Ended {
            return Err(GameError::GameEnded);
        }
        Ok(())
    }

    /// Game must be accepting join requests
    pub fn require_joinable(&self) -> GameResult<()> {
        if self.status != GameStatus::Active {
            return Err(GameError::GameNotJoinable);
        }
        Ok(())
    }

    /// Caller must be the host or hold any roster entry.
    ///
    /// Outsiders get `NotFound` so the game's existence is not revealed.
    pub fn require_viewer(&self, caller: UserId, roster: &[RosterEntry]) -> GameResult<()> {
        if self.is_host(caller) || roster.iter().any(|p| p.user_id == caller) {
            return Ok(());
        }
        Err(GameError::NotFound("game"))
    }
}

impl RosterEntry {
    /// Player may edit their own requested amounts
    pub fn require_self_service(&self) -> GameResult<()> {
        match self.status {
            PlayerStatus::Pending | PlayerStatus::Approved => Ok(()),
            PlayerStatus::Denied => Err(GameError::NotAPlayer),
        }
    }

    /// Entry must still be waiting on the host's decision
    pub fn require_pending_target(&self) -> GameResult<()> {
        if self.status != PlayerStatus::Pending {
            return Err(GameError::InvalidTarget(format!(
                "player is {}, not pending",
                self.status.as_str()
            )));
        }
        Ok(())
    }

    /// Entry must be approved to be the target of a host action
    pub fn require_approved_target(&self, reason: &str) -> GameResult<()> {
        if self.status != PlayerStatus::Approved {
            return Err(GameError::InvalidTarget(reason.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn game(host_id: UserId, status: GameStatus) -> Game {
        Game {
            id: Uuid::new_v4(),
            short_code: "abc234".to_string(),
            host_id,
            status,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_caller() {
        assert!(matches!(require_caller(None), Err(GameError::Unauthenticated)));
        let id = Uuid::new_v4();
        assert_eq!(require_caller(Some(id)).unwrap(), id);
    }

    #[test]
    fn test_require_host() {
        let host = Uuid::new_v4();
        let g = game(host, GameStatus::Active);
        assert!(g.require_host(host).is_ok());
        assert!(matches!(
            g.require_host(Uuid::new_v4()),
            Err(GameError::Unauthorized)
        ));
    }

    #[test]
    fn test_ended_and_joinable_checks() {
        let g = game(Uuid::new_v4(), GameStatus::Closed);
        assert!(g.require_not_ended().is_ok());
        assert!(matches!(g.require_joinable(), Err(GameError::GameNotJoinable)));

        let ended = game(Uuid::new_v4(), GameStatus::Ended);
        assert!(matches!(ended.require_not_ended(), Err(GameError::GameEnded)));
    }

    #[test]
    fn test_require_viewer() {
        let host = Uuid::new_v4();
        let g = game(host, GameStatus::Active);
        let player = Uuid::new_v4();
        let roster = vec![RosterEntry::pending(g.id, player, 0)];

        assert!(g.require_viewer(host, &roster).is_ok());
        assert!(g.require_viewer(player, &roster).is_ok());
        assert!(matches!(
            g.require_viewer(Uuid::new_v4(), &roster),
            Err(GameError::NotFound("game"))
        ));
    }

    #[test]
    fn test_roster_entry_checks() {
        let mut entry = RosterEntry::pending(Uuid::new_v4(), Uuid::new_v4(), 100);
        assert!(entry.require_self_service().is_ok());
        assert!(entry.require_approved_target("nope").is_err());

        assert!(entry.require_pending_target().is_ok());

        entry.status = PlayerStatus::Approved;
        assert!(entry.require_approved_target("nope").is_ok());
        assert!(matches!(
            entry.require_pending_target(),
            Err(GameError::InvalidTarget(_))
        ));

        entry.status = PlayerStatus::Denied;
        assert!(matches!(entry.require_self_service(), Err(GameError::NotAPlayer)));
    }

    #[test]
    fn test_require_amount() {
        assert_eq!(require_amount(0).unwrap(), 0);
        assert!(matches!(require_amount(-1), Err(GameError::InvalidAmount(-1))));
        assert_eq!(require_amount(MAX_AMOUNT_CENTS).unwrap(), MAX_AMOUNT_CENTS);
        assert!(matches!(
            require_amount(MAX_AMOUNT_CENTS + 1),
            Err(GameError::InvalidAmount(_))
        ));
        assert!(matches!(
            require_amount(i64::MAX),
            Err(GameError::InvalidAmount(i64::MAX))
        ));
    }
}
