//! Game module: lifecycle state machine and roster management.
//!
//! A game moves `active → closed → active …` as the host closes and reopens
//! sessions, and finally to `ended`, which is terminal. Closing a session
//! records one immutable [`SessionSnapshot`] per approved player in the same
//! atomic write that flips the status.
//!
//! Roster entries move `pending → approved | denied`; denied players may ask
//! to rejoin (`denied → pending`) and the host may kick approved players
//! (`approved → denied`). Entries are never deleted.
//!
//! ## Example
//!
//! ```no_run
//! use poker_ledger::db::MemoryLedgerStore;
//! use poker_ledger::game::{GameManager, SessionStatus};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = GameManager::new(Arc::new(MemoryLedgerStore::new()));
//!     let host = Uuid::new_v4();
//!
//!     let game = manager.create_game(Some(host), Some("Friday".to_string())).await?;
//!     let change = manager
//!         .set_game_status(Some(host), game.id, SessionStatus::Closed)
//!         .await?;
//!     println!("{change:?}");
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{GameError, GameResult};
pub use manager::{GameManager, generate_short_code};
pub use models::{
    Cents, Game, GameId, MAX_AMOUNT_CENTS, GameStatus, GameView, PlayerStatus, Profile, RosterEntry, SessionSnapshot,
    SessionStatus, StatusChange, UserId, normalize_short_code,
};
