//! # Poker Ledger
//!
//! Buy-in, cash-out and standings tracking for casual home poker games.
//!
//! A host creates a game and shares its join code. Players request to join
//! with a buy-in, the host approves or denies them, and closes sessions as
//! the night goes on. Each close snapshots every approved player's net so
//! players can follow both the live session and the game's all-time
//! standings.
//!
//! ## Core Modules
//!
//! - [`game`]: Game lifecycle, roster operations and capability checks
//! - [`db`]: Connection pool and the [`db::LedgerStore`] persistence seam
//! - [`standings`]: Pure aggregation of roster and snapshot rows
//!
//! ## Example
//!
//! ```
//! use poker_ledger::standings::format_dollars;
//!
//! assert_eq!(format_dollars(-1250), "-$12.50");
//! ```

/// Database pool and ledger store implementations.
pub mod db;

/// Game lifecycle and roster management.
pub mod game;
pub use game::{GameError, GameManager, GameResult};

/// Standings and chart aggregation.
pub mod standings;
