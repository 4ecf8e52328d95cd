//! Standings aggregation: current-session and all-time profit/loss views.
//!
//! Everything here is a pure function of roster and snapshot rows; nothing
//! reads or writes the store.

pub mod aggregator;
pub mod chart;

pub use aggregator::{
    ChartPoint, GameMetrics, SessionPlayer, StandingsInput, StandingsPlayer, compute_metrics,
};
pub use chart::{display_name, format_dollars, y_domain};
