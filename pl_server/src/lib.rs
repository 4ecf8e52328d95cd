//! HTTP server for the poker ledger.
//!
//! Exposes [`poker_ledger::GameManager`] as a JSON API under `/api/v1`,
//! authenticated with bearer tokens issued by an external identity provider.

pub mod api;
pub mod config;
pub mod logging;
