//! BETSLIP — wager ledger and bet-slip service
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod odds;
pub mod ledger;
pub mod settlement;
pub mod api;
