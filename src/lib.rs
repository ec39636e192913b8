//! # Match Tracker
//!
//! Match log and statistics for a small fixed squad.
//!
//! ## Architecture
//!
//! - **models**: Records (matches, tickets, archive links, player ranks), seasons, vocabulary
//! - **normalize**: Required-field validation and write-time defaults
//! - **calculate**: Win rates, player breakdowns, combos, heroes, queues, seasons
//! - **storage**: JSONL record store and the scratchpad document
//! - **ingest**: Bulk import and export bundles
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod storage;

pub use models::*;
