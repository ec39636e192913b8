//! Core data models for the match tracker.

mod archive_link;
mod ids;
mod match_record;
mod player_rank;
mod season;
mod stats;
mod ticket;
mod timestamp;
pub mod vocabulary;

pub use archive_link::*;
pub use ids::*;
pub use match_record::*;
pub use player_rank::*;
pub use season::*;
pub use stats::*;
pub use ticket::*;
pub use timestamp::*;
