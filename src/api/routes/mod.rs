pub mod archive;
pub mod improvements;
pub mod matches;
pub mod meta;
pub mod player_ranks;
pub mod scratchpad;
pub mod stats;
