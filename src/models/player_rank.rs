//! Per-season player ranks: one current value per (player, season, queue, role).

use serde::{Deserialize, Serialize};

use super::{RecordId, Role};

/// Composite key of a rank entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankKey {
    pub player: String,
    pub season: String,
    pub queue: String,
    pub role: Role,
}

impl RankKey {
    /// Deterministic row id for this key.
    pub fn row_id(&self) -> RecordId {
        RecordId::generate(&[&self.player, &self.season, &self.queue, self.role.as_str()])
    }
}

/// A stored rank entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRank {
    pub player: String,
    pub season: String,
    pub queue: String,
    pub role: Role,
    #[serde(default)]
    pub rank: String,
}

/// Body of a rank write; `rank` defaults to an empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankUpdate {
    #[serde(default)]
    pub player: String,
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub queue: String,
    pub role: Option<Role>,
    #[serde(default)]
    pub rank: Option<String>,
}
