//! Match records.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use super::{RecordId, Timestamp};

/// Outcome of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Lose,
}

impl MatchResult {
    pub fn is_win(self) -> bool {
        self == MatchResult::Win
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResult::Win => write!(f, "Win"),
            MatchResult::Lose => write!(f, "Lose"),
        }
    }
}

/// Role a player filled in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Tank,
    #[serde(rename = "DPS")]
    Dps,
    Support,
}

impl Role {
    /// Fixed display and grouping order.
    pub const ALL: [Role; 3] = [Role::Tank, Role::Dps, Role::Support];

    /// Sort priority used when canonicalizing lineups.
    pub fn priority(self) -> u8 {
        match self {
            Role::Tank => 0,
            Role::Dps => 1,
            Role::Support => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Tank => "Tank",
            Role::Dps => "DPS",
            Role::Support => "Support",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tank" => Ok(Role::Tank),
            "dps" | "damage" => Ok(Role::Dps),
            "support" => Ok(Role::Support),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Keeps an explicit `null` apart from an absent field: absent is `None`,
/// `null` is `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One player's slot in a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
}

impl PlayerEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            character: None,
        }
    }

    pub fn with_character(mut self, character: impl Into<String>) -> Self {
        self.character = Some(character.into());
        self
    }

    /// Character name, treating an empty string as unset.
    pub fn played_character(&self) -> Option<&str> {
        self.character
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// A match as sent by a writer; `createdAt` and `season` may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDraft {
    #[serde(default)]
    pub id: RecordId,
    #[serde(default)]
    pub queue: String,
    pub result: MatchResult,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub rank: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub map: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub score: Option<Option<Number>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default)]
    pub players: Vec<PlayerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Unknown fields, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MatchDraft {
    pub fn new(id: impl Into<RecordId>, queue: impl Into<String>, result: MatchResult) -> Self {
        Self {
            id: id.into(),
            queue: queue.into(),
            result,
            rank: None,
            map: None,
            score: None,
            season: None,
            players: Vec::new(),
            created_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_player(mut self, player: PlayerEntry) -> Self {
        self.players.push(player);
        self
    }

    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }

    pub fn with_score(mut self, score: impl Into<Number>) -> Self {
        self.score = Some(Some(score.into()));
        self
    }
}

/// A stored match: `createdAt` and `season` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: RecordId,
    #[serde(default)]
    pub queue: String,
    pub result: MatchResult,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub rank: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub map: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub score: Option<Option<Number>>,
    pub season: String,
    #[serde(default)]
    pub players: Vec<PlayerEntry>,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MatchRecord {
    /// First entry for `name`, restricted to `role` when given.
    pub fn player(&self, name: &str, role: Option<Role>) -> Option<&PlayerEntry> {
        self.players
            .iter()
            .find(|p| p.name == name && role.map_or(true, |r| p.role == r))
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.players.iter().any(|p| p.role == role)
    }

    pub fn rank(&self) -> Option<&str> {
        self.rank.as_ref()?.as_deref()
    }

    pub fn score(&self) -> Option<&Number> {
        self.score.as_ref()?.as_ref()
    }

    pub fn score_value(&self) -> Option<f64> {
        self.score().and_then(Number::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_value(Role::Dps).unwrap(), json!("DPS"));
        assert_eq!(serde_json::to_value(Role::Tank).unwrap(), json!("Tank"));
        let role: Role = serde_json::from_value(json!("Support")).unwrap();
        assert_eq!(role, Role::Support);
        assert!(serde_json::from_value::<Role>(json!("Healer")).is_err());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("dps".parse::<Role>().unwrap(), Role::Dps);
        assert_eq!(" Tank ".parse::<Role>().unwrap(), Role::Tank);
        assert!("flex".parse::<Role>().is_err());
    }

    #[test]
    fn test_played_character_ignores_blank() {
        let p = PlayerEntry::new("p1", "Nora", Role::Support).with_character("");
        assert_eq!(p.played_character(), None);
        let p = PlayerEntry::new("p1", "Nora", Role::Support).with_character("Ana");
        assert_eq!(p.played_character(), Some("Ana"));
    }

    #[test]
    fn test_draft_keeps_unknown_fields() {
        let input = json!({
            "id": "m1",
            "queue": "Rangliste",
            "result": "Win",
            "players": [],
            "note": "clutch"
        });
        let draft: MatchDraft = serde_json::from_value(input).unwrap();
        assert_eq!(draft.extra.get("note"), Some(&json!("clutch")));
        assert!(draft.created_at.is_none());

        let out = serde_json::to_value(&draft).unwrap();
        assert_eq!(out["note"], "clutch");
        assert!(out.get("rank").is_none());
        assert!(out.get("createdAt").is_none());
    }

    #[test]
    fn test_record_requires_season_and_created_at() {
        let missing = json!({"id": "m1", "queue": "Rangliste", "result": "Lose", "players": []});
        assert!(serde_json::from_value::<MatchRecord>(missing).is_err());
    }

    #[test]
    fn test_player_lookup_by_role() {
        let input = json!({
            "id": "m1", "queue": "Rangliste", "result": "Win", "season": "Season 10",
            "createdAt": "2024-05-01T10:00:00Z",
            "players": [{"id": "a", "name": "Nora", "role": "DPS"}]
        });
        let record: MatchRecord = serde_json::from_value(input).unwrap();
        assert_eq!(record.player("Nora", None).map(|p| p.role), Some(Role::Dps));
        assert_eq!(record.player("Nora", Some(Role::Dps)).map(|p| p.id.as_str()), Some("a"));
        assert!(record.player("Nora", Some(Role::Tank)).is_none());
        assert!(record.player("Pudel", None).is_none());
    }

    #[test]
    fn test_explicit_nulls_survive() {
        let input = json!({
            "id": "m1", "queue": "Rangliste", "result": "Lose", "rank": null, "score": null,
            "season": "Season 10", "players": [], "createdAt": "2024-05-01T10:00:00Z"
        });
        let record: MatchRecord = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(record.rank, Some(None));
        assert_eq!(record.map, None);
        assert_eq!(record.rank(), None);
        assert_eq!(record.score_value(), None);

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out, input);
        assert!(out.get("map").is_none());
    }

    #[test]
    fn test_integer_score_survives() {
        let input = json!({
            "id": "m1", "queue": "Stadion", "result": "Win", "score": 4200,
            "season": "Season 10", "players": [], "createdAt": "2024-05-01T10:00:00Z"
        });
        let record: MatchRecord = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(record.score_value(), Some(4200.0));
        assert_eq!(serde_json::to_value(&record).unwrap(), input);
    }
}
