//! Game vocabulary: rank ladders per queue and heroes per role.
//!
//! Used for hints and logging only; stored records are never rejected for
//! an unknown rank or hero.

use serde::Serialize;

use super::Role;

pub const COMPETITIVE_TIERS: &[&str] = &[
    "Bronze",
    "Silver",
    "Gold",
    "Platinum",
    "Diamond",
    "Master",
    "Grandmaster",
    "Champion",
];

pub const COMPETITIVE_DIVISIONS: &[u8] = &[5, 4, 3, 2, 1];

pub const STADIUM_RANKS: &[&str] = &["Rookie", "Challenger", "Contender", "Elite", "Legend"];

const TANKS: &[&str] = &[
    "D.Va",
    "Doomfist",
    "Junker Queen",
    "Mauga",
    "Orisa",
    "Ramattra",
    "Reinhardt",
    "Roadhog",
    "Sigma",
    "Winston",
    "Wrecking Ball",
    "Zarya",
];

const DAMAGE: &[&str] = &[
    "Ashe",
    "Bastion",
    "Cassidy",
    "Echo",
    "Genji",
    "Hanzo",
    "Junkrat",
    "Mei",
    "Pharah",
    "Reaper",
    "Sojourn",
    "Soldier: 76",
    "Sombra",
    "Symmetra",
    "Torbjörn",
    "Tracer",
    "Venture",
    "Widowmaker",
];

const SUPPORTS: &[&str] = &[
    "Ana",
    "Baptiste",
    "Brigitte",
    "Illari",
    "Juno",
    "Kiriko",
    "Lifeweaver",
    "Lúcio",
    "Mercy",
    "Moira",
    "Zenyatta",
];

/// Which rank ladder a queue uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankLadder {
    Competitive,
    Stadium,
}

/// "Bronze 5" through "Champion 1", lowest first.
pub fn competitive_ranks() -> Vec<String> {
    COMPETITIVE_TIERS
        .iter()
        .flat_map(|tier| {
            COMPETITIVE_DIVISIONS
                .iter()
                .map(move |division| format!("{} {}", tier, division))
        })
        .collect()
}

impl RankLadder {
    pub fn options(self) -> Vec<String> {
        match self {
            RankLadder::Competitive => competitive_ranks(),
            RankLadder::Stadium => STADIUM_RANKS.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn contains(self, rank: &str) -> bool {
        let rank = rank.trim();
        match self {
            RankLadder::Competitive => rank
                .rsplit_once(' ')
                .and_then(|(tier, div)| Some((tier, div.parse::<u8>().ok()?)))
                .is_some_and(|(tier, div)| {
                    COMPETITIVE_TIERS.contains(&tier) && COMPETITIVE_DIVISIONS.contains(&div)
                }),
            RankLadder::Stadium => STADIUM_RANKS.contains(&rank),
        }
    }
}

/// Heroes selectable for a role.
pub fn characters_for(role: Role) -> &'static [&'static str] {
    match role {
        Role::Tank => TANKS,
        Role::Dps => DAMAGE,
        Role::Support => SUPPORTS,
    }
}

/// Vocabulary snapshot handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vocabulary {
    pub roster: Vec<String>,
    pub roles: Vec<Role>,
    pub queues: Vec<String>,
    pub rank_options: Vec<QueueRanks>,
    pub characters: Vec<RoleCharacters>,
}

impl Vocabulary {
    /// Snapshot for a roster and the two queues that carry rank ladders.
    pub fn new(roster: Vec<String>, ranked_queue: &str, special_queue: &str) -> Self {
        Self {
            roster,
            roles: Role::ALL.to_vec(),
            queues: vec![ranked_queue.to_string(), special_queue.to_string()],
            rank_options: vec![
                QueueRanks {
                    queue: ranked_queue.to_string(),
                    ranks: RankLadder::Competitive.options(),
                },
                QueueRanks {
                    queue: special_queue.to_string(),
                    ranks: RankLadder::Stadium.options(),
                },
            ],
            characters: Role::ALL
                .iter()
                .map(|role| RoleCharacters {
                    role: *role,
                    characters: characters_for(*role).iter().map(|c| c.to_string()).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueRanks {
    pub queue: String,
    pub ranks: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleCharacters {
    pub role: Role,
    pub characters: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_competitive_ranks_order() {
        let ranks = competitive_ranks();
        assert_eq!(ranks.len(), 40);
        assert_eq!(ranks[0], "Bronze 5");
        assert_eq!(ranks[4], "Bronze 1");
        assert_eq!(ranks[39], "Champion 1");
    }

    #[test]
    fn test_ladder_contains() {
        assert!(RankLadder::Competitive.contains("Gold 3"));
        assert!(RankLadder::Competitive.contains("Grandmaster 1"));
        assert!(!RankLadder::Competitive.contains("Gold 6"));
        assert!(!RankLadder::Competitive.contains("Elite"));
        assert!(RankLadder::Stadium.contains("Elite"));
        assert!(!RankLadder::Stadium.contains("Gold 3"));
    }

    #[test]
    fn test_characters_for_role() {
        assert!(characters_for(Role::Tank).contains(&"Reinhardt"));
        assert!(characters_for(Role::Support).contains(&"Lúcio"));
        assert!(!characters_for(Role::Dps).contains(&"Mercy"));
    }

    #[test]
    fn test_vocabulary_snapshot() {
        let vocab = Vocabulary::new(vec!["Nora".to_string()], "Rangliste", "Stadion");
        assert_eq!(vocab.roles.len(), 3);
        assert_eq!(vocab.queues, vec!["Rangliste", "Stadion"]);
        assert_eq!(vocab.rank_options[0].ranks.len(), 40);
        assert_eq!(vocab.rank_options[1].ranks[0], "Rookie");
        assert_eq!(vocab.characters[2].role, Role::Support);
    }
}
