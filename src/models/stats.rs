//! Derived statistics models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::Role;

/// Rounded percentage of `part` in `total`; 0 when `total` is 0.
pub fn percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        (100.0 * part as f64 / total as f64).round() as u32
    }
}

/// Win/loss tally with a rounded win rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinLoss {
    pub wins: u32,
    pub losses: u32,
    pub total: u32,
    /// Percent, 0 to 100
    pub win_rate: u32,
}

impl WinLoss {
    pub fn new(wins: u32, losses: u32) -> Self {
        let total = wins + losses;
        Self {
            wins,
            losses,
            total,
            win_rate: percent(wins, total),
        }
    }

    /// Add one result.
    pub fn record(&mut self, win: bool) {
        if win {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        *self = Self::new(self.wins, self.losses);
    }
}

/// How a player did in one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBreakdown {
    pub role: Role,
    pub count: u32,
    pub wins: u32,
    pub win_rate: u32,
}

/// How a player did on one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterStat {
    pub character: String,
    #[serde(flatten)]
    pub record: WinLoss,
}

/// Per-player breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub name: String,
    pub matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: u32,
    pub top_role: Option<Role>,
    pub top_role_count: u32,
    pub top_character: Option<String>,
    pub top_character_count: u32,
    pub roles: Vec<RoleBreakdown>,
    /// Best character with at least two matches
    pub best_character: Option<CharacterStat>,
    /// Worst character with at least two matches
    pub worst_character: Option<CharacterStat>,
    /// Highest score in the special queue
    pub highscore: Option<Number>,
}

/// One (role, player) slot in a canonical lineup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineupSlot {
    pub role: Role,
    pub name: String,
}

/// Results of one teammate combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboStat {
    pub players: Vec<LineupSlot>,
    #[serde(flatten)]
    pub record: WinLoss,
}

impl ComboStat {
    /// `Tank:Pudel|DPS:Nora` style key of the lineup.
    pub fn key(&self) -> String {
        self.players
            .iter()
            .map(|s| format!("{}:{}", s.role, s.name))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Results of one hero across everyone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroStat {
    pub character: String,
    /// Role of the first recorded pick, for display
    pub role: Role,
    #[serde(flatten)]
    pub record: WinLoss,
}

/// Results in one queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeStat {
    pub queue: String,
    #[serde(flatten)]
    pub record: WinLoss,
}

/// Overall and per-queue totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeBreakdown {
    pub overall: WinLoss,
    pub modes: Vec<ModeStat>,
}

/// Results in one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonStat {
    pub season: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(flatten)]
    pub record: WinLoss,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub role_filter: Option<Role>,
    pub season_filter: Option<String>,
    pub computed_at: DateTime<Utc>,
    pub team: WinLoss,
    pub players: Vec<PlayerStats>,
    pub best_combos: Vec<ComboStat>,
    pub worst_combos: Vec<ComboStat>,
    pub best_heroes: Vec<HeroStat>,
    pub worst_heroes: Vec<HeroStat>,
    pub modes: ModeBreakdown,
    pub seasons: Vec<SeasonStat>,
}

impl Dashboard {
    /// Player stats by name.
    pub fn player(&self, name: &str) -> Option<&PlayerStats> {
        self.players.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(3, 4), 75);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(5, 5), 100);
    }

    #[test]
    fn test_win_loss_record() {
        let mut wl = WinLoss::default();
        wl.record(true);
        wl.record(true);
        wl.record(false);
        assert_eq!(wl, WinLoss::new(2, 1));
        assert_eq!(wl.total, 3);
        assert_eq!(wl.win_rate, 67);
    }

    #[test]
    fn test_flattened_serialization() {
        let stat = ModeStat {
            queue: "Stadion".to_string(),
            record: WinLoss::new(1, 1),
        };
        let value = serde_json::to_value(&stat).unwrap();
        assert_eq!(value["queue"], "Stadion");
        assert_eq!(value["winRate"], 50);
        assert_eq!(value["total"], 2);
    }

    #[test]
    fn test_combo_key() {
        let combo = ComboStat {
            players: vec![
                LineupSlot {
                    role: Role::Tank,
                    name: "Pudel".to_string(),
                },
                LineupSlot {
                    role: Role::Dps,
                    name: "Nora".to_string(),
                },
            ],
            record: WinLoss::default(),
        };
        assert_eq!(combo.key(), "Tank:Pudel|DPS:Nora");
    }
}
