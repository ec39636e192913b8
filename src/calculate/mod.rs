//! Statistics calculation engine.
//!
//! Derives dashboard numbers from the stored match set:
//! - Team win rate and per-player breakdowns
//! - Teammate combinations (best/worst lineups)
//! - Hero performance across the squad
//! - Per-queue and per-season totals
//!
//! Ties always go to whatever was seen first while walking the input, so
//! callers must pass matches in stored order (newest first).

use std::collections::HashMap;
use std::hash::Hash;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::models::{
    CharacterStat, ComboStat, Dashboard, HeroStat, LineupSlot, MatchRecord, ModeBreakdown,
    ModeStat, PlayerEntry, PlayerStats, Role, RoleBreakdown, SeasonStat, SeasonTable, WinLoss,
};

/// Combos listed in each of the best/worst lists.
pub const COMBO_LIST_LEN: usize = 3;

/// Heroes listed in each of the best/worst lists.
pub const HERO_LIST_LEN: usize = 5;

/// Fewest matches before a hero or character is ranked.
pub const MIN_RANKED_MATCHES: u32 = 2;

/// Inputs that are configuration rather than data.
#[derive(Debug, Clone)]
pub struct StatsSettings {
    /// Players that get a breakdown, in display order
    pub roster: Vec<String>,
    /// Queue whose `score` counts towards highscores
    pub special_queue: String,
}

/// Optional dashboard filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsQuery {
    pub role: Option<Role>,
    pub season: Option<String>,
}

/// Counter that remembers first-seen order.
struct Tally<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, u32)>,
}

impl<K: Eq + Hash + Clone> Tally<K> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Highest count; an equal count later on does not replace the leader.
    fn top(&self) -> Option<(&K, u32)> {
        let mut best: Option<(&K, u32)> = None;
        for (key, count) in &self.entries {
            if best.map_or(true, |(_, c)| *count > c) {
                best = Some((key, *count));
            }
        }
        best
    }
}

/// Win/loss groups that remember first-seen order.
struct Groups<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(V, WinLoss)>,
}

impl<K: Eq + Hash, V> Groups<K, V> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn record(&mut self, key: K, win: bool, label: impl FnOnce() -> V) {
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.entries.push((label(), WinLoss::default()));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[i].1.record(win);
    }

    fn into_entries(self) -> Vec<(V, WinLoss)> {
        self.entries
    }
}

/// Matches where at least one player filled `role`; all matches when `None`.
pub fn filter_by_role<'a>(matches: &[&'a MatchRecord], role: Option<Role>) -> Vec<&'a MatchRecord> {
    matches
        .iter()
        .copied()
        .filter(|m| role.map_or(true, |r| m.has_role(r)))
        .collect()
}

/// Wins, losses and win rate over a match set.
pub fn team_summary(matches: &[&MatchRecord]) -> WinLoss {
    let wins = matches.iter().filter(|m| m.result.is_win()).count() as u32;
    WinLoss::new(wins, matches.len() as u32 - wins)
}

/// The entry for `name` in a match, honouring the role filter.
/// Breakdown for one roster player.
pub fn player_stats(
    matches: &[&MatchRecord],
    name: &str,
    role: Option<Role>,
    special_queue: &str,
) -> PlayerStats {
    let mut record = WinLoss::default();
    let mut roles: Tally<Role> = Tally::new();
    let mut characters: Tally<String> = Tally::new();
    let mut role_records: HashMap<Role, WinLoss> = HashMap::new();
    let mut character_records: Groups<String, String> = Groups::new();
    let mut highscore: Option<&Number> = None;

    for m in matches {
        let Some(entry) = m.player(name, role) else {
            continue;
        };
        let win = m.result.is_win();
        record.record(win);

        roles.add(entry.role);
        role_records.entry(entry.role).or_default().record(win);

        if let Some(character) = entry.played_character() {
            characters.add(character.to_string());
            character_records.record(character.to_string(), win, || character.to_string());
        }

        if m.queue == special_queue {
            if let Some(score) = m.score() {
                let value = score.as_f64().unwrap_or(f64::NEG_INFINITY);
                let current = highscore.and_then(Number::as_f64).unwrap_or(f64::NEG_INFINITY);
                if highscore.is_none() || value > current {
                    highscore = Some(score);
                }
            }
        }
    }

    let (top_role, top_role_count) = roles
        .top()
        .map_or((None, 0), |(r, c)| (Some(*r), c));
    let (top_character, top_character_count) = characters
        .top()
        .map_or((None, 0), |(ch, c)| (Some(ch.clone()), c));

    let role_breakdown = Role::ALL
        .iter()
        .map(|r| {
            let wl = role_records.get(r).copied().unwrap_or_default();
            RoleBreakdown {
                role: *r,
                count: wl.total,
                wins: wl.wins,
                win_rate: wl.win_rate,
            }
        })
        .collect();

    let ranked: Vec<CharacterStat> = character_records
        .into_entries()
        .into_iter()
        .filter(|(_, wl)| wl.total >= MIN_RANKED_MATCHES)
        .map(|(character, record)| CharacterStat { character, record })
        .collect();

    let mut best_character: Option<&CharacterStat> = None;
    let mut worst_character: Option<&CharacterStat> = None;
    for stat in &ranked {
        if best_character.map_or(true, |b| stat.record.win_rate > b.record.win_rate) {
            best_character = Some(stat);
        }
        if worst_character.map_or(true, |w| stat.record.win_rate < w.record.win_rate) {
            worst_character = Some(stat);
        }
    }

    PlayerStats {
        name: name.to_string(),
        matches: record.total,
        wins: record.wins,
        losses: record.losses,
        win_rate: record.win_rate,
        top_role,
        top_role_count,
        top_character,
        top_character_count,
        roles: role_breakdown,
        best_character: best_character.cloned(),
        worst_character: worst_character.cloned(),
        highscore: highscore.cloned(),
    }
}

/// Lineup sorted Tank, DPS, Support and by name within a role. Names
/// compare case-insensitively, with exact byte order breaking ties.
pub fn canonical_lineup(players: &[PlayerEntry]) -> Vec<LineupSlot> {
    let mut slots: Vec<LineupSlot> = players
        .iter()
        .map(|p| LineupSlot {
            role: p.role,
            name: p.name.clone(),
        })
        .collect();
    slots.sort_by(|a, b| {
        a.role
            .priority()
            .cmp(&b.role.priority())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
    slots
}

/// Group matches by exact lineup, in first-seen order.
///
/// Matches without players share the empty lineup.
pub fn combo_stats(matches: &[&MatchRecord]) -> Vec<ComboStat> {
    let mut groups: Groups<Vec<LineupSlot>, Vec<LineupSlot>> = Groups::new();
    for m in matches {
        let lineup = canonical_lineup(&m.players);
        groups.record(lineup.clone(), m.result.is_win(), || lineup);
    }
    groups
        .into_entries()
        .into_iter()
        .map(|(players, record)| ComboStat { players, record })
        .collect()
}

/// Top combos by win rate, descending. No minimum sample size.
pub fn best_combos(combos: &[ComboStat], limit: usize) -> Vec<ComboStat> {
    let mut sorted = combos.to_vec();
    sorted.sort_by(|a, b| b.record.win_rate.cmp(&a.record.win_rate));
    sorted.truncate(limit);
    sorted
}

/// Bottom combos by win rate, ascending. No minimum sample size.
pub fn worst_combos(combos: &[ComboStat], limit: usize) -> Vec<ComboStat> {
    let mut sorted = combos.to_vec();
    sorted.sort_by(|a, b| a.record.win_rate.cmp(&b.record.win_rate));
    sorted.truncate(limit);
    sorted
}

/// Every hero pick across all players, grouped by hero name.
pub fn hero_stats(matches: &[&MatchRecord]) -> Vec<HeroStat> {
    let mut groups: Groups<String, (String, Role)> = Groups::new();
    for m in matches {
        let win = m.result.is_win();
        for p in &m.players {
            if let Some(character) = p.played_character() {
                groups.record(character.to_string(), win, || (character.to_string(), p.role));
            }
        }
    }
    groups
        .into_entries()
        .into_iter()
        .map(|((character, role), record)| HeroStat {
            character,
            role,
            record,
        })
        .collect()
}

/// Heroes with enough matches, best win rate first, more matches first on ties.
pub fn best_heroes(heroes: &[HeroStat], limit: usize) -> Vec<HeroStat> {
    let mut ranked: Vec<HeroStat> = heroes
        .iter()
        .filter(|h| h.record.total >= MIN_RANKED_MATCHES)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        b.record
            .win_rate
            .cmp(&a.record.win_rate)
            .then_with(|| b.record.total.cmp(&a.record.total))
    });
    ranked.truncate(limit);
    ranked
}

/// Heroes with enough matches, worst win rate first, more matches first on ties.
pub fn worst_heroes(heroes: &[HeroStat], limit: usize) -> Vec<HeroStat> {
    let mut ranked: Vec<HeroStat> = heroes
        .iter()
        .filter(|h| h.record.total >= MIN_RANKED_MATCHES)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        a.record
            .win_rate
            .cmp(&b.record.win_rate)
            .then_with(|| b.record.total.cmp(&a.record.total))
    });
    ranked.truncate(limit);
    ranked
}

/// Overall totals plus one row per queue, queues in first-seen order.
pub fn mode_breakdown(matches: &[&MatchRecord]) -> ModeBreakdown {
    let mut groups: Groups<String, String> = Groups::new();
    for m in matches {
        groups.record(m.queue.clone(), m.result.is_win(), || m.queue.clone());
    }
    ModeBreakdown {
        overall: team_summary(matches),
        modes: groups
            .into_entries()
            .into_iter()
            .map(|(queue, record)| ModeStat { queue, record })
            .collect(),
    }
}

/// Totals per season, in season-table order.
///
/// Seasons missing from the table (caller-supplied labels) follow in
/// first-seen order.
pub fn season_breakdown(matches: &[&MatchRecord], table: &SeasonTable) -> Vec<SeasonStat> {
    let mut groups: Groups<String, String> = Groups::new();
    for m in matches {
        groups.record(m.season.clone(), m.result.is_win(), || m.season.clone());
    }
    let mut stats: Vec<SeasonStat> = groups
        .into_entries()
        .into_iter()
        .map(|(season, record)| SeasonStat {
            start: table.get(&season).map(|s| s.start),
            end: table.end_of(&season),
            season,
            record,
        })
        .collect();
    stats.sort_by_key(|s| table.position(&s.season).unwrap_or(usize::MAX));
    stats
}

/// Compute the whole dashboard.
///
/// The season filter narrows everything. The role filter then applies to
/// team, player and combo numbers; heroes and queues use the season-filtered
/// set, and the season breakdown always covers every match.
pub fn compute_dashboard(
    matches: &[MatchRecord],
    settings: &StatsSettings,
    seasons: &SeasonTable,
    query: &StatsQuery,
    now: DateTime<Utc>,
) -> Dashboard {
    let all: Vec<&MatchRecord> = matches.iter().collect();
    let in_season: Vec<&MatchRecord> = match query.season.as_deref() {
        Some(season) => all.iter().copied().filter(|m| m.season == season).collect(),
        None => all.clone(),
    };
    let role_filtered = filter_by_role(&in_season, query.role);

    let players = settings
        .roster
        .iter()
        .map(|name| player_stats(&role_filtered, name, query.role, &settings.special_queue))
        .collect();

    let combos = combo_stats(&role_filtered);
    let heroes = hero_stats(&in_season);

    Dashboard {
        role_filter: query.role,
        season_filter: query.season.clone(),
        computed_at: now,
        team: team_summary(&role_filtered),
        players,
        best_combos: best_combos(&combos, COMBO_LIST_LEN),
        worst_combos: worst_combos(&combos, COMBO_LIST_LEN),
        best_heroes: best_heroes(&heroes, HERO_LIST_LEN),
        worst_heroes: worst_heroes(&heroes, HERO_LIST_LEN),
        modes: mode_breakdown(&in_season),
        seasons: season_breakdown(&all, seasons),
    }
}

/// Column to sort a player's match history by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistorySortKey {
    #[default]
    Date,
    Result,
    Queue,
    Role,
}

impl FromStr for HistorySortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(Self::Date),
            "result" => Ok(Self::Result),
            "queue" => Ok(Self::Queue),
            "role" => Ok(Self::Role),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

/// One match from a single player's point of view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatchView {
    #[serde(flatten)]
    pub record: MatchRecord,
    pub player_role: Role,
    pub player_character: Option<String>,
}

/// Matches a player took part in (under `role`, if given), sorted.
pub fn player_history(
    matches: &[MatchRecord],
    name: &str,
    role: Option<Role>,
    key: HistorySortKey,
    direction: SortDirection,
) -> Vec<PlayerMatchView> {
    let mut views: Vec<PlayerMatchView> = matches
        .iter()
        .filter_map(|m| {
            let entry = m.player(name, role)?;
            Some(PlayerMatchView {
                player_role: entry.role,
                player_character: entry.played_character().map(str::to_string),
                record: m.clone(),
            })
        })
        .collect();

    views.sort_by(|a, b| {
        let ord = match key {
            HistorySortKey::Date => a.record.created_at.at().cmp(&b.record.created_at.at()),
            HistorySortKey::Result => a
                .record
                .result
                .to_string()
                .cmp(&b.record.result.to_string()),
            HistorySortKey::Queue => a.record.queue.cmp(&b.record.queue),
            HistorySortKey::Role => a.player_role.as_str().cmp(b.player_role.as_str()),
        };
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    views
}

/// Roster check used by the history endpoint.
pub fn in_roster(settings: &StatsSettings, name: &str) -> bool {
    settings.roster.iter().any(|n| n == name)
}
