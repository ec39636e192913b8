//! Seasons - time windows between consecutive season starts.
//!
//! A season has no stored end; it runs until the next entry's start date.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors building a season table.
#[derive(Debug, Error, PartialEq)]
pub enum SeasonTableError {
    #[error("season table is empty")]
    Empty,

    #[error("season {0:?} does not start after the previous season")]
    OutOfOrder(String),

    #[error("season label must not be empty")]
    BlankLabel,
}

/// One row of the season table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub label: String,
    pub start: NaiveDate,
}

impl Season {
    pub fn new(label: impl Into<String>, start: NaiveDate) -> Self {
        Self {
            label: label.into(),
            start,
        }
    }
}

/// Ordered (ascending by start) lookup table of seasons.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonTable {
    seasons: Vec<Season>,
}

/// Season starts as shipped; extend via config when a new season begins.
const BUILTIN_SEASONS: &[(&str, (i32, u32, u32))] = &[
    ("Season 1", (2022, 10, 4)),
    ("Season 2", (2022, 12, 6)),
    ("Season 3", (2023, 2, 7)),
    ("Season 4", (2023, 4, 11)),
    ("Season 5", (2023, 6, 13)),
    ("Season 6", (2023, 8, 10)),
    ("Season 7", (2023, 10, 10)),
    ("Season 8", (2023, 12, 5)),
    ("Season 9", (2024, 2, 13)),
    ("Season 10", (2024, 4, 16)),
    ("Season 11", (2024, 6, 20)),
    ("Season 12", (2024, 8, 20)),
    ("Season 13", (2024, 10, 15)),
    ("Season 14", (2024, 12, 10)),
    ("Season 15", (2025, 2, 18)),
    ("Season 16", (2025, 4, 22)),
    ("Season 17", (2025, 6, 24)),
    ("Season 18", (2025, 8, 26)),
    ("Season 19", (2025, 10, 14)),
];

/// The built-in season rows.
pub fn builtin_seasons() -> Vec<Season> {
    BUILTIN_SEASONS
        .iter()
        .filter_map(|(label, (y, m, d))| {
            NaiveDate::from_ymd_opt(*y, *m, *d).map(|start| Season::new(*label, start))
        })
        .collect()
}

impl SeasonTable {
    /// Build a table; rows must be non-empty and strictly ascending by start.
    pub fn new(seasons: Vec<Season>) -> Result<Self, SeasonTableError> {
        if seasons.is_empty() {
            return Err(SeasonTableError::Empty);
        }
        for (i, season) in seasons.iter().enumerate() {
            if season.label.trim().is_empty() {
                return Err(SeasonTableError::BlankLabel);
            }
            if i > 0 && season.start <= seasons[i - 1].start {
                return Err(SeasonTableError::OutOfOrder(season.label.clone()));
            }
        }
        Ok(Self { seasons })
    }

    /// Season label for a point in time.
    ///
    /// Scans from the latest season backwards and returns the first whose
    /// start is on or before `at`. Times before the first season clamp to it.
    pub fn resolve(&self, at: DateTime<Utc>) -> &str {
        let date = at.date_naive();
        self.seasons
            .iter()
            .rev()
            .find(|s| s.start <= date)
            .unwrap_or(&self.seasons[0])
            .label
            .as_str()
    }

    pub fn all(&self) -> &[Season] {
        &self.seasons
    }

    pub fn get(&self, label: &str) -> Option<&Season> {
        self.seasons.iter().find(|s| s.label == label)
    }

    /// Position in the table, used to order season buckets.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.seasons.iter().position(|s| s.label == label)
    }

    /// Last day of a season, `None` for the latest one.
    pub fn end_of(&self, label: &str) -> Option<NaiveDate> {
        let idx = self.position(label)?;
        self.seasons
            .get(idx + 1)
            .and_then(|next| next.start.pred_opt())
    }
}

impl Default for SeasonTable {
    fn default() -> Self {
        Self {
            seasons: builtin_seasons(),
        }
    }
}
