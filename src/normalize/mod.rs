//! Write-time validation and defaulting.
//!
//! Validation rejects drafts missing a required field. Normalization then
//! fills `createdAt`, `season` and completion state without touching any
//! field the writer set.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::vocabulary::{characters_for, RankLadder};
use crate::models::{
    is_truthy, ArchiveLink, ImprovementTicket, LinkDraft, MatchDraft, MatchRecord, RankKey,
    RankUpdate, SeasonTable, TicketDraft, Timestamp,
};

/// Reasons a draft is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("payload is missing")]
    EmptyPayload,

    #[error("{0} id is missing")]
    MissingId(&'static str),

    #[error("title is required")]
    MissingTitle,

    #[error("url is required")]
    MissingUrl,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("url is not valid: {0}")]
    InvalidUrl(String),

    #[error("invalid payload: {0}")]
    Malformed(String),
}

/// Queue names that pick a rank ladder.
#[derive(Debug, Clone)]
pub struct QueueNames {
    pub ranked: String,
    pub special: String,
}

impl QueueNames {
    pub fn ladder_for(&self, queue: &str) -> Option<RankLadder> {
        if queue == self.ranked {
            Some(RankLadder::Competitive)
        } else if queue == self.special {
            Some(RankLadder::Stadium)
        } else {
            None
        }
    }
}

impl Default for QueueNames {
    fn default() -> Self {
        Self {
            ranked: "Rangliste".to_string(),
            special: "Stadion".to_string(),
        }
    }
}

pub fn validate_match(draft: &MatchDraft) -> Result<(), ValidationError> {
    if draft.id.is_blank() {
        return Err(ValidationError::MissingId("match"));
    }
    Ok(())
}

pub fn validate_ticket(draft: &TicketDraft) -> Result<(), ValidationError> {
    if draft.id.is_blank() {
        return Err(ValidationError::MissingId("ticket"));
    }
    if draft.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    Ok(())
}

pub fn validate_link(draft: &LinkDraft) -> Result<(), ValidationError> {
    if draft.id.is_blank() {
        return Err(ValidationError::MissingId("archive link"));
    }
    if draft.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    let url = draft.url.trim();
    if url.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;
    Ok(())
}

/// Check a rank write and return its key.
pub fn validate_rank_update(update: &RankUpdate) -> Result<RankKey, ValidationError> {
    if update.player.trim().is_empty() {
        return Err(ValidationError::MissingField("player"));
    }
    if update.season.trim().is_empty() {
        return Err(ValidationError::MissingField("season"));
    }
    if update.queue.trim().is_empty() {
        return Err(ValidationError::MissingField("queue"));
    }
    let role = update.role.ok_or(ValidationError::MissingField("role"))?;
    Ok(RankKey {
        player: update.player.clone(),
        season: update.season.clone(),
        queue: update.queue.clone(),
        role,
    })
}

/// Fill `createdAt` and `season`.
///
/// The season is looked up from `createdAt`, which itself defaults to `now`.
pub fn normalize_match(draft: MatchDraft, now: DateTime<Utc>, seasons: &SeasonTable) -> MatchRecord {
    let created_at = draft
        .created_at
        .unwrap_or_else(|| Timestamp::from_datetime(now));
    let season = draft
        .season
        .unwrap_or_else(|| seasons.resolve(created_at.at()).to_string());

    MatchRecord {
        id: draft.id,
        queue: draft.queue,
        result: draft.result,
        rank: draft.rank,
        map: draft.map,
        score: draft.score,
        season,
        players: draft.players,
        created_at,
        extra: draft.extra,
    }
}

/// Note ranks and heroes outside the known vocabulary. Never rejects.
pub fn log_vocabulary_gaps(record: &MatchRecord, queues: &QueueNames) {
    if let (Some(rank), Some(ladder)) = (record.rank(), queues.ladder_for(&record.queue)) {
        if !rank.trim().is_empty() && !ladder.contains(rank) {
            debug!(
                "Match {} has rank {:?} outside the {} ladder",
                record.id, rank, record.queue
            );
        }
    }
    for player in &record.players {
        if let Some(character) = player.played_character() {
            if !characters_for(player.role).contains(&character) {
                debug!(
                    "Match {}: {} played unknown {} hero {:?}",
                    record.id, player.name, player.role, character
                );
            }
        }
    }
}

/// Fill `createdAt`, coerce `completed`, and derive `completedAt`.
///
/// An open ticket always ends with `completedAt = null`, even if the writer
/// sent a stale stamp.
pub fn normalize_ticket(draft: TicketDraft, now: DateTime<Utc>) -> ImprovementTicket {
    let completed = is_truthy(&draft.completed);
    let completed_at = if completed {
        Some(
            draft
                .completed_at
                .unwrap_or_else(|| Timestamp::from_datetime(now)),
        )
    } else {
        None
    };

    ImprovementTicket {
        id: draft.id,
        title: draft.title,
        description: draft.description,
        created_at: draft
            .created_at
            .unwrap_or_else(|| Timestamp::from_datetime(now)),
        completed,
        completed_at,
    }
}

pub fn normalize_link(draft: LinkDraft, now: DateTime<Utc>) -> ArchiveLink {
    ArchiveLink {
        id: draft.id,
        title: draft.title,
        url: draft.url,
        description: draft.description,
        created_at: draft
            .created_at
            .unwrap_or_else(|| Timestamp::from_datetime(now)),
    }
}
