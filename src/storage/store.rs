//! The keyed record store.
//!
//! Four collections, each a JSONL file of row envelopes. Every mutation
//! loads the collection, changes it in memory and rewrites it atomically.
//! Mutations work on untyped payloads, so a stored row the current record
//! types cannot read is carried through a rewrite unchanged. A line that is
//! not a row envelope at all blocks rewrites of its collection.
//! Mutators take `&mut self` so callers sharing the store behind a lock
//! must hold the write half.

use std::fs;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::jsonl::{dedup_last_wins, JsonlReader, JsonlWriter, Row};
use super::{Collection, StorageConfig, StorageError};
use crate::models::{
    ArchiveLink, ImprovementTicket, MatchRecord, PlayerRank, RankKey, Timestamp,
};

/// The shared text pad. Last write wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scratchpad {
    pub content: String,
    pub updated_at: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    config: StorageConfig,
}

impl RecordStore {
    /// Open the store, creating its directories.
    pub fn open(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(config.collections_dir())?;
        fs::create_dir_all(config.state_dir())?;
        info!("Opened record store at {:?}", config.data_dir);
        Ok(Self { config })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<Row<T>>, StorageError> {
        let reader = JsonlReader::new(self.config.collection_path(collection));
        Ok(dedup_last_wins(reader.read_all()?))
    }

    /// Rows for a rewrite: untyped, and no line may be skipped.
    fn load_for_write(&self, collection: Collection) -> Result<Vec<Row<Value>>, StorageError> {
        let reader = JsonlReader::new(self.config.collection_path(collection));
        Ok(dedup_last_wins(reader.read_all_strict()?))
    }

    fn save<T: Serialize>(&self, collection: Collection, rows: &[Row<T>]) -> Result<usize, StorageError> {
        JsonlWriter::new(self.config.collection_path(collection)).write_all(rows)
    }

    /// Insert new ids, replace existing ones in place. One rewrite per call.
    fn upsert_rows<T: Serialize>(
        &mut self,
        collection: Collection,
        incoming: Vec<Row<T>>,
    ) -> Result<usize, StorageError> {
        if incoming.is_empty() {
            return Ok(0);
        }
        let mut rows = self.load_for_write(collection)?;
        let count = incoming.len();
        for row in incoming {
            let row = row.into_value()?;
            match rows.iter_mut().find(|r| r.id == row.id) {
                Some(existing) => *existing = row,
                None => rows.push(row),
            }
        }
        self.save(collection, &rows)?;
        Ok(count)
    }

    fn delete_row(&mut self, collection: Collection, id: &str) -> Result<bool, StorageError> {
        let mut rows = self.load_for_write(collection)?;
        let before = rows.len();
        rows.retain(|r| r.id.as_str() != id);
        if rows.len() == before {
            debug!("Delete of {} in {:?} matched nothing", id, collection);
            return Ok(false);
        }
        self.save(collection, &rows)?;
        info!("Deleted {} from {:?}", id, collection);
        Ok(true)
    }

    fn clear(&mut self, collection: Collection) -> Result<usize, StorageError> {
        let rows: Vec<Row<Value>> = self.load(collection)?;
        self.save::<Value>(collection, &[])?;
        info!("Cleared {} rows from {:?}", rows.len(), collection);
        Ok(rows.len())
    }

    // Matches

    /// All matches, newest first.
    pub fn list_matches(&self) -> Result<Vec<MatchRecord>, StorageError> {
        let mut matches: Vec<MatchRecord> = self
            .load::<MatchRecord>(Collection::Matches)?
            .into_iter()
            .map(|r| r.payload)
            .collect();
        matches.sort_by(|a, b| b.created_at.at().cmp(&a.created_at.at()));
        Ok(matches)
    }

    pub fn upsert_match(&mut self, record: &MatchRecord) -> Result<(), StorageError> {
        self.upsert_matches(vec![record.clone()])?;
        info!("Stored match {}", record.id);
        Ok(())
    }

    /// Batch upsert; the collection is rewritten once.
    pub fn upsert_matches(&mut self, records: Vec<MatchRecord>) -> Result<usize, StorageError> {
        let rows = records.into_iter().map(match_row).collect();
        self.upsert_rows(Collection::Matches, rows)
    }

    pub fn delete_match(&mut self, id: &str) -> Result<bool, StorageError> {
        self.delete_row(Collection::Matches, id)
    }

    pub fn delete_all_matches(&mut self) -> Result<usize, StorageError> {
        self.clear(Collection::Matches)
    }

    // Improvement tickets

    /// Open tickets first, newest first within each group.
    pub fn list_tickets(&self) -> Result<Vec<ImprovementTicket>, StorageError> {
        let mut tickets: Vec<ImprovementTicket> = self
            .load::<ImprovementTicket>(Collection::Improvements)?
            .into_iter()
            .map(|r| r.payload)
            .collect();
        tickets.sort_by(|a, b| {
            a.completed
                .cmp(&b.completed)
                .then_with(|| b.created_at.at().cmp(&a.created_at.at()))
        });
        Ok(tickets)
    }

    pub fn upsert_ticket(&mut self, ticket: &ImprovementTicket) -> Result<(), StorageError> {
        self.upsert_tickets(vec![ticket.clone()])?;
        info!("Stored ticket {}", ticket.id);
        Ok(())
    }

    pub fn upsert_tickets(&mut self, tickets: Vec<ImprovementTicket>) -> Result<usize, StorageError> {
        let rows = tickets.into_iter().map(ticket_row).collect();
        self.upsert_rows(Collection::Improvements, rows)
    }

    /// Toggle completion. `None` when the id is unknown.
    pub fn set_ticket_completed(
        &mut self,
        id: &str,
        completed: bool,
        now: Timestamp,
    ) -> Result<Option<ImprovementTicket>, StorageError> {
        let mut rows = self.load_for_write(Collection::Improvements)?;
        let Some(row) = rows.iter_mut().find(|r| r.id.as_str() == id) else {
            return Ok(None);
        };
        let mut ticket: ImprovementTicket = serde_json::from_value(row.payload.clone())?;
        ticket.set_completed(completed, now);
        row.payload = serde_json::to_value(&ticket)?;
        self.save(Collection::Improvements, &rows)?;
        info!("Ticket {} completed={}", id, completed);
        Ok(Some(ticket))
    }

    pub fn delete_ticket(&mut self, id: &str) -> Result<bool, StorageError> {
        self.delete_row(Collection::Improvements, id)
    }

    pub fn delete_all_tickets(&mut self) -> Result<usize, StorageError> {
        self.clear(Collection::Improvements)
    }

    // Archive links

    /// All links, newest first.
    pub fn list_links(&self) -> Result<Vec<ArchiveLink>, StorageError> {
        let mut links: Vec<ArchiveLink> = self
            .load::<ArchiveLink>(Collection::ArchiveLinks)?
            .into_iter()
            .map(|r| r.payload)
            .collect();
        links.sort_by(|a, b| b.created_at.at().cmp(&a.created_at.at()));
        Ok(links)
    }

    pub fn upsert_link(&mut self, link: &ArchiveLink) -> Result<(), StorageError> {
        let row = Row::new(link.id.clone(), link.clone()).with_created_at(link.created_at.clone());
        self.upsert_rows(Collection::ArchiveLinks, vec![row])?;
        info!("Stored archive link {}", link.id);
        Ok(())
    }

    pub fn delete_link(&mut self, id: &str) -> Result<bool, StorageError> {
        self.delete_row(Collection::ArchiveLinks, id)
    }

    pub fn delete_all_links(&mut self) -> Result<usize, StorageError> {
        self.clear(Collection::ArchiveLinks)
    }

    // Player ranks

    /// Ranks recorded for one season, ordered by player, queue and role.
    pub fn list_ranks(&self, season: &str) -> Result<Vec<PlayerRank>, StorageError> {
        let mut ranks: Vec<PlayerRank> = self
            .load::<PlayerRank>(Collection::PlayerRanks)?
            .into_iter()
            .filter(|r| r.season.as_deref() == Some(season))
            .map(|r| r.payload)
            .collect();
        ranks.sort_by(|a, b| {
            a.player
                .cmp(&b.player)
                .then_with(|| a.queue.cmp(&b.queue))
                .then_with(|| a.role.priority().cmp(&b.role.priority()))
        });
        Ok(ranks)
    }

    /// Write the rank for a key.
    ///
    /// An existing row only has its rank replaced, and only when `rank` is
    /// given. A new row starts with an empty rank if none is given.
    pub fn upsert_rank(&mut self, key: RankKey, rank: Option<String>) -> Result<PlayerRank, StorageError> {
        let id = key.row_id();
        let mut rows = self.load_for_write(Collection::PlayerRanks)?;
        let stored = match rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                let mut entry: PlayerRank = serde_json::from_value(row.payload.clone())?;
                if let Some(rank) = rank {
                    entry.rank = rank;
                    row.payload = serde_json::to_value(&entry)?;
                }
                entry
            }
            None => {
                let entry = PlayerRank {
                    player: key.player,
                    season: key.season,
                    queue: key.queue,
                    role: key.role,
                    rank: rank.unwrap_or_default(),
                };
                rows.push(
                    Row::new(id, serde_json::to_value(&entry)?).with_season(entry.season.clone()),
                );
                entry
            }
        };
        self.save(Collection::PlayerRanks, &rows)?;
        info!(
            "Rank for {} {} {} {} set to {:?}",
            stored.player, stored.season, stored.queue, stored.role, stored.rank
        );
        Ok(stored)
    }

    // Scratchpad

    pub fn scratchpad(&self) -> Result<Scratchpad, StorageError> {
        let path = self.config.scratchpad_path();
        if !path.exists() {
            return Ok(Scratchpad::default());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save_scratchpad(&mut self, content: String, now: Timestamp) -> Result<Scratchpad, StorageError> {
        let pad = Scratchpad {
            content,
            updated_at: Some(now),
        };
        let path = self.config.scratchpad_path();
        let mut temp = path.clone().into_os_string();
        temp.push(".tmp");
        fs::write(&temp, serde_json::to_vec_pretty(&pad)?)?;
        fs::rename(&temp, &path)?;
        debug!("Saved scratchpad ({} bytes)", pad.content.len());
        Ok(pad)
    }
}

fn match_row(record: MatchRecord) -> Row<MatchRecord> {
    Row::new(record.id.clone(), record.clone())
        .with_created_at(record.created_at.clone())
        .with_season(record.season)
}

fn ticket_row(ticket: ImprovementTicket) -> Row<ImprovementTicket> {
    let created_at = ticket.created_at.clone();
    Row::new(ticket.id.clone(), ticket).with_created_at(created_at)
}
