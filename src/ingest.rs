//! Bulk import and export of match data.
//!
//! An import file is either a bare array of matches or an object with a
//! `matches` array and an optional `improvements` array (the export shape).
//! Entries that fail validation are skipped without being reported; only
//! the count of accepted entries comes back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{ImprovementTicket, MatchDraft, MatchRecord, SeasonTable, TicketDraft, Timestamp};
use crate::normalize::{
    normalize_match, normalize_ticket, validate_match, validate_ticket, ValidationError,
};
use crate::storage::{RecordStore, StorageError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import file must be an array of matches or an object with a matches array")]
    InvalidBundle,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Raw entries pulled out of an import file.
#[derive(Debug, Default)]
pub struct ImportBundle {
    pub matches: Vec<Value>,
    pub improvements: Vec<Value>,
}

impl ImportBundle {
    pub fn parse(value: Value) -> Result<Self, ImportError> {
        match value {
            Value::Array(matches) => Ok(Self {
                matches,
                improvements: Vec::new(),
            }),
            Value::Object(mut map) => {
                let matches = match map.remove("matches") {
                    Some(Value::Array(items)) => items,
                    _ => return Err(ImportError::InvalidBundle),
                };
                let improvements = match map.remove("improvements") {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                };
                Ok(Self {
                    matches,
                    improvements,
                })
            }
            _ => Err(ImportError::InvalidBundle),
        }
    }
}

/// Accepted entry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    pub improvements_imported: usize,
}

/// What `GET /api/matches/export` and `export` write out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub exported_at: Timestamp,
    pub matches: Vec<MatchRecord>,
    pub improvements: Vec<ImprovementTicket>,
}

impl ExportBundle {
    pub fn collect(store: &RecordStore, now: DateTime<Utc>) -> Result<Self, StorageError> {
        Ok(Self {
            exported_at: Timestamp::from_datetime(now),
            matches: store.list_matches()?,
            improvements: store.list_tickets()?,
        })
    }
}

fn match_from_value(value: Value) -> Result<MatchDraft, ValidationError> {
    let draft: MatchDraft =
        serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    validate_match(&draft)?;
    Ok(draft)
}

fn ticket_from_value(value: Value) -> Result<TicketDraft, ValidationError> {
    let draft: TicketDraft =
        serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    validate_ticket(&draft)?;
    Ok(draft)
}

/// Validate and normalize match entries, dropping the ones that fail.
pub fn prepare_matches(entries: Vec<Value>, now: DateTime<Utc>, seasons: &SeasonTable) -> Vec<MatchRecord> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match match_from_value(value) {
            Ok(draft) => Some(normalize_match(draft, now, seasons)),
            Err(e) => {
                debug!("Skipping match entry {}: {}", idx, e);
                None
            }
        })
        .collect()
}

/// Validate and normalize ticket entries, dropping the ones that fail.
pub fn prepare_tickets(entries: Vec<Value>, now: DateTime<Utc>) -> Vec<ImprovementTicket> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match ticket_from_value(value) {
            Ok(draft) => Some(normalize_ticket(draft, now)),
            Err(e) => {
                debug!("Skipping improvement entry {}: {}", idx, e);
                None
            }
        })
        .collect()
}

/// Import tickets in one write.
pub fn import_tickets(
    store: &mut RecordStore,
    entries: Vec<Value>,
    now: DateTime<Utc>,
) -> Result<usize, StorageError> {
    let tickets = prepare_tickets(entries, now);
    store.upsert_tickets(tickets)
}

/// Import a whole bundle. Each collection is written once; there is no
/// atomicity across the two.
pub fn import_bundle(
    store: &mut RecordStore,
    bundle: ImportBundle,
    now: DateTime<Utc>,
    seasons: &SeasonTable,
) -> Result<ImportReport, ImportError> {
    let offered = (bundle.matches.len(), bundle.improvements.len());

    let matches = prepare_matches(bundle.matches, now, seasons);
    let imported = store.upsert_matches(matches)?;
    let improvements_imported = import_tickets(store, bundle.improvements, now)?;

    info!(
        "Imported {}/{} matches and {}/{} improvements",
        imported, offered.0, improvements_imported, offered.1
    );
    Ok(ImportReport {
        imported,
        improvements_imported,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageConfig;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn open_store(temp_dir: &TempDir) -> RecordStore {
        RecordStore::open(StorageConfig::new(temp_dir.path().to_path_buf())).unwrap()
    }

    #[test]
    fn test_parse_bare_array() {
        let bundle = ImportBundle::parse(json!([{"id": "a"}, {"id": "b"}])).unwrap();
        assert_eq!(bundle.matches.len(), 2);
        assert!(bundle.improvements.is_empty());
    }

    #[test]
    fn test_parse_export_shape() {
        let bundle = ImportBundle::parse(json!({
            "exportedAt": "2024-05-01T12:00:00.000Z",
            "matches": [{"id": "a"}],
            "improvements": [{"id": "t", "title": "x"}]
        }))
        .unwrap();
        assert_eq!(bundle.matches.len(), 1);
        assert_eq!(bundle.improvements.len(), 1);
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(matches!(
            ImportBundle::parse(json!({"improvements": []})),
            Err(ImportError::InvalidBundle)
        ));
        assert!(matches!(
            ImportBundle::parse(json!("matches")),
            Err(ImportError::InvalidBundle)
        ));
    }

    #[test]
    fn test_ticket_import_counts_only_valid_entries() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);

        let count = import_tickets(
            &mut store,
            vec![json!({"id": "a", "title": "x"}), json!({"id": "", "title": "y"})],
            now(),
        )
        .unwrap();

        // The rejected entry is not reported anywhere, only left out of the count.
        assert_eq!(count, 1);
        let tickets = store.list_tickets().unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id.as_str(), "a");
        assert!(!tickets[0].completed);
    }

    #[test]
    fn test_import_bundle_normalizes_and_skips() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let seasons = SeasonTable::default();

        let bundle = ImportBundle::parse(json!({
            "matches": [
                {"id": "m1", "queue": "Rangliste", "result": "Win",
                 "players": [{"id": "p1", "name": "Pudel", "role": "Tank"}]},
                {"queue": "Rangliste", "result": "Lose"},
                {"id": "m2", "result": "Maybe"},
                {"id": "m3", "queue": "Stadion", "result": "Lose",
                 "createdAt": "2023-01-10T20:00:00Z", "score": 2100}
            ],
            "improvements": [{"id": "t1", "title": "Warm up", "completed": 1}]
        }))
        .unwrap();

        let report = import_bundle(&mut store, bundle, now(), &seasons).unwrap();
        assert_eq!(
            report,
            ImportReport {
                imported: 2,
                improvements_imported: 1
            }
        );

        let matches = store.list_matches().unwrap();
        assert_eq!(matches.len(), 2);
        let m1 = matches.iter().find(|m| m.id.as_str() == "m1").unwrap();
        assert_eq!(m1.season, "Season 10");
        assert_eq!(m1.created_at.as_str(), "2024-05-01T12:00:00.000Z");
        let m3 = matches.iter().find(|m| m.id.as_str() == "m3").unwrap();
        assert_eq!(m3.season, "Season 2");

        let tickets = store.list_tickets().unwrap();
        assert!(tickets[0].completed);
        assert!(tickets[0].completed_at.is_some());
    }

    #[test]
    fn test_import_replaces_existing_ids() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let seasons = SeasonTable::default();

        for result in ["Win", "Lose"] {
            let bundle = ImportBundle::parse(json!([
                {"id": "m1", "queue": "Rangliste", "result": result}
            ]))
            .unwrap();
            import_bundle(&mut store, bundle, now(), &seasons).unwrap();
        }

        let matches = store.list_matches().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].result.to_string(), "Lose");
    }

    #[test]
    fn test_export_collects_both_collections() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        import_tickets(&mut store, vec![json!({"id": "t1", "title": "x"})], now()).unwrap();

        let export = ExportBundle::collect(&store, now()).unwrap();
        assert_eq!(export.exported_at.as_str(), "2024-05-01T12:00:00.000Z");
        assert!(export.matches.is_empty());
        assert_eq!(export.improvements.len(), 1);
    }
}
