//! JSONL (JSON Lines) storage.
//!
//! Every collection file holds one row envelope per line: the indexed
//! columns (`id`, `createdAt`, `season`) beside the record payload.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::StorageError;
use crate::models::{RecordId, Timestamp};

/// One stored line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row<T> {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    pub payload: T,
}

impl<T> Row<T> {
    pub fn new(id: RecordId, payload: T) -> Self {
        Self {
            id,
            created_at: None,
            season: None,
            payload,
        }
    }

    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }
}

impl<T: Serialize> Row<T> {
    /// The same row with an untyped payload.
    pub fn into_value(self) -> Result<Row<Value>, serde_json::Error> {
        Ok(Row {
            id: self.id,
            created_at: self.created_at,
            season: self.season,
            payload: serde_json::to_value(self.payload)?,
        })
    }
}

/// Keep the last row for every id, at the position of that last row.
pub fn dedup_last_wins<T>(rows: Vec<Row<T>>) -> Vec<Row<T>> {
    let mut seen = std::collections::HashSet::new();
    let mut kept: Vec<Row<T>> = rows
        .into_iter()
        .rev()
        .filter(|row| seen.insert(row.id.clone()))
        .collect();
    kept.reverse();
    kept
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf, StorageError> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| StorageError::InvalidPath(self.path.display().to_string()))?;
        let mut temp: OsString = name.to_os_string();
        temp.push(".tmp");
        Ok(self.path.with_file_name(temp))
    }

    /// Replace the whole file.
    ///
    /// Lines go to a sibling temp file that is renamed over the target, so
    /// readers see either the old contents or the new ones.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;
        let temp = self.temp_path()?;

        let result = (|| -> Result<usize, StorageError> {
            let file = File::create(&temp)?;
            let mut writer = BufWriter::new(file);
            let mut count = 0;

            for entity in entities {
                let json = serde_json::to_string(entity)?;
                writeln!(writer, "{}", json)?;
                count += 1;
            }

            writer.flush()?;
            writer.get_ref().sync_all()?;
            Ok(count)
        })();

        match result {
            Ok(count) => {
                fs::rename(&temp, &self.path)?;
                debug!("Wrote {} rows to {:?}", count, self.path);
                Ok(count)
            }
            Err(e) => {
                let _ = fs::remove_file(&temp);
                Err(e)
            }
        }
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all entities from the file, skipping lines that do not parse.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        self.read(false)
    }

    /// Read all entities, failing on the first line that does not parse.
    ///
    /// Used before a rewrite, which would otherwise drop the bad line.
    pub fn read_all_strict(&self) -> Result<Vec<T>, StorageError> {
        self.read(true)
    }

    fn read(&self, strict: bool) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(_) if strict => {
                    return Err(StorageError::Corrupt {
                        path: self.path.display().to_string(),
                        line: idx + 1,
                    });
                }
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        idx + 1,
                        self.path,
                        e
                    );
                }
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Note {
        text: String,
    }

    fn row(id: &str, text: &str) -> Row<Note> {
        Row::new(
            RecordId::from(id),
            Note {
                text: text.to_string(),
            },
        )
    }

    #[test]
    fn test_jsonl_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.jsonl");

        let rows = vec![
            row("1", "first").with_season("Season 3"),
            row("2", "second")
                .with_created_at(Timestamp::parse("2024-01-01T10:00:00Z").unwrap()),
        ];

        let writer: JsonlWriter<Row<Note>> = JsonlWriter::new(path.clone());
        assert_eq!(writer.write_all(&rows).unwrap(), 2);

        let reader: JsonlReader<Row<Note>> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap(), rows);
    }

    #[test]
    fn test_row_envelope_shape() {
        let line = serde_json::to_value(
            row("a", "x").with_created_at(Timestamp::parse("2024-01-01T10:00:00Z").unwrap()),
        )
        .unwrap();
        assert_eq!(
            line,
            serde_json::json!({
                "id": "a",
                "createdAt": "2024-01-01T10:00:00Z",
                "payload": {"text": "x"}
            })
        );
    }

    #[test]
    fn test_jsonl_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let reader: JsonlReader<Row<Note>> =
            JsonlReader::new(temp_dir.path().join("nonexistent.jsonl"));
        assert!(!reader.exists());
        assert!(reader.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_write_all_overwrites_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("overwrite.jsonl");

        let writer: JsonlWriter<Row<Note>> = JsonlWriter::new(path.clone());
        writer.write_all(&[row("1", "old")]).unwrap();
        writer.write_all(&[row("2", "new"), row("3", "newer")]).unwrap();

        let reader: JsonlReader<Row<Note>> = JsonlReader::new(path.clone());
        let read = reader.read_all().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].payload.text, "new");

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_read_all_skips_bad_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad_lines.jsonl");

        std::fs::write(
            &path,
            r#"{"id":"1","payload":{"text":"good"}}
not-valid-json

{"id":"2","payload":{"text":"also good"}}
"#,
        )
        .unwrap();

        let reader: JsonlReader<Row<Note>> = JsonlReader::new(path);
        let rows = reader.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].payload.text, "also good");

        match reader.read_all_strict() {
            Err(StorageError::Corrupt { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected a corrupt line error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_value_keeps_envelope() {
        let typed = row("a", "x").with_season("Season 3");
        let untyped = typed.into_value().unwrap();
        assert_eq!(untyped.id.as_str(), "a");
        assert_eq!(untyped.season.as_deref(), Some("Season 3"));
        assert_eq!(untyped.payload, serde_json::json!({"text": "x"}));
    }

    #[test]
    fn test_dedup_last_wins() {
        let rows = vec![row("a", "one"), row("b", "two"), row("a", "three")];
        let kept = dedup_last_wins(rows);
        let texts: Vec<&str> = kept.iter().map(|r| r.payload.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }
}
