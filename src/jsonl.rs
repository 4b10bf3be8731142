// JSONL file operations

use eyre::{Context, Result};
use fs2::FileExt;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Append records to a JSONL file under an exclusive lock
///
/// All lines land in a single locked write, so a batch is either fully
/// appended or the call fails before anything is flushed.
pub fn append_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut buf = String::new();
    for record in records {
        buf.push_str(&serde_json::to_string(record).context("Failed to serialize record")?);
        buf.push('\n');
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open JSONL file for appending")?;

    file.lock_exclusive().context("Failed to acquire file lock")?;

    file.write_all(buf.as_bytes())?;
    file.sync_all()?; // Ensure data is flushed to disk

    debug!(file = ?path, count = records.len(), "Appended JSONL lines");

    // Lock is automatically released when file is dropped
    Ok(())
}

/// Read all records from a JSONL file, returning latest version per ID
///
/// For records with duplicate IDs, the one with the highest updated_at wins.
/// On equal timestamps the later line wins, so a tombstone written in the
/// same millisecond as the record still deletes it.
pub fn read_jsonl_latest<T>(path: &Path) -> Result<HashMap<String, T>>
where
    T: DeserializeOwned + HasId + HasUpdatedAt,
{
    if !path.exists() {
        // File doesn't exist yet, return empty map
        return Ok(HashMap::new());
    }

    let file = File::open(path).context("Failed to open JSONL file")?;
    let reader = BufReader::new(file);
    let mut records: HashMap<String, T> = HashMap::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to read line, skipping"
                );
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let record: T = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    file = ?path,
                    line = line_num + 1,
                    error = ?e,
                    "Failed to parse JSON, skipping"
                );
                continue;
            }
        };

        let Some(id) = record.id() else {
            warn!(file = ?path, line = line_num + 1, "Line has no id, skipping");
            continue;
        };
        let updated_at = record.updated_at();

        match records.get(&id) {
            Some(existing) if updated_at < existing.updated_at() => {}
            _ => {
                records.insert(id, record);
            }
        }
    }

    info!(
        file = ?path,
        count = records.len(),
        "Loaded latest records from JSONL"
    );

    Ok(records)
}

/// Trait for types that carry a record ID
pub trait HasId {
    fn id(&self) -> Option<String>;
}

/// Trait for types that have an updated_at timestamp
pub trait HasUpdatedAt {
    fn updated_at(&self) -> i64;
}

impl HasId for Value {
    fn id(&self) -> Option<String> {
        self.get("id").and_then(Value::as_str).map(str::to_string)
    }
}

impl HasUpdatedAt for Value {
    fn updated_at(&self) -> i64 {
        self.get("updated_at").and_then(Value::as_i64).unwrap_or(0)
    }
}

/// True for the `{"id": .., "deleted": true}` lines written on delete
pub fn is_tombstone(value: &Value) -> bool {
    value.get("deleted").and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_append_jsonl() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("assets.jsonl");

        let asset = json!({"id": "a-1", "name": "Mixer", "status": "InUse", "updated_at": 1000});
        append_jsonl(&jsonl_path, &[asset]).unwrap();

        let content = fs::read_to_string(&jsonl_path).unwrap();
        assert!(content.contains("\"id\":\"a-1\""));
        assert!(content.contains("\"name\":\"Mixer\""));
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_append_batch_writes_one_line_each() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("assets.jsonl");

        let tombstones: Vec<Value> = ["a", "b", "c"]
            .iter()
            .map(|id| json!({"id": id, "deleted": true, "updated_at": 5}))
            .collect();
        append_jsonl(&jsonl_path, &tombstones).unwrap();

        let content = fs::read_to_string(&jsonl_path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_read_jsonl_latest() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("assets.jsonl");

        append_jsonl(&jsonl_path, &[json!({"id": "a-1", "name": "Version 1", "updated_at": 1000})]).unwrap();
        append_jsonl(&jsonl_path, &[json!({"id": "a-1", "name": "Version 2", "updated_at": 2000})]).unwrap();

        let records: HashMap<String, Value> = read_jsonl_latest(&jsonl_path).unwrap();
        assert_eq!(records.len(), 1);

        let latest = &records["a-1"];
        assert_eq!(latest["name"], "Version 2");
        assert_eq!(latest.updated_at(), 2000);
    }

    #[test]
    fn test_tombstone_with_same_timestamp_wins() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("assets.jsonl");

        append_jsonl(&jsonl_path, &[json!({"id": "a-1", "name": "Mixer", "updated_at": 1000})]).unwrap();
        append_jsonl(&jsonl_path, &[json!({"id": "a-1", "deleted": true, "updated_at": 1000})]).unwrap();

        let records: HashMap<String, Value> = read_jsonl_latest(&jsonl_path).unwrap();
        assert!(is_tombstone(&records["a-1"]));
    }

    #[test]
    fn test_read_jsonl_nonexistent_file() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("nonexistent.jsonl");

        let records: HashMap<String, Value> = read_jsonl_latest(&jsonl_path).unwrap();
        assert_eq!(records.len(), 0);
    }

    #[test]
    fn test_read_jsonl_malformed_line() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("assets.jsonl");

        // Valid record, malformed line, record without id, another valid record
        fs::write(
            &jsonl_path,
            r#"{"id":"a-1","name":"Valid","updated_at":1000}
{malformed json}
{"name":"No id","updated_at":1000}
{"id":"a-2","name":"Also Valid","updated_at":1000}
"#,
        )
        .unwrap();

        let records: HashMap<String, Value> = read_jsonl_latest(&jsonl_path).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.contains_key("a-1"));
        assert!(records.contains_key("a-2"));
    }
}
