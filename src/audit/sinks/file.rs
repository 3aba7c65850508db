//! Append-only JSONL file sink.
//!
//! Each line holds one record and the SHA3-256 checksum of its serialized
//! form. Reads recompute the checksum, so edits to the file show up as
//! verification failures.

use crate::audit::config::validate_destination;
use crate::audit::filter::RecordFilter;
use crate::audit::record::{AuditRecord, RecordId};
use crate::audit::sink::{AuditSink, SinkKind, VerificationResult};
use crate::core::{Hash256, SinkError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One line of the audit file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// The record as written
    pub record: AuditRecord,
    /// Hex SHA3-256 of the serialized record
    pub checksum: String,
}

impl StoredRecord {
    fn seal(record: &AuditRecord) -> Result<Self, SinkError> {
        let checksum = record
            .checksum()
            .map_err(|e| SinkError::Serialization(e.to_string()))?;
        Ok(Self {
            record: record.clone(),
            checksum: checksum.to_hex(),
        })
    }

    /// Whether the stored checksum matches the record content.
    pub fn is_intact(&self) -> bool {
        let Ok(expected) = Hash256::from_hex(&self.checksum) else {
            return false;
        };
        matches!(self.record.checksum(), Ok(actual) if actual == expected)
    }
}

/// Sink appending records to `<dir>/<destination>.jsonl`.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    destination: String,
    write_lock: Mutex<()>,
}

impl FileSink {
    /// Open the sink for a destination, creating the directory if needed.
    ///
    /// The destination must be a plain table name; anything that would
    /// resolve outside `dir` is rejected.
    pub async fn open(dir: impl AsRef<Path>, destination: &str) -> Result<Self, SinkError> {
        validate_destination(destination).map_err(|e| SinkError::Rejected(e.to_string()))?;
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;
        Ok(Self {
            path: dir.join(format!("{}.jsonl", destination)),
            destination: destination.to_string(),
            write_lock: Mutex::new(()),
        })
    }

    /// Sink over an existing file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let destination = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            destination,
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the audit file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Destination name the file was opened for.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Read every stored line, oldest first.
    ///
    /// A missing file reads as empty. Blank lines are skipped.
    pub async fn read_all(&self) -> Result<Vec<StoredRecord>, SinkError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut stored = Vec::new();
        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: StoredRecord = serde_json::from_str(line).map_err(|e| {
                SinkError::Serialization(format!(
                    "failed to parse audit record at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            stored.push(entry);
        }

        Ok(stored)
    }

    /// Records matching a filter, oldest first.
    pub async fn query(&self, filter: &RecordFilter) -> Result<Vec<AuditRecord>, SinkError> {
        let stored = self.read_all().await?;
        Ok(filter.apply(stored.iter().map(|s| &s.record)))
    }

    /// Check a stored record's checksum.
    pub async fn verify(&self, id: &RecordId) -> Result<VerificationResult, SinkError> {
        let stored = self.read_all().await?;
        let result = match stored.iter().find(|s| &s.record.id == id) {
            None => VerificationResult::invalid(id.clone(), "Record not found"),
            Some(entry) if entry.is_intact() => VerificationResult::valid(id.clone()),
            Some(_) => VerificationResult::invalid(id.clone(), "Checksum mismatch"),
        };
        Ok(result)
    }

    /// Check every stored record.
    pub async fn verify_all(&self) -> Result<Vec<VerificationResult>, SinkError> {
        let stored = self.read_all().await?;
        Ok(stored
            .iter()
            .map(|entry| {
                if entry.is_intact() {
                    VerificationResult::valid(entry.record.id.clone())
                } else {
                    VerificationResult::invalid(entry.record.id.clone(), "Checksum mismatch")
                }
            })
            .collect())
    }
}

#[async_trait]
impl AuditSink for FileSink {
    async fn put(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(&StoredRecord::seal(record)?)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SinkError::Write {
                destination: self.destination.clone(),
                message: format!("failed to open {}: {}", self.path.display(), e),
            })?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    fn kind(&self) -> SinkKind {
        SinkKind::File
    }

    async fn health_check(&self) -> Result<bool, SinkError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(fs::metadata(dir).await.is_ok()),
            _ => Ok(true),
        }
    }

    async fn count(&self) -> Result<u64, SinkError> {
        Ok(self.read_all().await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::builder::AuditRecordBuilder;
    use crate::audit::record::RecordKind;
    use crate::stream::ChangeEvent;
    use tempfile::TempDir;

    async fn create_test_sink() -> (FileSink, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::open(temp_dir.path(), "ConfigurationAudit").await.unwrap();
        (sink, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_read() {
        let (sink, _temp) = create_test_sink().await;
        let record = AuditRecordBuilder::system().build(&ChangeEvent::update("abc", 10, 15));

        sink.put(&record).await.unwrap();

        let stored = sink.read_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record, record);
        assert!(stored[0].is_intact());
        assert!(sink.path().ends_with("ConfigurationAudit.jsonl"));
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let (sink, _temp) = create_test_sink().await;
        assert!(sink.read_all().await.unwrap().is_empty());
        assert_eq!(sink.count().await.unwrap(), 0);
        assert!(sink.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_query_and_count() {
        let (sink, _temp) = create_test_sink().await;
        let builder = AuditRecordBuilder::system();
        sink.put(&builder.build(&ChangeEvent::insert("abc", 1))).await.unwrap();
        sink.put(&builder.build(&ChangeEvent::update("abc", 1, 2))).await.unwrap();
        sink.put(&builder.build(&ChangeEvent::insert("xyz", 9))).await.unwrap();

        assert_eq!(sink.count().await.unwrap(), 3);

        let inserts = sink
            .query(&RecordFilter::new().by_kind(RecordKind::Insert))
            .await
            .unwrap();
        assert_eq!(inserts.len(), 2);
        assert_eq!(inserts[1].item_key, "xyz");
    }

    #[tokio::test]
    async fn test_verify_detects_tampering() {
        let (sink, _temp) = create_test_sink().await;
        let record = AuditRecordBuilder::system().build(&ChangeEvent::update("abc", 10, 15));
        sink.put(&record).await.unwrap();

        assert!(sink.verify(&record.id).await.unwrap().is_valid);

        let content = tokio::fs::read_to_string(sink.path()).await.unwrap();
        let tampered = content.replace("\"newValue\":\"15\"", "\"newValue\":\"1500\"");
        assert_ne!(content, tampered);
        tokio::fs::write(sink.path(), tampered).await.unwrap();

        let result = sink.verify(&record.id).await.unwrap();
        assert!(!result.is_valid);
        assert!(result.message.contains("Checksum mismatch"));
    }

    #[tokio::test]
    async fn test_verify_unknown_record() {
        let (sink, _temp) = create_test_sink().await;
        let result = sink.verify(&RecordId::new("nope")).await.unwrap();
        assert!(!result.is_valid);
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let temp_dir = TempDir::new().unwrap();
        let builder = AuditRecordBuilder::system();

        let first = FileSink::open(temp_dir.path(), "t").await.unwrap();
        first.put(&builder.build(&ChangeEvent::insert("a", 1))).await.unwrap();

        let second = FileSink::from_path(first.path().to_path_buf());
        assert_eq!(second.destination(), "t");
        second.put(&builder.build(&ChangeEvent::insert("b", 2))).await.unwrap();

        let verified = second.verify_all().await.unwrap();
        assert_eq!(verified.len(), 2);
        assert!(verified.iter().all(|v| v.is_valid));
    }

    #[tokio::test]
    async fn test_corrupt_line_reports_position() {
        let (sink, _temp) = create_test_sink().await;
        tokio::fs::write(sink.path(), "\nnot json\n").await.unwrap();

        let err = sink.read_all().await.unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn test_open_rejects_path_like_destination() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("audit");

        for destination in ["arn:aws:dynamodb:eu-central-1:1:table/Audit", "../escape"] {
            let err = FileSink::open(&dir, destination).await.unwrap_err();
            assert!(matches!(err, SinkError::Rejected(_)));
        }
        assert!(!dir.exists());
        assert!(!temp_dir.path().join("escape.jsonl").exists());
    }
}
