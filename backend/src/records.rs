//! Loading and indexing of the institution's record set.
//!
//! Records are read once from the institution's JSON export and held in
//! insertion order; the order fixes each record's leaf index in the
//! commitment tree.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use zk_commitments::constants::SCORE_SCALE;
use zk_commitments::types::{composite_score, Record};

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("invalid record file: {0}")]
    InvalidRecordFile(String),

    #[error("duplicate record id: {0}")]
    DuplicateRecordId(String),

    #[error("record with empty id")]
    EmptyRecordId,
}

/// Raw entry as found in the institution's record file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub id: String,
    pub cgpa: f64,
    pub test_score: u64,
}

impl ScoreReport {
    /// Collapse the report into the single scaled score the circuit commits to.
    pub fn into_record(self) -> Record {
        let cgpa_centi = (self.cgpa * SCORE_SCALE as f64).floor() as u64;
        Record {
            score: composite_score(cgpa_centi, self.test_score),
            id: self.id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecordFile {
    students: Vec<ScoreReport>,
}

/// Ordered, read-only collection backing the commitment tree.
#[derive(Debug)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    /// The index lookup must be unambiguous, so duplicate ids are rejected.
    pub fn new(records: Vec<Record>) -> Result<Self, RecordStoreError> {
        let mut seen = HashSet::new();
        for record in &records {
            if record.id.is_empty() {
                return Err(RecordStoreError::EmptyRecordId);
            }
            if !seen.insert(record.id.clone()) {
                return Err(RecordStoreError::DuplicateRecordId(record.id.clone()));
            }
        }
        Ok(Self { records })
    }

    pub fn from_reports(
        reports: impl IntoIterator<Item = ScoreReport>,
    ) -> Result<Self, RecordStoreError> {
        Self::new(reports.into_iter().map(ScoreReport::into_record).collect())
    }

    /// Read the institution's export: `{"students": [{id, cgpa, testScore}]}`.
    pub fn load_json(path: &Path) -> Result<Self, RecordStoreError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RecordStoreError::InvalidRecordFile(e.to_string()))?;
        let file: RecordFile = serde_json::from_str(&raw)
            .map_err(|e| RecordStoreError::InvalidRecordFile(e.to_string()))?;
        Self::from_reports(file.students)
    }

    pub fn lookup(&self, id: &str) -> Option<(usize, &Record)> {
        self.records.iter().enumerate().find(|(_, r)| r.id == id)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
