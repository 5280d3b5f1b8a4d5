//! Sled-based local history of past analyses.
//!
//! Keyed by a hash of the résumé bytes, so re-analyzing the same file
//! overwrites its previous entry instead of piling up duplicates.

use crate::analysis::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    DbError(#[from] sled::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A stored analysis with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAnalysis {
    /// Original résumé file name
    pub file_name: String,
    /// Recipient the report was addressed to, if any
    pub email: Option<String>,
    /// When the analysis was run
    pub created_at: DateTime<Utc>,
    /// The normalized result
    pub result: AnalysisResult,
}

impl StoredAnalysis {
    pub fn new(file_name: String, email: Option<String>, result: AnalysisResult) -> Self {
        Self {
            file_name,
            email,
            created_at: Utc::now(),
            result,
        }
    }
}

/// Sled-based storage for analysis history.
pub struct Storage {
    db: sled::Db,
}

impl Storage {
    /// Open or create storage at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Store an analysis for a résumé, replacing any previous entry for the
    /// same file contents
    pub fn store(
        &self,
        resume: &[u8],
        file_name: &str,
        email: Option<&str>,
        result: &AnalysisResult,
    ) -> Result<(), StorageError> {
        let key = Self::hash_resume(resume);
        let stored = StoredAnalysis::new(
            file_name.to_string(),
            email.map(str::to_string),
            result.clone(),
        );
        let value = serde_json::to_vec(&stored)?;
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }

    /// Retrieve the stored analysis for a résumé, if any
    pub fn get(&self, resume: &[u8]) -> Result<Option<StoredAnalysis>, StorageError> {
        let key = Self::hash_resume(resume);
        match self.db.get(key.as_bytes())? {
            Some(data) => {
                let stored: StoredAnalysis = serde_json::from_slice(&data)?;
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }

    /// List all stored analyses, newest first
    pub fn list_all(&self) -> Result<Vec<StoredAnalysis>, StorageError> {
        let mut results = Vec::new();
        for item in self.db.iter() {
            let (_key, value) = item?;
            let stored: StoredAnalysis = serde_json::from_slice(&value)?;
            results.push(stored);
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    /// Delete the entry for a résumé
    pub fn delete(&self, resume: &[u8]) -> Result<bool, StorageError> {
        let key = Self::hash_resume(resume);
        let existed = self.db.remove(key.as_bytes())?.is_some();
        self.db.flush()?;
        Ok(existed)
    }

    /// Number of stored analyses
    pub fn count(&self) -> usize {
        self.db.len()
    }

    /// Create a hash of the résumé bytes for use as a key
    fn hash_resume(resume: &[u8]) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        resume.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(score: i64) -> AnalysisResult {
        AnalysisResult {
            ats_score: score,
            ..AnalysisResult::fallback(None)
        }
    }

    #[test]
    fn stores_and_retrieves_by_resume_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        storage
            .store(b"%PDF-1.7 abc", "cv.pdf", Some("jo@example.com"), &sample_result(55))
            .unwrap();

        let stored = storage.get(b"%PDF-1.7 abc").unwrap().unwrap();
        assert_eq!(stored.file_name, "cv.pdf");
        assert_eq!(stored.email.as_deref(), Some("jo@example.com"));
        assert_eq!(stored.result.ats_score, 55);

        assert!(storage.get(b"different bytes").unwrap().is_none());
    }

    #[test]
    fn same_resume_replaces_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        storage.store(b"same", "cv.pdf", None, &sample_result(40)).unwrap();
        storage.store(b"same", "cv.pdf", None, &sample_result(70)).unwrap();

        assert_eq!(storage.count(), 1);
        assert_eq!(storage.get(b"same").unwrap().unwrap().result.ats_score, 70);
    }

    #[test]
    fn delete_reports_whether_an_entry_existed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        storage.store(b"gone soon", "cv.pdf", None, &sample_result(10)).unwrap();
        assert!(storage.delete(b"gone soon").unwrap());
        assert!(!storage.delete(b"gone soon").unwrap());
        assert_eq!(storage.count(), 0);
    }
}
