//! Durable store for external-value -> ad-copy mappings.
//!
//! The whole collection lives in one JSON document (`mappings.json`), read
//! once at startup and rewritten in full on every mutation. Writes go
//! through a sibling temp file and a rename, and the in-memory view is only
//! updated after the rewrite succeeded: a failed write is logged, reported
//! to the caller, and leaves both views unchanged.
//!
//! Every mutation holds the lock for its full read-modify-write-persist
//! cycle; two concurrent upserts can never interleave.

use crate::error::AppError;
use chrono::Utc;
use common::model::mapping::Mapping;
use common::requests::MappingEntry;
use log::{error, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default, Deserialize)]
struct MappingsDocument {
    #[serde(default)]
    mappings: Vec<Mapping>,
}

pub struct MappingStore {
    path: PathBuf,
    state: Mutex<Vec<Mapping>>,
}

impl MappingStore {
    /// Opens the store, creating an empty document (and its parent
    /// directory) when none exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let mappings = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            let doc: MappingsDocument = serde_json::from_str(&data).map_err(|e| {
                AppError::Internal(format!("Corrupt mappings file {}: {e}", path.display()))
            })?;
            info!("Mappings store loaded ({} record(s))", doc.mappings.len());
            doc.mappings
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            write_document(&path, &[])?;
            info!("Mappings store created at {}", path.display());
            Vec::new()
        };

        Ok(Self {
            path,
            state: Mutex::new(mappings),
        })
    }

    pub fn all(&self) -> Vec<Mapping> {
        self.state.lock().unwrap().clone()
    }

    pub fn by_external_value(&self, value: &str) -> Option<Mapping> {
        self.state
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.external_value == value)
            .cloned()
    }

    pub fn by_external_values(&self, values: &[String]) -> Vec<Mapping> {
        if values.is_empty() {
            return Vec::new();
        }
        self.state
            .lock()
            .unwrap()
            .iter()
            .filter(|m| values.contains(&m.external_value))
            .cloned()
            .collect()
    }

    /// Creates the mapping, or updates `adcopy_name` and `updated_at` in
    /// place when the external value is already known. New records get
    /// `1 + max existing id`.
    pub fn upsert(&self, external_value: &str, adcopy_name: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        let mut next = state.clone();
        let now = Utc::now();

        match next.iter_mut().find(|m| m.external_value == external_value) {
            Some(existing) => {
                existing.adcopy_name = adcopy_name.to_string();
                existing.updated_at = now;
            }
            None => {
                let id = next.iter().map(|m| m.id).max().unwrap_or(0) + 1;
                next.push(Mapping {
                    id,
                    external_value: external_value.to_string(),
                    adcopy_name: adcopy_name.to_string(),
                    created_at: now,
                    updated_at: now,
                });
            }
        }

        self.persist(&next)?;
        *state = next;
        Ok(())
    }

    /// Applies [`upsert`](Self::upsert) for every entry with both fields
    /// present and returns the number applied. Entries with an empty field
    /// are skipped, not counted and not an error.
    pub fn upsert_batch(&self, entries: &[MappingEntry]) -> Result<usize, AppError> {
        let mut count = 0;
        for entry in entries {
            if entry.external_value.is_empty() || entry.adcopy_name.is_empty() {
                continue;
            }
            self.upsert(&entry.external_value, &entry.adcopy_name)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn delete_by_id(&self, id: u32) -> Result<bool, AppError> {
        self.remove_where(|m| m.id == id)
    }

    pub fn delete_by_external_value(&self, value: &str) -> Result<bool, AppError> {
        self.remove_where(|m| m.external_value == value)
    }

    fn remove_where(&self, pred: impl Fn(&Mapping) -> bool) -> Result<bool, AppError> {
        let mut state = self.state.lock().unwrap();
        let next: Vec<Mapping> = state.iter().filter(|m| !pred(m)).cloned().collect();
        if next.len() == state.len() {
            return Ok(false);
        }
        self.persist(&next)?;
        *state = next;
        Ok(true)
    }

    fn persist(&self, mappings: &[Mapping]) -> Result<(), AppError> {
        if let Err(e) = write_document(&self.path, mappings) {
            error!("Failed to write mappings file {}: {e}", self.path.display());
            return Err(e.into());
        }
        Ok(())
    }
}

fn write_document(path: &Path, mappings: &[Mapping]) -> std::io::Result<()> {
    let doc = serde_json::json!({ "mappings": mappings });
    let body = serde_json::to_vec_pretty(&doc).map_err(std::io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)
}
