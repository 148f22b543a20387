// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dead-letter records for mentions that permanently failed the pipeline.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

const DEAD_LETTERS_FILE: &str = "dead_letters.json";

/// Pipeline stage at which a mention failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PipelineStage {
    FetchOrigin,
    Suggest,
    Deploy,
    Reply,
}

/// A record of one permanently-failed mention. Failures are never retried;
/// the record is what keeps them from being silent drops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    pub mention_id: String,
    pub origin_post_id: Option<String>,
    pub stage: PipelineStage,
    pub error: String,
    pub timestamp: u64,
}

/// File-backed dead-letter log.
#[derive(Debug)]
pub struct DeadLetterLog {
    path: PathBuf,
    letters: Vec<DeadLetter>,
}

impl DeadLetterLog {
    /// Load the log from the default file or start fresh.
    pub fn load() -> Self {
        Self::with_path(PathBuf::from(DEAD_LETTERS_FILE))
    }

    /// Load the log from a specific path or start fresh.
    pub fn with_path(path: PathBuf) -> Self {
        let letters = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!("Failed to parse {}: {}", path.display(), e);
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };

        if !letters.is_empty() {
            info!("📭 Loaded {} dead-lettered mentions", letters.len());
        }
        Self { path, letters }
    }

    /// Append a record and persist immediately. Persistence failures are
    /// logged and swallowed so the poll loop keeps running.
    pub fn record(&mut self, letter: DeadLetter) {
        warn!(
            "📭 Dead-lettering mention {} at {:?}: {}",
            letter.mention_id, letter.stage, letter.error
        );
        self.letters.push(letter);
        if let Err(e) = self.save() {
            warn!("Failed to persist dead letters: {}", e);
        }
    }

    fn save(&self) -> Result<(), String> {
        let json = serde_json::to_string_pretty(&self.letters)
            .map_err(|e| format!("Failed to serialize dead letters: {}", e))?;
        fs::write(&self.path, json)
            .map_err(|e| format!("Failed to write {}: {}", self.path.display(), e))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dead_letters.json");

        let mut log = DeadLetterLog::with_path(path.clone());
        assert!(log.is_empty());

        log.record(DeadLetter {
            mention_id: "1928300000000000001".to_string(),
            origin_post_id: Some("1928211000190259581".to_string()),
            stage: PipelineStage::Deploy,
            error: "deploy transaction reverted".to_string(),
            timestamp: 1748606400,
        });
        log.record(DeadLetter {
            mention_id: "1928300000000000002".to_string(),
            origin_post_id: None,
            stage: PipelineStage::Suggest,
            error: "no content".to_string(),
            timestamp: 1748606430,
        });
        assert_eq!(log.len(), 2);

        let reloaded = DeadLetterLog::with_path(path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.letters[0].stage, PipelineStage::Deploy);
        assert_eq!(reloaded.letters[1].origin_post_id, None);
    }

    #[test]
    fn unreadable_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dead_letters.json");
        fs::write(&path, "not json").unwrap();

        let log = DeadLetterLog::with_path(path);
        assert!(log.is_empty());
    }
}
