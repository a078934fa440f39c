//! High score leaderboard
//!
//! Persisted as JSON, tracks the top 10 runs.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("failed to read/write high scores at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("high score file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Barriers cleared
    pub score: u64,
    /// Revive tokens spent during the run
    pub revives_used: u32,
    /// Simulated play time (ms)
    pub survived_ms: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Add a run to the leaderboard (if it qualifies).
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn add_score(&mut self, score: u64, revives_used: u32, survived_ms: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            revives_used,
            survived_ms,
        };

        // Sorted descending by score; ties keep the older run first
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The best score so far (0 when empty)
    pub fn top_score(&self) -> u64 {
        self.entries.first().map(|e| e.score).unwrap_or(0)
    }

    /// Load the leaderboard, starting fresh when the file does not exist yet
    pub fn load(path: &Path) -> Result<Self, ScoreError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No high scores at {}, starting fresh", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(ScoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let scores: HighScores =
            serde_json::from_str(&json).map_err(|source| ScoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!("Loaded {} high scores", scores.entries.len());
        Ok(scores)
    }

    /// Write the leaderboard as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ScoreError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ScoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ScoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(0, 0, 1000), None);
        assert!(scores.is_empty());
        assert_eq!(scores.top_score(), 0);
    }

    #[test]
    fn test_ranked_descending() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(5, 0, 1000), Some(1));
        assert_eq!(scores.add_score(9, 1, 2000), Some(1));
        assert_eq!(scores.add_score(7, 2, 3000), Some(2));
        assert_eq!(scores.add_score(7, 0, 4000), Some(3));

        let values: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(values, vec![9, 7, 7, 5]);
        assert_eq!(scores.top_score(), 9);
        // Older tie stays ahead
        assert_eq!(scores.entries[1].revives_used, 2);
    }

    #[test]
    fn test_table_is_capped() {
        let mut scores = HighScores::new();
        for s in 1..=MAX_HIGH_SCORES as u64 {
            scores.add_score(s * 10, 0, 0);
        }
        assert!(!scores.qualifies(10));
        assert_eq!(scores.add_score(5, 0, 0), None);
        assert_eq!(scores.add_score(15, 0, 0), Some(10));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().unwrap().score, 15);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");

        let mut scores = HighScores::new();
        scores.add_score(12, 1, 45_000);
        scores.add_score(30, 3, 90_000);
        scores.save(&path).unwrap();

        assert_eq!(HighScores::load(&path).unwrap(), scores);
    }

    #[test]
    fn test_missing_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let scores = HighScores::load(&dir.path().join("none.json")).unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            HighScores::load(&path),
            Err(ScoreError::Corrupt { .. })
        ));
    }
}
