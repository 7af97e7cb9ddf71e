//! High score persistence
//!
//! The store is a text file holding a single integer. A missing or corrupt
//! file reads as 0; failed writes are logged and otherwise ignored.

use std::path::{Path, PathBuf};

/// Default file name, relative to the working directory
pub const DEFAULT_FILE: &str = "high_score.txt";

/// Errors from reading or writing the high score file
#[derive(thiserror::Error, Debug)]
pub enum HighScoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt high score {0:?}")]
    Parse(String),
}

/// Single best score, bound to a file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScore {
    path: PathBuf,
    best: u64,
}

impl HighScore {
    /// Open the store at `path`, treating any read/parse failure as 0
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let best = match Self::read(&path) {
            Ok(score) => {
                log::info!("Loaded high score {score}");
                score
            }
            Err(HighScoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No high score found, starting fresh");
                0
            }
            Err(e) => {
                log::warn!("Ignoring unreadable high score at {}: {e}", path.display());
                0
            }
        };
        Self { path, best }
    }

    /// Read and parse the file strictly
    pub fn read(path: impl AsRef<Path>) -> Result<u64, HighScoreError> {
        let text = std::fs::read_to_string(path)?;
        let trimmed = text.trim();
        trimmed
            .parse::<u64>()
            .map_err(|_| HighScoreError::Parse(trimmed.to_string()))
    }

    /// Write the current best to disk
    pub fn save(&self) -> Result<(), HighScoreError> {
        std::fs::write(&self.path, self.best.to_string())?;
        Ok(())
    }

    /// Current best score
    pub fn best(&self) -> u64 {
        self.best
    }

    /// Compare a final score against the stored best, persisting a new record.
    /// Returns true if `score` set a new record.
    pub fn record(&mut self, score: u64) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        match self.save() {
            Ok(()) => log::info!("New high score {score} saved"),
            Err(e) => log::warn!("Could not save high score: {e}"),
        }
        true
    }
}
