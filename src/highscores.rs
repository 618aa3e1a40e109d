//! High score persistence
//!
//! A single best score, stored as JSON: LocalStorage on the web, a file on
//! native builds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or writing the high score
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("high score file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed high score JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Best score achieved on this device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScore {
    best: u64,
}

impl HighScore {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "tank_arena_high_score";

    pub fn new(best: u64) -> Self {
        Self { best }
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Keep `score` if it beats the stored best. Returns true when it did.
    pub fn record(&mut self, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load the high score from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(score) => {
                        log::info!("Loaded high score {}", score.best);
                        return score;
                    }
                    Err(err) => log::warn!("Discarding stored high score: {err}"),
                }
            }
        }

        log::info!("No high score found, starting fresh");
        Self::default()
    }

    /// Save the high score to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let (Some(storage), Ok(json)) = (storage, self.to_json()) {
            let _ = storage.set_item(Self::STORAGE_KEY, &json);
            log::info!("High score saved ({})", self.best);
        }
    }

    /// Read a high score file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, PersistError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Read a high score file, starting from zero when missing or unreadable
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_default(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(score) => {
                log::info!("Loaded high score {} from {}", score.best, path.display());
                score
            }
            Err(err) => {
                log::warn!("Ignoring high score file {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), PersistError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("High score saved ({}) to {}", self.best, path.display());
        Ok(())
    }
}
