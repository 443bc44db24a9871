//! Top-N ranking of finished sessions, fastest first.
//!
//! Persistence is best effort: unreadable or corrupt data reads as an empty
//! board and failed writes are logged, never returned.

use std::sync::Arc;

use shared::{
    domain::{ScoreEntry, LEADERBOARD_CAPACITY, LEADERBOARD_KEY},
    error::QuizError,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::KeyValueStore;

pub struct Leaderboard {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
    write_guard: Mutex<()>,
}

impl Leaderboard {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: LEADERBOARD_KEY.to_string(),
            capacity: LEADERBOARD_CAPACITY,
            write_guard: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Vec<ScoreEntry> {
        match self.read().await {
            Ok(raw) => self.decode(raw.as_deref()),
            Err(err) => {
                warn!(key = %self.key, error = %err, "leaderboard: read failed, listing nothing");
                Vec::new()
            }
        }
    }

    /// Inserts `entry` and returns its 1-based rank, or `None` when it did not
    /// make the top list or the stored board could not be read.
    pub async fn record(&self, entry: ScoreEntry) -> Option<usize> {
        let _guard = self.write_guard.lock().await;
        // An unreadable store must not be overwritten by a one-entry board.
        let raw = match self.read().await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    key = %self.key,
                    nickname = %entry.nickname,
                    error = %err,
                    "leaderboard: read failed, entry not recorded"
                );
                return None;
            }
        };
        let mut entries = self.decode(raw.as_deref());

        // Equal times keep insertion order: the newcomer goes after them.
        let index = entries.partition_point(|existing| existing.elapsed_ms <= entry.elapsed_ms);
        if index >= self.capacity {
            debug!(
                nickname = %entry.nickname,
                elapsed_ms = entry.elapsed_ms,
                "leaderboard: entry did not qualify"
            );
            return None;
        }

        entries.insert(index, entry);
        entries.truncate(self.capacity);
        if let Err(err) = self.save(&entries).await {
            warn!(key = %self.key, error = %err, "leaderboard: save failed");
        }
        Some(index + 1)
    }

    pub async fn clear(&self) {
        let _guard = self.write_guard.lock().await;
        if let Err(err) = self.store.remove(&self.key).await {
            warn!(key = %self.key, error = %err, "leaderboard: clear failed");
        }
    }

    async fn read(&self) -> Result<Option<String>, QuizError> {
        self.store
            .get(&self.key)
            .await
            .map_err(|err| QuizError::Persistence(format!("{err:#}")))
    }

    /// Corrupt data reads as an empty board and is replaced by the next write.
    fn decode(&self, raw: Option<&str>) -> Vec<ScoreEntry> {
        let Some(raw) = raw else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<ScoreEntry>>(raw) {
            Ok(mut entries) => {
                entries.sort_by_key(|entry| entry.elapsed_ms);
                entries.truncate(self.capacity);
                entries
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "leaderboard: corrupt data treated as empty");
                Vec::new()
            }
        }
    }

    async fn save(&self, entries: &[ScoreEntry]) -> Result<(), QuizError> {
        let raw = serde_json::to_string(entries)
            .map_err(|err| QuizError::Persistence(err.to_string()))?;
        self.store
            .set(&self.key, &raw)
            .await
            .map_err(|err| QuizError::Persistence(format!("{err:#}")))
    }
}

#[cfg(test)]
#[path = "tests/leaderboard_tests.rs"]
mod tests;
