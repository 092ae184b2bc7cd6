use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cicada_core::model::{LevelId, PartId, SubpartKey, Team};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Fixed key of the persisted session slot.
pub const SESSION_KEY: &str = "Team";

/// Storage key of a per-part completion flag, e.g. `level2_partA_done`.
#[must_use]
pub fn part_flag_key(level: LevelId, part: PartId) -> Option<String> {
    let key = SubpartKey::for_part(part)?;
    Some(format!("level{level}_part{}_done", key.label()))
}

/// Inverse of [`part_flag_key`]: returns the part if `key` is a flag of `level`.
#[must_use]
pub fn parse_part_flag_key(level: LevelId, key: &str) -> Option<PartId> {
    let rest = key.strip_prefix(&format!("level{level}_part"))?;
    let letter = rest.strip_suffix("_done")?;
    let key: SubpartKey = letter.parse().ok()?;
    let offset = u32::from(key.letter()) - u32::from('a');
    Some(PartId::new(offset + 1))
}

/// Persisted shape of the session slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub team: Team,
    pub saved_at: DateTime<Utc>,
}

impl SessionRecord {
    #[must_use]
    pub fn new(team: Team, saved_at: DateTime<Utc>) -> Self {
        Self { team, saved_at }
    }

    /// Encode for the key-value slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Decode from the key-value slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed payloads.
    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// The single persisted session slot.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Load the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read or decoded.
    async fn load_session(&self) -> Result<Option<SessionRecord>, StorageError>;

    /// Replace the persisted session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be written.
    async fn save_session(&self, record: &SessionRecord) -> Result<(), StorageError>;

    /// Remove the persisted session. Clearing an empty slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be written.
    async fn clear_session(&self) -> Result<(), StorageError>;
}

/// Per-level flags mirroring which parts the grader has already accepted.
#[async_trait]
pub trait PartFlagRepository: Send + Sync {
    /// Parts of `level` flagged as completed, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn completed_parts(&self, level: LevelId) -> Result<Vec<PartId>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn mark_part_completed(&self, level: LevelId, part: PartId) -> Result<(), StorageError>;

    /// Drop every flag of `level`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn clear_level(&self, level: LevelId) -> Result<(), StorageError>;

    /// Drop every flag of every level.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn clear_all(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    session: Arc<Mutex<Option<SessionRecord>>>,
    flags: Arc<Mutex<BTreeMap<LevelId, BTreeSet<PartId>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn load_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        let guard = self.session.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn save_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let mut guard = self.session.lock().map_err(poisoned)?;
        *guard = Some(record.clone());
        Ok(())
    }

    async fn clear_session(&self) -> Result<(), StorageError> {
        let mut guard = self.session.lock().map_err(poisoned)?;
        *guard = None;
        Ok(())
    }
}

#[async_trait]
impl PartFlagRepository for InMemoryRepository {
    async fn completed_parts(&self, level: LevelId) -> Result<Vec<PartId>, StorageError> {
        let guard = self.flags.lock().map_err(poisoned)?;
        Ok(guard
            .get(&level)
            .map(|parts| parts.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn mark_part_completed(&self, level: LevelId, part: PartId) -> Result<(), StorageError> {
        let mut guard = self.flags.lock().map_err(poisoned)?;
        guard.entry(level).or_default().insert(part);
        Ok(())
    }

    async fn clear_level(&self, level: LevelId) -> Result<(), StorageError> {
        let mut guard = self.flags.lock().map_err(poisoned)?;
        guard.remove(&level);
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        let mut guard = self.flags.lock().map_err(poisoned)?;
        guard.clear();
        Ok(())
    }
}

/// Aggregates the session slot and part flags behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub part_flags: Arc<dyn PartFlagRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let part_flags: Arc<dyn PartFlagRepository> = Arc::new(repo);
        Self {
            sessions,
            part_flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::model::TeamId;
    use cicada_core::time::fixed_now;

    fn team(level: u32) -> Team {
        Team::new(TeamId::new("t1"), "Cicadas", LevelId::new(level)).unwrap()
    }

    #[test]
    fn flag_key_layout() {
        assert_eq!(
            part_flag_key(LevelId::new(2), PartId::new(1)).as_deref(),
            Some("level2_partA_done")
        );
        assert_eq!(part_flag_key(LevelId::new(2), PartId::new(27)), None);
    }

    #[test]
    fn flag_key_parses_back_for_its_level_only() {
        assert_eq!(
            parse_part_flag_key(LevelId::new(6), "level6_partF_done"),
            Some(PartId::new(6))
        );
        assert_eq!(parse_part_flag_key(LevelId::new(1), "level12_partA_done"), None);
        assert_eq!(parse_part_flag_key(LevelId::new(6), "level6_partF"), None);
    }

    #[test]
    fn session_record_json_reads_back() {
        let record = SessionRecord::new(team(3), fixed_now());
        let back = SessionRecord::from_json(&record.to_json().unwrap()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn malformed_session_is_serialization_error() {
        let err = SessionRecord::from_json("{not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn session_slot_save_and_clear() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_session().await.unwrap().is_none());

        let record = SessionRecord::new(team(2), fixed_now());
        repo.save_session(&record).await.unwrap();
        assert_eq!(repo.load_session().await.unwrap(), Some(record));

        repo.clear_session().await.unwrap();
        repo.clear_session().await.unwrap();
        assert!(repo.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn flags_are_scoped_per_level() {
        let repo = InMemoryRepository::new();
        repo.mark_part_completed(LevelId::new(6), PartId::new(2))
            .await
            .unwrap();
        repo.mark_part_completed(LevelId::new(6), PartId::new(1))
            .await
            .unwrap();
        repo.mark_part_completed(LevelId::new(7), PartId::new(1))
            .await
            .unwrap();

        assert_eq!(
            repo.completed_parts(LevelId::new(6)).await.unwrap(),
            vec![PartId::new(1), PartId::new(2)]
        );

        repo.clear_level(LevelId::new(6)).await.unwrap();
        assert!(repo.completed_parts(LevelId::new(6)).await.unwrap().is_empty());
        assert_eq!(repo.completed_parts(LevelId::new(7)).await.unwrap().len(), 1);

        repo.clear_all().await.unwrap();
        assert!(repo.completed_parts(LevelId::new(7)).await.unwrap().is_empty());
    }
}
