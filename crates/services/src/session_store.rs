use std::sync::{Arc, PoisonError, RwLock};

use cicada_core::Clock;
use cicada_core::model::{LevelId, PartId, Team};
use storage::repository::{PartFlagRepository, SessionRecord, SessionRepository, Storage};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::SessionStoreError;

/// Single owner of the signed-in team and its unlocked level.
///
/// Every mutation is written to storage first and only then applied in
/// memory, so a failed write leaves both copies unchanged.
pub struct SessionStore {
    sessions: Arc<dyn SessionRepository>,
    part_flags: Arc<dyn PartFlagRepository>,
    clock: Clock,
    current: RwLock<Option<Team>>,
    writer: Mutex<()>,
}

impl SessionStore {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        part_flags: Arc<dyn PartFlagRepository>,
        clock: Clock,
    ) -> Self {
        Self {
            sessions,
            part_flags,
            clock,
            current: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self::new(
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.part_flags),
            clock,
        )
    }

    /// Snapshot of the signed-in team.
    #[must_use]
    pub fn get_session(&self) -> Option<Team> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn current_level(&self) -> Option<LevelId> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Team::current_level)
    }

    fn replace(&self, team: Option<Team>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = team;
    }

    /// Replace the session; `None` signs the team out and drops part flags.
    ///
    /// Part flags belong to the team that earned them, so they are also
    /// dropped when a different team takes over the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` if the write fails; memory is
    /// left untouched in that case.
    pub async fn set_session(&self, team: Option<Team>) -> Result<(), SessionStoreError> {
        let _guard = self.writer.lock().await;
        match team {
            Some(team) => {
                let previous = match self.get_session() {
                    Some(current) => Some(current),
                    None => self.sessions.load_session().await?.map(|record| record.team),
                };
                if previous.as_ref().map(Team::id) != Some(team.id()) {
                    self.part_flags.clear_all().await?;
                    debug!("part flags reset for new team");
                }
                self.sessions
                    .save_session(&SessionRecord::new(team.clone(), self.clock.now()))
                    .await?;
                info!(team = %team.team_name(), level = team.current_level().value(), "session saved");
                self.replace(Some(team));
            }
            None => {
                self.sessions.clear_session().await?;
                self.part_flags.clear_all().await?;
                info!("session cleared");
                self.replace(None);
            }
        }
        Ok(())
    }

    /// Raise the unlocked level to `new_level` if it is higher.
    ///
    /// Returns the resulting level. Nothing is written when the level does
    /// not change.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::NoSession` when signed out, or
    /// `SessionStoreError::Storage` if the write fails.
    pub async fn advance_level(&self, new_level: LevelId) -> Result<LevelId, SessionStoreError> {
        let _guard = self.writer.lock().await;
        let mut team = self.get_session().ok_or(SessionStoreError::NoSession)?;
        if !team.advance_to(new_level) {
            debug!(
                requested = new_level.value(),
                current = team.current_level().value(),
                "level unchanged"
            );
            return Ok(team.current_level());
        }
        self.sessions
            .save_session(&SessionRecord::new(team.clone(), self.clock.now()))
            .await?;
        let level = team.current_level();
        info!(level = level.value(), "level unlocked");
        self.replace(Some(team));
        Ok(level)
    }

    /// Load the persisted session if nothing is in memory yet.
    ///
    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` if the slot cannot be read.
    pub async fn restore_from_persisted(&self) -> Result<Option<Team>, SessionStoreError> {
        let _guard = self.writer.lock().await;
        if let Some(team) = self.get_session() {
            return Ok(Some(team));
        }
        let team = self.sessions.load_session().await?.map(|record| record.team);
        if team.is_some() {
            debug!("session restored from storage");
        }
        self.replace(team.clone());
        Ok(team)
    }

    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` on read failures.
    pub async fn completed_parts(&self, level: LevelId) -> Result<Vec<PartId>, SessionStoreError> {
        Ok(self.part_flags.completed_parts(level).await?)
    }

    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` on write failures.
    pub async fn mark_part_completed(
        &self,
        level: LevelId,
        part: PartId,
    ) -> Result<(), SessionStoreError> {
        Ok(self.part_flags.mark_part_completed(level, part).await?)
    }

    /// # Errors
    ///
    /// Returns `SessionStoreError::Storage` on write failures.
    pub async fn clear_level(&self, level: LevelId) -> Result<(), SessionStoreError> {
        Ok(self.part_flags.clear_level(level).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::model::TeamId;
    use cicada_core::time::fixed_clock;

    fn team(level: u32) -> Team {
        Team::new(TeamId::new("t1"), "Cicadas", LevelId::new(level)).unwrap()
    }

    fn store(storage: &Storage) -> SessionStore {
        SessionStore::from_storage(storage, fixed_clock())
    }

    #[tokio::test]
    async fn advance_level_keeps_maximum_and_writes_through() {
        let storage = Storage::in_memory();
        let store = store(&storage);
        store.set_session(Some(team(2))).await.unwrap();

        for requested in [5, 3, 4, 1] {
            store.advance_level(LevelId::new(requested)).await.unwrap();
        }

        assert_eq!(store.current_level(), Some(LevelId::new(5)));
        let persisted = storage.sessions.load_session().await.unwrap().unwrap();
        assert_eq!(persisted.team.current_level(), LevelId::new(5));
    }

    #[tokio::test]
    async fn advance_without_session_fails() {
        let store = store(&Storage::in_memory());
        let err = store.advance_level(LevelId::new(3)).await.unwrap_err();
        assert!(matches!(err, SessionStoreError::NoSession));
    }

    #[tokio::test]
    async fn restore_hydrates_only_when_empty() {
        let storage = Storage::in_memory();
        storage
            .sessions
            .save_session(&SessionRecord::new(team(4), cicada_core::time::fixed_now()))
            .await
            .unwrap();

        let store = store(&storage);
        assert!(store.get_session().is_none());
        let restored = store.restore_from_persisted().await.unwrap().unwrap();
        assert_eq!(restored.current_level(), LevelId::new(4));

        storage.sessions.clear_session().await.unwrap();
        let again = store.restore_from_persisted().await.unwrap();
        assert_eq!(again, Some(restored));
    }

    #[tokio::test]
    async fn restore_with_nothing_persisted_is_none() {
        let store = store(&Storage::in_memory());
        assert!(store.restore_from_persisted().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn switching_team_drops_flags_but_same_team_keeps_them() {
        let storage = Storage::in_memory();
        let store = store(&storage);
        store.set_session(Some(team(2))).await.unwrap();
        store
            .mark_part_completed(LevelId::new(2), PartId::FIRST)
            .await
            .unwrap();

        store.set_session(Some(team(3))).await.unwrap();
        assert_eq!(
            store.completed_parts(LevelId::new(2)).await.unwrap(),
            vec![PartId::FIRST]
        );

        let other = Team::new(TeamId::new("t2"), "Moths", LevelId::new(2)).unwrap();
        store.set_session(Some(other)).await.unwrap();
        assert!(store.completed_parts(LevelId::new(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persisted_team_counts_as_previous_owner_of_flags() {
        let storage = Storage::in_memory();
        storage
            .sessions
            .save_session(&SessionRecord::new(team(2), cicada_core::time::fixed_now()))
            .await
            .unwrap();
        storage
            .part_flags
            .mark_part_completed(LevelId::new(2), PartId::FIRST)
            .await
            .unwrap();

        let store = store(&storage);
        store.set_session(Some(team(2))).await.unwrap();
        assert_eq!(
            store.completed_parts(LevelId::new(2)).await.unwrap(),
            vec![PartId::FIRST]
        );
    }

    #[tokio::test]
    async fn clearing_session_drops_flags() {
        let storage = Storage::in_memory();
        let store = store(&storage);
        store.set_session(Some(team(2))).await.unwrap();
        store
            .mark_part_completed(LevelId::new(2), PartId::FIRST)
            .await
            .unwrap();

        store.set_session(None).await.unwrap();

        assert!(store.get_session().is_none());
        assert!(storage.sessions.load_session().await.unwrap().is_none());
        assert!(store.completed_parts(LevelId::new(2)).await.unwrap().is_empty());
    }
}
