use async_trait::async_trait;

use crate::repository::{SESSION_KEY, SessionRecord, SessionRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{delete_value, get_value, put_value};

#[async_trait]
impl SessionRepository for SqliteRepository {
    async fn load_session(&self) -> Result<Option<SessionRecord>, StorageError> {
        let Some(raw) = get_value(&self.pool, SESSION_KEY).await? else {
            return Ok(None);
        };
        SessionRecord::from_json(&raw).map(Some)
    }

    async fn save_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let raw = record.to_json()?;
        put_value(&self.pool, SESSION_KEY, &raw, record.saved_at).await
    }

    async fn clear_session(&self) -> Result<(), StorageError> {
        delete_value(&self.pool, SESSION_KEY).await
    }
}
