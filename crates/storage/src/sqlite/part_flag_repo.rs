use async_trait::async_trait;
use cicada_core::model::{LevelId, PartId};

use crate::repository::{PartFlagRepository, StorageError, parse_part_flag_key, part_flag_key};

use super::SqliteRepository;
use super::mapping::{FLAG_SET, conn, keys_with_prefix, put_value};

const FLAG_PREFIX: &str = "level";
const FLAG_SUFFIX: &str = "_done";

fn level_prefix(level: LevelId) -> String {
    format!("{FLAG_PREFIX}{level}_part")
}

#[async_trait]
impl PartFlagRepository for SqliteRepository {
    async fn completed_parts(&self, level: LevelId) -> Result<Vec<PartId>, StorageError> {
        let keys = keys_with_prefix(&self.pool, &level_prefix(level)).await?;
        let mut parts: Vec<PartId> = keys
            .iter()
            .filter_map(|key| parse_part_flag_key(level, key))
            .collect();
        parts.sort();
        parts.dedup();
        Ok(parts)
    }

    async fn mark_part_completed(&self, level: LevelId, part: PartId) -> Result<(), StorageError> {
        let key = part_flag_key(level, part).ok_or(StorageError::NotFound)?;
        put_value(&self.pool, &key, FLAG_SET, self.clock.now()).await
    }

    async fn clear_level(&self, level: LevelId) -> Result<(), StorageError> {
        let keys = keys_with_prefix(&self.pool, &level_prefix(level)).await?;
        let mut tx = self.pool.begin().await.map_err(conn)?;
        for key in keys
            .iter()
            .filter(|key| parse_part_flag_key(level, key).is_some())
        {
            sqlx::query("DELETE FROM kv_store WHERE key = ?1")
                .bind(key)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        let keys = keys_with_prefix(&self.pool, FLAG_PREFIX).await?;
        let mut tx = self.pool.begin().await.map_err(conn)?;
        for key in keys.iter().filter(|key| key.ends_with(FLAG_SUFFIX)) {
            sqlx::query("DELETE FROM kv_store WHERE key = ?1")
                .bind(key)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
