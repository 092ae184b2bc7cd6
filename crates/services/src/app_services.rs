use std::sync::Arc;

use cicada_core::Clock;
use cicada_core::model::{LevelCatalog, LevelId};
use storage::repository::Storage;
use tracing::info;

use crate::api::{HttpTeamApi, TeamApi};
use crate::auth_service::AuthService;
use crate::config::{ApiConfig, ProgressionTiming};
use crate::error::AppServicesError;
use crate::progression_controller::LevelProgressionController;
use crate::session_store::SessionStore;

/// Assembles app-facing services over one storage backend and one API client.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<LevelCatalog>,
    api: Arc<dyn TeamApi>,
    session_store: Arc<SessionStore>,
    auth: Arc<AuthService>,
    timing: ProgressionTiming,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the HTTP
    /// client cannot be built.
    pub async fn new_sqlite(
        db_url: &str,
        api_config: &ApiConfig,
        timing: ProgressionTiming,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, clock).await?;
        let api: Arc<dyn TeamApi> = Arc::new(HttpTeamApi::new(api_config)?);
        info!(api = %api_config.base_url, "services ready");
        Ok(Self::new(
            &storage,
            api,
            api_config.allowed_email_domain.clone(),
            timing,
            clock,
        ))
    }

    /// Build services from already constructed parts.
    #[must_use]
    pub fn new(
        storage: &Storage,
        api: Arc<dyn TeamApi>,
        allowed_email_domain: Option<String>,
        timing: ProgressionTiming,
        clock: Clock,
    ) -> Self {
        let session_store = Arc::new(SessionStore::from_storage(storage, clock));
        let auth = Arc::new(AuthService::new(
            Arc::clone(&api),
            Arc::clone(&session_store),
            allowed_email_domain,
        ));
        Self {
            catalog: Arc::new(LevelCatalog::standard()),
            api,
            session_store,
            auth,
            timing,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<LevelCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn session_store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.session_store)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn timing(&self) -> ProgressionTiming {
        self.timing
    }

    /// A fresh controller for one visit to `level`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::UnknownLevel` if the catalog has no such level.
    pub fn controller_for(
        &self,
        level: LevelId,
    ) -> Result<LevelProgressionController, AppServicesError> {
        let level = self
            .catalog
            .get(level)
            .cloned()
            .ok_or(AppServicesError::UnknownLevel(level.value()))?;
        Ok(LevelProgressionController::new(
            level,
            Arc::clone(&self.api),
            Arc::clone(&self.session_store),
            self.timing,
        ))
    }
}
