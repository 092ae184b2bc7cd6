use std::sync::Arc;

use cicada_core::model::{LevelCatalog, LevelId};
use services::{AppServices, AppServicesError, AuthService, LevelProgressionController, SessionStore};

pub trait UiApp: Send + Sync {
    fn catalog(&self) -> Arc<LevelCatalog>;
    fn session_store(&self) -> Arc<SessionStore>;
    fn auth(&self) -> Arc<AuthService>;

    /// # Errors
    ///
    /// Returns `AppServicesError::UnknownLevel` for levels outside the catalog.
    fn controller_for(
        &self,
        level: LevelId,
    ) -> Result<LevelProgressionController, AppServicesError>;
}

impl UiApp for AppServices {
    fn catalog(&self) -> Arc<LevelCatalog> {
        AppServices::catalog(self)
    }

    fn session_store(&self) -> Arc<SessionStore> {
        AppServices::session_store(self)
    }

    fn auth(&self) -> Arc<AuthService> {
        AppServices::auth(self)
    }

    fn controller_for(
        &self,
        level: LevelId,
    ) -> Result<LevelProgressionController, AppServicesError> {
        AppServices::controller_for(self, level)
    }
}

#[derive(Clone)]
pub struct AppContext {
    app: Arc<dyn UiApp>,
    catalog: Arc<LevelCatalog>,
    session_store: Arc<SessionStore>,
    auth: Arc<AuthService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            app: Arc::clone(app),
            catalog: app.catalog(),
            session_store: app.session_store(),
            auth: app.auth(),
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

    /// A fresh controller for one visit to a level page.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::UnknownLevel` for levels outside the catalog.
    pub fn controller_for(
        &self,
        level: LevelId,
    ) -> Result<LevelProgressionController, AppServicesError> {
        self.app.controller_for(level)
    }
}

// Provided by the composition root (`crates/app`) or the view test harness.

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
