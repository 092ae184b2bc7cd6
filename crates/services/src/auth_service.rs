use std::sync::Arc;

use cicada_core::model::Team;
use tracing::{info, warn};

use crate::api::{SignupForm, TeamApi};
use crate::error::AuthError;
use crate::session_store::SessionStore;

/// Login, signup and logout against the grading service, keeping the
/// session store in step.
#[derive(Clone)]
pub struct AuthService {
    api: Arc<dyn TeamApi>,
    store: Arc<SessionStore>,
    allowed_email_domain: Option<String>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        api: Arc<dyn TeamApi>,
        store: Arc<SessionStore>,
        allowed_email_domain: Option<String>,
    ) -> Self {
        Self {
            api,
            store,
            allowed_email_domain,
        }
    }

    /// # Errors
    ///
    /// Returns `AuthError::Validation` for blank credentials, `AuthError::Api`
    /// when the service refuses, or `AuthError::Session` if the team cannot
    /// be saved.
    pub async fn login(&self, leader_email: &str, password: &str) -> Result<Team, AuthError> {
        let leader_email = leader_email.trim();
        if leader_email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Please enter your email and password.".into(),
            ));
        }
        let team = self.api.login(leader_email, password).await?;
        self.store.set_session(Some(team.clone())).await?;
        info!(team = %team.team_name(), "logged in");
        Ok(team)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Validation` for blank fields or emails outside the
    /// allowed domain, `AuthError::Api` when the service refuses, or
    /// `AuthError::Session` if the team cannot be saved.
    pub async fn signup(&self, form: &SignupForm) -> Result<Team, AuthError> {
        if form.has_blank_field() {
            return Err(AuthError::Validation(
                "Please fill out all required fields.".into(),
            ));
        }
        if let Some(domain) = &self.allowed_email_domain {
            if !form.emails().iter().all(|email| email_in_domain(email, domain)) {
                return Err(AuthError::Validation(format!(
                    "All emails must end with @{domain}"
                )));
            }
        }
        let team = self.api.signup(form).await?;
        self.store.set_session(Some(team.clone())).await?;
        info!(team = %team.team_name(), "team registered");
        Ok(team)
    }

    /// Sign out. The local session is only cleared once the service agrees.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Api` if the service refuses; the session is kept.
    pub async fn logout(&self) -> Result<(), AuthError> {
        if let Err(err) = self.api.logout().await {
            warn!(error = %err, "logout refused");
            return Err(err.into());
        }
        self.store.set_session(None).await?;
        info!("logged out");
        Ok(())
    }
}

fn email_in_domain(email: &str, domain: &str) -> bool {
    let Some((local, host)) = email.trim().rsplit_once('@') else {
        return false;
    };
    !local.is_empty() && !local.contains('@') && host.eq_ignore_ascii_case(domain)
}
