//! Seam to the external grading/auth service.

use std::fmt;

use async_trait::async_trait;
use cicada_core::model::{LevelId, SubpartKey, Team};
use serde::Serialize;

use crate::error::ApiError;

mod http;
mod wire;

pub use http::HttpTeamApi;
pub use wire::LevelStatus;

/// Normalized grader verdict for one submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerVerdict {
    pub correct: bool,
    pub message: Option<String>,
    pub new_level: Option<LevelId>,
}

impl AnswerVerdict {
    #[must_use]
    pub fn correct() -> Self {
        Self {
            correct: true,
            message: None,
            new_level: None,
        }
    }

    #[must_use]
    pub fn incorrect() -> Self {
        Self {
            correct: false,
            message: None,
            new_level: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_new_level(mut self, level: LevelId) -> Self {
        self.new_level = Some(level);
        self
    }
}

/// Team registration, sent to the service as-is.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignupForm {
    pub team_name: String,
    pub leader_name: String,
    pub leader_email: String,
    pub member1_name: String,
    pub member1_email: String,
    pub member2_name: String,
    pub member2_email: String,
    pub password: String,
}

impl SignupForm {
    #[must_use]
    pub fn emails(&self) -> [&str; 3] {
        [
            self.leader_email.as_str(),
            self.member1_email.as_str(),
            self.member2_email.as_str(),
        ]
    }

    fn fields(&self) -> [&str; 8] {
        [
            self.team_name.as_str(),
            self.leader_name.as_str(),
            self.leader_email.as_str(),
            self.member1_name.as_str(),
            self.member1_email.as_str(),
            self.member2_name.as_str(),
            self.member2_email.as_str(),
            self.password.as_str(),
        ]
    }

    /// True when any required field is blank.
    #[must_use]
    pub fn has_blank_field(&self) -> bool {
        self.fields().iter().any(|field| field.trim().is_empty())
    }
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("team_name", &self.team_name)
            .field("leader_email", &self.leader_email)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Operations offered by the grading/auth service.
///
/// Every call carries the session cookie set at login.
#[async_trait]
pub trait TeamApi: Send + Sync {
    async fn login(&self, leader_email: &str, password: &str) -> Result<Team, ApiError>;

    async fn signup(&self, form: &SignupForm) -> Result<Team, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    /// Grade `answer` for `level`; `subpart` is omitted for single-part levels.
    async fn submit_answer(
        &self,
        level: LevelId,
        subpart: Option<SubpartKey>,
        answer: &str,
    ) -> Result<AnswerVerdict, ApiError>;

    async fn level_status(&self, level: LevelId) -> Result<LevelStatus, ApiError>;
}
