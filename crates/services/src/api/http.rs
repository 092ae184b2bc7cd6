use async_trait::async_trait;
use cicada_core::model::{LevelId, SubpartKey, Team};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::wire::{ErrorBody, LevelStatus, LoginRequest, SubmitRequest, SubmitResponse, TeamEnvelope};
use super::{AnswerVerdict, SignupForm, TeamApi};
use crate::config::ApiConfig;
use crate::error::ApiError;

/// `TeamApi` over HTTP with a cookie jar for the team session.
#[derive(Clone)]
pub struct HttpTeamApi {
    client: Client,
    base_url: Url,
}

impl HttpTeamApi {
    /// Build a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }
}

/// Decode a JSON body, mapping non-success statuses to `ApiError::Rejected`
/// with the body's `err` text or `fallback`.
async fn read_json<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.err)
            .filter(|err| !err.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        return Err(ApiError::Rejected { status, message });
    }
    serde_json::from_slice(&bytes).map_err(|err| ApiError::Transport(err.to_string()))
}

#[async_trait]
impl TeamApi for HttpTeamApi {
    async fn login(&self, leader_email: &str, password: &str) -> Result<Team, ApiError> {
        debug!(leader_email, "login");
        let response = self
            .client
            .post(self.endpoint("api/team/login")?)
            .json(&LoginRequest {
                leader_email,
                password,
            })
            .send()
            .await?;
        let envelope: TeamEnvelope = read_json(response, "Login failed").await?;
        Ok(envelope.team)
    }

    async fn signup(&self, form: &SignupForm) -> Result<Team, ApiError> {
        debug!(team_name = %form.team_name, "signup");
        let response = self
            .client
            .post(self.endpoint("api/team/signup")?)
            .json(form)
            .send()
            .await?;
        let envelope: TeamEnvelope = read_json(response, "Signup failed").await?;
        Ok(envelope.team)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        debug!("logout");
        let response = self
            .client
            .post(self.endpoint("api/team/logout")?)
            .send()
            .await?;
        let _: serde_json::Value = read_json(response, "Logout failed").await?;
        Ok(())
    }

    async fn submit_answer(
        &self,
        level: LevelId,
        subpart: Option<SubpartKey>,
        answer: &str,
    ) -> Result<AnswerVerdict, ApiError> {
        debug!(level = level.value(), subpart = ?subpart, "submit answer");
        let response = self
            .client
            .post(self.endpoint("api/submit/ans")?)
            .json(&SubmitRequest {
                ans: answer,
                level: level.value(),
                subpart,
            })
            .send()
            .await?;
        let body: SubmitResponse = read_json(response, "Submission failed.").await?;
        Ok(AnswerVerdict {
            correct: body.correct,
            message: body.msg.filter(|msg| !msg.trim().is_empty()),
            new_level: body.new_level.filter(|level| *level >= 1).map(LevelId::new),
        })
    }

    async fn level_status(&self, level: LevelId) -> Result<LevelStatus, ApiError> {
        let response = self
            .client
            .get(self.endpoint(&format!("api/level-status/{level}"))?)
            .send()
            .await?;
        read_json(response, "Level status unavailable").await
    }
}
