#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cicada_core::model::{LevelId, SubpartKey, Team, TeamId};
use cicada_core::time::fixed_clock;
use services::{
    AnswerVerdict, ApiError, AppServices, LevelStatus, ProgressionTiming, SignupForm, TeamApi,
};
use storage::repository::Storage;

/// Canned reply for the next `submit_answer` call.
pub enum Scripted {
    Verdict(AnswerVerdict),
    Offline,
    Rejected(u16, &'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub level: LevelId,
    pub subpart: Option<SubpartKey>,
    pub answer: String,
}

/// In-process stand-in for the grading service.
#[derive(Default)]
pub struct FakeApi {
    script: Mutex<VecDeque<Scripted>>,
    submissions: Mutex<Vec<Submission>>,
    status: Mutex<Option<LevelStatus>>,
    status_calls: AtomicUsize,
    login_calls: AtomicUsize,
    logout_fails: AtomicBool,
    team: Mutex<Option<Team>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: Scripted) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn set_status(&self, status: LevelStatus) {
        *self.status.lock().unwrap() = Some(status);
    }

    pub fn set_team(&self, team: Team) {
        *self.team.lock().unwrap() = Some(team);
    }

    pub fn fail_logout(&self) {
        self.logout_fails.store(true, Ordering::SeqCst);
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    fn signed_in_team(&self) -> Result<Team, ApiError> {
        self.team.lock().unwrap().clone().ok_or(ApiError::Rejected {
            status: reqwest::StatusCode::UNAUTHORIZED,
            message: "Invalid credentials".into(),
        })
    }
}

#[async_trait]
impl TeamApi for FakeApi {
    async fn login(&self, _leader_email: &str, _password: &str) -> Result<Team, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.signed_in_team()
    }

    async fn signup(&self, _form: &SignupForm) -> Result<Team, ApiError> {
        self.signed_in_team()
    }

    async fn logout(&self) -> Result<(), ApiError> {
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("connection reset".into()));
        }
        Ok(())
    }

    async fn submit_answer(
        &self,
        level: LevelId,
        subpart: Option<SubpartKey>,
        answer: &str,
    ) -> Result<AnswerVerdict, ApiError> {
        self.submissions.lock().unwrap().push(Submission {
            level,
            subpart,
            answer: answer.to_string(),
        });
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scripted::Verdict(AnswerVerdict::incorrect()));
        match reply {
            Scripted::Verdict(verdict) => Ok(verdict),
            Scripted::Offline => Err(ApiError::Transport("network unreachable".into())),
            Scripted::Rejected(status, message) => Err(ApiError::Rejected {
                status: reqwest::StatusCode::from_u16(status).unwrap(),
                message: message.into(),
            }),
        }
    }

    async fn level_status(&self, _level: LevelId) -> Result<LevelStatus, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Transport("no status".into()))
    }
}

pub fn team(level: u32) -> Team {
    Team::new(TeamId::new("65f0"), "Nymphs", LevelId::new(level))
        .unwrap()
        .with_leader("Ada", "ada@juetguna.in")
}

/// Services over in-memory storage and `api`, with a team signed in at `level`.
pub async fn signed_in(api: &Arc<FakeApi>, level: u32, timing: ProgressionTiming) -> (AppServices, Storage) {
    let storage = Storage::in_memory();
    let services = AppServices::new(
        &storage,
        Arc::clone(api) as Arc<dyn TeamApi>,
        None,
        timing,
        fixed_clock(),
    );
    services
        .session_store()
        .set_session(Some(team(level)))
        .await
        .unwrap();
    (services, storage)
}
