#![forbid(unsafe_code)]

pub mod api;
pub mod app_services;
pub mod auth_service;
pub mod config;
pub mod error;
pub mod progression_controller;
pub mod session_store;

pub use cicada_core::Clock;

pub use api::{AnswerVerdict, HttpTeamApi, LevelStatus, SignupForm, TeamApi};
pub use app_services::AppServices;
pub use auth_service::AuthService;
pub use config::{ApiConfig, ProgressionTiming};
pub use error::{ApiError, AppServicesError, AuthError, SessionStoreError, SubmitError};
pub use progression_controller::{
    ControllerState, LevelProgressionController, Notice, NoticeKind, SubmitOutcome,
};
pub use session_store::SessionStore;
