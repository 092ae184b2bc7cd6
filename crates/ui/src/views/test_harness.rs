use std::sync::Arc;

use async_trait::async_trait;
use cicada_core::model::{LevelId, SubpartKey, Team, TeamId};
use cicada_core::time::fixed_clock;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::{
    AnswerVerdict, ApiError, AppServices, LevelStatus, ProgressionTiming, SignupForm, TeamApi,
};
use storage::repository::Storage;

use crate::context::{UiApp, build_app_context};
use crate::views::{HomeView, LevelView, PlayView};

/// Grading service that refuses every answer and knows no sub-parts.
struct StubApi;

#[async_trait]
impl TeamApi for StubApi {
    async fn login(&self, _leader_email: &str, _password: &str) -> Result<Team, ApiError> {
        Err(ApiError::Transport("offline".to_string()))
    }

    async fn signup(&self, _form: &SignupForm) -> Result<Team, ApiError> {
        Err(ApiError::Transport("offline".to_string()))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn submit_answer(
        &self,
        _level: LevelId,
        _subpart: Option<SubpartKey>,
        _answer: &str,
    ) -> Result<AnswerVerdict, ApiError> {
        Ok(AnswerVerdict::incorrect())
    }

    async fn level_status(&self, _level: LevelId) -> Result<LevelStatus, ApiError> {
        Ok(LevelStatus::new(Vec::new()))
    }
}

pub fn team(level: u32) -> Team {
    Team::new(TeamId::new("t1"), "Cicadas", LevelId::new(level)).expect("valid team")
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Play,
    Level(u32),
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<dyn UiApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    use_context_provider(|| build_app_context(&props.app));
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::Play => rsx! { PlayView {} },
        ViewKind::Level(level_id) => rsx! { LevelView { level_id } },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub storage: Storage,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuild and let resources and futures settle.
    pub async fn settle(&mut self) {
        self.rebuild();
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// Harness over in-memory storage, optionally with a signed-in team.
pub async fn setup_view_harness(view: ViewKind, signed_in: Option<Team>) -> ViewHarness {
    let storage = Storage::in_memory();
    let services = AppServices::new(
        &storage,
        Arc::new(StubApi),
        None,
        ProgressionTiming::immediate(),
        fixed_clock(),
    );
    if let Some(team) = signed_in {
        services
            .session_store()
            .set_session(Some(team))
            .await
            .expect("seed session");
    }

    let app: Arc<dyn UiApp> = Arc::new(services);
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });

    ViewHarness { dom, storage }
}
