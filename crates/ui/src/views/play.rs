use std::time::Duration;

use cicada_core::model::LevelId;
use dioxus::prelude::*;
use dioxus_router::use_navigator;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{
    LOCKED_LEVEL_MESSAGE, LOGOUT_FAILED, LevelMapVm, LevelTileVm, PLAY_COUNTDOWN_SECS,
    auth_error_message,
};

/// Pause between the countdown reaching zero and the level opening.
const LAUNCH_DELAY: Duration = Duration::from_millis(200);

#[component]
pub fn PlayView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let countdown = use_signal(|| None::<u32>);
    let message = use_signal(|| None::<String>);

    let session_store = ctx.session_store();
    let catalog = ctx.catalog();
    let resource = use_resource(move || {
        let session_store = session_store.clone();
        let catalog = catalog.clone();
        async move {
            let team = session_store
                .restore_from_persisted()
                .await
                .map_err(|_| ViewError::Unknown)?;
            Ok::<_, ViewError>(team.map(|team| LevelMapVm::new(&team, &catalog)))
        }
    });
    let state = view_state_from_resource(resource);

    use_effect(move || {
        if let Some(Ok(None)) = resource.value().read().as_ref() {
            navigator.replace(Route::Home {});
        }
    });

    let on_play = use_callback(move |(vm, level): (LevelMapVm, LevelId)| {
        let mut countdown = countdown;
        let mut message = message;
        if countdown().is_some() {
            return;
        }
        if !vm.can_play(level) {
            message.set(Some(LOCKED_LEVEL_MESSAGE.to_string()));
            return;
        }
        message.set(None);
        spawn(async move {
            let mut remaining = PLAY_COUNTDOWN_SECS;
            countdown.set(Some(remaining));
            while remaining > 0 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                remaining -= 1;
                countdown.set(Some(remaining));
            }
            countdown.set(None);
            tokio::time::sleep(LAUNCH_DELAY).await;
            navigator.push(Route::Level {
                level_id: level.value(),
            });
        });
    });

    let auth = ctx.auth();
    let on_logout = use_callback(move |()| {
        let auth = auth.clone();
        let mut message = message;
        spawn(async move {
            match auth.logout().await {
                Ok(()) => {
                    info!("signed out");
                    navigator.replace(Route::Home {});
                }
                Err(err) => {
                    warn!(error = %err, "logout failed");
                    message.set(Some(auth_error_message(&err, LOGOUT_FAILED)));
                }
            }
        });
    });

    rsx! {
        div { class: "page play-page",
            match state {
                ViewState::Idle | ViewState::Loading | ViewState::Ready(None) => rsx! {
                    p { class: "muted", "Loading..." }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "form-error", "{err.message()}" }
                },
                ViewState::Ready(Some(vm)) => rsx! {
                    header { class: "page-header",
                        h2 { "Team {vm.team_name}" }
                        button {
                            class: "btn",
                            r#type: "button",
                            onclick: move |_| on_logout.call(()),
                            "LOGOUT"
                        }
                    }
                    if let Some(text) = message() {
                        p { class: "notice notice-failure", "{text}" }
                    }
                    if vm.finished {
                        div { class: "celebrate",
                            h1 { "CONGRATULATIONS!" }
                            p { "You have completed all challenges. You are truly one of the chosen." }
                        }
                    }
                    ol { class: "level-map",
                        for tile in vm.tiles.clone() {
                            LevelTile {
                                key: "{tile.level}",
                                tile: tile.clone(),
                                on_play: {
                                    let vm = vm.clone();
                                    move |level: LevelId| on_play.call((vm.clone(), level))
                                },
                            }
                        }
                    }
                },
            }
            if let Some(remaining) = countdown() {
                div { class: "countdown-overlay",
                    span { class: "countdown-digit", "{remaining}" }
                }
            }
        }
    }
}

#[component]
fn LevelTile(tile: LevelTileVm, on_play: EventHandler<LevelId>) -> Element {
    let level = tile.level;
    rsx! {
        li { class: tile.class(),
            div { class: "tile-number", "{level}" }
            div { class: "tile-caption", "LVL" }
            div { class: "tile-title", "{tile.title}" }
            if tile.is_playable() {
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    onclick: move |_| on_play.call(level),
                    "PLAY"
                }
            } else {
                button {
                    class: "tile-lock",
                    r#type: "button",
                    title: LOCKED_LEVEL_MESSAGE,
                    onclick: move |_| on_play.call(level),
                    "🔒"
                }
            }
        }
    }
}
