use std::sync::Arc;
use std::time::Duration;

use cicada_core::model::{LevelId, PartId};
use cicada_core::progression::PartState;
use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};
use services::SubmitOutcome;
use tracing::{debug, info, warn};

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::ViewError;
use crate::vm::{LOCKED_LEVEL_MESSAGE, PartBodyVm, PartRowVm, map_level_page};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Access {
    Checking,
    Open,
    Locked,
}

#[component]
pub fn LevelView(level_id: u32) -> Element {
    // A new key remounts the page, so each level visit gets its own controller.
    rsx! {
        LevelPage { key: "{level_id}", level_id }
    }
}

#[component]
fn LevelPage(level_id: u32) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let level = LevelId::new(level_id);
    let controller = use_hook(|| ctx.controller_for(level).ok().map(Arc::new));
    let access = use_signal(|| Access::Checking);
    let state = use_signal(|| controller.as_ref().map(|controller| controller.state()));
    let hint_visible = use_signal(|| false);

    {
        let controller = controller.clone();
        use_drop(move || {
            if let Some(controller) = controller {
                controller.cancel();
            }
        });
    }

    {
        let controller = controller.clone();
        let session_store = ctx.session_store();
        use_future(move || {
            let controller = controller.clone();
            let session_store = session_store.clone();
            let mut access = access;
            let mut state = state;
            async move {
                let Some(controller) = controller else {
                    return;
                };
                let team = match session_store.restore_from_persisted().await {
                    Ok(Some(team)) => team,
                    Ok(None) => {
                        navigator.replace(Route::Home {});
                        return;
                    }
                    Err(err) => {
                        warn!(error = %err, "session could not be restored");
                        navigator.replace(Route::Home {});
                        return;
                    }
                };
                if !team.is_level_unlocked(level) {
                    access.set(Access::Locked);
                    return;
                }
                access.set(Access::Open);

                let restored = controller.hydrate().await;
                debug!(level = level_id, restored, "level page ready");
                let mut updates = controller.subscribe();
                state.set(Some(updates.borrow_and_update().clone()));
                while updates.changed().await.is_ok() {
                    state.set(Some(updates.borrow_and_update().clone()));
                }
            }
        });
    }

    let hint = controller
        .as_ref()
        .and_then(|controller| controller.level().hint().cloned());
    {
        let reveal_after = hint
            .as_ref()
            .map(|hint| Duration::from_secs(u64::from(hint.reveal_after_secs)));
        use_future(move || {
            let mut hint_visible = hint_visible;
            async move {
                if let Some(delay) = reveal_after {
                    tokio::time::sleep(delay).await;
                    hint_visible.set(true);
                }
            }
        });
    }

    let on_draft = {
        let controller = controller.clone();
        use_callback(move |(part, text): (PartId, String)| {
            if let Some(controller) = controller.as_ref() {
                controller.set_draft(part, text);
            }
        })
    };

    let on_submit = {
        let controller = controller.clone();
        use_callback(move |part: PartId| {
            let Some(controller) = controller.clone() else {
                return;
            };
            let draft = controller
                .snapshot()
                .part(part)
                .map(|snapshot| snapshot.draft.clone())
                .unwrap_or_default();
            spawn(async move {
                match controller.submit(part, &draft).await {
                    Ok(SubmitOutcome::LevelCompleted { new_level, .. }) => {
                        info!(level = level_id, unlocked = new_level.value(), "level completed");
                        navigator.push(Route::Play {});
                    }
                    Ok(outcome) => debug!(?outcome, "submission resolved"),
                    Err(err) => debug!(error = %err, "submission not accepted"),
                }
            });
        })
    };

    let Some(controller) = controller else {
        return rsx! {
            div { class: "page level-page",
                p { class: "form-error", "{ViewError::UnknownLevel.message()}" }
                Link { class: "btn", to: Route::Play {}, "Back to map" }
            }
        };
    };

    match access() {
        Access::Checking => rsx! {
            div { class: "page level-page",
                p { class: "muted", "Loading..." }
            }
        },
        Access::Locked => rsx! {
            div { class: "page level-page",
                p { class: "notice notice-failure", "{LOCKED_LEVEL_MESSAGE}" }
                Link { class: "btn", to: Route::Play {}, "Back to map" }
            }
        },
        Access::Open => {
            let Some(vm) = state
                .read()
                .as_ref()
                .map(|state| map_level_page(controller.level(), state))
            else {
                return rsx! {
                    div { class: "page level-page",
                        p { class: "muted", "Loading..." }
                    }
                };
            };
            let total = vm.rows.len();
            rsx! {
                div { class: "page level-page",
                    header { class: "page-header",
                        h2 { "Level {vm.level}: {vm.title}" }
                        span { class: "level-progress", "{vm.solved}/{total} solved" }
                    }
                    if let Some(notice) = vm.notice.clone() {
                        div {
                            class: notice.class,
                            onclick: move |_| controller.dismiss_notice(),
                            "{notice.message}"
                        }
                    }
                    for row in vm.rows.clone() {
                        PartRow {
                            key: "{row.id}",
                            row: row.clone(),
                            on_draft,
                            on_submit,
                        }
                    }
                    if hint_visible() {
                        if let Some(hint) = hint.clone() {
                            aside { class: "hint", "Hint: {hint.text}" }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn PartRow(
    row: PartRowVm,
    on_draft: EventHandler<(PartId, String)>,
    on_submit: EventHandler<PartId>,
) -> Element {
    let part = row.id;
    rsx! {
        section { class: row.state_class(),
            h3 { "{row.title}" }
            if row.state == PartState::Locked {
                p { class: "muted", "Solve the previous part to unlock this one." }
            } else {
                PartBody { body: row.body.clone() }
                div { class: "answer-row",
                    input {
                        id: row.dom_id(),
                        r#type: "text",
                        placeholder: "Enter your answer",
                        value: "{row.draft}",
                        disabled: !row.input_enabled,
                        oninput: move |evt| on_draft.call((part, evt.value())),
                        onkeydown: move |evt: KeyboardEvent| {
                            if evt.key() == Key::Enter {
                                on_submit.call(part);
                            }
                        },
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        disabled: !row.submit_enabled,
                        onclick: move |_| on_submit.call(part),
                        "{row.button_label}"
                    }
                }
            }
        }
    }
}

#[component]
fn PartBody(body: PartBodyVm) -> Element {
    match body {
        PartBodyVm::Html(html) => rsx! {
            div { class: "part-text", dangerous_inner_html: "{html}" }
        },
        PartBodyVm::Cipher { lines, legend } => rsx! {
            div { class: "cipher",
                for (index, line) in lines.iter().enumerate() {
                    p { key: "{index}", class: "cipher-line", "{line}" }
                }
                table { class: "cipher-legend",
                    tbody {
                        for (letter, glyph) in legend.iter() {
                            tr { key: "{letter}",
                                td { "{letter}" }
                                td { "{glyph}" }
                            }
                        }
                    }
                }
            }
        },
        PartBodyVm::Video { uri } => rsx! {
            video { class: "part-video", src: "{uri}", controls: true }
        },
    }
}
