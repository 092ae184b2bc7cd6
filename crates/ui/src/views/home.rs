use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};
use tracing::info;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{LOGIN_FAILED, auth_error_message};

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let error = use_signal(|| None::<String>);
    let busy = use_signal(|| false);

    let session_store = ctx.session_store();
    let session = use_resource(move || {
        let session_store = session_store.clone();
        async move {
            session_store
                .restore_from_persisted()
                .await
                .map_err(|_| ViewError::Unknown)
        }
    });
    let state = view_state_from_resource(session);

    let auth = ctx.auth();
    let on_login = use_callback(move |()| {
        let auth = auth.clone();
        let mut error = error;
        let mut busy = busy;
        if busy() {
            return;
        }
        let email_value = email.read().clone();
        let password_value = password.read().clone();
        spawn(async move {
            busy.set(true);
            error.set(None);
            let result = auth.login(&email_value, &password_value).await;
            busy.set(false);
            match result {
                Ok(team) => {
                    info!(team = team.team_name(), "signed in");
                    navigator.push(Route::Play {});
                }
                Err(err) => error.set(Some(auth_error_message(&err, LOGIN_FAILED))),
            }
        });
    });

    rsx! {
        div { class: "page home-page",
            h2 { class: "home-title", "CICADA" }
            p { class: "home-tagline",
                "Epiphany is upon you. Your pilgrimage has begun. "
                span { class: "accent", "Enlightenment awaits." }
            }
            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { class: "muted", "Loading..." }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "form-error", "{err.message()}" }
                },
                ViewState::Ready(Some(team)) => rsx! {
                    div { class: "terminal",
                        p { "Signed in as " span { class: "accent", "{team.team_name()}" } }
                        p { "Current level: {team.current_level()}" }
                        Link { class: "btn btn-primary", to: Route::Play {}, "CONTINUE" }
                    }
                },
                ViewState::Ready(None) => rsx! {
                    form { class: "terminal login-form",
                        onsubmit: move |evt| {
                            evt.prevent_default();
                            on_login.call(());
                        },
                        label { r#for: "leader-email", "Leader email" }
                        input {
                            id: "leader-email",
                            r#type: "email",
                            value: "{email}",
                            oninput: move |evt| email.set(evt.value()),
                        }
                        label { r#for: "password", "Password" }
                        input {
                            id: "password",
                            r#type: "password",
                            value: "{password}",
                            oninput: move |evt| password.set(evt.value()),
                        }
                        button {
                            class: "btn btn-primary",
                            r#type: "submit",
                            disabled: busy(),
                            if busy() { "Signing in..." } else { "ENTER" }
                        }
                        if let Some(message) = error() {
                            p { class: "form-error", "{message}" }
                        }
                    }
                },
            }
        }
    }
}
