use dioxus::prelude::*;
use dioxus_router::Router;

use crate::routes::Route;

const STYLE: Asset = asset!("/assets/style.css");

#[component]
pub fn App() -> Element {
    rsx! {
        document::Stylesheet { href: STYLE }
        document::Title { "CICADA" }

        div { class: "app-root",
            ErrorBoundary {
                handle_error: |errors: ErrorContext| rsx! {
                    TransmissionLost { details: format!("{errors:?}") }
                },
                Router::<Route> {}
            }
        }
    }
}

#[component]
fn TransmissionLost(details: String) -> Element {
    rsx! {
        div { class: "page fatal",
            h1 { "Transmission lost" }
            p { class: "muted", "Restart the client to reconnect." }
            pre { "{details}" }
        }
    }
}
