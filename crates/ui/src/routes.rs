use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::views::{HomeView, LevelView, PlayView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/play", PlayView)] Play {},
        #[route("/level/:level_id", LevelView)] Level { level_id: u32 },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            TopBar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn TopBar() -> Element {
    rsx! {
        nav { class: "topbar",
            h1 { class: "brand", "CICADA" }
            ul {
                li { Link { to: Route::Home {}, "Home" } }
                li { Link { to: Route::Play {}, "Play" } }
            }
        }
    }
}
