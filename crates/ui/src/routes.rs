use dioxus::prelude::*;
use dioxus_router::{Outlet, Routable, use_navigator};

use crate::context::AppContext;
use crate::views::{IntakeView, QuestView, use_quest_store, use_quest_store_provider};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", IntakePage)] Intake {},
        #[route("/quest", QuestPage)] Quest {},
}

#[component]
fn Layout() -> Element {
    use_quest_store_provider();
    rsx! {
        div { class: "app",
            Header {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Header() -> Element {
    let ctx = use_context::<AppContext>();
    let store = use_quest_store();
    let navigator = use_navigator();
    let in_quest = store.session.read().is_some();

    rsx! {
        header { class: "topbar",
            h1 { "Math Quest" }
            span { class: "topbar__backend", "{ctx.backend_label()}" }
            if in_quest {
                button {
                    class: "btn btn-link",
                    r#type: "button",
                    onclick: move |_| {
                        store.reset();
                        navigator.replace(Route::Intake {});
                    },
                    "Start over"
                }
            }
        }
    }
}

#[component]
fn IntakePage() -> Element {
    let navigator = use_navigator();
    rsx! {
        IntakeView {
            on_started: move |()| {
                navigator.push(Route::Quest {});
            },
        }
    }
}

#[component]
fn QuestPage() -> Element {
    let navigator = use_navigator();
    rsx! {
        QuestView {
            on_reset: move |()| {
                navigator.replace(Route::Intake {});
            },
        }
    }
}
