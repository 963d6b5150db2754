use dioxus::prelude::*;

use super::ViewError;

#[component]
pub fn ErrorPanel(
    error: ViewError,
    backend_label: String,
    detail: Option<String>,
    on_retry: EventHandler<()>,
) -> Element {
    let hint = error
        .suggests_backend_check()
        .then(|| format!("Make sure the story server is running at {backend_label}."));

    rsx! {
        div { class: "error-panel", role: "alert",
            p { class: "error-panel__message", "{error.message()}" }
            if let Some(hint) = hint {
                p { class: "error-panel__hint", "{hint}" }
            }
            if let Some(detail) = detail {
                pre { class: "error-panel__detail", "{detail}" }
            }
            button {
                class: "btn btn-primary",
                r#type: "button",
                onclick: move |_| on_retry.call(()),
                "Retry"
            }
        }
    }
}

#[component]
pub fn LoadingPanel(#[props(into)] label: String) -> Element {
    rsx! {
        div { class: "loading", aria_busy: "true",
            span { class: "loading__spinner" }
            p { "{label}" }
        }
    }
}
