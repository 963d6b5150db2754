use dioxus::prelude::*;

use quest_core::{FailedRequest, IntakeForm, IntakeSchema, IntakeStep, QuestEvent, QuestPhase, StoryRequest};

use crate::context::AppContext;
use crate::views::{
    ErrorPanel, LoadingPanel, QuestStore, ViewError, ViewState, use_quest_store,
    view_state_from_resource,
};
use crate::vm::{intake_vm, load_intake_schema, start_quest};

/// Send the bootstrap request and hand over to the story view once a scene arrives.
fn launch_quest(
    ctx: &AppContext,
    store: QuestStore,
    request: StoryRequest,
    on_started: EventHandler<()>,
) {
    let event = if *store.phase.peek() == QuestPhase::Failed(FailedRequest::Bootstrap) {
        QuestEvent::Retry
    } else {
        QuestEvent::IntakeSubmitted
    };
    if !store.transition(event) {
        return;
    }

    let mut store = store;
    store.profile.set(Some(request.clone()));
    store.error.set(None);
    let quest_loop = ctx.quest_loop();
    spawn(async move {
        match start_quest(&quest_loop, request).await {
            Ok(session) => {
                let finished = session.is_finished();
                if store.transition(QuestEvent::SceneReceived {
                    finished,
                    feedback: false,
                }) {
                    store.session.set(Some(session));
                    on_started.call(());
                }
            }
            Err(err) => {
                store.error.set(Some(err));
                store.transition(QuestEvent::RequestFailed);
            }
        }
    });
}

fn form_for(schema: &ViewState<IntakeSchema>) -> Option<IntakeForm> {
    match schema {
        ViewState::Ready(schema) => IntakeForm::new(schema.clone()).ok(),
        _ => None,
    }
}

#[component]
pub fn IntakeView(on_started: EventHandler<()>) -> Element {
    let ctx = use_context::<AppContext>();
    let store = use_quest_store();
    let mut form = use_signal(|| None::<IntakeForm>);
    let mut draft = use_signal(String::new);
    let mut input_error = use_signal(|| None::<String>);

    let schema = {
        let quest_loop = ctx.quest_loop();
        use_resource(move || {
            let quest_loop = quest_loop.clone();
            async move { load_intake_schema(&quest_loop).await }
        })
    };

    {
        let ctx = ctx.clone();
        use_hook(move || {
            if ctx.take_quick_start_on_launch() {
                launch_quest(&ctx, store, StoryRequest::quick_start(), on_started);
            }
        });
    }

    let on_submit = {
        let ctx = ctx.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            let stored = form.peek().clone();
            let Some(mut current) = stored.or_else(|| form_for(&view_state_from_resource(&schema)))
            else {
                return;
            };
            let answer = draft.peek().clone();
            match current.submit(&answer) {
                Ok(IntakeStep::Next { index }) => {
                    draft.set(current.answer_at(index).unwrap_or_default().to_string());
                    input_error.set(None);
                    form.set(Some(current));
                }
                Ok(IntakeStep::Complete(answers)) => {
                    input_error.set(None);
                    form.set(Some(current));
                    launch_quest(&ctx, store, answers.story_request(), on_started);
                }
                Err(err) => input_error.set(Some(err.to_string())),
            }
        }
    };

    let on_back = move |_: MouseEvent| {
        let previous = {
            let mut guard = form.write();
            match guard.as_mut() {
                Some(current) => {
                    if current.back() {
                        Some(current.answer_at(current.position()).unwrap_or_default().to_string())
                    } else {
                        None
                    }
                }
                None => None,
            }
        };
        if let Some(previous) = previous {
            draft.set(previous);
            input_error.set(None);
        }
    };

    let on_quick_start = {
        let ctx = ctx.clone();
        move |_: MouseEvent| launch_quest(&ctx, store, StoryRequest::quick_start(), on_started)
    };

    let on_retry_start = {
        let ctx = ctx.clone();
        move |()| {
            let request = store
                .profile
                .peek()
                .clone()
                .unwrap_or_else(StoryRequest::quick_start);
            launch_quest(&ctx, store, request, on_started);
        }
    };

    let phase = *store.phase.read();
    let backend_label = ctx.backend_label().to_string();

    if phase == QuestPhase::AwaitingFirstScene {
        return rsx! {
            LoadingPanel { label: "Preparing your adventure…" }
        };
    }
    if phase == QuestPhase::Failed(FailedRequest::Bootstrap) {
        let error = (*store.error.read()).unwrap_or(ViewError::Unknown);
        return rsx! {
            section { class: "intake",
                h2 { "Your adventure could not start" }
                ErrorPanel {
                    error,
                    backend_label,
                    detail: None,
                    on_retry: on_retry_start,
                }
            }
        };
    }

    let schema_state = view_state_from_resource(&schema);
    let current = form.read().clone().or_else(|| form_for(&schema_state));

    let body = match (&schema_state, current) {
        (_, Some(current)) => {
            let vm = intake_vm(&current);
            rsx! {
                form { class: "intake__form", onsubmit: on_submit,
                    p { class: "intake__step", "{vm.step_label}" }
                    label { class: "intake__prompt", r#for: "intake-answer", "{vm.prompt}" }
                    input {
                        id: "intake-answer",
                        class: "intake__input",
                        r#type: "text",
                        autocomplete: "off",
                        placeholder: "{vm.previous_answer}",
                        value: "{draft}",
                        oninput: move |evt| draft.set(evt.value()),
                    }
                    if let Some(message) = input_error() {
                        p { class: "intake__error", "{message}" }
                    }
                    div { class: "intake__actions",
                        if vm.can_go_back {
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: on_back,
                                "Back"
                            }
                        }
                        button { class: "btn btn-primary", r#type: "submit", "{vm.submit_label}" }
                    }
                }
            }
        }
        (ViewState::Error(err), None) => rsx! {
            ErrorPanel {
                error: *err,
                backend_label,
                detail: None,
                on_retry: move |()| {
                    let mut schema = schema;
                    schema.restart();
                },
            }
        },
        (ViewState::Idle | ViewState::Loading, None) => rsx! {
            LoadingPanel { label: "Loading…" }
        },
        (ViewState::Ready(_), None) => rsx! {
            p { class: "intake__empty", "The story server asked no questions." }
        },
    };

    rsx! {
        section { class: "intake",
            header { class: "intake__header",
                h2 { "Tell us about your adventure" }
                button {
                    class: "btn btn-link",
                    r#type: "button",
                    onclick: on_quick_start,
                    "Quick start"
                }
            }
            {body}
        }
    }
}
