use dioxus::prelude::*;

use quest_core::{FailedRequest, QuestEvent, QuestPhase};

use crate::context::AppContext;
use crate::views::{ErrorPanel, ViewError, use_quest_store};
use crate::vm::{
    FeedbackVm, ImageVm, RecapRowVm, SceneBodyVm, SceneVm, markdown_to_html, progress_label,
    render_scene,
};

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::rc::Rc;

#[component]
pub fn QuestView(on_reset: EventHandler<()>) -> Element {
    let ctx = use_context::<AppContext>();
    let store = use_quest_store();

    let submit_choice = {
        let quest_loop = ctx.quest_loop();
        use_callback(move |choice: String| {
            let mut store = store;
            if !store.phase.peek().accepts_choice() {
                return;
            }

            let started = {
                let mut guard = store.session.write();
                let Some(session) = guard.as_mut() else {
                    return;
                };
                quest_loop
                    .begin_turn(session, &choice)
                    .map(|ticket| (ticket, session.clone()))
            };
            let (ticket, mut snapshot) = match started {
                Ok(started) => started,
                Err(err) => {
                    tracing::warn!(%err, "choice refused");
                    return;
                }
            };
            store.error.set(None);
            store.transition(QuestEvent::ChoiceSubmitted);

            let quest_loop = quest_loop.clone();
            spawn(async move {
                match quest_loop.complete_turn(&mut snapshot, ticket).await {
                    Ok(outcome) => {
                        let finished = outcome.finished;
                        let feedback = outcome
                            .feedback
                            .filter(|_| !outcome.dwell.is_zero())
                            .map(|text| FeedbackVm {
                                text,
                                correct: outcome.correct,
                            });
                        if let Some(feedback) = feedback {
                            if !store.transition(QuestEvent::SceneReceived {
                                finished,
                                feedback: true,
                            }) {
                                return;
                            }
                            store.feedback.set(Some(feedback));
                            tokio::time::sleep(outcome.dwell).await;
                            store.feedback.set(None);
                            if store.transition(QuestEvent::FeedbackElapsed) {
                                store.session.set(Some(snapshot));
                            }
                        } else if store.transition(QuestEvent::SceneReceived {
                            finished,
                            feedback: false,
                        }) {
                            store.session.set(Some(snapshot));
                        }
                    }
                    Err(err) => {
                        store.error.set(Some(ViewError::from(&err)));
                        store.session.set(Some(snapshot));
                        store.transition(QuestEvent::RequestFailed);
                    }
                }
            });
        })
    };

    #[cfg(test)]
    {
        let mut registered = use_signal(|| false);
        if !registered() {
            registered.set(true);
            if let Some(handles) = try_consume_context::<QuestTestHandles>() {
                handles.register(submit_choice);
            }
        }
    }

    let on_retry = move |()| {
        let failed = store
            .session
            .peek()
            .as_ref()
            .and_then(|session| session.failed_choice().map(str::to_string));
        if let Some(choice) = failed {
            submit_choice.call(choice);
        }
    };

    let on_new_adventure = move |_: MouseEvent| {
        store.reset();
        on_reset.call(());
    };

    let phase = *store.phase.read();
    let feedback = store.feedback.read().clone();
    let (vm, progress, last_error) = {
        let session = store.session.read();
        let Some(session) = session.as_ref() else {
            return rsx! {
                section { class: "quest quest--empty",
                    p { "No adventure in progress." }
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        onclick: move |_| on_reset.call(()),
                        "Start an adventure"
                    }
                }
            };
        };
        let busy = phase.is_busy() || matches!(phase, QuestPhase::Feedback { .. });
        (
            render_scene(session.scene(), session.pending_choice(), busy),
            progress_label(session),
            session.last_error().map(str::to_string),
        )
    };
    let turn_error = (phase == QuestPhase::Failed(FailedRequest::Turn))
        .then(|| (*store.error.read()).unwrap_or(ViewError::Unknown));

    rsx! {
        section { class: "quest",
            header { class: "quest__header",
                span { class: "quest__progress-label", "{progress}" }
                if let Some(percent) = vm.progress_percent {
                    div { class: "progress",
                        div { class: "progress__bar", style: "width: {percent}%" }
                    }
                }
            }
            SceneStage { vm: vm.clone() }
            if let Some(feedback) = feedback {
                div { class: feedback.class(), role: "status", "{feedback.text}" }
            }
            if let Some(error) = turn_error {
                ErrorPanel {
                    error,
                    backend_label: ctx.backend_label().to_string(),
                    detail: last_error,
                    on_retry,
                }
            }
            match vm.body {
                SceneBodyVm::Question { prompt, choices } => rsx! {
                    div { class: "question",
                        p { class: "question__prompt", "{prompt}" }
                        div { class: "question__choices",
                            for choice in choices {
                                ChoiceButton {
                                    key: "{choice.key}",
                                    label: choice.label,
                                    selected: choice.selected,
                                    disabled: choice.disabled,
                                    on_choose: submit_choice,
                                }
                            }
                        }
                    }
                },
                SceneBodyVm::Complete { score_label, summary: closing, recap, history } => rsx! {
                    div { class: "complete",
                        h2 { "Adventure complete!" }
                        p { class: "complete__score", "{score_label}" }
                        if let Some(closing) = closing {
                            div {
                                class: "complete__summary",
                                dangerous_inner_html: "{markdown_to_html(&closing)}",
                            }
                        }
                        if !recap.is_empty() {
                            RecapTable { rows: recap }
                        }
                        if !history.is_empty() {
                            details { class: "complete__history",
                                summary { "Story so far" }
                                for (index, chapter) in history.into_iter().enumerate() {
                                    div {
                                        key: "{index}",
                                        class: "complete__chapter",
                                        dangerous_inner_html: "{markdown_to_html(&chapter)}",
                                    }
                                }
                            }
                        }
                        button {
                            class: "btn btn-primary",
                            r#type: "button",
                            onclick: on_new_adventure,
                            "New adventure"
                        }
                    }
                },
            }
        }
    }
}

#[component]
fn SceneStage(vm: SceneVm) -> Element {
    rsx! {
        article { class: "scene",
            match vm.image {
                Some(ImageVm::Src(src)) => rsx! {
                    img { class: "scene__image", src: "{src}", alt: "Story illustration" }
                },
                Some(ImageVm::Caption(caption)) => rsx! {
                    figure { class: "scene__image scene__image--caption",
                        figcaption { "{caption}" }
                    }
                },
                None => rsx! {},
            }
            div { class: "scene__text", dangerous_inner_html: "{vm.narrative_html}" }
        }
    }
}

#[component]
fn ChoiceButton(
    label: String,
    selected: bool,
    disabled: bool,
    on_choose: Callback<String>,
) -> Element {
    let class = if selected { "choice choice--selected" } else { "choice" };
    let choice = label.clone();
    rsx! {
        button {
            class,
            r#type: "button",
            disabled,
            onclick: move |_| on_choose.call(choice.clone()),
            "{label}"
        }
    }
}

#[component]
fn RecapTable(rows: Vec<RecapRowVm>) -> Element {
    rsx! {
        table { class: "recap",
            thead {
                tr {
                    th { "#" }
                    th { "In the story" }
                    th { "In math" }
                }
            }
            tbody {
                for row in rows {
                    tr { key: "{row.index}",
                        td { "{row.index}" }
                        td { "{row.metaphor.as_deref().unwrap_or_default()}" }
                        td { "{row.math_concept.as_deref().unwrap_or_default()}" }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct QuestTestHandles {
    choose: Rc<RefCell<Option<Callback<String>>>>,
}

#[cfg(test)]
impl QuestTestHandles {
    pub(crate) fn register(&self, choose: Callback<String>) {
        *self.choose.borrow_mut() = Some(choose);
    }

    pub(crate) fn choose(&self) -> Callback<String> {
        (*self.choose.borrow()).expect("quest choose registered")
    }
}
