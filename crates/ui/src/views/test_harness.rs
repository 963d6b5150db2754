use std::sync::Arc;
use std::time::Duration;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::{QuestLoopService, QuestSession, RetryPolicy, ScriptedBackend};

use crate::context::{UiApp, build_app_context};
use crate::views::quest::QuestTestHandles;
use crate::views::{IntakeView, QuestView, use_quest_store_provider};

pub const TEST_BACKEND_LABEL: &str = "http://localhost:5000";

#[derive(Clone)]
struct TestApp {
    quest_loop: Arc<QuestLoopService>,
    quick_start_on_launch: bool,
}

impl UiApp for TestApp {
    fn quest_loop(&self) -> Arc<QuestLoopService> {
        Arc::clone(&self.quest_loop)
    }

    fn backend_label(&self) -> String {
        TEST_BACKEND_LABEL.to_string()
    }

    fn quick_start_on_launch(&self) -> bool {
        self.quick_start_on_launch
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Intake,
    Quest,
}

#[derive(Default)]
pub struct HarnessOptions {
    pub quick_start_on_launch: bool,
    /// Session already in the store when the view first renders.
    pub seed: Option<QuestSession>,
    pub feedback_dwell: Duration,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
    seed: Option<QuestSession>,
    quest_handles: QuestTestHandles,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    use_context_provider(|| props.quest_handles.clone());
    let mut store = use_quest_store_provider();
    let seed = props.seed.clone();
    use_hook(move || {
        if let Some(session) = seed {
            store.phase.set(session.phase());
            store.session.set(Some(session));
        }
    });
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
    let initial = use_context::<ViewKind>();
    let mut view = use_signal(|| initial);
    match view() {
        ViewKind::Intake => rsx! {
            IntakeView { on_started: move |()| view.set(ViewKind::Quest) }
        },
        ViewKind::Quest => rsx! {
            QuestView { on_reset: move |()| view.set(ViewKind::Intake) }
        },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub backend: ScriptedBackend,
    pub quest_handles: QuestTestHandles,
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

    /// Submit a choice through the quest view's own handler.
    pub fn choose(&mut self, label: &str) {
        let choose = self.quest_handles.choose();
        self.dom.in_runtime(|| choose.call(label.to_string()));
        drive_dom(&mut self.dom);
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

pub fn setup_view_harness(view: ViewKind, backend: ScriptedBackend) -> ViewHarness {
    setup_view_harness_with(view, backend, HarnessOptions::default())
}

pub fn setup_view_harness_with(
    view: ViewKind,
    backend: ScriptedBackend,
    options: HarnessOptions,
) -> ViewHarness {
    let quest_loop = QuestLoopService::new(Arc::new(backend.clone()))
        .with_retry(RetryPolicy::none())
        .with_feedback_dwell(options.feedback_dwell);
    let app = Arc::new(TestApp {
        quest_loop: Arc::new(quest_loop),
        quick_start_on_launch: options.quick_start_on_launch,
    });
    let quest_handles = QuestTestHandles::default();

    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app,
            view,
            seed: options.seed,
            quest_handles: quest_handles.clone(),
        },
    );

    ViewHarness {
        dom,
        backend,
        quest_handles,
    }
}
