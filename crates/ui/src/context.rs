use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use services::QuestLoopService;

pub trait UiApp: Send + Sync {
    fn quest_loop(&self) -> Arc<QuestLoopService>;
    /// Human-readable backend origin, shown when the backend cannot be reached.
    fn backend_label(&self) -> String;
    fn quick_start_on_launch(&self) -> bool;
}

#[derive(Clone)]
pub struct AppContext {
    quest_loop: Arc<QuestLoopService>,
    backend_label: String,
    quick_start_once: Arc<AtomicBool>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            quest_loop: app.quest_loop(),
            backend_label: app.backend_label(),
            quick_start_once: Arc::new(AtomicBool::new(app.quick_start_on_launch())),
        }
    }

    #[must_use]
    pub fn quest_loop(&self) -> Arc<QuestLoopService> {
        Arc::clone(&self.quest_loop)
    }

    #[must_use]
    pub fn backend_label(&self) -> &str {
        &self.backend_label
    }

    /// True exactly once if the app was launched with quick start.
    #[must_use]
    pub fn take_quick_start_on_launch(&self) -> bool {
        self.quick_start_once.swap(false, Ordering::AcqRel)
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
