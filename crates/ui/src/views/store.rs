use dioxus::prelude::*;

use quest_core::{QuestEvent, QuestPhase, StoryRequest};
use services::QuestSession;

use super::ViewError;
use crate::vm::FeedbackVm;

/// Quest state shared by the intake and story views.
#[derive(Clone, Copy, PartialEq)]
pub struct QuestStore {
    pub phase: Signal<QuestPhase>,
    pub session: Signal<Option<QuestSession>>,
    /// Profile of the bootstrap request, kept for retries.
    pub profile: Signal<Option<StoryRequest>>,
    /// Feedback shown while the previous scene is still on screen.
    pub feedback: Signal<Option<FeedbackVm>>,
    pub error: Signal<Option<ViewError>>,
}

impl QuestStore {
    /// Apply a lifecycle event. Illegal events are logged and ignored.
    pub fn transition(mut self, event: QuestEvent) -> bool {
        let current = *self.phase.peek();
        match current.apply(event) {
            Ok(next) => {
                tracing::debug!(from = ?current, to = ?next, "quest phase changed");
                self.phase.set(next);
                true
            }
            Err(err) => {
                tracing::warn!(%err, "ignored quest event");
                false
            }
        }
    }

    /// Drop the current quest and return to the intake.
    pub fn reset(mut self) {
        self.transition(QuestEvent::Reset);
        self.session.set(None);
        self.profile.set(None);
        self.feedback.set(None);
        self.error.set(None);
    }
}

/// Create the store for this subtree.
pub fn use_quest_store_provider() -> QuestStore {
    use_context_provider(|| QuestStore {
        phase: Signal::new(QuestPhase::Intake),
        session: Signal::new(None),
        profile: Signal::new(None),
        feedback: Signal::new(None),
        error: Signal::new(None),
    })
}

#[must_use]
pub fn use_quest_store() -> QuestStore {
    use_context::<QuestStore>()
}
