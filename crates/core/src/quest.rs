//! Client-side lifecycle of one quest.
//!
//! `Intake → AwaitingFirstScene → Question → Submitting → (Feedback →) Question | Finished`.
//! `Finished` is terminal; only `Reset` leaves it.

use thiserror::Error;

/// Which request a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedRequest {
    Bootstrap,
    Turn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestPhase {
    Intake,
    AwaitingFirstScene,
    Question,
    Submitting,
    /// Showing feedback for the answer; `finished` says where to go next.
    Feedback { finished: bool },
    Finished,
    Failed(FailedRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestEvent {
    IntakeSubmitted,
    SceneReceived { finished: bool, feedback: bool },
    FeedbackElapsed,
    ChoiceSubmitted,
    RequestFailed,
    Retry,
    Reset,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot apply {event:?} while {from:?}")]
pub struct TransitionError {
    pub from: QuestPhase,
    pub event: QuestEvent,
}

impl QuestPhase {
    /// Apply an event, returning the next phase.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` for events that are not legal in the current phase.
    pub fn apply(self, event: QuestEvent) -> Result<Self, TransitionError> {
        use QuestEvent as E;
        use QuestPhase as P;

        let next = match (self, event) {
            (_, E::Reset) => P::Intake,
            (P::Intake, E::IntakeSubmitted) => P::AwaitingFirstScene,
            (P::AwaitingFirstScene, E::SceneReceived { finished, .. }) => Self::settled(finished),
            (P::AwaitingFirstScene, E::RequestFailed) => P::Failed(FailedRequest::Bootstrap),
            (P::Question | P::Failed(FailedRequest::Turn), E::ChoiceSubmitted) => P::Submitting,
            (P::Submitting, E::SceneReceived { finished, feedback: true }) => {
                P::Feedback { finished }
            }
            (P::Submitting, E::SceneReceived { finished, feedback: false }) => {
                Self::settled(finished)
            }
            (P::Submitting, E::RequestFailed) => P::Failed(FailedRequest::Turn),
            (P::Feedback { finished }, E::FeedbackElapsed) => Self::settled(finished),
            (P::Failed(FailedRequest::Bootstrap), E::Retry) => P::AwaitingFirstScene,
            (P::Failed(FailedRequest::Turn), E::Retry) => P::Submitting,
            (from, event) => return Err(TransitionError { from, event }),
        };
        Ok(next)
    }

    fn settled(finished: bool) -> Self {
        if finished {
            QuestPhase::Finished
        } else {
            QuestPhase::Question
        }
    }

    /// Whether choice controls should be enabled.
    #[must_use]
    pub fn accepts_choice(self) -> bool {
        matches!(self, QuestPhase::Question | QuestPhase::Failed(FailedRequest::Turn))
    }

    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, QuestPhase::AwaitingFirstScene | QuestPhase::Submitting)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, QuestPhase::Finished)
    }
}
