use quest_core::model::{Scene, SessionId};
use quest_core::{FailedRequest, QuestPhase, StoryRequest};

use crate::error::QuestError;

/// Proof that a turn was started; handed back when the response arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTicket {
    choice: String,
    turn: u32,
}

impl TurnTicket {
    #[must_use]
    pub fn choice(&self) -> &str {
        &self.choice
    }

    /// The turn number this ticket will complete.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }
}

/// Client-side state of one quest: the current scene plus whatever is
/// needed to send the next turn.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestSession {
    profile: StoryRequest,
    session_id: Option<SessionId>,
    scene: Scene,
    turn: u32,
    pending_choice: Option<String>,
    failed_choice: Option<String>,
    last_error: Option<String>,
}

impl QuestSession {
    #[must_use]
    pub fn new(profile: StoryRequest, scene: Scene) -> Self {
        Self {
            profile,
            session_id: scene.session_id().cloned(),
            scene,
            turn: 0,
            pending_choice: None,
            failed_choice: None,
            last_error: None,
        }
    }

    #[must_use]
    pub fn profile(&self) -> &StoryRequest {
        &self.profile
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// The one current scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Number of completed turns.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn pending_choice(&self) -> Option<&str> {
        self.pending_choice.as_deref()
    }

    #[must_use]
    pub fn failed_choice(&self) -> Option<&str> {
        self.failed_choice.as_deref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.scene.is_finished()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.pending_choice.is_some()
    }

    /// Lifecycle phase derived from the session fields.
    #[must_use]
    pub fn phase(&self) -> QuestPhase {
        if self.scene.is_finished() {
            QuestPhase::Finished
        } else if self.pending_choice.is_some() {
            QuestPhase::Submitting
        } else if self.failed_choice.is_some() {
            QuestPhase::Failed(FailedRequest::Turn)
        } else {
            QuestPhase::Question
        }
    }

    /// Reserve the session for a single outgoing turn.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::Finished` on a finished scene, `QuestError::TurnInFlight`
    /// while another choice is pending, and `QuestError::UnknownChoice` if `choice`
    /// is not offered by the current question.
    pub fn begin_turn(&mut self, choice: &str) -> Result<TurnTicket, QuestError> {
        if self.scene.is_finished() {
            return Err(QuestError::Finished);
        }
        if self.pending_choice.is_some() {
            return Err(QuestError::TurnInFlight);
        }
        if !self.scene.is_choice(choice) {
            return Err(QuestError::UnknownChoice(choice.to_string()));
        }

        self.pending_choice = Some(choice.to_string());
        self.failed_choice = None;
        self.last_error = None;
        Ok(TurnTicket {
            choice: choice.to_string(),
            turn: self.turn + 1,
        })
    }

    /// Check that `ticket` belongs to the turn currently in flight.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::NoPendingTurn` for a stale or foreign ticket.
    pub fn check_ticket(&self, ticket: &TurnTicket) -> Result<(), QuestError> {
        let matches = self.pending_choice.as_deref() == Some(ticket.choice.as_str())
            && self.turn + 1 == ticket.turn;
        if matches {
            Ok(())
        } else {
            Err(QuestError::NoPendingTurn)
        }
    }

    /// Replace the scene with the response to the pending turn.
    ///
    /// A response without a session id keeps the previous one.
    pub(crate) fn complete_turn(&mut self, scene: Scene) {
        if let Some(id) = scene.session_id() {
            self.session_id = Some(id.clone());
        }
        self.scene = scene;
        self.turn += 1;
        self.pending_choice = None;
        self.failed_choice = None;
        self.last_error = None;
    }

    /// Release the pending turn, keeping the current scene.
    pub(crate) fn fail_turn(&mut self, error: &QuestError) {
        self.failed_choice = self.pending_choice.take();
        self.last_error = Some(error.to_string());
    }

    /// Take the choice of the last failed turn, if any.
    pub(crate) fn take_failed_choice(&mut self) -> Option<String> {
        self.failed_choice.take()
    }
}
