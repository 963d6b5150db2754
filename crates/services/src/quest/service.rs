use std::sync::Arc;
use std::time::Duration;

use quest_core::model::{Question, Scene};
use quest_core::{IntakeSchema, StoryRequest};

use super::session::{QuestSession, TurnTicket};
use crate::backend::{HttpStoryBackend, StoryBackend, TurnRequest};
use crate::config::QuestConfig;
use crate::error::{BackendError, QuestError};
use crate::retry::RetryPolicy;

const DEFAULT_FEEDBACK_DWELL: Duration = Duration::from_millis(1800);

/// What the caller should show after a successful turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Transient feedback about the submitted answer.
    pub feedback: Option<String>,
    pub finished: bool,
    /// How long to show `feedback` before revealing the new scene; zero without feedback.
    pub dwell: Duration,
    /// Whether the submitted choice was correct, when the previous scene disclosed it.
    pub correct: Option<bool>,
}

/// Drives a quest: bootstrap, then one request per answered question.
#[derive(Clone)]
pub struct QuestLoopService {
    backend: Arc<dyn StoryBackend>,
    retry: RetryPolicy,
    feedback_dwell: Duration,
}

impl QuestLoopService {
    #[must_use]
    pub fn new(backend: Arc<dyn StoryBackend>) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
            feedback_dwell: DEFAULT_FEEDBACK_DWELL,
        }
    }

    /// Build an HTTP-backed loop from configuration.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &QuestConfig) -> Result<Self, BackendError> {
        let backend = HttpStoryBackend::new(config)?;
        Ok(Self::new(Arc::new(backend))
            .with_retry(RetryPolicy::new(config.max_attempts, RetryPolicy::default().base_delay))
            .with_feedback_dwell(config.feedback_dwell))
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_feedback_dwell(mut self, dwell: Duration) -> Self {
        self.feedback_dwell = dwell;
        self
    }

    #[must_use]
    pub fn feedback_dwell(&self) -> Duration {
        self.feedback_dwell
    }

    /// Prompts for the intake questionnaire.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::Backend` if the backend cannot be asked.
    pub async fn intake_schema(&self) -> Result<IntakeSchema, QuestError> {
        let schema = self
            .retry
            .run("intro", || self.backend.intake_schema())
            .await?;
        tracing::debug!(prompts = schema.len(), "intake schema loaded");
        Ok(schema)
    }

    /// Send the bootstrap request and open a session on the first scene.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::Backend` when the backend fails or returns an invalid scene.
    pub async fn start_quest(&self, request: StoryRequest) -> Result<QuestSession, QuestError> {
        let scene = self
            .retry
            .run("generate", || self.backend.start_story(&request))
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "quest bootstrap failed"))?;

        let session = QuestSession::new(request, scene);
        tracing::info!(
            session_id = session.session_id().map(|id| id.as_str()),
            finished = session.is_finished(),
            "quest started"
        );
        Ok(session)
    }

    /// Reserve the session for `choice`; see `QuestSession::begin_turn`.
    ///
    /// # Errors
    ///
    /// Returns `QuestError` when the session cannot accept a choice right now.
    pub fn begin_turn(
        &self,
        session: &mut QuestSession,
        choice: &str,
    ) -> Result<TurnTicket, QuestError> {
        session.begin_turn(choice)
    }

    /// Send the request for a turn started with `begin_turn` and apply the response.
    ///
    /// On failure the previous scene stays current and the choice can be retried.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::NoPendingTurn` for a stale ticket and
    /// `QuestError::Backend` when the request fails.
    pub async fn complete_turn(
        &self,
        session: &mut QuestSession,
        ticket: TurnTicket,
    ) -> Result<TurnOutcome, QuestError> {
        session.check_ticket(&ticket)?;

        let answered = session.scene().active_question();
        let correct = answered.and_then(|q| q.is_correct(ticket.choice()));
        let explanation = answered.and_then(Question::feedback).map(str::to_string);

        let result = {
            let turn = TurnRequest {
                session_id: session.session_id(),
                scene: session.scene(),
                profile: session.profile(),
                choice: ticket.choice(),
            };
            self.retry
                .run("progress", || self.backend.advance_story(&turn))
                .await
        };

        match result {
            Ok(scene) => Ok(self.apply_scene(session, &ticket, scene, correct, explanation)),
            Err(err) => {
                let err = QuestError::from(err);
                tracing::warn!(turn = ticket.turn(), error = %err, "turn failed");
                session.fail_turn(&err);
                Err(err)
            }
        }
    }

    fn apply_scene(
        &self,
        session: &mut QuestSession,
        ticket: &TurnTicket,
        scene: Scene,
        correct: Option<bool>,
        explanation: Option<String>,
    ) -> TurnOutcome {
        // The new scene's question feedback explains a question not yet shown.
        let feedback = scene.feedback().map(str::to_string).or(explanation);
        let finished = scene.is_finished();
        session.complete_turn(scene);

        tracing::info!(
            turn = ticket.turn(),
            finished,
            session_id = session.session_id().map(|id| id.as_str()),
            "turn completed"
        );

        TurnOutcome {
            dwell: if feedback.is_some() {
                self.feedback_dwell
            } else {
                Duration::ZERO
            },
            feedback,
            finished,
            correct,
        }
    }

    /// Submit a choice and wait for the next scene.
    ///
    /// # Errors
    ///
    /// Returns `QuestError` if the choice is not accepted or the request fails.
    pub async fn submit_choice(
        &self,
        session: &mut QuestSession,
        choice: &str,
    ) -> Result<TurnOutcome, QuestError> {
        let ticket = self.begin_turn(session, choice)?;
        self.complete_turn(session, ticket).await
    }

    /// Re-submit the choice of the last failed turn.
    ///
    /// # Errors
    ///
    /// Returns `QuestError::NothingToRetry` if no turn has failed, or any
    /// error `submit_choice` can return.
    pub async fn retry_last(&self, session: &mut QuestSession) -> Result<TurnOutcome, QuestError> {
        let choice = session
            .take_failed_choice()
            .ok_or(QuestError::NothingToRetry)?;
        self.submit_choice(session, &choice).await
    }
}
