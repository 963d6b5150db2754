//! In-memory `StoryBackend` that replays queued responses.
//!
//! Used by tests and the desktop preview; it records every call it receives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use quest_core::model::{Scene, SessionId};
use quest_core::{IntakeSchema, StoryRequest};

use super::{StoryBackend, TurnRequest};
use crate::error::BackendError;

/// A request observed by `ScriptedBackend`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Intro,
    Start(StoryRequest),
    Turn {
        session_id: Option<SessionId>,
        choice: String,
        scene_text: String,
    },
}

#[derive(Debug, Default)]
struct Script {
    schema: Option<IntakeSchema>,
    starts: VecDeque<Result<Scene, BackendError>>,
    turns: VecDeque<Result<Scene, BackendError>>,
    calls: Vec<RecordedCall>,
}

#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
    latency: Duration,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prompts returned by `intake_schema`; `Structured` when unset.
    #[must_use]
    pub fn with_schema(self, schema: IntakeSchema) -> Self {
        self.with_script(|s| s.schema = Some(schema));
        self
    }

    /// Delay every response, to observe in-flight state.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push_start(&self, result: Result<Scene, BackendError>) {
        self.with_script(|s| s.starts.push_back(result));
    }

    pub fn push_turn(&self, result: Result<Scene, BackendError>) {
        self.with_script(|s| s.turns.push_back(result));
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.with_script(|s| s.calls.clone())
    }

    /// Number of `advance_story` calls seen so far.
    #[must_use]
    pub fn turn_calls(&self) -> usize {
        self.with_script(|s| {
            s.calls
                .iter()
                .filter(|c| matches!(c, RecordedCall::Turn { .. }))
                .count()
        })
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut guard = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn record(
        &self,
        call: RecordedCall,
        next: impl FnOnce(&mut Script) -> Option<Result<Scene, BackendError>>,
    ) -> Result<Scene, BackendError> {
        let mut guard = self
            .script
            .lock()
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        guard.calls.push(call);
        next(&mut guard).unwrap_or(Err(BackendError::Unsupported("unscripted request")))
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl StoryBackend for ScriptedBackend {
    async fn intake_schema(&self) -> Result<IntakeSchema, BackendError> {
        let mut guard = self
            .script
            .lock()
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        guard.calls.push(RecordedCall::Intro);
        Ok(guard.schema.clone().unwrap_or(IntakeSchema::Structured))
    }

    async fn start_story(&self, request: &StoryRequest) -> Result<Scene, BackendError> {
        self.pause().await;
        self.record(RecordedCall::Start(request.clone()), |s| s.starts.pop_front())
    }

    async fn advance_story(&self, turn: &TurnRequest<'_>) -> Result<Scene, BackendError> {
        self.pause().await;
        let call = RecordedCall::Turn {
            session_id: turn.session_id.cloned(),
            choice: turn.choice.to_string(),
            scene_text: turn.scene.text().to_string(),
        };
        self.record(call, |s| s.turns.pop_front())
    }
}
