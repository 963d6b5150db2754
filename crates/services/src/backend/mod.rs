//! Story backend abstraction and its implementations.

mod http;
pub mod scripted;
mod wire;

use async_trait::async_trait;

use quest_core::model::{Scene, SessionId};
use quest_core::{IntakeSchema, StoryRequest};

use crate::error::BackendError;

pub use http::HttpStoryBackend;
pub use scripted::{RecordedCall, ScriptedBackend};

/// Everything a backend may need to advance the story by one turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    /// Identifier returned by the previous response, if the backend issued one.
    pub session_id: Option<&'a SessionId>,
    pub scene: &'a Scene,
    pub profile: &'a StoryRequest,
    pub choice: &'a str,
}

/// An opaque story generator reached over some transport.
///
/// Each call is one logical request; retries are the caller's business.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    /// Prompts for the intake questionnaire.
    async fn intake_schema(&self) -> Result<IntakeSchema, BackendError>;

    /// Generate the first scene for a learner profile.
    async fn start_story(&self, request: &StoryRequest) -> Result<Scene, BackendError>;

    /// Send the learner's choice and receive the next scene.
    async fn advance_story(&self, turn: &TurnRequest<'_>) -> Result<Scene, BackendError>;
}
