#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod quest;
pub mod retry;

pub use backend::{HttpStoryBackend, RecordedCall, ScriptedBackend, StoryBackend, TurnRequest};
pub use config::{BackendDialect, ContinuityMode, QuestConfig};
pub use error::{BackendError, ConfigError, QuestError};
pub use quest::{QuestLoopService, QuestProgress, QuestSession, TurnOutcome, TurnTicket};
pub use retry::RetryPolicy;
