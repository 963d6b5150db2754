#![forbid(unsafe_code)]

pub mod intake;
pub mod model;
pub mod quest;

pub use intake::{IntakeAnswers, IntakeError, IntakeForm, IntakeSchema, IntakeStep, StoryRequest};
pub use quest::{FailedRequest, QuestEvent, QuestPhase, TransitionError};
