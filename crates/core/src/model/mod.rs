mod ids;
mod image;
mod scene;

pub use ids::{SessionId, SessionIdError};
pub use image::{ImageRef, ImageRefError};
pub use scene::{
    MAX_CHOICES, MIN_CHOICES, Question, QuestionDraft, RecapEntry, Scene, SceneDraft, SceneError,
};
