use quest_core::{IntakeSchema, StoryRequest};
use services::{QuestLoopService, QuestProgress, QuestSession};

use crate::views::ViewError;

/// # Errors
///
/// Returns the `ViewError` matching the backend failure.
pub async fn load_intake_schema(quest_loop: &QuestLoopService) -> Result<IntakeSchema, ViewError> {
    quest_loop
        .intake_schema()
        .await
        .map_err(|err| ViewError::from(&err))
}

/// # Errors
///
/// Returns the `ViewError` matching the backend failure.
pub async fn start_quest(
    quest_loop: &QuestLoopService,
    request: StoryRequest,
) -> Result<QuestSession, ViewError> {
    quest_loop
        .start_quest(request)
        .await
        .map_err(|err| ViewError::from(&err))
}

#[must_use]
pub fn progress_label(session: &QuestSession) -> String {
    let progress = QuestProgress::of(session);
    format!("Turn {} · Score {}", progress.turn + 1, progress.score)
}
