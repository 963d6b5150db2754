use dioxus::prelude::*;

use services::{BackendError, QuestError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    BackendUnavailable,
    InvalidResponse,
    Rejected,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ViewError::BackendUnavailable => "The story server could not be reached.",
            ViewError::InvalidResponse => "The story server sent a scene that cannot be shown.",
            ViewError::Rejected => "The story server could not continue the story.",
            ViewError::Unknown => "Something went wrong. Please try again.",
        }
    }

    /// Whether the backend origin hint should accompany the message.
    #[must_use]
    pub fn suggests_backend_check(self) -> bool {
        matches!(self, ViewError::BackendUnavailable | ViewError::InvalidResponse)
    }
}

impl From<&QuestError> for ViewError {
    fn from(err: &QuestError) -> Self {
        match err.backend() {
            Some(
                BackendError::Timeout | BackendError::Unreachable(_) | BackendError::Http(_),
            ) => ViewError::BackendUnavailable,
            Some(
                BackendError::Decode(_)
                | BackendError::InvalidScene(_)
                | BackendError::MissingSessionId,
            ) => ViewError::InvalidResponse,
            Some(BackendError::Rejected { .. }) => ViewError::Rejected,
            _ => ViewError::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: &Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::model::SceneError;

    #[test]
    fn backend_failures_map_to_view_errors() {
        let cases = [
            (BackendError::Timeout, ViewError::BackendUnavailable),
            (BackendError::Unreachable("refused".into()), ViewError::BackendUnavailable),
            (BackendError::InvalidScene(SceneError::MissingQuestion), ViewError::InvalidResponse),
            (
                BackendError::Rejected {
                    status: 500,
                    message: "boom".into(),
                },
                ViewError::Rejected,
            ),
            (BackendError::Unsupported("x"), ViewError::Unknown),
        ];
        for (backend, expected) in cases {
            assert_eq!(ViewError::from(&QuestError::Backend(backend)), expected);
        }
        assert_eq!(ViewError::from(&QuestError::TurnInFlight), ViewError::Unknown);
    }
}
