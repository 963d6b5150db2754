use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use url::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;

use quest_core::model::{ImageRef, Scene, SceneDraft};
use quest_core::{IntakeSchema, StoryRequest};

use super::wire::{
    EchoBody, ErrorWire, GenerateBody, IntroWire, ProgressBody, QuizContinueBody, QuizStartBody,
    QuizWire, SceneWire,
};
use super::{StoryBackend, TurnRequest};
use crate::config::{BackendDialect, ContinuityMode, QuestConfig};
use crate::error::BackendError;

/// `StoryBackend` over JSON/HTTP, speaking either backend dialect.
#[derive(Clone, Debug)]
pub struct HttpStoryBackend {
    client: Client,
    origin: Url,
    base_url: String,
    dialect: BackendDialect,
    continuity: ContinuityMode,
}

impl HttpStoryBackend {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the TLS backend cannot be initialised.
    pub fn new(config: &QuestConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(BackendError::Http)?;
        Ok(Self {
            client,
            origin: config.backend_url.clone(),
            base_url: config.backend_url.as_str().trim_end_matches('/').to_string(),
            dialect: config.dialect,
            continuity: config.continuity,
        })
    }

    #[must_use]
    pub fn dialect(&self) -> BackendDialect {
        self.dialect
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!(%url, dialect = %self.dialect, "posting to story backend");
        let response = self.client.post(&url).json(body).send().await?;
        read_json(response).await
    }

    async fn post_scene<B>(&self, path: &str, body: &B) -> Result<SceneDraft, BackendError>
    where
        B: Serialize + ?Sized,
    {
        let wire: SceneWire = self.post(path, body).await?;
        if wire.is_error() {
            return Err(BackendError::Rejected {
                status: StatusCode::OK.as_u16(),
                message: wire.into_error_message(),
            });
        }
        let mut draft = wire.into_draft();
        draft.image_ref = draft.image_ref.map(|raw| self.absolute_image(raw));
        Ok(draft)
    }

    /// Server-relative image paths only load once joined onto the backend origin.
    fn absolute_image(&self, raw: String) -> String {
        match ImageRef::parse(&raw) {
            Ok(path @ ImageRef::FilePath(_)) => path.resolve_against(&self.origin).as_raw(),
            _ => raw,
        }
    }

    async fn story_intro(&self) -> Result<IntakeSchema, BackendError> {
        let url = self.url("api/intro");
        tracing::debug!(%url, "fetching intake prompts");
        let response = self.client.get(&url).send().await?;
        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED
        ) {
            return Ok(IntakeSchema::Structured);
        }
        let intro: IntroWire = read_json(response).await?;
        let prompts: Vec<String> = intro
            .questions
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
        if prompts.is_empty() {
            Ok(IntakeSchema::Structured)
        } else {
            Ok(IntakeSchema::Freeform(prompts))
        }
    }

    async fn story_advance(&self, turn: &TurnRequest<'_>) -> Result<Scene, BackendError> {
        let draft = match self.continuity {
            ContinuityMode::SessionId => {
                let session_id = turn.session_id.ok_or(BackendError::MissingSessionId)?;
                let body = ProgressBody {
                    session_id: session_id.as_str(),
                    choice: turn.choice,
                };
                self.post_scene("api/progress-story", &body).await?
            }
            ContinuityMode::SceneEcho => {
                let body = EchoBody::new(turn.choice, turn.scene, turn.profile);
                self.post_scene("api/progress-story", &body).await?
            }
        };
        Ok(draft.validate()?)
    }

    async fn quiz_start(&self, request: &StoryRequest) -> Result<Scene, BackendError> {
        let body = QuizStartBody {
            username: request.display_name(),
            session_id: None,
            context: request.context_label(),
        };
        let wire: QuizWire = self.post("start", &body).await?;
        let scene = wire.into_draft(0, 1).validate()?;
        if scene.session_id().is_none() {
            return Err(BackendError::MissingSessionId);
        }
        Ok(scene)
    }

    async fn quiz_advance(&self, turn: &TurnRequest<'_>) -> Result<Scene, BackendError> {
        let session_id = turn.session_id.ok_or(BackendError::MissingSessionId)?;
        let question = turn
            .scene
            .active_question()
            .ok_or(BackendError::Unsupported("answering a finished quiz"))?;
        let user_answer = question
            .key_for(turn.choice)
            .ok_or(BackendError::Unsupported("choices outside the current question"))?;

        let correct_key = question
            .correct_answer()
            .and_then(|label| question.key_for(label));
        let gained = u32::from(correct_key.as_deref() == Some(user_answer.as_str()));
        let score = turn.scene.score() + gained;
        let step = turn.scene.step().unwrap_or(1) + 1;

        let body = QuizContinueBody {
            session_id: session_id.as_str(),
            user_answer: &user_answer,
            username: turn.profile.display_name(),
            context: turn.profile.context_label(),
        };
        let wire: QuizWire = self.post("continue", &body).await?;
        Ok(wire.into_draft(score, step).validate()?)
    }
}

#[async_trait]
impl StoryBackend for HttpStoryBackend {
    async fn intake_schema(&self) -> Result<IntakeSchema, BackendError> {
        match self.dialect {
            BackendDialect::Story => self.story_intro().await,
            BackendDialect::Quiz => Ok(IntakeSchema::Structured),
        }
    }

    async fn start_story(&self, request: &StoryRequest) -> Result<Scene, BackendError> {
        match self.dialect {
            BackendDialect::Story => {
                let draft = self
                    .post_scene("api/generate-story", &GenerateBody::from(request))
                    .await?;
                let scene = draft.validate()?;
                if self.continuity == ContinuityMode::SessionId
                    && !scene.is_finished()
                    && scene.session_id().is_none()
                {
                    return Err(BackendError::MissingSessionId);
                }
                Ok(scene)
            }
            BackendDialect::Quiz => self.quiz_start(request).await,
        }
    }

    async fn advance_story(&self, turn: &TurnRequest<'_>) -> Result<Scene, BackendError> {
        match self.dialect {
            BackendDialect::Story => self.story_advance(turn).await,
            BackendDialect::Quiz => self.quiz_advance(turn).await,
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorWire>(&bytes)
            .ok()
            .and_then(ErrorWire::message)
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).trim().to_string());
        let message = if message.is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            message
        };
        return Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_slice(&bytes)?)
}
