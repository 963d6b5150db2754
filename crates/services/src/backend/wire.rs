//! JSON shapes exchanged with the story backends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use quest_core::StoryRequest;
use quest_core::model::{Question, QuestionDraft, Scene, SceneDraft};

const DEFAULT_MATH_TOPIC: &str = "algebra";

//
// ─── SHARED ────────────────────────────────────────────────────────────────────
//

/// Identifiers arrive as strings from some backends and numbers from others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum IdWire {
    Text(String),
    Number(i64),
}

impl IdWire {
    fn into_string(self) -> String {
        match self {
            IdWire::Text(s) => s,
            IdWire::Number(n) => n.to_string(),
        }
    }
}

/// Error body: `{ "error": ..., "details": ... }`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ErrorWire {
    pub error: Option<String>,
    pub details: Option<String>,
}

impl ErrorWire {
    pub fn message(self) -> Option<String> {
        match (self.error, self.details) {
            (Some(error), Some(details)) if !details.trim().is_empty() => {
                Some(format!("{error}: {details}"))
            }
            (Some(error), _) => Some(error),
            (None, details) => details,
        }
    }
}

//
// ─── STORY DIALECT ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct IntroWire {
    pub questions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct QuestionWire {
    #[serde(alias = "question")]
    prompt: Option<String>,
    #[serde(alias = "options")]
    choices: Option<Vec<String>>,
    #[serde(alias = "correctAnswer")]
    answer: Option<String>,
    feedback: Option<String>,
}

/// List entries are usually strings; anything else is kept as compact JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum LooseText {
    Text(String),
    Other(Value),
}

fn loose_texts(entries: Option<Vec<LooseText>>) -> Vec<String> {
    entries
        .unwrap_or_default()
        .into_iter()
        .map(|entry| match entry {
            LooseText::Text(text) => text,
            LooseText::Other(value) => value.to_string(),
        })
        .collect()
}

/// A scene in either the flat or the nested shape.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct SceneWire {
    #[serde(alias = "scene_text", alias = "text")]
    scene_text: Option<String>,
    #[serde(alias = "image_ref")]
    image_ref: Option<String>,
    progress: Option<f32>,

    // flat shape
    question: Option<String>,
    options: Option<Vec<String>>,
    #[serde(alias = "correct_answer")]
    correct_answer: Option<String>,

    // nested shape
    questions: Option<Vec<QuestionWire>>,
    metaphor: Option<String>,
    #[serde(alias = "math_concept")]
    math_concept: Option<String>,
    answers: Option<Vec<LooseText>>,
    metaphors: Option<Vec<String>>,
    #[serde(alias = "math_concepts")]
    math_concepts: Option<Vec<String>>,
    #[serde(alias = "story_history")]
    story_history: Option<Vec<LooseText>>,
    step: Option<u32>,
    #[serde(alias = "theory")]
    summary: Option<String>,
    #[serde(alias = "math_topic")]
    math_topic: Option<String>,

    feedback: Option<String>,
    finished: Option<bool>,
    score: Option<u32>,
    #[serde(alias = "session_id")]
    session_id: Option<IdWire>,

    pub error: Option<String>,
    pub details: Option<String>,
}

impl SceneWire {
    /// True when the body is an error payload rather than a scene.
    pub fn is_error(&self) -> bool {
        self.error.is_some() && self.scene_text.is_none() && self.questions.is_none()
    }

    pub fn into_error_message(self) -> String {
        ErrorWire {
            error: self.error,
            details: self.details,
        }
        .message()
        .unwrap_or_default()
    }

    pub fn into_draft(self) -> SceneDraft {
        let nested = self
            .questions
            .and_then(|questions| questions.into_iter().next())
            .map(|q| QuestionDraft {
                prompt: q.prompt.unwrap_or_default(),
                choices: q.choices.unwrap_or_default(),
                keys: Vec::new(),
                correct_answer: q.answer,
                feedback: q.feedback,
            });
        let flat = self.question.map(|prompt| QuestionDraft {
            prompt,
            choices: self.options.unwrap_or_default(),
            keys: Vec::new(),
            correct_answer: self.correct_answer,
            feedback: None,
        });

        SceneDraft {
            text: self.scene_text.unwrap_or_default(),
            image_ref: self.image_ref,
            progress: self.progress,
            question: nested.or(flat),
            feedback: self.feedback,
            finished: self.finished.unwrap_or(false),
            score: self.score.unwrap_or(0),
            step: self.step,
            metaphor: self.metaphor,
            math_concept: self.math_concept,
            answers: loose_texts(self.answers),
            metaphors: self.metaphors.unwrap_or_default(),
            math_concepts: self.math_concepts.unwrap_or_default(),
            story_history: loose_texts(self.story_history),
            summary: self.summary,
            session_id: self.session_id.map(IdWire::into_string),
            math_topic: self.math_topic,
        }
    }
}

/// `POST /api/generate-story`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    interests: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    story_context: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    character: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    math_topic: Option<&'a str>,
}

impl<'a> From<&'a StoryRequest> for GenerateBody<'a> {
    fn from(request: &'a StoryRequest) -> Self {
        Self {
            interests: request.interests.as_deref(),
            story_context: request.story_context.as_deref(),
            character: request.character.as_deref(),
            math_topic: request.math_topic.as_deref(),
        }
    }
}

/// `POST /api/progress-story` with session continuity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProgressBody<'a> {
    pub session_id: &'a str,
    pub choice: &'a str,
}

#[derive(Debug, Serialize)]
struct QuestionEcho<'a> {
    prompt: &'a str,
    choices: &'a [String],
    answer: &'a str,
    feedback: &'a str,
}

impl<'a> From<&'a Question> for QuestionEcho<'a> {
    fn from(q: &'a Question) -> Self {
        Self {
            prompt: q.prompt(),
            choices: q.choices(),
            answer: q.correct_answer().unwrap_or_default(),
            feedback: q.feedback().unwrap_or_default(),
        }
    }
}

/// The current scene, normalized for echoing back to the backend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SceneEcho<'a> {
    scene_text: &'a str,
    image_ref: String,
    progress: f32,
    questions: Vec<QuestionEcho<'a>>,
    metaphor: &'a str,
    math_concept: &'a str,
    finished: bool,
    score: u32,
    step: u32,
    answers: &'a [String],
    metaphors: &'a [String],
    math_concepts: &'a [String],
    story_history: &'a [String],
}

impl<'a> From<&'a Scene> for SceneEcho<'a> {
    fn from(scene: &'a Scene) -> Self {
        Self {
            scene_text: scene.text(),
            image_ref: scene.image_ref().map(|img| img.as_raw()).unwrap_or_default(),
            progress: scene.progress().unwrap_or(0.0),
            questions: scene.question().map(QuestionEcho::from).into_iter().collect(),
            metaphor: scene.metaphor().unwrap_or_default(),
            math_concept: scene.math_concept().unwrap_or_default(),
            finished: scene.is_finished(),
            score: scene.score(),
            step: scene.step().unwrap_or(0),
            answers: scene.answers(),
            metaphors: scene.metaphors(),
            math_concepts: scene.math_concepts(),
            story_history: scene.story_history(),
        }
    }
}

/// `POST /api/progress-story` echoing the whole scene.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EchoBody<'a> {
    choice: &'a str,
    current_scene: SceneEcho<'a>,
    story_context: &'a str,
    character: &'a str,
    math_topic: &'a str,
}

impl<'a> EchoBody<'a> {
    pub fn new(choice: &'a str, scene: &'a Scene, profile: &'a StoryRequest) -> Self {
        Self {
            choice,
            current_scene: SceneEcho::from(scene),
            story_context: profile.context_label(),
            character: profile.character.as_deref().unwrap_or_default(),
            math_topic: scene
                .math_topic()
                .or(profile.math_topic.as_deref())
                .unwrap_or(DEFAULT_MATH_TOPIC),
        }
    }
}

//
// ─── QUIZ DIALECT ──────────────────────────────────────────────────────────────
//

/// `POST /start`.
#[derive(Debug, Serialize)]
pub(crate) struct QuizStartBody<'a> {
    pub username: &'a str,
    pub session_id: Option<&'a str>,
    pub context: &'a str,
}

/// `POST /continue`.
#[derive(Debug, Serialize)]
pub(crate) struct QuizContinueBody<'a> {
    pub session_id: &'a str,
    pub user_answer: &'a str,
    pub username: &'a str,
    pub context: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct QuizWire {
    session_id: Option<IdWire>,
    question: Option<String>,
    answers: Option<BTreeMap<String, String>>,
    story: Option<String>,
    full_story: Option<String>,
    correct: Option<String>,
    result: Option<String>,
}

impl QuizWire {
    /// Convert a quiz response. The quiz backend keeps no score, so the caller
    /// supplies the running total and step.
    pub fn into_draft(self, score: u32, step: u32) -> SceneDraft {
        let prompt = self.question.filter(|q| !q.trim().is_empty());
        let finished = prompt.is_none();

        let question = prompt.map(|prompt| {
            let (keys, choices): (Vec<String>, Vec<String>) = self
                .answers
                .unwrap_or_default()
                .into_iter()
                .map(|(key, label)| (key.trim().to_ascii_lowercase(), label))
                .unzip();
            let correct_answer = self.correct.and_then(|correct| {
                let correct = correct.trim().to_ascii_lowercase();
                keys.iter()
                    .position(|key| *key == correct)
                    .and_then(|i| choices.get(i).cloned())
            });
            QuestionDraft {
                prompt,
                choices,
                keys,
                correct_answer,
                feedback: None,
            }
        });

        SceneDraft {
            text: self.story.unwrap_or_default(),
            question,
            feedback: self.result,
            finished,
            score,
            step: Some(step),
            summary: self.full_story,
            session_id: self.session_id.map(IdWire::into_string),
            ..SceneDraft::default()
        }
    }
}
