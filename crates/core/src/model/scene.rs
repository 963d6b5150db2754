use thiserror::Error;

use crate::model::ids::SessionId;
use crate::model::image::ImageRef;

/// Smallest number of choices a question may offer.
pub const MIN_CHOICES: usize = 2;
/// Largest number of choices a question may offer.
pub const MAX_CHOICES: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SceneError {
    #[error("scene text cannot be empty")]
    EmptyText,

    #[error("unfinished scene has no question")]
    MissingQuestion,

    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must offer {MIN_CHOICES}-{MAX_CHOICES} choices, got {count}")]
    ChoiceCount { count: usize },

    #[error("choice {index} is empty")]
    EmptyChoice { index: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question as decoded from a backend payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub prompt: String,
    pub choices: Vec<String>,
    /// Answer keys (`"a"`, `"b"`, ...) parallel to `choices`, when the backend uses them.
    pub keys: Vec<String>,
    pub correct_answer: Option<String>,
    pub feedback: Option<String>,
}

impl QuestionDraft {
    /// Validate prompt and choices.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::EmptyPrompt`, `SceneError::ChoiceCount` or
    /// `SceneError::EmptyChoice` when the payload cannot be shown as a question.
    pub fn validate(self) -> Result<Question, SceneError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(SceneError::EmptyPrompt);
        }

        let count = self.choices.len();
        if !(MIN_CHOICES..=MAX_CHOICES).contains(&count) {
            return Err(SceneError::ChoiceCount { count });
        }

        let mut choices = Vec::with_capacity(count);
        for (index, choice) in self.choices.into_iter().enumerate() {
            let choice = choice.trim().to_string();
            if choice.is_empty() {
                return Err(SceneError::EmptyChoice { index });
            }
            choices.push(choice);
        }

        let keys = if self.keys.len() == choices.len() {
            self.keys
        } else {
            Vec::new()
        };

        Ok(Question {
            prompt,
            choices,
            keys,
            correct_answer: non_blank(self.correct_answer),
            feedback: non_blank(self.feedback),
        })
    }
}

/// A single multiple-choice question attached to a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    choices: Vec<String>,
    keys: Vec<String>,
    correct_answer: Option<String>,
    feedback: Option<String>,
}

impl Question {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Choice labels in the order the backend sent them.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn correct_answer(&self) -> Option<&str> {
        self.correct_answer.as_deref()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    #[must_use]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.choices.iter().position(|choice| choice == label)
    }

    /// Answer key for a choice label.
    ///
    /// Without explicit keys, choices are lettered `a`, `b`, ... by position.
    #[must_use]
    pub fn key_for(&self, label: &str) -> Option<String> {
        let index = self.position(label)?;
        if let Some(key) = self.keys.get(index) {
            return Some(key.clone());
        }
        u8::try_from(index)
            .ok()
            .map(|offset| char::from(b'a' + offset).to_string())
    }

    /// Choice label for an answer key; the inverse of `key_for`.
    #[must_use]
    pub fn label_for_key(&self, key: &str) -> Option<&str> {
        let key = key.trim().to_ascii_lowercase();
        self.choices
            .iter()
            .find(|label| self.key_for(label).as_deref() == Some(key.as_str()))
            .map(String::as_str)
    }

    /// `None` when the backend did not disclose the correct answer.
    #[must_use]
    pub fn is_correct(&self, label: &str) -> Option<bool> {
        self.correct_answer.as_deref().map(|answer| answer == label)
    }
}

//
// ─── SCENE ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated scene as decoded from a backend payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDraft {
    pub text: String,
    pub image_ref: Option<String>,
    pub progress: Option<f32>,
    pub question: Option<QuestionDraft>,
    pub feedback: Option<String>,
    pub finished: bool,
    pub score: u32,
    pub step: Option<u32>,
    /// Metaphor used by the current scene, when the backend names one.
    pub metaphor: Option<String>,
    pub math_concept: Option<String>,
    /// Answers given so far, as the backend tracks them.
    pub answers: Vec<String>,
    pub metaphors: Vec<String>,
    pub math_concepts: Vec<String>,
    pub story_history: Vec<String>,
    pub summary: Option<String>,
    pub session_id: Option<String>,
    pub math_topic: Option<String>,
}

impl SceneDraft {
    /// Validate the draft into a displayable `Scene`.
    ///
    /// A finished scene keeps a question only if it happens to be well formed;
    /// it is never shown either way.
    ///
    /// # Errors
    ///
    /// Returns `SceneError` when an unfinished scene lacks text or a valid question.
    pub fn validate(self) -> Result<Scene, SceneError> {
        let text = self.text.trim().to_string();
        let question = if self.finished {
            self.question.and_then(|q| q.validate().ok())
        } else {
            if text.is_empty() {
                return Err(SceneError::EmptyText);
            }
            Some(self.question.ok_or(SceneError::MissingQuestion)?.validate()?)
        };

        let progress = self
            .progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0));

        Ok(Scene {
            text,
            image_ref: self
                .image_ref
                .and_then(|raw| ImageRef::parse(raw).ok()),
            progress,
            question,
            feedback: non_blank(self.feedback),
            finished: self.finished,
            score: self.score,
            step: self.step,
            metaphor: non_blank(self.metaphor),
            math_concept: non_blank(self.math_concept),
            answers: self.answers,
            metaphors: self.metaphors,
            math_concepts: self.math_concepts,
            story_history: self.story_history,
            summary: non_blank(self.summary),
            session_id: self.session_id.and_then(|raw| SessionId::new(raw).ok()),
            math_topic: non_blank(self.math_topic),
        })
    }
}

/// One unit of story content returned by the backend.
///
/// Scenes are replace-only: the client never edits one after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    text: String,
    image_ref: Option<ImageRef>,
    progress: Option<f32>,
    question: Option<Question>,
    feedback: Option<String>,
    finished: bool,
    score: u32,
    step: Option<u32>,
    metaphor: Option<String>,
    math_concept: Option<String>,
    answers: Vec<String>,
    metaphors: Vec<String>,
    math_concepts: Vec<String>,
    story_history: Vec<String>,
    summary: Option<String>,
    session_id: Option<SessionId>,
    math_topic: Option<String>,
}

/// A metaphor/concept pair from the completion recap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecapEntry<'a> {
    pub index: usize,
    pub metaphor: Option<&'a str>,
    pub math_concept: Option<&'a str>,
}

impl Scene {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn image_ref(&self) -> Option<&ImageRef> {
        self.image_ref.as_ref()
    }

    /// Fraction of the story completed, clamped to `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> Option<f32> {
        self.progress
    }

    /// The question payload, even on a finished scene.
    #[must_use]
    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// The question the learner can still answer; `None` once finished.
    #[must_use]
    pub fn active_question(&self) -> Option<&Question> {
        if self.finished {
            None
        } else {
            self.question.as_ref()
        }
    }

    /// Transient feedback about the previous answer.
    ///
    /// Question-level feedback belongs to this scene's own question and is
    /// not reported here.
    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn step(&self) -> Option<u32> {
        self.step
    }

    #[must_use]
    pub fn metaphor(&self) -> Option<&str> {
        self.metaphor.as_deref()
    }

    #[must_use]
    pub fn math_concept(&self) -> Option<&str> {
        self.math_concept.as_deref()
    }

    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    #[must_use]
    pub fn metaphors(&self) -> &[String] {
        &self.metaphors
    }

    #[must_use]
    pub fn math_concepts(&self) -> &[String] {
        &self.math_concepts
    }

    #[must_use]
    pub fn story_history(&self) -> &[String] {
        &self.story_history
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    #[must_use]
    pub fn math_topic(&self) -> Option<&str> {
        self.math_topic.as_deref()
    }

    /// True if `label` is one of the choices of the active question.
    #[must_use]
    pub fn is_choice(&self, label: &str) -> bool {
        self.active_question()
            .is_some_and(|q| q.position(label).is_some())
    }

    /// Pair metaphors with math concepts by index.
    ///
    /// Lengths are not required to match; the shorter list yields `None`.
    #[must_use]
    pub fn recap(&self) -> Vec<RecapEntry<'_>> {
        let len = self.metaphors.len().max(self.math_concepts.len());
        (0..len)
            .map(|index| RecapEntry {
                index,
                metaphor: self.metaphors.get(index).map(String::as_str),
                math_concept: self.math_concepts.get(index).map(String::as_str),
            })
            .collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
