//! Intake questionnaire collected once before the first scene.

use thiserror::Error;

/// Prompts used when the backend does not declare its own.
///
/// Order matters: answers map positionally onto `StoryRequest`.
pub const STRUCTURED_PROMPTS: [&str; 4] = [
    "What's your name?",
    "Where should your story take place?",
    "Who is the hero of your story?",
    "Which math topic do you want to practice?",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IntakeError {
    #[error("the intake has no prompts")]
    NoPrompts,

    #[error("answer cannot be blank")]
    BlankAnswer,

    #[error("the intake is already complete")]
    AlreadyComplete,
}

/// Which prompts the learner is asked, and how answers are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeSchema {
    /// The fixed client-side prompts in `STRUCTURED_PROMPTS`.
    Structured,
    /// Prompts declared by the backend; answers are sent as free-form interests.
    Freeform(Vec<String>),
}

impl IntakeSchema {
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        match self {
            IntakeSchema::Structured => STRUCTURED_PROMPTS.iter().map(|p| (*p).to_string()).collect(),
            IntakeSchema::Freeform(prompts) => prompts.clone(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            IntakeSchema::Structured => STRUCTURED_PROMPTS.len(),
            IntakeSchema::Freeform(prompts) => prompts.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened after an answer was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeStep {
    /// Move on to the prompt at `index`.
    Next { index: usize },
    /// Every prompt is answered; the bootstrap request may be sent.
    Complete(IntakeAnswers),
}

/// Step-by-step collector for the intake prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeForm {
    prompts: Vec<String>,
    schema: IntakeSchema,
    answers: Vec<String>,
    cursor: usize,
    complete: bool,
}

impl IntakeForm {
    /// # Errors
    ///
    /// Returns `IntakeError::NoPrompts` for an empty freeform schema.
    pub fn new(schema: IntakeSchema) -> Result<Self, IntakeError> {
        if schema.is_empty() {
            return Err(IntakeError::NoPrompts);
        }
        let prompts = schema.prompts();
        Ok(Self {
            answers: vec![String::new(); prompts.len()],
            prompts,
            schema,
            cursor: 0,
            complete: false,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &IntakeSchema {
        &self.schema
    }

    #[must_use]
    pub fn current_prompt(&self) -> Option<&str> {
        if self.complete {
            return None;
        }
        self.prompts.get(self.cursor).map(String::as_str)
    }

    /// Zero-based index of the prompt being answered.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.cursor + 1 == self.prompts.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Previously entered answer for the prompt at `index`, if any.
    #[must_use]
    pub fn answer_at(&self, index: usize) -> Option<&str> {
        self.answers
            .get(index)
            .map(String::as_str)
            .filter(|a| !a.is_empty())
    }

    /// Record an answer for the current prompt.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::BlankAnswer` for whitespace-only input and
    /// `IntakeError::AlreadyComplete` once every prompt has been answered.
    pub fn submit(&mut self, answer: &str) -> Result<IntakeStep, IntakeError> {
        if self.complete {
            return Err(IntakeError::AlreadyComplete);
        }
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(IntakeError::BlankAnswer);
        }

        self.answers[self.cursor] = answer.to_string();

        if self.is_last() {
            self.complete = true;
            return Ok(IntakeStep::Complete(IntakeAnswers {
                schema: self.schema.clone(),
                answers: self.answers.clone(),
            }));
        }

        self.cursor += 1;
        Ok(IntakeStep::Next { index: self.cursor })
    }

    /// Step back to the previous prompt. Returns false at the first prompt.
    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.complete = false;
        self.cursor -= 1;
        true
    }
}

/// The full set of intake answers, one per prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeAnswers {
    schema: IntakeSchema,
    answers: Vec<String>,
}

impl IntakeAnswers {
    #[must_use]
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Map the answers onto the bootstrap request.
    #[must_use]
    pub fn story_request(&self) -> StoryRequest {
        match self.schema {
            IntakeSchema::Structured => {
                let field = |i: usize| self.answers.get(i).cloned();
                StoryRequest {
                    name: field(0),
                    interests: None,
                    story_context: field(1),
                    character: field(2),
                    math_topic: field(3),
                }
            }
            IntakeSchema::Freeform(_) => StoryRequest {
                interests: Some(self.answers.join(", ")),
                ..StoryRequest::default()
            },
        }
    }
}

/// Learner profile sent to the backend to personalize the story.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryRequest {
    pub name: Option<String>,
    pub interests: Option<String>,
    pub story_context: Option<String>,
    pub character: Option<String>,
    pub math_topic: Option<String>,
}

impl StoryRequest {
    /// Profile used when the learner skips the intake.
    #[must_use]
    pub fn quick_start() -> Self {
        Self {
            story_context: Some("fantasy world".into()),
            character: Some("adventurer".into()),
            ..Self::default()
        }
    }

    /// Best single description of the story setting.
    #[must_use]
    pub fn context_label(&self) -> &str {
        self.story_context
            .as_deref()
            .or(self.interests.as_deref())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Explorer")
    }
}
