use std::fmt::Write as _;

use quest_core::model::{ImageRef, Scene};
use services::quest::percent_of;

use super::markdown_vm::{markdown_to_html, markdown_to_plain};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageVm {
    /// Something an `<img>` can load.
    Src(String),
    /// Only a description of the illustration is available.
    Caption(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceVm {
    pub label: String,
    pub key: String,
    pub selected: bool,
    pub disabled: bool,
}

/// Feedback about the answer just given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackVm {
    pub text: String,
    /// `None` when the scene did not disclose the correct answer.
    pub correct: Option<bool>,
}

impl FeedbackVm {
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self.correct {
            Some(true) => "feedback feedback--correct",
            Some(false) => "feedback feedback--wrong",
            None => "feedback",
        }
    }

    /// Short prefix for terminals.
    #[must_use]
    pub fn marker(&self) -> &'static str {
        match self.correct {
            Some(true) => "✔ ",
            Some(false) => "✘ ",
            None => "",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecapRowVm {
    pub index: usize,
    pub metaphor: Option<String>,
    pub math_concept: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneBodyVm {
    Question {
        prompt: String,
        choices: Vec<ChoiceVm>,
    },
    Complete {
        score_label: String,
        summary: Option<String>,
        recap: Vec<RecapRowVm>,
        history: Vec<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneVm {
    pub narrative: String,
    pub narrative_html: String,
    pub image: Option<ImageVm>,
    pub progress_percent: Option<u8>,
    pub body: SceneBodyVm,
}

impl SceneVm {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.body, SceneBodyVm::Complete { .. })
    }
}

/// Pure view of a scene.
///
/// A finished scene never yields choice controls, whatever question payload
/// it carries; an unfinished one never yields a score.
#[must_use]
pub fn render_scene(scene: &Scene, selected: Option<&str>, submitting: bool) -> SceneVm {
    let image = scene.image_ref().map(|img| match img {
        ImageRef::Description(text) => ImageVm::Caption(text.clone()),
        other => other
            .src()
            .map_or_else(|| ImageVm::Caption(other.as_raw()), ImageVm::Src),
    });

    let body = if scene.is_finished() {
        SceneBodyVm::Complete {
            score_label: format!("Your final score: {}", scene.score()),
            summary: scene.summary().map(str::to_string),
            recap: scene
                .recap()
                .into_iter()
                .map(|entry| RecapRowVm {
                    index: entry.index + 1,
                    metaphor: entry.metaphor.map(str::to_string),
                    math_concept: entry.math_concept.map(str::to_string),
                })
                .collect(),
            history: scene.story_history().to_vec(),
        }
    } else {
        let locked = submitting || selected.is_some();
        let (prompt, choices) = scene.active_question().map_or_else(
            || (String::new(), Vec::new()),
            |question| {
                let choices = question
                    .choices()
                    .iter()
                    .map(|label| ChoiceVm {
                        key: question.key_for(label).unwrap_or_default(),
                        label: label.clone(),
                        selected: selected == Some(label.as_str()),
                        disabled: locked,
                    })
                    .collect();
                (question.prompt().to_string(), choices)
            },
        );
        SceneBodyVm::Question { prompt, choices }
    };

    SceneVm {
        narrative: scene.text().to_string(),
        narrative_html: markdown_to_html(scene.text()),
        image,
        progress_percent: scene.progress().map(percent_of),
        body,
    }
}

/// Plain-text rendering for terminals.
#[must_use]
pub fn render_plain(vm: &SceneVm) -> String {
    let mut out = String::new();

    if let Some(percent) = vm.progress_percent {
        let filled = usize::from(percent / 5);
        let _ = writeln!(
            out,
            "[{}{}] {percent}%",
            "#".repeat(filled),
            "-".repeat(20 - filled)
        );
    }
    if let Some(ImageVm::Caption(caption)) = &vm.image {
        let _ = writeln!(out, "({caption})");
    }
    if !vm.narrative.is_empty() {
        let _ = writeln!(out, "{}\n", markdown_to_plain(&vm.narrative));
    }

    match &vm.body {
        SceneBodyVm::Question { prompt, choices } => {
            let _ = writeln!(out, "{prompt}");
            for (i, choice) in choices.iter().enumerate() {
                let _ = writeln!(out, "  {}) {}", i + 1, choice.label);
            }
        }
        SceneBodyVm::Complete {
            score_label,
            summary,
            recap,
            ..
        } => {
            let _ = writeln!(out, "Adventure complete!\n{score_label}");
            if let Some(summary) = summary {
                let _ = writeln!(out, "\n{}", markdown_to_plain(summary));
            }
            for row in recap {
                let _ = writeln!(
                    out,
                    "  {}. {} -> {}",
                    row.index,
                    row.metaphor.as_deref().unwrap_or("?"),
                    row.math_concept.as_deref().unwrap_or("?")
                );
            }
        }
    }
    out
}
