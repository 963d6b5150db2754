use std::time::Duration;

use quest_core::model::{QuestionDraft, Scene, SceneDraft};
use quest_core::{IntakeSchema, StoryRequest};
use services::{BackendError, QuestSession, RecordedCall, ScriptedBackend};

use super::test_harness::{
    HarnessOptions, TEST_BACKEND_LABEL, ViewKind, setup_view_harness, setup_view_harness_with,
};

fn question_scene(text: &str) -> Scene {
    SceneDraft {
        text: text.into(),
        question: Some(QuestionDraft {
            prompt: "Which is larger?".into(),
            choices: vec!["1/2".into(), "1/3".into()],
            correct_answer: Some("1/2".into()),
            ..QuestionDraft::default()
        }),
        progress: Some(0.25),
        session_id: Some("s-1".into()),
        ..SceneDraft::default()
    }
    .validate()
    .unwrap()
}

fn finished_scene() -> Scene {
    SceneDraft {
        text: "The dragon bows.".into(),
        finished: true,
        score: 4,
        metaphors: vec!["a bridge".into()],
        math_concepts: vec!["fractions".into()],
        summary: Some("Fractions compare parts of a whole.".into()),
        ..SceneDraft::default()
    }
    .validate()
    .unwrap()
}

fn seeded(scene: Scene) -> HarnessOptions {
    HarnessOptions {
        seed: Some(QuestSession::new(StoryRequest::quick_start(), scene)),
        ..HarnessOptions::default()
    }
}

fn start_calls(backend: &ScriptedBackend) -> usize {
    backend
        .calls()
        .iter()
        .filter(|call| matches!(call, RecordedCall::Start(_)))
        .count()
}

#[tokio::test(flavor = "current_thread")]
async fn intake_view_smoke_renders_first_structured_prompt() {
    let mut harness = setup_view_harness(ViewKind::Intake, ScriptedBackend::new());
    harness.rebuild();
    harness.drive_async().await;

    let html = harness.render();
    assert!(html.contains("What&#39;s your name?") || html.contains("What's your name?"), "{html}");
    assert!(html.contains("Question 1 of 4"), "{html}");
    assert!(html.contains("Quick start"), "{html}");
    assert_eq!(start_calls(&harness.backend), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn intake_view_smoke_uses_backend_prompts() {
    let backend = ScriptedBackend::new().with_schema(IntakeSchema::Freeform(vec![
        "Hobbies?".into(),
        "Favourite animal?".into(),
        "Favourite place?".into(),
    ]));
    let mut harness = setup_view_harness(ViewKind::Intake, backend);
    harness.rebuild();
    harness.drive_async().await;

    let html = harness.render();
    assert!(html.contains("Hobbies?"), "{html}");
    assert!(html.contains("Question 1 of 3"), "{html}");
    assert!(html.contains("Next"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn quick_start_failure_shows_error_panel_with_backend_hint() {
    let backend = ScriptedBackend::new();
    backend.push_start(Err(BackendError::Unreachable("connection refused".into())));
    let mut harness = setup_view_harness_with(
        ViewKind::Intake,
        backend,
        HarnessOptions {
            quick_start_on_launch: true,
            ..HarnessOptions::default()
        },
    );
    harness.rebuild();
    for _ in 0..3 {
        harness.drive_async().await;
    }

    let html = harness.render();
    assert!(html.contains("could not be reached"), "{html}");
    assert!(html.contains(TEST_BACKEND_LABEL), "{html}");
    assert!(html.contains("Retry"), "{html}");
    assert_eq!(start_calls(&harness.backend), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn quick_start_success_opens_first_scene() {
    let backend = ScriptedBackend::new();
    backend.push_start(Ok(question_scene("A map unfolds.")));
    let mut harness = setup_view_harness_with(
        ViewKind::Intake,
        backend,
        HarnessOptions {
            quick_start_on_launch: true,
            ..HarnessOptions::default()
        },
    );
    harness.rebuild();
    for _ in 0..3 {
        harness.drive_async().await;
    }

    let html = harness.render();
    assert!(html.contains("A map unfolds."), "{html}");
    assert!(html.contains("Which is larger?"), "{html}");
    assert_eq!(start_calls(&harness.backend), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn quest_view_smoke_renders_choices_without_score() {
    let mut harness = setup_view_harness_with(
        ViewKind::Quest,
        ScriptedBackend::new(),
        seeded(question_scene("The troll blocks the bridge.")),
    );
    harness.rebuild();

    let html = harness.render();
    assert!(html.contains("The troll blocks the bridge."), "{html}");
    assert!(html.contains("1/2") && html.contains("1/3"), "{html}");
    assert!(html.contains("Turn 1 · Score 0"), "{html}");
    assert!(!html.contains("final score"), "{html}");
    assert!(!html.contains("choice--selected"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn finished_quest_shows_score_and_no_choices() {
    let mut harness = setup_view_harness_with(
        ViewKind::Quest,
        ScriptedBackend::new(),
        seeded(finished_scene()),
    );
    harness.rebuild();

    let html = harness.render();
    assert!(html.contains("Adventure complete!"), "{html}");
    assert!(html.contains("Your final score: 4"), "{html}");
    assert!(html.contains("fractions"), "{html}");
    assert!(html.contains("New adventure"), "{html}");
    assert!(!html.contains("class=\"choice"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn pending_choice_renders_disabled_buttons() {
    let mut session = QuestSession::new(StoryRequest::quick_start(), question_scene("Waiting."));
    session.begin_turn("1/3").unwrap();
    let mut harness = setup_view_harness_with(
        ViewKind::Quest,
        ScriptedBackend::new(),
        HarnessOptions {
            seed: Some(session),
            ..HarnessOptions::default()
        },
    );
    harness.rebuild();

    let html = harness.render();
    assert!(html.contains("choice--selected"), "{html}");
    assert!(html.contains("disabled"), "{html}");
}

#[tokio::test(flavor = "current_thread")]
async fn choosing_sends_one_turn_and_shows_next_scene() {
    let backend = ScriptedBackend::new().with_latency(Duration::from_millis(10));
    backend.push_turn(Ok(question_scene("The bridge lowers.")));
    let mut harness = setup_view_harness_with(
        ViewKind::Quest,
        backend,
        seeded(question_scene("The troll blocks the bridge.")),
    );
    harness.rebuild();

    harness.choose("1/2");
    harness.choose("1/3");
    let html = harness.render();
    assert!(html.contains("choice--selected"), "{html}");

    for _ in 0..3 {
        harness.drive_async().await;
    }

    let html = harness.render();
    assert!(html.contains("The bridge lowers."), "{html}");
    assert!(html.contains("Turn 2"), "{html}");
    assert_eq!(harness.backend.turn_calls(), 1);
    let choices: Vec<String> = harness
        .backend
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            RecordedCall::Turn { choice, .. } => Some(choice),
            _ => None,
        })
        .collect();
    assert_eq!(choices, vec!["1/2".to_string()]);
}

#[tokio::test(flavor = "current_thread")]
async fn failed_turn_keeps_scene_and_offers_retry() {
    let backend = ScriptedBackend::new();
    backend.push_turn(Err(BackendError::Rejected {
        status: 500,
        message: "story engine crashed".into(),
    }));
    backend.push_turn(Ok(question_scene("The bridge lowers.")));
    let mut harness = setup_view_harness_with(
        ViewKind::Quest,
        backend,
        seeded(question_scene("The troll blocks the bridge.")),
    );
    harness.rebuild();

    harness.choose("1/2");
    for _ in 0..2 {
        harness.drive_async().await;
    }

    let html = harness.render();
    assert!(html.contains("The troll blocks the bridge."), "{html}");
    assert!(html.contains("could not continue the story"), "{html}");
    assert!(html.contains("story engine crashed"), "{html}");
    assert!(html.contains("Retry"), "{html}");

    harness.choose("1/2");
    for _ in 0..2 {
        harness.drive_async().await;
    }

    let html = harness.render();
    assert!(html.contains("The bridge lowers."), "{html}");
    assert!(!html.contains("could not continue the story"), "{html}");
    assert_eq!(harness.backend.turn_calls(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn feedback_dwells_over_previous_scene_then_reveals_next() {
    let mut next = SceneDraft {
        text: "The bridge lowers.".into(),
        feedback: Some("Correct! Half is bigger.".into()),
        ..SceneDraft::default()
    };
    next.question = Some(QuestionDraft {
        prompt: "Which is smaller?".into(),
        choices: vec!["1/4".into(), "1/5".into()],
        ..QuestionDraft::default()
    });
    let backend = ScriptedBackend::new();
    backend.push_turn(Ok(next.validate().unwrap()));
    let mut harness = setup_view_harness_with(
        ViewKind::Quest,
        backend,
        HarnessOptions {
            feedback_dwell: Duration::from_millis(300),
            ..seeded(question_scene("The troll blocks the bridge."))
        },
    );
    harness.rebuild();

    harness.choose("1/2");
    for _ in 0..2 {
        harness.drive_async().await;
    }

    let html = harness.render();
    assert!(html.contains("Correct! Half is bigger."), "{html}");
    assert!(html.contains("feedback--correct"), "{html}");
    assert!(html.contains("The troll blocks the bridge."), "{html}");
    assert!(html.contains("disabled"), "{html}");
    assert!(!html.contains("The bridge lowers."), "{html}");

    tokio::time::sleep(Duration::from_millis(350)).await;
    for _ in 0..3 {
        harness.drive_async().await;
    }

    let html = harness.render();
    assert!(html.contains("The bridge lowers."), "{html}");
    assert!(html.contains("Which is smaller?"), "{html}");
    assert!(!html.contains("Correct! Half is bigger."), "{html}");
    assert!(!html.contains("The troll blocks the bridge."), "{html}");
}
