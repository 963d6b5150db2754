use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use quest_core::{IntakeSchema, StoryRequest};
use services::{
    BackendDialect, BackendError, ContinuityMode, HttpStoryBackend, QuestConfig, QuestLoopService,
    RetryPolicy, StoryBackend,
};

#[derive(Clone, Default)]
struct Recorder {
    bodies: Arc<Mutex<Vec<(&'static str, Value)>>>,
}

impl Recorder {
    fn push(&self, endpoint: &'static str, body: Value) -> usize {
        let mut bodies = self.bodies.lock().unwrap();
        bodies.push((endpoint, body));
        bodies.iter().filter(|(e, _)| *e == endpoint).count()
    }

    fn bodies(&self, endpoint: &str) -> Vec<Value> {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(dialect: BackendDialect, base: &str) -> QuestConfig {
    QuestConfig::for_dialect(dialect)
        .unwrap()
        .with_backend_url(base)
        .unwrap()
}

fn nested_scene(session_id: &str, step: u32, finished: bool) -> Value {
    let feedback = if step > 1 {
        json!("Correct! Well done!")
    } else {
        Value::Null
    };
    json!({
        "sceneText": format!("Scene {step} in the haunted forest."),
        "imageRef": "https://example.com/forest.png",
        "progress": f64::from(step) / 3.0,
        "questions": [{
            "prompt": format!("Question {step}: what is 1/2 of 8?"),
            "choices": ["2", "4", "6"],
            "answer": "4",
            "feedback": "Half means two equal parts."
        }],
        "feedback": feedback,
        "finished": finished,
        "score": step - 1,
        "step": step,
        "metaphors": ["a pizza cut in two"],
        "mathConcepts": ["halves"],
        "sessionId": session_id
    })
}

async fn story_generate(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("generate", body);
    Json(nested_scene("s-1", 1, false))
}

async fn story_progress(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    let n = rec.push("progress", body);
    let step = u32::try_from(n).unwrap() + 1;
    Json(nested_scene(&format!("s-{step}"), step, step >= 3))
}

async fn story_server() -> (String, Recorder) {
    let rec = Recorder::default();
    let router = Router::new()
        .route(
            "/api/intro",
            get(|| async { Json(json!({"questions": ["What do you like to do?"]})) }),
        )
        .route("/api/generate-story", post(story_generate))
        .route("/api/progress-story", post(story_progress))
        .with_state(rec.clone());
    (serve(router).await, rec)
}

#[tokio::test]
async fn generate_body_matches_structured_intake() {
    let (base, rec) = story_server().await;
    let backend = HttpStoryBackend::new(&config(BackendDialect::Story, &base)).unwrap();

    let request = StoryRequest {
        name: Some("Alex".into()),
        story_context: Some("a haunted forest".into()),
        character: Some("explorer".into()),
        math_topic: Some("fractions".into()),
        ..StoryRequest::default()
    };
    let scene = backend.start_story(&request).await.unwrap();

    assert_eq!(
        rec.bodies("generate"),
        vec![json!({
            "storyContext": "a haunted forest",
            "character": "explorer",
            "mathTopic": "fractions"
        })]
    );
    let question = scene.active_question().unwrap();
    assert_eq!(question.prompt(), "Question 1: what is 1/2 of 8?");
    assert_eq!(question.choices(), ["2", "4", "6"]);
    assert_eq!(scene.session_id().unwrap().as_str(), "s-1");
}

#[tokio::test]
async fn intro_prompts_become_freeform_schema() {
    let (base, _rec) = story_server().await;
    let backend = HttpStoryBackend::new(&config(BackendDialect::Story, &base)).unwrap();
    assert_eq!(
        backend.intake_schema().await.unwrap(),
        IntakeSchema::Freeform(vec!["What do you like to do?".into()])
    );
}

#[tokio::test]
async fn missing_intro_falls_back_to_structured() {
    let base = serve(Router::new()).await;
    let backend = HttpStoryBackend::new(&config(BackendDialect::Story, &base)).unwrap();
    assert_eq!(backend.intake_schema().await.unwrap(), IntakeSchema::Structured);
}

#[tokio::test]
async fn session_id_round_trips_every_turn() {
    let (base, rec) = story_server().await;
    let service = QuestLoopService::from_config(&config(BackendDialect::Story, &base)).unwrap();

    let mut session = service
        .start_quest(StoryRequest::quick_start())
        .await
        .unwrap();
    let first = service.submit_choice(&mut session, "4").await.unwrap();
    assert!(!first.finished);
    assert_eq!(first.feedback.as_deref(), Some("Correct! Well done!"));
    assert_eq!(first.correct, Some(true));

    let last = service.submit_choice(&mut session, "2").await.unwrap();
    assert!(last.finished);
    assert_eq!(last.correct, Some(false));
    assert!(session.is_finished());

    let sent: Vec<Value> = rec.bodies("progress");
    assert_eq!(sent[0], json!({"sessionId": "s-1", "choice": "4"}));
    assert_eq!(sent[1], json!({"sessionId": "s-2", "choice": "2"}));
}

#[tokio::test]
async fn scene_echo_sends_current_scene_and_profile() {
    let (base, rec) = story_server().await;
    let mut cfg = config(BackendDialect::Story, &base);
    cfg.continuity = ContinuityMode::SceneEcho;
    let service = QuestLoopService::from_config(&cfg).unwrap();

    let mut session = service
        .start_quest(StoryRequest::quick_start())
        .await
        .unwrap();
    service.submit_choice(&mut session, "6").await.unwrap();

    let bodies = rec.bodies("progress");
    let body = &bodies[0];
    assert_eq!(body["choice"], "6");
    assert_eq!(body["storyContext"], "fantasy world");
    assert_eq!(body["character"], "adventurer");
    assert_eq!(body["mathTopic"], "algebra");
    assert_eq!(body["currentScene"]["sceneText"], "Scene 1 in the haunted forest.");
    assert_eq!(body["currentScene"]["questions"][0]["answer"], "4");
    assert!(body.get("sessionId").is_none());
}

#[tokio::test]
async fn error_body_is_surfaced_as_rejection() {
    let router = Router::new().route(
        "/api/generate-story",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to generate a valid story. Please try again.",
                    "details": "The AI response was not in the expected format."
                })),
            )
        }),
    );
    let base = serve(router).await;
    let backend = HttpStoryBackend::new(&config(BackendDialect::Story, &base)).unwrap();

    let err = backend
        .start_story(&StoryRequest::quick_start())
        .await
        .unwrap_err();
    match err {
        BackendError::Rejected { status, message } => {
            assert_eq!(status, 500);
            assert!(message.starts_with("Failed to generate a valid story"));
            assert!(message.contains("expected format"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn scene_without_question_is_invalid() {
    let router = Router::new().route(
        "/api/generate-story",
        post(|| async { Json(json!({"sceneText": "Once upon a time", "sessionId": "1"})) }),
    );
    let base = serve(router).await;
    let backend = HttpStoryBackend::new(&config(BackendDialect::Story, &base)).unwrap();

    let err = backend
        .start_story(&StoryRequest::quick_start())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::InvalidScene(_)));
}

#[tokio::test]
async fn server_relative_image_is_joined_onto_backend() {
    let router = Router::new().route(
        "/api/generate-story",
        post(|| async {
            let mut scene = nested_scene("s-1", 1, false);
            scene["imageRef"] = json!("/static/scene-1.png");
            Json(scene)
        }),
    );
    let base = serve(router).await;
    let backend = HttpStoryBackend::new(&config(BackendDialect::Story, &base)).unwrap();

    let scene = backend.start_story(&StoryRequest::quick_start()).await.unwrap();
    let src = scene.image_ref().and_then(|img| img.src());
    assert_eq!(src, Some(format!("{base}/static/scene-1.png")));
}

#[tokio::test]
async fn invalid_session_is_a_permanent_failure() {
    let hits = Recorder::default();
    let router = Router::new()
        .route(
            "/api/generate-story",
            post(|| async { Json(nested_scene("s-1", 1, false)) }),
        )
        .route(
            "/api/progress-story",
            post(|State(rec): State<Recorder>, Json(body): Json<Value>| async move {
                rec.push("progress", body);
                (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid session"})))
            }),
        )
        .with_state(hits.clone());
    let base = serve(router).await;

    let service = QuestLoopService::from_config(&config(BackendDialect::Story, &base))
        .unwrap()
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)));
    let mut session = service
        .start_quest(StoryRequest::quick_start())
        .await
        .unwrap();

    let err = service.submit_choice(&mut session, "4").await.unwrap_err();
    assert!(matches!(
        err.backend(),
        Some(BackendError::Rejected { status: 400, .. })
    ));
    assert_eq!(hits.bodies("progress").len(), 1);
    assert_eq!(session.turn(), 0);
    assert_eq!(session.failed_choice(), Some("4"));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let router = Router::new().route(
        "/api/generate-story",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(nested_scene("s-1", 1, false))
        }),
    );
    let base = serve(router).await;
    let mut cfg = config(BackendDialect::Story, &base);
    cfg.request_timeout = Duration::from_millis(200);
    let backend = HttpStoryBackend::new(&cfg).unwrap();

    let err = backend
        .start_story(&StoryRequest::quick_start())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Timeout));
    assert!(err.is_transient());
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend =
        HttpStoryBackend::new(&config(BackendDialect::Story, &format!("http://{addr}"))).unwrap();
    let err = backend
        .start_story(&StoryRequest::quick_start())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Unreachable(_)));
}

async fn quiz_start(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("start", body);
    Json(json!({
        "session_id": "q-1",
        "context": "space",
        "story": "The rocket needs fuel.",
        "question": "3 x 4 = ?",
        "answers": {"c": "14", "a": "7", "b": "12"},
        "correct": "b"
    }))
}

async fn quiz_continue(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    let n = rec.push("continue", body);
    if n == 1 {
        Json(json!({
            "session_id": "q-1",
            "result": "Correct!",
            "story": "The rocket lifts off.",
            "question": "10 - 3 = ?",
            "answers": {"a": "7", "b": "6", "c": "13"},
            "correct": "a"
        }))
    } else {
        Json(json!({
            "session_id": "q-1",
            "result": "Wrong, it was 7.",
            "full_story": "The rocket lifted off and reached the moon."
        }))
    }
}

#[tokio::test]
async fn quiz_dialect_maps_keys_and_keeps_score() {
    let rec = Recorder::default();
    let router = Router::new()
        .route("/start", post(quiz_start))
        .route("/continue", post(quiz_continue))
        .with_state(rec.clone());
    let base = serve(router).await;
    let service = QuestLoopService::from_config(&config(BackendDialect::Quiz, &base)).unwrap();

    assert_eq!(service.intake_schema().await.unwrap(), IntakeSchema::Structured);

    let request = StoryRequest {
        name: Some("Alex".into()),
        story_context: Some("space".into()),
        ..StoryRequest::default()
    };
    let mut session = service.start_quest(request).await.unwrap();
    assert_eq!(
        rec.bodies("start")[0],
        json!({"username": "Alex", "session_id": null, "context": "space"})
    );
    assert_eq!(session.scene().active_question().unwrap().choices(), ["7", "12", "14"]);

    let outcome = service.submit_choice(&mut session, "12").await.unwrap();
    assert_eq!(outcome.correct, Some(true));
    assert_eq!(session.scene().score(), 1);

    let outcome = service.submit_choice(&mut session, "13").await.unwrap();
    assert!(outcome.finished);
    assert_eq!(outcome.feedback.as_deref(), Some("Wrong, it was 7."));
    assert_eq!(session.scene().score(), 1);
    assert_eq!(
        session.scene().summary(),
        Some("The rocket lifted off and reached the moon.")
    );

    let sent = rec.bodies("continue");
    assert_eq!(
        sent[0],
        json!({"session_id": "q-1", "user_answer": "b", "username": "Alex", "context": "space"})
    );
    assert_eq!(sent[1]["user_answer"], "c");
}
