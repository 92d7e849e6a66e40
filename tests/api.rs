//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use tower::ServiceExt;
use voicepal::AudioStore;
use voicepal::api::ApiServerBuilder;

mod common;
use common::{BOUNDARY, FAKE_MP3, FakeStt, FakeSynthesizer, FakeTranscriber, orchestrator, tone_wav, voice_form};

/// Build a test API router serving `static_dir`
fn build_test_router(turns: voicepal::TurnOrchestrator, static_dir: &std::path::Path) -> axum::Router {
    ApiServerBuilder::new(Arc::new(turns), 0)
        .static_dir(static_dir.to_path_buf())
        .build()
        .router()
}

fn voice_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process_voice")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(orchestrator(None, None), dir.path());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_reports_voice_collaborators() {
    let dir = tempfile::tempdir().unwrap();
    let stt = FakeTranscriber::new(FakeStt::Says("hello"));
    let app = build_test_router(orchestrator(Some(stt), None), dir.path());

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"]["stt"]["status"], "ok");
    assert_eq!(json["checks"]["tts"]["status"], "unavailable");
}

#[tokio::test]
async fn test_ready_without_stt_is_degraded() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(orchestrator(None, None), dir.path());

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["status"], "degraded");
}

#[tokio::test]
async fn test_missing_audio_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let stt = FakeTranscriber::new(FakeStt::Says("hello"));
    let app = build_test_router(orchestrator(Some(stt.clone()), None), dir.path());

    let response = app
        .oneshot(voice_request(voice_form(None, Some("s1"), Some("cat"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["code"], "bad_request");
    assert_eq!(json["error"], "No audio file");
    assert_eq!(stt.calls(), 0);
}

#[tokio::test]
async fn test_full_voice_turn() {
    let dir = tempfile::tempdir().unwrap();
    let stt = FakeTranscriber::new(FakeStt::Says("hello"));
    let tts = FakeSynthesizer::working();
    let audio_store = AudioStore::new(dir.path(), 8);
    let app = build_test_router(
        orchestrator(Some(stt), Some((tts.clone(), audio_store))),
        dir.path(),
    );

    let response = app
        .clone()
        .oneshot(voice_request(voice_form(Some(&tone_wav()), Some("s1"), Some("winnie"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["user_text"], "hello");
    assert_eq!(json["assistant_text"], "🧸 Hi there, friend 🌸");
    assert_eq!(json["persona"], "winnie");

    // TTS hears the reply without the pictographs it cannot pronounce
    assert_eq!(tts.spoken(), vec!["🧸 Hi there, friend".to_string()]);

    let url = json["audio"].as_str().unwrap().to_string();
    assert!(url.starts_with("/static/tts/"));

    let response = app
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], FAKE_MP3);
}

#[tokio::test]
async fn test_defaults_and_unknown_persona_echo() {
    let dir = tempfile::tempdir().unwrap();
    let stt = FakeTranscriber::new(FakeStt::Says("who are you"));
    let turns = orchestrator(Some(stt), None);
    let store = Arc::clone(turns.store());
    let app = build_test_router(turns, dir.path());

    let response = app
        .oneshot(voice_request(voice_form(Some(&tone_wav()), None, Some("dragon"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["persona"], "dragon");
    assert_eq!(
        json["assistant_text"],
        "🐋 I'm narwhal! the splashy sidekick you never knew you needed! 🎉"
    );
    assert!(json["audio"].is_null());
    assert_eq!(store.session("default").map(|s| s.len()), Some(3));
}

#[tokio::test]
async fn test_stt_not_configured() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(orchestrator(None, None), dir.path());

    let response = app
        .oneshot(voice_request(voice_form(Some(&tone_wav()), None, None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["code"], "not_configured");
}

#[tokio::test]
async fn test_stt_failure_aborts_turn() {
    let dir = tempfile::tempdir().unwrap();
    let turns = orchestrator(Some(FakeTranscriber::new(FakeStt::Fails)), None);
    let store = Arc::clone(turns.store());
    let app = build_test_router(turns, dir.path());

    let response = app
        .oneshot(voice_request(voice_form(Some(&tone_wav()), Some("s1"), None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["code"], "transcription_failed");
    assert!(store.session("s1").is_none());
}

#[tokio::test]
async fn test_stt_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let turns = orchestrator(Some(FakeTranscriber::new(FakeStt::Hangs)), None);
    let app = build_test_router(turns, dir.path());

    let response = app
        .oneshot(voice_request(voice_form(Some(&tone_wav()), None, None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await["code"], "timeout");
}

#[tokio::test]
async fn test_tts_failure_still_replies() {
    let dir = tempfile::tempdir().unwrap();
    let stt = FakeTranscriber::new(FakeStt::Says("how are you"));
    let tts = FakeSynthesizer::failing();
    let audio_store = AudioStore::new(dir.path(), 8);
    let app = build_test_router(orchestrator(Some(stt), Some((tts, audio_store))), dir.path());

    let response = app
        .oneshot(voice_request(voice_form(Some(&tone_wav()), None, Some("cat"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["assistant_text"], "😼 I'm chilling, as always 😏");
    assert!(json["audio"].is_null());
}

#[tokio::test]
async fn test_tts_timeout_still_replies() {
    let dir = tempfile::tempdir().unwrap();
    let stt = FakeTranscriber::new(FakeStt::Says("hello"));
    let tts = FakeSynthesizer::hangs();
    let audio_store = AudioStore::new(dir.path(), 8);
    let app = build_test_router(
        orchestrator(Some(stt), Some((tts.clone(), audio_store))),
        dir.path(),
    );

    let response = app
        .oneshot(voice_request(voice_form(Some(&tone_wav()), Some("s1"), Some("cat"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["user_text"], "hello");
    assert_eq!(json["assistant_text"], "😼 Yo, what's up 😏");
    assert!(json["audio"].is_null());
    assert_eq!(tts.spoken().len(), 1);
}

#[tokio::test]
async fn test_web_ui_index() {
    let web = tempfile::tempdir().unwrap();
    std::fs::write(web.path().join("index.html"), "<h1>voicepal</h1>").unwrap();
    let static_dir = tempfile::tempdir().unwrap();

    let app = ApiServerBuilder::new(Arc::new(orchestrator(None, None)), 0)
        .static_dir(static_dir.path().to_path_buf())
        .web_dir(Some(web.path().to_path_buf()))
        .build()
        .router();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"<h1>voicepal</h1>");
}

#[tokio::test]
async fn test_bundled_web_ui() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_router(orchestrator(None, None), dir.path());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("recordBtn"));

    let response = app
        .oneshot(Request::builder().uri("/script.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/javascript")
    );
}
