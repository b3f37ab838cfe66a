//! HTTP Backend Integration Tests
//!
//! Runs the adapter against a mock server:
//! - Request shapes for every endpoint
//! - Error bodies and status mapping
//! - The canvas engine driving the adapter end to end

use ink_core::{
    Canvas, CanvasConfig, CapabilityError, CollectingNotifier, DocumentStore, InkSynthesizer,
    Level, Mode, ObjectKind, PathCommand, Point, SceneBlob, Size, TextRecognizer,
};
use ink_remote::{HttpBackend, RemoteConfig, RemoteError};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_and_backend() -> (MockServer, HttpBackend) {
    let server = MockServer::start().await;
    let backend =
        HttpBackend::new(&RemoteConfig::new(format!("{}/api", server.uri()))).expect("backend");
    (server, backend)
}

fn two_strokes() -> serde_json::Value {
    json!({
        "paths": [
            [["M", 0, 0], ["Q", 5, 10, 10, 0], ["L", 20, 0]],
            [["M", 0, 20], ["L", 20, 20], ["M", 40, 20], ["L", 60, 20]]
        ]
    })
}

// ============================================================================
// Endpoints
// ============================================================================

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_recognize_sends_multipart_png() {
    let (server, backend) = server_and_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/ml/image-to-text"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"canvas.png\""))
        .and(body_string_contains("name=\"id\""))
        .and(body_string_contains("doc-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "hello world" })))
        .expect(1)
        .mount(&server)
        .await;

    let text = backend
        .recognize(b"PNG placeholder bytes", "doc-7")
        .await
        .expect("recognize");
    assert_eq!(text, "hello world");
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_synthesize_parses_command_arrays() {
    let (server, backend) = server_and_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/ml/text-to-image"))
        .and(body_json(json!({ "text": "hi" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_strokes()))
        .mount(&server)
        .await;

    let ink = backend.synthesize("hi").await.expect("synthesize");
    assert_eq!(ink.paths.len(), 2);
    assert_eq!(ink.paths[0][0], PathCommand::MoveTo(Point::new(0.0, 0.0)));
    assert_eq!(ink.subpaths().len(), 3);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_fetch_accepts_embedded_and_string_data() {
    let (server, backend) = server_and_backend().await;
    Mock::given(method("GET"))
        .and(path("/api/canvas/embedded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "version": 1, "objects": [] },
            "text": "cached"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/canvas/stringly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": "{\"version\":1,\"objects\":[]}",
            "recognizedTextCache": "older cache"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/canvas/fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .mount(&server)
        .await;

    let embedded = backend.fetch("embedded").await.expect("embedded");
    let blob = embedded.scene.expect("scene present");
    let value: serde_json::Value = serde_json::from_slice(blob.as_bytes()).expect("json");
    assert_eq!(value["version"], 1);
    assert_eq!(embedded.recognized_text.as_deref(), Some("cached"));

    let stringly = backend.fetch("stringly").await.expect("stringly");
    assert_eq!(
        stringly.scene.expect("scene present").as_bytes(),
        br#"{"version":1,"objects":[]}"#
    );
    assert_eq!(stringly.recognized_text.as_deref(), Some("older cache"));

    let fresh = backend.fetch("fresh").await.expect("fresh");
    assert!(fresh.scene.is_none());
    assert!(fresh.recognized_text.is_none());
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_store_puts_multipart_json() {
    let (server, backend) = server_and_backend().await;
    Mock::given(method("PUT"))
        .and(path("/api/canvas/42"))
        .and(body_string_contains("filename=\"canvas.json\""))
        .and(body_string_contains("application/json"))
        .and(body_string_contains("\"objects\""))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let blob = SceneBlob::from_bytes(br#"{"version":1,"objects":[]}"#.to_vec());
    backend.store("42", &blob).await.expect("store");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_error_body_message_is_used() {
    let (server, backend) = server_and_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/ml/text-to-image"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "code": 422, "message": "text too long" })),
        )
        .mount(&server)
        .await;

    let err = backend.synthesize("x").await.unwrap_err();
    match &err {
        RemoteError::Status { status, message } => {
            assert_eq!(*status, 422);
            assert_eq!(message, "text too long");
        }
        other => panic!("unexpected error: {other}"),
    }

    let capability = backend.synthesize_ink("x").await.unwrap_err();
    assert!(matches!(
        capability,
        CapabilityError::Rejected {
            service: "synthesis",
            ..
        }
    ));
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_status_text_fallback_and_transient_mapping() {
    let (server, backend) = server_and_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/ml/image-to-text"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
        .mount(&server)
        .await;

    let err = backend.recognize(b"png", "0").await.unwrap_err();
    assert!(err.is_transient());
    assert!(err.to_string().contains("Service Unavailable"), "{err}");

    let capability = backend.recognize_text(b"png", "0").await.unwrap_err();
    assert!(capability.is_transient());
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_malformed_success_body() {
    let (server, backend) = server_and_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/ml/text-to-image"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "paths": [[["Z", 1, 2]]] })),
        )
        .mount(&server)
        .await;

    let err = backend.synthesize("x").await.unwrap_err();
    assert!(matches!(err, RemoteError::UnexpectedResponse(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_unreachable_backend_is_transient() {
    let backend = HttpBackend::new(&RemoteConfig {
        base_url: "http://127.0.0.1:9/".to_string(),
        timeout_secs: 2,
        user_agent: None,
    })
    .expect("backend");
    let err = backend.load_document("0").await.unwrap_err();
    assert!(err.is_transient(), "{err}");
}

// ============================================================================
// Engine end to end
// ============================================================================

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_canvas_converts_text_through_backend() {
    let (server, backend) = server_and_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/ml/text-to-image"))
        .and(body_json(json!({ "text": "ink" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_strokes()))
        .expect(1)
        .mount(&server)
        .await;

    let mut canvas =
        Canvas::new(CanvasConfig::default(), Size::new(800.0, 600.0)).expect("canvas");
    canvas.apply_mode(Mode::Text);
    canvas.pointer_down(Point::new(100.0, 100.0));
    canvas.pointer_up(Point::new(100.0, 100.0));
    let id = canvas.editing().expect("text box");
    canvas.insert_text("ink");
    canvas.exit_text_editing();

    let created = canvas
        .convert(id, &backend, &backend)
        .await
        .expect("convert");
    assert_eq!(created.len(), 3);
    assert!(canvas.get_scene().get_object(id).is_none());
    assert!(created.iter().all(|new_id| matches!(
        canvas.get_scene().get_object(*new_id).map(|o| &o.kind),
        Some(ObjectKind::Stroke { .. })
    )));
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_canvas_keeps_text_when_backend_fails() {
    let (server, backend) = server_and_backend().await;
    Mock::given(method("POST"))
        .and(path("/api/ml/text-to-image"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let notifier = CollectingNotifier::new();
    let mut canvas = Canvas::new(CanvasConfig::default(), Size::new(800.0, 600.0))
        .expect("canvas")
        .with_notifier(notifier.clone());
    canvas.apply_mode(Mode::Text);
    canvas.pointer_down(Point::new(50.0, 50.0));
    canvas.pointer_up(Point::new(50.0, 50.0));
    let id = canvas.editing().expect("text box");
    canvas.insert_text("stays");
    canvas.exit_text_editing();

    assert!(canvas.convert(id, &backend, &backend).await.is_err());
    assert!(canvas.get_scene().get_object(id).is_some());
    let warnings: Vec<_> = notifier
        .take()
        .into_iter()
        .filter(|n| n.level == Level::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock/reqwest system-configuration issue on macOS"
)]
async fn test_canvas_round_trips_through_storage() {
    let (server, backend) = server_and_backend().await;
    Mock::given(method("PUT"))
        .and(path("/api/canvas/0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut source =
        Canvas::new(CanvasConfig::default(), Size::new(800.0, 600.0)).expect("canvas");
    source.apply_mode(Mode::Draw);
    source.pointer_down(Point::new(10.0, 10.0));
    source.pointer_move(Point::new(40.0, 30.0));
    source.pointer_up(Point::new(80.0, 20.0));
    source.save_to(&backend).await.expect("save");

    let blob = source.save().expect("blob");
    let data: serde_json::Value = serde_json::from_slice(blob.as_bytes()).expect("json");
    Mock::given(method("GET"))
        .and(path("/api/canvas/0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": data, "text": "scribble" })),
        )
        .mount(&server)
        .await;

    let mut target =
        Canvas::new(CanvasConfig::default(), Size::new(800.0, 600.0)).expect("canvas");
    target.load_from(&backend).await.expect("load");
    assert_eq!(target.get_scene().len(), 1);
    assert_eq!(target.recognized_text().as_str(), "scribble");
}
