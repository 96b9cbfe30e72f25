//! Router-level integration tests for the REST surface.
//!
//! These run fully offline: the text and image models are recording mocks
//! injected through `WedcardConfig`, so the tests exercise validation,
//! multipart decoding, the pipeline, storage, and the response shapes
//! without a single network call.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use wedcard::client::{GeneratedImage, ImageModel, ReferenceImage, TextModel};
use wedcard::{WedcardConfig, WedcardError};

// ── Test helpers ─────────────────────────────────────────────────────────────

const TEXT_PAYLOAD: &str = r#"{
    "greetings": ["서로의 빛이 되어", "두 사람이 하나 되어", "사랑으로 맺어진 두 사람"],
    "invitations": ["함께해 주세요", "자리를 빛내 주세요", "소중한 걸음 해주세요"],
    "location": "더 클래식 500, 2층 그랜드홀",
    "closing": ["감사합니다", "따뜻한 마음 감사합니다", "평생 간직하겠습니다"]
}"#;

/// Text model returning a canned schema payload, counting calls.
struct CannedText {
    calls: Arc<Mutex<usize>>,
}

#[async_trait]
impl TextModel for CannedText {
    async fn generate_text(&self, _prompt: &str) -> Result<String, WedcardError> {
        *self.calls.lock().unwrap() += 1;
        Ok(TEXT_PAYLOAD.to_string())
    }
}

/// Image model returning a tiny PNG per call, counting calls.
struct CannedImage {
    calls: Arc<Mutex<usize>>,
}

#[async_trait]
impl ImageModel for CannedImage {
    async fn generate_image(
        &self,
        _prompt: &str,
        _references: &[ReferenceImage],
    ) -> Result<GeneratedImage, WedcardError> {
        *self.calls.lock().unwrap() += 1;
        Ok(GeneratedImage {
            mime_type: "image/png".into(),
            data: png_bytes(),
        })
    }
}

fn png_bytes() -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 180, 160, 255]));
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

struct TestApp {
    router: axum::Router,
    text_calls: Arc<Mutex<usize>>,
    image_calls: Arc<Mutex<usize>>,
    _output_dir: tempfile::TempDir,
}

fn test_app() -> TestApp {
    let output_dir = tempfile::tempdir().unwrap();
    let text_calls = Arc::new(Mutex::new(0));
    let image_calls = Arc::new(Mutex::new(0));

    let config = WedcardConfig::builder()
        .output_dir(output_dir.path())
        .public_base_url("http://localhost:8000")
        .text_client(Arc::new(CannedText {
            calls: text_calls.clone(),
        }))
        .image_client(Arc::new(CannedImage {
            calls: image_calls.clone(),
        }))
        .build()
        .unwrap();

    TestApp {
        router: wedcard::server::router(Arc::new(config)),
        text_calls,
        image_calls,
        _output_dir: output_dir,
    }
}

const BOUNDARY: &str = "wedcard-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, Vec<u8>),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.png\"\r\n\
                         Content-Type: image/png\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn text_fields() -> Vec<Part<'static>> {
    vec![
        Part::Text("tone", "romantic"),
        Part::Text("groom_name", "이철수"),
        Part::Text("bride_name", "김영희"),
        Part::Text("venue", "더 클래식 500"),
        Part::Text("wedding_date", "2025년 4월 12일 토요일"),
        Part::Text("wedding_time", "오후 2시 30분"),
        Part::Text("address", "서울특별시 강남구 테헤란로 123"),
    ]
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = test_app();
    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

// ── Text generation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_text_returns_all_variant_sets() {
    let app = test_app();
    let payload = serde_json::json!({
        "tone": "romantic",
        "groom_name": "이철수",
        "bride_name": "김영희",
        "venue": "더 클래식 500",
        "wedding_date": "2025년 4월 12일 토요일",
        "wedding_time": "오후 2시 30분",
        "address": "서울특별시 강남구 테헤란로 123"
    });
    let response = app
        .router
        .oneshot(
            Request::post("/api/generate-text")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["greetings"].as_array().unwrap().len(), 3);
    assert_eq!(data["invitations"].as_array().unwrap().len(), 3);
    assert_eq!(data["closing"].as_array().unwrap().len(), 3);
    assert!(!data["location"].as_str().unwrap().is_empty());
    for section in ["greetings", "invitations", "closing"] {
        for entry in data[section].as_array().unwrap() {
            assert!(!entry.as_str().unwrap().trim().is_empty());
        }
    }
}

#[tokio::test]
async fn generate_text_with_blank_fields_is_rejected_before_the_model() {
    let app = test_app();
    let payload = serde_json::json!({
        "tone": "romantic",
        "groom_name": "",
        "bride_name": "김영희",
        "venue": "더 클래식 500",
        "wedding_date": "2025년 4월 12일 토요일",
        "wedding_time": "오후 2시 30분"
    });
    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/api/generate-text")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Validation Error");
    assert!(body["detail"].as_str().unwrap().contains("groom_name"));
    assert_eq!(*app.text_calls.lock().unwrap(), 0, "model was never called");
}

// ── Invitation generation ────────────────────────────────────────────────────

#[tokio::test]
async fn generate_invitation_yields_five_ordered_pages() {
    let app = test_app();
    let mut parts = text_fields();
    parts.push(Part::File("wedding_image", png_bytes()));
    parts.push(Part::File("style_image", png_bytes()));

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/generate-invitation", &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);

    let pages = body["data"]["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 5);
    let kinds: Vec<&str> = pages.iter().map(|p| p["type"].as_str().unwrap()).collect();
    assert_eq!(
        kinds,
        vec!["cover", "greeting", "invitation", "location", "closing"]
    );
    for (idx, page) in pages.iter().enumerate() {
        assert_eq!(page["page_number"].as_u64().unwrap() as usize, idx + 1);
        let url = page["image_url"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:8000/static/generated/"));
    }
    assert!(!body["data"]["texts"]["greetings"][0]
        .as_str()
        .unwrap()
        .is_empty());
    assert_eq!(*app.image_calls.lock().unwrap(), 5);
}

#[tokio::test]
async fn missing_wedding_image_is_rejected_before_any_external_call() {
    let app = test_app();
    let mut parts = text_fields();
    parts.push(Part::File("style_image", png_bytes()));

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/generate-invitation", &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["detail"].as_str().unwrap().contains("wedding_image"));
    assert_eq!(*app.text_calls.lock().unwrap(), 0);
    assert_eq!(*app.image_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn tuning_endpoint_yields_three_pages() {
    let app = test_app();
    let mut parts = text_fields();
    parts.push(Part::File("wedding_image", png_bytes()));
    parts.push(Part::File("style_image", png_bytes()));
    parts.push(Part::Text("model_type", "nanobanana"));
    parts.push(Part::Text("prompt_override_2", "a completely custom second page"));

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/generate-invitation-test", &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let pages = body["data"]["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[1]["type"], "content");
    assert_eq!(*app.image_calls.lock().unwrap(), 3);
}

#[tokio::test]
async fn non_image_upload_is_a_validation_error() {
    let app = test_app();
    let mut parts = text_fields();
    parts.push(Part::File("wedding_image", b"definitely not a png".to_vec()));
    parts.push(Part::File("style_image", png_bytes()));

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/generate-invitation", &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("wedding_image"));
    assert_eq!(*app.image_calls.lock().unwrap(), 0);
}

// ── 3D endpoints ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_3d_with_missing_file_is_404() {
    let app = test_app();
    let payload = serde_json::json!({"image_path": "/definitely/not/here.png"});
    let response = app
        .router
        .oneshot(
            Request::post("/api/generate-3d")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn status_without_meshy_key_is_a_configuration_error() {
    let app = test_app();
    let response = app
        .router
        .oneshot(
            Request::get("/api/status/tsk_123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Configuration Error");
    assert!(body["detail"].as_str().unwrap().contains("MESHY_API_KEY"));
}

// ── Static serving ───────────────────────────────────────────────────────────

#[tokio::test]
async fn generated_images_are_served_back() {
    let app = test_app();
    let mut parts = text_fields();
    parts.push(Part::File("wedding_image", png_bytes()));
    parts.push(Part::File("style_image", png_bytes()));

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/api/generate-invitation", &parts))
        .await
        .unwrap();
    let body = json_body(response).await;
    let url = body["data"]["pages"][0]["image_url"].as_str().unwrap();
    let path = url.strip_prefix("http://localhost:8000").unwrap();

    let fetched = app
        .router
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(fetched.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.to_vec(), png_bytes());
}
