//! End-to-end tests against the real router.
//!
//! These need a trained artifact, so they are gated on `LUNGSEG_TEST_MODEL`
//! (path to a lung-model.onnx) and skip silently when it is unset.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use image::{DynamicImage, ImageFormat, RgbImage};
use lungseg::api::{create_router, AppState};
use lungseg::ml::Autoencoder;
use lungseg::preprocess::NormalizedScan;
use lungseg::render::MaskRenderer;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "lungseg-test-boundary";

fn test_model_path() -> Option<PathBuf> {
    match std::env::var("LUNGSEG_TEST_MODEL") {
        Ok(path) => Some(PathBuf::from(path)),
        Err(_) => {
            eprintln!("LUNGSEG_TEST_MODEL not set, skipping");
            None
        }
    }
}

fn temp_output_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lungseg-e2e-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn test_state(model_path: &PathBuf, output_dir: &PathBuf) -> AppState {
    let engine = Arc::new(Autoencoder::load(model_path).unwrap());
    let renderer = Arc::new(MaskRenderer::new(output_dir));
    AppState::new(engine, renderer, model_path.display().to_string())
}

fn xray_png() -> Vec<u8> {
    // A synthetic three-channel "X-ray": darker borders, brighter center.
    let img = RgbImage::from_fn(256, 256, |x, y| {
        let cx = (x as i32 - 128).unsigned_abs() as u8;
        let cy = (y as i32 - 128).unsigned_abs() as u8;
        let v = 255 - cx.max(cy);
        image::Rgb([v, v, v])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn multipart_request(payload: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"input_image\"; \
             filename=\"scan.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/lungs")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn welcome_and_health_respond() {
    let Some(model_path) = test_model_path() else {
        return;
    };
    let output_dir = temp_output_dir();
    let app = create_router(test_state(&model_path, &output_dir));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let welcome: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(welcome["message"].as_str().unwrap().contains("/lungs"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    std::fs::remove_dir_all(&output_dir).unwrap();
}

#[tokio::test]
async fn valid_xray_yields_a_jpeg_mask() {
    let Some(model_path) = test_model_path() else {
        return;
    };
    let output_dir = temp_output_dir();
    let app = create_router(test_state(&model_path, &output_dir));

    let response = app.oneshot(multipart_request(&xray_png())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );

    // The body is itself a valid raster image.
    let mask = image::load_from_memory(&body_bytes(response).await).unwrap();
    assert_eq!(mask.width(), 400);
    assert_eq!(mask.height(), 400);

    // The disk parity copy exists until the janitor sweeps it.
    assert_eq!(std::fs::read_dir(&output_dir).unwrap().count(), 1);

    std::fs::remove_dir_all(&output_dir).unwrap();
}

#[tokio::test]
async fn zero_byte_upload_is_rejected() {
    let Some(model_path) = test_model_path() else {
        return;
    };
    let output_dir = temp_output_dir();
    let app = create_router(test_state(&model_path, &output_dir));

    let response = app.oneshot(multipart_request(&[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    std::fs::remove_dir_all(&output_dir).unwrap();
}

#[tokio::test]
async fn garbage_upload_is_rejected() {
    let Some(model_path) = test_model_path() else {
        return;
    };
    let output_dir = temp_output_dir();
    let app = create_router(test_state(&model_path, &output_dir));

    let response = app
        .oneshot(multipart_request(b"not an image at all"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    std::fs::remove_dir_all(&output_dir).unwrap();
}

#[tokio::test]
async fn concurrent_requests_yield_distinct_masks() {
    let Some(model_path) = test_model_path() else {
        return;
    };
    let output_dir = temp_output_dir();
    let app = create_router(test_state(&model_path, &output_dir));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(multipart_request(&xray_png())).await.unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().status(), StatusCode::OK);
    }

    // One uniquely named parity file per request.
    assert_eq!(std::fs::read_dir(&output_dir).unwrap().count(), 4);

    std::fs::remove_dir_all(&output_dir).unwrap();
}

#[tokio::test]
async fn inference_is_deterministic() {
    let Some(model_path) = test_model_path() else {
        return;
    };
    let engine = Autoencoder::load(&model_path).unwrap();
    let scan = NormalizedScan::from_bytes(&xray_png()).unwrap();

    let first = engine.predict(&scan).unwrap();
    let second = engine.predict(&scan).unwrap();
    assert_eq!(first, second);
}
