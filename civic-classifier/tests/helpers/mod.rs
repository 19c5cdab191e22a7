//! Shared test helpers: fake image scorer, stand-in upstream server,
//! request builders.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use civic_classifier::services::{
    ImageClassifier, ImageScorer, ImageTensor, ScorerError, TextClassifierClient,
};
use civic_classifier::AppState;
use civic_common::config::TextClassifierSettings;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

pub const BOUNDARY: &str = "civic-test-boundary";

/// Image scorer returning fixed logits
pub struct FixedScorer(pub Vec<f32>);

impl ImageScorer for FixedScorer {
    fn logits(&self, _input: &ImageTensor) -> Result<Vec<f32>, ScorerError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "fixed-test-scorer".to_string()
    }
}

/// Image scorer whose inference always fails
pub struct FailingScorer;

impl ImageScorer for FailingScorer {
    fn logits(&self, _input: &ImageTensor) -> Result<Vec<f32>, ScorerError> {
        Err(ScorerError::Inference("boom".to_string()))
    }

    fn describe(&self) -> String {
        "failing-test-scorer".to_string()
    }
}

pub fn text_client(endpoint: &str, timeout: Duration, token: Option<&str>) -> TextClassifierClient {
    TextClassifierClient::new(TextClassifierSettings {
        endpoint: endpoint.to_string(),
        timeout,
        api_token: token.map(str::to_string),
    })
    .expect("build text client")
}

/// App state with the given scorer and upstream endpoint
pub fn app_state(scorer: Arc<dyn ImageScorer>, endpoint: &str) -> AppState {
    AppState::new(
        ImageClassifier::new(scorer, 32),
        text_client(endpoint, Duration::from_secs(5), None),
    )
}

/// App whose text endpoint points nowhere reachable
pub fn image_only_app(logits: Vec<f32>) -> Router {
    civic_classifier::build_router(app_state(
        Arc::new(FixedScorer(logits)),
        "http://127.0.0.1:9/unused",
    ))
}

/// Serve `router` on an ephemeral loopback port, returning its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{}", addr)
}

pub fn png_bytes() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbImage::from_pixel(40, 30, Rgb([120, 80, 40]))
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

/// Multipart body with a single field
pub fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/classify-image")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Status and parsed JSON body of a response
pub async fn into_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).expect("body should be JSON");
    (status, json)
}
