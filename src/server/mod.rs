//! HTTP boundary for the mobile app.
//!
//! - `POST /api/ocr` runs the OCR pipeline on a base64 image
//! - `GET /health` liveness probe

mod handlers;
mod routes;

pub use handlers::{ApiError, CorrectionBody, OcrRequest, OcrResponse};
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{Config, ServerConfig};
use crate::llm::LlmClient;
use crate::ocr::OcrPipeline;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<OcrPipeline>,
    /// Present only when the correction step is configured.
    pub llm: Option<Arc<LlmClient>>,
    /// Recognition engine key, held server-side.
    pub api_key: Arc<str>,
    pub server: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.vision.api_key().ok_or_else(|| {
            anyhow::anyhow!("Vision API key not configured (set VISION_API_KEY)")
        })?;

        let pipeline = OcrPipeline::new(config.vision.clone())?;

        let llm = if config.llm.is_configured() {
            Some(Arc::new(LlmClient::new(config.llm.clone())?))
        } else {
            None
        };

        Ok(Self {
            pipeline: Arc::new(pipeline),
            llm,
            api_key: Arc::from(api_key),
            server: Arc::new(config.server.clone()),
        })
    }
}

/// Start the web server.
pub async fn serve(config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::io::Cursor;
    use tower::ServiceExt;

    use crate::config::VisionConfig;
    use crate::ocr::encode_payload;

    fn test_config(expose_error_details: bool) -> Config {
        Config {
            // Nothing listens on the discard port
            vision: VisionConfig {
                api_key: Some("test-key".to_string()),
                ..VisionConfig::default().with_endpoint("http://127.0.0.1:9/annotate")
            },
            server: ServerConfig {
                max_body_bytes: 64 * 1024,
                expose_error_details,
                ..ServerConfig::default()
            },
            ..Config::default()
        }
    }

    fn setup_test_app(expose_error_details: bool) -> axum::Router {
        let state = AppState::new(&test_config(expose_error_details)).unwrap();
        create_router(state)
    }

    fn png_payload() -> String {
        let img = image::GrayImage::from_pixel(8, 8, image::Luma([200u8]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        encode_payload(&bytes.into_inner())
    }

    fn post_json(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/ocr")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_state_requires_api_key() {
        let config = Config {
            vision: VisionConfig::default(),
            ..test_config(false)
        };
        assert!(AppState::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_health() {
        let app = setup_test_app(false);

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
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_image_is_bad_request() {
        let app = setup_test_app(false);

        let response = app
            .oneshot(post_json(r#"{"languageHints":["sk"]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("image"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = setup_test_app(false);

        let response = app.oneshot(post_json("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_hint_is_bad_request() {
        let app = setup_test_app(false);

        let body = serde_json::json!({ "image": png_payload(), "languageHints": ["not a hint"] });
        let response = app.oneshot(post_json(body.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_base64_is_bad_request() {
        let app = setup_test_app(false);

        let response = app
            .oneshot(post_json(r#"{"image":"!!!not-base64!!!"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["code"], "invalid_payload");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let app = setup_test_app(false);

        let body = serde_json::json!({ "image": "A".repeat(128 * 1024) });
        let response = app.oneshot(post_json(body.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_undecodable_image_is_bad_gateway() {
        let app = setup_test_app(false);

        let body = serde_json::json!({ "image": encode_payload(b"definitely not an image") });
        let response = app.oneshot(post_json(body.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = json_body(response).await;
        assert_eq!(json["code"], "image_decode");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_bad_gateway() {
        let app = setup_test_app(true);

        let body = serde_json::json!({ "image": png_payload() });
        let response = app.oneshot(post_json(body.to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Text recognition failed");
        assert_eq!(json["code"], "recognition_unreachable");
        assert!(json["details"].is_string());
    }
}
