//! HTTP request handlers for the OCR API.

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::AppState;
use crate::llm::Correction;
use crate::ocr::{normalize_hints, OcrError, OcrResult};

/// Body of `POST /api/ocr`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrRequest {
    /// Base64 image, optionally with a data-URL prefix.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub language_hints: Vec<String>,
    /// Run the LLM correction step over the cleaned text.
    #[serde(default)]
    pub correct: bool,
}

#[derive(Debug, Serialize)]
pub struct CorrectionBody {
    pub text: String,
    pub corrected: bool,
}

#[derive(Debug, Serialize)]
pub struct OcrResponse {
    #[serde(flatten)]
    pub result: OcrResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correction: Option<CorrectionBody>,
}

/// JSON error body: `{"error": ..., "code": ..., "details": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: Option<&'static str>,
    details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({ "error": self.message });
        if let Some(code) = self.code {
            body["code"] = code.into();
        }
        if let Some(details) = self.details {
            body["details"] = details.into();
        }
        (self.status, Json(body)).into_response()
    }
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run the OCR pipeline on an uploaded image.
pub async fn api_ocr(
    State(state): State<AppState>,
    payload: Result<Json<OcrRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_error(rejection).into_response(),
    };

    let Some(image) = request.image.as_deref().filter(|s| !s.trim().is_empty()) else {
        return ApiError::bad_request("Missing required field: image").into_response();
    };

    let hints = match normalize_hints(&request.language_hints) {
        Ok(hints) => hints,
        Err(e) => return ApiError::bad_request(e.to_string()).into_response(),
    };

    let timeout = Duration::from_secs(state.server.request_timeout_secs);
    let run = state.pipeline.run(image, &hints, &state.api_key);

    let result = match tokio::time::timeout(timeout, run).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => return pipeline_error(&state, e).into_response(),
        Err(_) => {
            warn!("OCR request timed out after {:?}", timeout);
            return ApiError::new(StatusCode::GATEWAY_TIMEOUT, "OCR request timed out")
                .into_response();
        }
    };

    if result.is_empty() {
        info!("No text detected in uploaded image");
        return ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "No text detected")
            .into_response();
    }

    let correction = if request.correct {
        Some(correct_text(&state, &result.cleaned_text).await)
    } else {
        None
    };

    Json(OcrResponse { result, correction }).into_response()
}

/// Oversized bodies keep their 413; every other rejection is a 400.
fn rejection_error(rejection: JsonRejection) -> ApiError {
    let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::BAD_REQUEST
    };
    ApiError::new(status, rejection.body_text())
}

/// Map a pipeline failure to a response, logging the engine diagnostics.
fn pipeline_error(state: &AppState, err: OcrError) -> ApiError {
    let diagnostics = err.diagnostics();
    match &diagnostics {
        Some(details) => error!("OCR pipeline failed ({}): {} | {}", err.code(), err, details),
        None => error!("OCR pipeline failed ({}): {}", err.code(), err),
    }

    if let OcrError::InvalidPayload(_) = err {
        return ApiError::bad_request(err.to_string()).with_code(err.code());
    }

    let details = if state.server.expose_error_details {
        diagnostics.or_else(|| Some(err.to_string()))
    } else {
        None
    };

    ApiError::new(StatusCode::BAD_GATEWAY, "Text recognition failed")
        .with_code(err.code())
        .with_details(details)
}

/// Correction never fails the request; errors fall back to the cleaned text.
async fn correct_text(state: &AppState, text: &str) -> CorrectionBody {
    let correction = match &state.llm {
        Some(llm) => match llm.correct(text).await {
            Ok(correction) => correction,
            Err(e) => {
                warn!("LLM correction failed: {}", e);
                Correction::PassThrough
            }
        },
        None => Correction::PassThrough,
    };

    let corrected = correction.is_corrected();
    CorrectionBody {
        text: correction.into_text(text),
        corrected,
    }
}
