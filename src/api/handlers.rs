use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::{ErrorResponse, HealthResponse, WelcomeResponse};
use crate::error::LungsegError;
use crate::preprocess::NormalizedScan;

/// GET / -- static welcome message
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the lung segmentation API. POST a chest X-ray to /lungs.".to_string(),
    })
}

/// GET /health -- lightweight liveness probe
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.model_path.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// POST /lungs -- segment an uploaded chest X-ray
///
/// Accepts a multipart body carrying one image file and answers with the
/// rendered lung mask as a JPEG. The body is served from the renderer's
/// in-memory bytes, never from the swept output directory.
pub async fn segment_lungs(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let upload = read_upload(multipart).await.map_err(error_response)?;
    debug!("received upload of {} bytes", upload.len());

    let scan = NormalizedScan::from_bytes(&upload).map_err(error_response)?;
    let mask = state.engine.predict(&scan).map_err(error_response)?;
    let rendered = state.renderer.render(&mask).map_err(error_response)?;
    debug!("rendered mask {}", rendered.name());

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/jpeg")],
        rendered.into_bytes(),
    )
        .into_response())
}

/// Pull the first file field out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> crate::error::Result<Vec<u8>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| LungsegError::Multipart(format!("invalid multipart body: {e}")))?
        .ok_or_else(|| LungsegError::Multipart("no file field in upload".to_string()))?;

    let bytes = field
        .bytes()
        .await
        .map_err(|e| LungsegError::Multipart(format!("could not read upload: {e}")))?;
    Ok(bytes.to_vec())
}

fn error_response(err: LungsegError) -> (StatusCode, Json<ErrorResponse>) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    if status.is_server_error() {
        warn!("request failed: {err}");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
