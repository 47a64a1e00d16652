use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::Json;
use axum::response::{Html, IntoResponse, Response};
use futures_util::StreamExt;
use serde::Serialize;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{AppState, WizardPage};
use crate::install::{EnvironmentStatus, InstallationRequest, InstallerError, check_environment};

pub(super) const NDJSON: &str = "application/x-ndjson";

/// Error body: plain text with a status derived from the installer error.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<InstallerError> for ApiError {
    fn from(e: InstallerError) -> Self {
        if !e.is_client_error() {
            log::warn!("Install request failed: {}", e);
        }
        let status = match &e {
            InstallerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            InstallerError::PortInUse(_)
            | InstallerError::AlreadyRunning
            | InstallerError::Completed => StatusCode::CONFLICT,
            InstallerError::PermissionDenied => StatusCode::FORBIDDEN,
            InstallerError::System(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

#[derive(Serialize)]
pub struct SubmitResponse {
    success: bool,
}

fn decode_request(body: &[u8]) -> Result<InstallationRequest, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        log::debug!("Rejecting malformed install request: {}", e);
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: format!("Invalid request: {}", e),
        }
    })
}

pub async fn index() -> Response {
    match WizardPage::get("index.html") {
        Some(page) => Html(page.data.into_owned()).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load page").into_response(),
    }
}

pub async fn install_status(State(state): State<AppState>) -> Json<EnvironmentStatus> {
    Json(check_environment(&state.settings, state.host.as_ref()))
}

pub async fn install_submit(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubmitResponse>, ApiError> {
    let request = decode_request(&body)?;
    request.validate(&state.settings)?;
    Ok(Json(SubmitResponse { success: true }))
}

/// Stream one JSON snapshot per line as the installation advances.
pub async fn install_apply(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request = decode_request(&body)?;
    if state.orchestrator.is_running() {
        return Err(InstallerError::AlreadyRunning.into());
    }
    let request = request.validate(&state.settings)?;
    let rx = state.orchestrator.apply(request)?;

    let lines = UnboundedReceiverStream::new(rx).map(|progress| {
        serde_json::to_vec(&progress).map(|mut line| {
            line.push(b'\n');
            Bytes::from(line)
        })
    });

    Ok(([(header::CONTENT_TYPE, NDJSON)], Body::from_stream(lines)).into_response())
}

pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;
    log::info!("{} {} -> {}", method, uri, response.status().as_u16());
    response
}
