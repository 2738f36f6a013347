// src/main.rs
use anyhow::{Context, Result};
use axum::http::StatusCode as AxumStatusCode;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use serde::Serialize;
use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use timesheet_core::drive_client::{DriveClient, DriveConfig, DriveError, TimesheetStore};
use timesheet_core::pdf_render::{render_timesheet, RenderError};
use timesheet_core::timesheet::Submission;

const DEFAULT_LOGO_FILE: &str = "logo.png";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Drive configuration error: {0}")]
    DriveConfig(#[from] envy::Error),
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),
    #[error("Please sign the timesheet before submitting")]
    MissingSignature,
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Saving to Google Drive failed: {0}")]
    Drive(#[from] DriveError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        error!("Error occurred: {:?}", self);
        let status_code = match &self {
            AppError::MissingEnvVar(_) | AppError::DriveConfig(_) | AppError::TlsConfig(_) => {
                AxumStatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::MissingSignature => AxumStatusCode::BAD_REQUEST,
            AppError::Render(render_err) => match render_err {
                RenderError::Signature(_) | RenderError::SignatureDecode { .. } => {
                    AxumStatusCode::UNPROCESSABLE_ENTITY
                }
                RenderError::Pdf(_) => AxumStatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Drive(drive_err) => match drive_err {
                DriveError::Request(_)
                | DriveError::ApiError { .. }
                | DriveError::TokenRequestFailed { .. } => AxumStatusCode::BAD_GATEWAY,
                _ => AxumStatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        // The submit contract surfaces the underlying message so the user can
        // decide whether resubmitting makes sense.
        (status_code, Json(SubmitResponse::failure(self.to_string()))).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl SubmitResponse {
    fn success(file_id: String) -> Self {
        Self {
            success: true,
            file_id: Some(file_id),
            error: None,
        }
    }

    fn failure(message: String) -> Self {
        Self {
            success: false,
            file_id: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone)]
struct AppConfig {
    cert_path: Option<String>,
    key_path: Option<String>,
    logo_path: PathBuf,
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn TimesheetStore>,
    logo_path: Arc<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting tracing subscriber failed")?;
    info!("Tracing subscriber initialized.");

    let app_config = load_app_config()?;
    info!("App configuration loaded.");
    let drive_config = DriveConfig::from_env().map_err(AppError::DriveConfig)?;
    info!("Drive configuration loaded.");

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Building HTTP client failed")?;
    let drive_client = Arc::new(DriveClient::new(drive_config, http_client));
    info!("Drive client initialized.");

    let state = AppState {
        store: drive_client,
        logo_path: Arc::new(app_config.logo_path.clone()),
    };
    info!("Application state initialized.");

    let timesheet_routes = Router::new().route("/submit", post(handle_submit));
    let api_routes = Router::new().nest("/timesheet", timesheet_routes);
    let app = Router::new()
        .nest("/api", api_routes)
        .route("/status", get(handle_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    match (&app_config.cert_path, &app_config.key_path) {
        (Some(cert_path), Some(key_path)) => {
            let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
                .await
                .map_err(|e| AppError::TlsConfig(format!("Failed to load TLS cert/key: {}", e)))?;
            info!("Starting server on https://{}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")?;
        }
        _ => {
            info!(
                "No TLS cert/key configured. Starting server on http://{}",
                addr
            );
            axum_server::bind(addr)
                .serve(app.into_make_service())
                .await
                .context("HTTP server failed")?;
        }
    }

    Ok(())
}

fn load_app_config() -> Result<AppConfig, AppError> {
    // TLS is optional for local use; when one of the pair is set, both must be.
    let cert_path = env::var("CERT_PATH").ok();
    let key_path = env::var("KEY_PATH").ok();
    match (&cert_path, &key_path) {
        (Some(_), None) => return Err(AppError::MissingEnvVar("KEY_PATH".to_string())),
        (None, Some(_)) => return Err(AppError::MissingEnvVar("CERT_PATH".to_string())),
        _ => {}
    }

    Ok(AppConfig {
        cert_path,
        key_path,
        logo_path: env::var("LOGO_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOGO_FILE)),
    })
}

/// Accepts one complete form snapshot, renders the PDF replica and stores it
/// in the shared Drive folder. Either the whole pipeline succeeds or nothing
/// is stored.
async fn handle_submit(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Result<Json<SubmitResponse>, AppError> {
    info!(
        "Handling timesheet submission from '{}' ({}).",
        submission.employee_name, submission.school
    );

    if !submission.is_signed() {
        return Err(AppError::MissingSignature);
    }

    let pdf_bytes = render_timesheet(&submission, &state.logo_path)?;
    info!("Rendered timesheet PDF ({} bytes).", pdf_bytes.len());

    let file_name = format!(
        "Timesheet_{}_{}.pdf",
        submission.employee_name,
        chrono::Utc::now().format("%Y-%m-%d")
    );
    let file_id = state.store.store_pdf(&file_name, pdf_bytes).await?;

    Ok(Json(SubmitResponse::success(file_id)))
}

async fn handle_status(State(state): State<AppState>) -> Html<String> {
    info!("Handling /status request...");
    let logo_note = if state.logo_path.exists() {
        "present"
    } else {
        "missing, forms will render without it"
    };
    Html(format!(
        "<h1>Server Status</h1><p>Current Time (Server): {}</p>\
         <p>Storage: {}</p>\
         <p>Logo file: {} ({})</p>",
        chrono::Local::now().to_rfc3339(),
        state.store.target_description(),
        state.logo_path.display(),
        logo_note
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_response_serializes_the_wire_shape() {
        let ok = serde_json::to_value(SubmitResponse::success("abc123".to_string())).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "fileId": "abc123"}));

        let failed = serde_json::to_value(SubmitResponse::failure("boom".to_string())).unwrap();
        assert_eq!(failed, serde_json::json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn unsigned_submissions_map_to_bad_request() {
        let response = AppError::MissingSignature.into_response();
        assert_eq!(response.status(), AxumStatusCode::BAD_REQUEST);
    }

    #[test]
    fn signature_decode_failures_map_to_unprocessable() {
        let error = AppError::Render(RenderError::Signature(
            timesheet_core::signature::SignatureError::Empty,
        ));
        let response = error.into_response();
        assert_eq!(response.status(), AxumStatusCode::UNPROCESSABLE_ENTITY);
    }
}
