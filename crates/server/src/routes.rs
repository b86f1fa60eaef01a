use crate::errors::ApiError;
use crate::models::{ChatRequest, ChatResponse, ReportResponse, SessionSnapshot};
use crate::service::ComplianceService;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use extraction::IndustrialApplication;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

type AppState = Arc<ComplianceService>;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn create_app(service: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate_report", post(generate_report))
        .route("/chat", post(chat))
        .route("/analysis", post(start_analysis))
        .route("/analysis/:id", get(get_session).delete(delete_session))
        .route("/analysis/:id/document", post(upload_document))
        .route("/analysis/:id/restart", post(restart_session))
        .route("/analysis/:id/proof", post(submit_proof))
        .route("/analysis/:id/skip", post(skip_step))
        .route("/analysis/:id/report", post(session_report))
        .route("/analysis/:id/export", get(export_record))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn generate_report(
    State(service): State<AppState>,
    Json(app): Json<IndustrialApplication>,
) -> Result<Json<ReportResponse>, ApiError> {
    let compliance_report = service.generate_report(&app).await?;
    Ok(Json(ReportResponse { compliance_report }))
}

async fn chat(
    State(service): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = service.chat(request.messages).await?;
    Ok(Json(ChatResponse { message }))
}

/// First `file` part of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(ApiError::InvalidRequest(
        "Missing multipart field 'file'".to_string(),
    ))
}

async fn start_analysis(
    State(service): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SessionSnapshot>), ApiError> {
    let (file_name, bytes) = read_upload(multipart).await?;
    let session = service.start_analysis(&file_name, &bytes).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

async fn get_session(
    State(service): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(service.session(id).await?.into()))
}

async fn upload_document(
    State(service): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let (file_name, bytes) = read_upload(multipart).await?;
    let session = service.upload_document(id, &file_name, &bytes).await?;
    Ok(Json(session.into()))
}

async fn restart_session(
    State(service): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(service.restart_session(id).await?.into()))
}

async fn submit_proof(
    State(service): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let (file_name, bytes) = read_upload(multipart).await?;
    let session = service.submit_proof(id, &file_name, &bytes).await?;
    Ok(Json(session.into()))
}

async fn skip_step(
    State(service): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(service.skip_step(id).await?.into()))
}

async fn session_report(
    State(service): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(service.session_report(id).await?.into()))
}

async fn export_record(
    State(service): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let record = service.export_record(id).await?;
    let body = serde_json::to_string_pretty(&record).map_err(anyhow::Error::from)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"compliance_report.json\"",
            ),
        ],
        body,
    )
        .into_response())
}

async fn delete_session(
    State(service): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    service.delete_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
