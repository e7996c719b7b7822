//! services/api/src/web/reports.rs
//!
//! Handlers for filing reports and working the moderation queue.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::AppState;
use lessonflow_core::domain::ReportDraft;
use lessonflow_core::ports::PortError;

#[derive(Deserialize, ToSchema)]
pub struct FileReportRequest {
    #[serde(rename = "lessonId")]
    pub lesson_id: String,
    #[serde(rename = "reporterUserId", default)]
    pub reporter_user_id: String,
    #[serde(rename = "reporterEmail", default)]
    pub reporter_email: Option<String>,
    pub reason: String,
}

/// Files a report and flags the lesson. Open to unauthenticated callers.
pub async fn file_report_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<FileReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = ReportDraft {
        lesson_id: request.lesson_id.clone(),
        reporter_user_id: request.reporter_user_id,
        reporter_email: request.reporter_email,
        reason: request.reason,
        created_at: Utc::now(),
    };

    let report = app_state
        .reports
        .insert(draft)
        .await
        .map_err(|e| ApiError::upstream("Failed to submit report", e))?;

    // The report stands even when the lesson vanished meanwhile; the
    // moderation queue joins against existing lessons and hides it.
    match app_state.lessons.set_reported(&request.lesson_id, true).await {
        Ok(()) | Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(ApiError::upstream("Failed to submit report", e)),
    }

    Ok(Json(json!({ "message": "Report submitted", "report": report })))
}

/// The moderation queue: open reports grouped per lesson.
pub async fn moderation_queue_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let queue = app_state
        .reports
        .moderation_queue()
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch reported lessons", e))?;
    Ok(Json(queue))
}

/// Every report filed against one lesson.
pub async fn lesson_reports_handler(
    State(app_state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let reports = app_state
        .reports
        .list_for_lesson(&lesson_id)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch reports", e))?;
    Ok(Json(reports))
}

/// Upholds the reports: removes the lesson, then all reports against it.
/// Lesson first, so an interleaved queue read never shows a row whose
/// lesson is already gone.
pub async fn delete_reported_lesson_handler(
    State(app_state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match app_state.lessons.delete(&lesson_id).await {
        // Already gone still means the reports need sweeping.
        Ok(()) | Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(ApiError::upstream("Failed to delete lesson", e)),
    }

    app_state
        .reports
        .delete_for_lesson(&lesson_id)
        .await
        .map_err(|e| ApiError::upstream("Failed to delete reports", e))?;

    Ok(Json(json!({ "success": true })))
}

/// Dismisses the reports: marks them ignored and clears the lesson flag.
pub async fn ignore_reports_handler(
    State(app_state): State<Arc<AppState>>,
    Path(lesson_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .reports
        .ignore_for_lesson(&lesson_id)
        .await
        .map_err(|e| ApiError::upstream("Failed to ignore reports", e))?;

    match app_state.lessons.set_reported(&lesson_id, false).await {
        Ok(()) | Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(ApiError::upstream("Failed to ignore reports", e)),
    }

    Ok(Json(json!({ "success": true })))
}
