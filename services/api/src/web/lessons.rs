//! services/api/src/web/lessons.rs
//!
//! Handlers for lesson CRUD, engagement (likes, favorites, comments, views),
//! and the caller's favorites listing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::policy;
use crate::web::state::AppState;
use lessonflow_core::domain::{
    AccessLevel, CallerIdentity, CommentDraft, Creator, LessonDraft, LessonUpdate,
};

/// How many lessons the most-saved shelf shows.
const MOST_SAVED_LIMIT: i64 = 6;

//=========================================================================================
// Request Payload Structs
//=========================================================================================

#[derive(Deserialize)]
pub struct CreateLessonRequest {
    pub title: String,
    pub description: String,
    #[serde(rename = "fullDescription", default)]
    pub full_description: String,
    pub category: String,
    #[serde(rename = "emotionalTone", default)]
    pub emotional_tone: String,
    #[serde(rename = "accessLevel", default = "default_access_level")]
    pub access_level: AccessLevel,
    pub creator: Creator,
}

fn default_access_level() -> AccessLevel {
    AccessLevel::Public
}

#[derive(Deserialize, ToSchema)]
pub struct CommentRequest {
    #[serde(rename = "userName", default)]
    pub user_name: String,
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RemoveFavoriteRequest {
    #[serde(rename = "lessonId")]
    pub lesson_id: String,
}

//=========================================================================================
// Listing Handlers
//=========================================================================================

/// Every lesson, for the public browse page.
#[utoipa::path(
    get,
    path = "/lessons",
    responses(
        (status = 200, description = "All lessons"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_lessons_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let lessons = app_state
        .lessons
        .list_all()
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch lessons", e))?;
    Ok(Json(lessons))
}

pub async fn featured_lessons_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let lessons = app_state
        .lessons
        .list_featured()
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch featured lessons", e))?;
    Ok(Json(lessons))
}

pub async fn most_saved_lessons_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let lessons = app_state
        .lessons
        .list_most_saved(MOST_SAVED_LIMIT)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch most saved lessons", e))?;
    Ok(Json(lessons))
}

/// The caller's own lessons, newest first.
pub async fn my_lessons_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let lessons = app_state
        .lessons
        .list_by_creator(&identity.email)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch your lessons", e))?;
    Ok(Json(lessons))
}

/// A single lesson, gated by the premium policy.
pub async fn get_lesson_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(identity): Extension<CallerIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let lesson = app_state
        .lessons
        .find(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch lesson"))?;

    let roles = app_state
        .users
        .roles_of(&identity.email)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch role", e))?;
    policy::ensure_can_view(&lesson, &roles)?;

    Ok(Json(lesson))
}

//=========================================================================================
// CRUD Handlers
//=========================================================================================

pub async fn create_lesson_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = LessonDraft {
        title: request.title,
        description: request.description,
        full_description: request.full_description,
        category: request.category,
        emotional_tone: request.emotional_tone,
        access_level: request.access_level,
        creator: request.creator,
        created_at: Utc::now(),
    };

    let lesson = app_state
        .lessons
        .insert(draft)
        .await
        .map_err(|e| ApiError::upstream("Failed to create lesson", e))?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// Applies the provided editable fields. Only the creator may edit.
pub async fn update_lesson_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(identity): Extension<CallerIdentity>,
    Json(update): Json<LessonUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let lesson = app_state
        .lessons
        .find(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch lesson"))?;
    policy::ensure_owner(&lesson, &identity)?;

    let updated = app_state
        .lessons
        .update_fields(&id, update)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to update lesson"))?;
    Ok(Json(json!({ "message": "Lesson updated", "updatedLesson": updated })))
}

pub async fn delete_lesson_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(identity): Extension<CallerIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let lesson = app_state
        .lessons
        .find(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch lesson"))?;
    policy::ensure_owner(&lesson, &identity)?;

    app_state
        .lessons
        .delete(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to delete lesson"))?;
    Ok(Json(json!({ "message": "Lesson deleted" })))
}

//=========================================================================================
// Engagement Handlers
//=========================================================================================

/// Toggles the caller's like and returns the updated lesson.
pub async fn like_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(identity): Extension<CallerIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lessons
        .toggle_like(&id, &identity.uid)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to update likes"))?;

    let lesson = app_state
        .lessons
        .find(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch lesson"))?;
    Ok(Json(lesson))
}

/// Toggles the caller's favorite and returns the updated lesson.
pub async fn favorite_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(identity): Extension<CallerIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lessons
        .toggle_favorite(&id, &identity.uid)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to update favorites"))?;

    let lesson = app_state
        .lessons
        .find(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to fetch lesson"))?;
    Ok(Json(lesson))
}

/// Appends a comment stamped server-side. The author id comes from the
/// verified identity, never from the body.
pub async fn comment_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Extension(identity): Extension<CallerIdentity>,
    Json(request): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = CommentDraft {
        user_id: identity.uid,
        user_name: request.user_name,
        text: request.text,
        created_at: Utc::now(),
    };

    let comment = app_state
        .lessons
        .push_comment(&id, draft)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to add comment"))?;
    Ok(Json(json!({ "message": "Comment added", "comment": comment })))
}

/// Open view counter; no identity involved.
#[utoipa::path(
    post,
    path = "/lessons/{id}/view",
    params(("id" = String, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "View counted"),
        (status = 404, description = "Lesson not found")
    )
)]
pub async fn view_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lessons
        .increment_views(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to increment view"))?;
    Ok(Json(json!({ "message": "View incremented" })))
}

//=========================================================================================
// Favorites Handlers
//=========================================================================================

/// Lessons whose favorites contain the caller.
pub async fn favorites_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let lessons = app_state
        .lessons
        .list_favorited_by(&identity.uid)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch favorites", e))?;
    Ok(Json(lessons))
}

/// One-directional removal, used by the favorites page. Reports whether
/// the caller was actually a member.
pub async fn remove_favorite_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(request): Json<RemoveFavoriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = app_state
        .lessons
        .remove_favorite(&request.lesson_id, &identity.uid)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to remove favorite"))?;
    Ok(Json(json!({ "success": removed })))
}
