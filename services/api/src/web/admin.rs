//! services/api/src/web/admin.rs
//!
//! Handlers for the admin lesson-management page: filtered listing with
//! stats, curation flags, and moderation deletes.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::AppState;
use lessonflow_core::domain::{AccessLevel, LessonFilter, LessonStats};

#[derive(Debug, Default, Deserialize)]
pub struct ManageLessonsQuery {
    pub category: Option<String>,
    #[serde(rename = "accessLevel")]
    pub access_level: Option<AccessLevel>,
    pub flagged: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct FeatureRequest {
    #[serde(rename = "isFeatured")]
    pub is_featured: bool,
}

/// Filtered listing plus read-time stats for the management page.
pub async fn manage_lessons_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ManageLessonsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = LessonFilter {
        category: query.category.filter(|c| !c.is_empty() && c != "all"),
        access_level: query.access_level,
        flagged_only: query.flagged.unwrap_or(false),
    };

    let lessons = app_state
        .lessons
        .list_filtered(filter)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch lessons", e))?;

    let public = app_state
        .lessons
        .count_by_access(AccessLevel::Public)
        .await
        .map_err(|e| ApiError::upstream("Failed to count lessons", e))?;
    let premium = app_state
        .lessons
        .count_by_access(AccessLevel::Premium)
        .await
        .map_err(|e| ApiError::upstream("Failed to count lessons", e))?;
    let flagged = app_state
        .lessons
        .count_flagged()
        .await
        .map_err(|e| ApiError::upstream("Failed to count lessons", e))?;

    Ok(Json(json!({
        "lessons": lessons,
        "stats": LessonStats { public, premium, flagged },
    })))
}

pub async fn set_featured_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<FeatureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lessons
        .set_featured(&id, request.is_featured)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to update featured flag"))?;
    Ok(Json(json!({ "message": "Featured status updated" })))
}

pub async fn set_reviewed_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lessons
        .set_reviewed(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to mark lesson reviewed"))?;
    Ok(Json(json!({ "message": "Lesson marked as reviewed" })))
}

/// Admin delete. Unlike the owner path there is no ownership check, and
/// any reports against the lesson are swept with it.
pub async fn admin_delete_lesson_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lessons
        .delete(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to delete lesson"))?;

    app_state
        .reports
        .delete_for_lesson(&id)
        .await
        .map_err(|e| ApiError::upstream("Failed to delete reports", e))?;

    Ok(Json(json!({ "message": "Lesson deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testutil::{seed_lesson, seed_report, test_state};

    #[tokio::test]
    async fn filters_compose_and_stats_count_everything() {
        let state = test_state();
        let flagged =
            seed_lesson(&state, "flagged", "a@x.com", AccessLevel::Public).await;
        seed_lesson(&state, "premium", "a@x.com", AccessLevel::Premium).await;
        seed_lesson(&state, "plain", "b@x.com", AccessLevel::Public).await;
        state.lessons.set_reported(&flagged.id, true).await.unwrap();

        let response = manage_lessons_handler(
            State(state.clone()),
            Query(ManageLessonsQuery {
                flagged: Some(true),
                ..ManageLessonsQuery::default()
            }),
        )
        .await;
        assert!(response.is_ok());

        // Stats are unconditional counts, independent of the filter.
        assert_eq!(
            state.lessons.count_by_access(AccessLevel::Public).await.unwrap(),
            2
        );
        assert_eq!(
            state.lessons.count_by_access(AccessLevel::Premium).await.unwrap(),
            1
        );
        assert_eq!(state.lessons.count_flagged().await.unwrap(), 1);

        let only_flagged = state
            .lessons
            .list_filtered(LessonFilter {
                flagged_only: true,
                ..LessonFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(only_flagged.len(), 1);
        assert_eq!(only_flagged[0].id, flagged.id);
    }

    #[tokio::test]
    async fn curation_flags_are_settable_both_ways() {
        let state = test_state();
        let lesson = seed_lesson(&state, "t", "a@x.com", AccessLevel::Public).await;

        set_featured_handler(
            State(state.clone()),
            Path(lesson.id.clone()),
            Json(FeatureRequest { is_featured: true }),
        )
        .await
        .unwrap();
        assert!(state.lessons.find(&lesson.id).await.unwrap().is_featured);

        set_featured_handler(
            State(state.clone()),
            Path(lesson.id.clone()),
            Json(FeatureRequest { is_featured: false }),
        )
        .await
        .unwrap();
        assert!(!state.lessons.find(&lesson.id).await.unwrap().is_featured);

        set_reviewed_handler(State(state.clone()), Path(lesson.id.clone()))
            .await
            .unwrap();
        assert!(state.lessons.find(&lesson.id).await.unwrap().is_reviewed);
    }

    #[tokio::test]
    async fn admin_delete_sweeps_reports_and_404s_on_missing() {
        let state = test_state();
        let lesson = seed_lesson(&state, "t", "a@x.com", AccessLevel::Public).await;
        seed_report(&state, &lesson.id, "u-1").await;

        admin_delete_lesson_handler(State(state.clone()), Path(lesson.id.clone()))
            .await
            .unwrap();
        assert!(state.lessons.find(&lesson.id).await.is_err());
        assert!(state.reports.list_for_lesson(&lesson.id).await.unwrap().is_empty());

        let missing =
            admin_delete_lesson_handler(State(state), Path(lesson.id)).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }
}
