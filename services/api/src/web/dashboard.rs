//! services/api/src/web/dashboard.rs
//!
//! Aggregate numbers for the two dashboard landing pages. Everything here
//! is computed at read time from the stores; nothing is materialized.

use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json};
use chrono::{NaiveTime, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::web::state::AppState;
use lessonflow_core::domain::{
    AccessLevel, CallerIdentity, ContributorStat, LessonSummary, WeekActivity,
};

/// The admin landing numbers. Contributors stay as raw email/count pairs
/// here; the public top-contributors endpoint is the one that joins
/// profiles.
#[derive(Serialize)]
pub struct AdminSummary {
    #[serde(rename = "totalUsers")]
    total_users: u64,
    #[serde(rename = "totalPublicLessons")]
    total_public_lessons: u64,
    #[serde(rename = "reportedLessons")]
    reported_lessons: u64,
    #[serde(rename = "topContributors")]
    top_contributors: Vec<ContributorStat>,
    #[serde(rename = "todaysLessons")]
    todays_lessons: u64,
}

/// The signed-in user's own numbers.
#[derive(Serialize)]
pub struct UserSummary {
    #[serde(rename = "totalLessons")]
    total_lessons: u64,
    #[serde(rename = "totalFavorites")]
    total_favorites: u64,
    #[serde(rename = "recentLessons")]
    recent_lessons: Vec<LessonSummary>,
    #[serde(rename = "weeklyActivity")]
    weekly_activity: Vec<WeekActivity>,
}

pub async fn admin_summary_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<AdminSummary>, ApiError> {
    let total_users = app_state
        .users
        .count()
        .await
        .map_err(|e| ApiError::upstream("Failed to count users", e))?;
    let total_public_lessons = app_state
        .lessons
        .count_by_access(AccessLevel::Public)
        .await
        .map_err(|e| ApiError::upstream("Failed to count lessons", e))?;
    let reported_lessons = app_state
        .lessons
        .count_flagged()
        .await
        .map_err(|e| ApiError::upstream("Failed to count reported lessons", e))?;
    let top_contributors = app_state
        .lessons
        .top_contributors(5)
        .await
        .map_err(|e| ApiError::upstream("Failed to rank contributors", e))?;

    // "Today" starts at UTC midnight.
    let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    let todays_lessons = app_state
        .lessons
        .count_created_since(midnight)
        .await
        .map_err(|e| ApiError::upstream("Failed to count today's lessons", e))?;

    Ok(Json(AdminSummary {
        total_users,
        total_public_lessons,
        reported_lessons,
        top_contributors,
        todays_lessons,
    }))
}

pub async fn user_summary_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> Result<Json<UserSummary>, ApiError> {
    let total_lessons = app_state
        .lessons
        .count_by_creator(&identity.email)
        .await
        .map_err(|e| ApiError::upstream("Failed to count lessons", e))?;
    let total_favorites = app_state
        .lessons
        .count_favorited_by(&identity.uid)
        .await
        .map_err(|e| ApiError::upstream("Failed to count favorites", e))?;
    let recent_lessons = app_state
        .lessons
        .recent_by_creator(&identity.email, 5)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch recent lessons", e))?;
    let weekly_activity = app_state
        .lessons
        .weekly_activity(&identity.email)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch weekly activity", e))?;

    Ok(Json(UserSummary {
        total_lessons,
        total_favorites,
        recent_lessons,
        weekly_activity,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testutil::{identity, seed_lesson, seed_user, test_state};
    use lessonflow_core::domain::Role;

    #[tokio::test]
    async fn admin_summary_counts_every_dimension() {
        let state = test_state();
        seed_user(&state, "Ada", "a@x.com", &[]).await;
        seed_user(&state, "Ben", "b@x.com", &[Role::Admin]).await;
        let flagged = seed_lesson(&state, "one", "a@x.com", AccessLevel::Public).await;
        seed_lesson(&state, "two", "a@x.com", AccessLevel::Public).await;
        seed_lesson(&state, "three", "b@x.com", AccessLevel::Premium).await;
        state.lessons.set_reported(&flagged.id, true).await.unwrap();

        let Json(summary) = admin_summary_handler(State(state)).await.unwrap();
        assert_eq!(summary.total_users, 2);
        assert_eq!(summary.total_public_lessons, 2);
        assert_eq!(summary.reported_lessons, 1);
        assert_eq!(summary.todays_lessons, 3);
        assert_eq!(summary.top_contributors.len(), 2);
        assert_eq!(summary.top_contributors[0].email, "a@x.com");
        assert_eq!(summary.top_contributors[0].count, 2);
    }

    #[tokio::test]
    async fn user_summary_is_scoped_to_the_caller() {
        let state = test_state();
        seed_user(&state, "Ada", "a@x.com", &[]).await;
        let mine = seed_lesson(&state, "mine", "a@x.com", AccessLevel::Public).await;
        seed_lesson(&state, "also mine", "a@x.com", AccessLevel::Public).await;
        let theirs = seed_lesson(&state, "theirs", "b@x.com", AccessLevel::Public).await;

        // The caller favorites someone else's lesson; it counts toward
        // favorites but never toward authored totals.
        state.lessons.toggle_favorite(&theirs.id, "u-a").await.unwrap();

        let Json(summary) = user_summary_handler(
            State(state),
            Extension(identity("a@x.com", "u-a")),
        )
        .await
        .unwrap();

        assert_eq!(summary.total_lessons, 2);
        assert_eq!(summary.total_favorites, 1);
        assert_eq!(summary.recent_lessons.len(), 2);
        assert!(summary.recent_lessons.iter().any(|l| l.id == mine.id));
        assert_eq!(summary.weekly_activity.len(), 1);
        assert_eq!(summary.weekly_activity[0].count, 2);
    }
}
