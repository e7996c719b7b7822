//! services/api/src/web/users.rs
//!
//! Handlers for user records, role reads, and user administration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::state::AppState;
use lessonflow_core::domain::{CallerIdentity, NewUserProfile, Role, RoleSet, TopContributor};

/// One row of the admin user-management table.
#[derive(Serialize)]
pub struct ManagedUser {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    email: String,
    #[serde(rename = "photoURL")]
    photo_url: Option<String>,
    #[serde(rename = "role")]
    roles: RoleSet,
    #[serde(rename = "totalLessons")]
    total_lessons: u64,
}

/// Create-or-refresh the signed-in user's record.
///
/// First sign-in stores the profile with the base role set and both
/// timestamps; later sign-ins only refresh the login timestamp.
#[utoipa::path(
    post,
    path = "/user",
    responses(
        (status = 201, description = "User created"),
        (status = 200, description = "Existing user refreshed"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upsert_user_handler(
    State(app_state): State<Arc<AppState>>,
    Json(profile): Json<NewUserProfile>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, created) = app_state
        .users
        .upsert_on_login(profile)
        .await
        .map_err(|e| ApiError::upstream("Failed to save user", e))?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(user)))
}

/// The caller's role list, e.g. `{"role": ["user", "premium"]}`.
/// A user without a stored record reads as the base set.
pub async fn my_role_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .users
        .roles_of(&identity.email)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch role", e))?;
    Ok(Json(json!({ "role": roles })))
}

/// All users with their lesson totals, for the admin management table.
pub async fn list_users_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .users
        .list_all()
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch users", e))?;

    let mut rows = Vec::with_capacity(users.len());
    for user in users {
        let total_lessons = app_state
            .lessons
            .count_by_creator(&user.email)
            .await
            .map_err(|e| ApiError::upstream("Failed to count lessons", e))?;
        rows.push(ManagedUser {
            id: user.id,
            name: user.name,
            email: user.email,
            photo_url: user.photo_url,
            roles: user.roles,
            total_lessons,
        });
    }
    Ok(Json(rows))
}

/// Idempotent promotion to admin.
pub async fn promote_user_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .users
        .grant_role_by_id(&id, Role::Admin)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to promote user"))?;
    Ok(Json(json!({ "message": "User promoted to admin" })))
}

pub async fn delete_user_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .users
        .delete(&id)
        .await
        .map_err(|e| ApiError::from_store(e, "Failed to delete user"))?;
    Ok(Json(json!({ "message": "User deleted" })))
}

/// The top five creators by lesson count, joined with their profiles.
pub async fn top_contributors_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let contributors = join_top_contributors(&app_state, 5).await?;
    Ok(Json(contributors))
}

/// Ranks creators by lesson count and joins each with their user record.
/// Creators without a record are dropped, matching a database join.
pub(crate) async fn join_top_contributors(
    app_state: &AppState,
    limit: i64,
) -> Result<Vec<TopContributor>, ApiError> {
    let stats = app_state
        .lessons
        .top_contributors(limit)
        .await
        .map_err(|e| ApiError::upstream("Failed to rank contributors", e))?;

    let mut contributors = Vec::with_capacity(stats.len());
    for stat in stats {
        let user = app_state
            .users
            .find_by_email(&stat.email)
            .await
            .map_err(|e| ApiError::upstream("Failed to fetch contributor", e))?;
        if let Some(user) = user {
            contributors.push(TopContributor {
                email: user.email,
                name: user.name,
                photo_url: user.photo_url,
                total_lessons: stat.count,
            });
        }
    }
    Ok(contributors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testutil::{seed_lesson, seed_user, test_state};
    use lessonflow_core::domain::AccessLevel;

    #[tokio::test]
    async fn upsert_returns_created_then_ok() {
        let state = test_state();
        let profile = NewUserProfile {
            name: "Ada".to_string(),
            email: "ada@x.com".to_string(),
            photo_url: None,
        };

        let first = upsert_user_handler(State(state.clone()), Json(profile.clone()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = upsert_user_handler(State(state), Json(profile))
            .await
            .unwrap()
            .into_response();
        assert_eq!(second.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn promote_then_delete_round_trips() {
        let state = test_state();
        let user = seed_user(&state, "Ada", "ada@x.com", &[]).await;

        promote_user_handler(State(state.clone()), Path(user.id.clone()))
            .await
            .unwrap();
        let roles = state.users.roles_of("ada@x.com").await.unwrap();
        assert!(roles.is_admin());

        delete_user_handler(State(state.clone()), Path(user.id.clone()))
            .await
            .unwrap();
        assert!(state.users.find_by_email("ada@x.com").await.unwrap().is_none());

        let missing = promote_user_handler(State(state), Path(user.id)).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn contributors_without_profiles_are_dropped() {
        let state = test_state();
        seed_user(&state, "Ada", "ada@x.com", &[]).await;
        for _ in 0..2 {
            seed_lesson(&state, "t", "ada@x.com", AccessLevel::Public).await;
        }
        seed_lesson(&state, "t", "ghost@x.com", AccessLevel::Public).await;

        let contributors = join_top_contributors(&state, 5).await.unwrap();
        assert_eq!(contributors.len(), 1);
        assert_eq!(contributors[0].email, "ada@x.com");
        assert_eq!(contributors[0].total_lessons, 2);
    }
}
