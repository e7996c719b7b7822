//! services/api/src/web/middleware.rs
//!
//! Authentication and authorization middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::error::ApiError;
use crate::web::state::AppState;
use lessonflow_core::domain::CallerIdentity;
use lessonflow_core::ports::{PortError, UserStore};

/// Middleware that validates the bearer token and extracts the caller identity.
///
/// If valid, inserts the [`CallerIdentity`] into request extensions for
/// handlers to use. If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the bearer token from the Authorization header
    let token = bearer_token(req.headers()).ok_or(ApiError::Unauthenticated)?;

    // 2. Verify it against the identity provider
    let identity = state.verifier.verify(token).await.map_err(|e| match e {
        PortError::Unauthorized => ApiError::Unauthenticated,
        other => {
            error!("Failed to verify token: {:?}", other);
            ApiError::Unauthenticated
        }
    })?;

    // 3. Insert the identity into request extensions
    req.extensions_mut().insert(identity);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

/// Middleware that requires an admin role on top of `require_auth`.
///
/// Layered inside `require_auth`, so the identity extension is already
/// present; its absence means the route was wired without authentication.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = req
        .extensions()
        .get::<CallerIdentity>()
        .cloned()
        .ok_or(ApiError::Unauthenticated)?;

    ensure_admin(state.users.as_ref(), &identity.email).await?;

    Ok(next.run(req).await)
}

/// The role check behind [`require_admin`]. A store failure surfaces as
/// an upstream error; only a loaded role set lacking `admin` is a refusal.
async fn ensure_admin(users: &dyn UserStore, email: &str) -> Result<(), ApiError> {
    let roles = users
        .roles_of(email)
        .await
        .map_err(|e| ApiError::upstream("Failed to load roles", e))?;
    if roles.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use async_trait::async_trait;
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::IntoResponse;
    use lessonflow_core::domain::{NewUserProfile, Role, RoleSet, User};
    use lessonflow_core::ports::PortResult;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers_with("Bearer abc123")), Some("abc123"));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers_with("Basic abc123")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("bearer abc123")), None);
    }

    #[tokio::test]
    async fn admin_gate_follows_the_stored_roles() {
        let store = MemoryStore::new();
        store
            .upsert_on_login(NewUserProfile {
                name: "Ada".to_string(),
                email: "a@x.com".to_string(),
                photo_url: None,
            })
            .await
            .unwrap();
        store.grant_role("a@x.com", Role::Admin).await.unwrap();

        assert!(ensure_admin(&store, "a@x.com").await.is_ok());

        // Unknown callers read as plain users.
        let refused = ensure_admin(&store, "b@x.com").await;
        assert!(matches!(refused, Err(ApiError::Forbidden)));
    }

    #[tokio::test]
    async fn role_lookup_failure_is_a_server_error() {
        let err = ensure_admin(&DownUserStore, "a@x.com").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    /// A store whose backing database is unreachable.
    struct DownUserStore;

    fn down() -> PortError {
        PortError::Unexpected("connection reset by peer".to_string())
    }

    #[async_trait]
    impl UserStore for DownUserStore {
        async fn upsert_on_login(&self, _profile: NewUserProfile) -> PortResult<(User, bool)> {
            Err(down())
        }

        async fn find_by_email(&self, _email: &str) -> PortResult<Option<User>> {
            Err(down())
        }

        async fn roles_of(&self, _email: &str) -> PortResult<RoleSet> {
            Err(down())
        }

        async fn grant_role(&self, _email: &str, _role: Role) -> PortResult<bool> {
            Err(down())
        }

        async fn grant_role_by_id(&self, _id: &str, _role: Role) -> PortResult<()> {
            Err(down())
        }

        async fn list_all(&self) -> PortResult<Vec<User>> {
            Err(down())
        }

        async fn delete(&self, _id: &str) -> PortResult<()> {
            Err(down())
        }

        async fn count(&self) -> PortResult<u64> {
            Err(down())
        }
    }
}
