//! services/api/src/web/testutil.rs
//!
//! Shared fixtures for handler tests: one in-memory store wired into a
//! full `AppState`, plus seeding helpers.

use std::sync::Arc;

use chrono::Utc;
use tracing::Level;

use crate::adapters::memory::{MemoryStore, StaticTokenVerifier, StubPaymentGateway};
use crate::config::Config;
use crate::web::state::AppState;
use lessonflow_core::domain::{
    AccessLevel, CallerIdentity, Creator, Lesson, LessonDraft, NewUserProfile, Report,
    ReportDraft, Role, User,
};

pub(crate) fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().expect("test bind address"),
        mongodb_uri: "mongodb://localhost:27017".to_string(),
        database_name: "lessonsDB".to_string(),
        log_level: Level::INFO,
        stripe_secret_key: "sk_test".to_string(),
        identity_api_key: "test-key".to_string(),
        client_origin: "http://localhost:5173".to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
    }
}

/// A state whose three stores all share one `MemoryStore`.
pub(crate) fn state_with(
    verifier: StaticTokenVerifier,
    payments: Arc<StubPaymentGateway>,
) -> Arc<AppState> {
    let store = Arc::new(MemoryStore::new());
    Arc::new(AppState {
        users: store.clone(),
        lessons: store.clone(),
        reports: store,
        verifier: Arc::new(verifier),
        payments,
        config: Arc::new(test_config()),
    })
}

pub(crate) fn test_state() -> Arc<AppState> {
    state_with(StaticTokenVerifier::new(), Arc::new(StubPaymentGateway::new()))
}

/// Like [`test_state`] but keeps a handle on the stub gateway.
pub(crate) fn payment_state() -> (Arc<AppState>, Arc<StubPaymentGateway>) {
    let payments = Arc::new(StubPaymentGateway::new());
    let state = state_with(StaticTokenVerifier::new(), payments.clone());
    (state, payments)
}

pub(crate) fn identity(email: &str, uid: &str) -> CallerIdentity {
    CallerIdentity {
        email: email.to_string(),
        uid: uid.to_string(),
    }
}

pub(crate) async fn seed_user(state: &AppState, name: &str, email: &str, roles: &[Role]) -> User {
    state
        .users
        .upsert_on_login(NewUserProfile {
            name: name.to_string(),
            email: email.to_string(),
            photo_url: None,
        })
        .await
        .expect("seed user");
    for role in roles {
        state.users.grant_role(email, *role).await.expect("grant role");
    }
    state
        .users
        .find_by_email(email)
        .await
        .expect("re-read seeded user")
        .expect("seeded user exists")
}

pub(crate) async fn seed_lesson(
    state: &AppState,
    title: &str,
    creator_email: &str,
    level: AccessLevel,
) -> Lesson {
    state
        .lessons
        .insert(LessonDraft {
            title: title.to_string(),
            description: "a few words".to_string(),
            full_description: "the whole story".to_string(),
            category: "resilience".to_string(),
            emotional_tone: "hopeful".to_string(),
            access_level: level,
            creator: Creator {
                name: "Author".to_string(),
                email: creator_email.to_string(),
                photo_url: None,
            },
            created_at: Utc::now(),
        })
        .await
        .expect("seed lesson")
}

pub(crate) async fn seed_report(state: &AppState, lesson_id: &str, reporter_uid: &str) -> Report {
    state
        .reports
        .insert(ReportDraft {
            lesson_id: lesson_id.to_string(),
            reporter_user_id: reporter_uid.to_string(),
            reporter_email: None,
            reason: "inappropriate".to_string(),
            created_at: Utc::now(),
        })
        .await
        .expect("seed report")
}
