//! crates/lessonflow_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AccessLevel, CallerIdentity, CheckoutSession, Comment, CommentDraft, ContributorStat, Lesson,
    LessonDraft, LessonFilter, LessonSummary, LessonUpdate, NewUserProfile, PaymentConfirmation,
    Report, ReportDraft, ReportedLesson, Role, RoleSet, ToggleOutcome, User, WeekActivity,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Identity
//=========================================================================================

/// Verifies a bearer credential against the external identity provider.
///
/// Read-only; must run before any authorization decision. A missing,
/// malformed or expired credential surfaces as [`PortError::Unauthorized`].
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> PortResult<CallerIdentity>;
}

//=========================================================================================
// Stores
//=========================================================================================

/// User records and the entitlement set gating all authorization.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// First sign-in inserts the record with `roles = {user}` and both
    /// timestamps; later sign-ins only refresh `last_logged_in`. Returns the
    /// stored user and whether it was created.
    async fn upsert_on_login(&self, profile: NewUserProfile) -> PortResult<(User, bool)>;

    async fn find_by_email(&self, email: &str) -> PortResult<Option<User>>;

    /// The caller's entitlements. A missing record reads as the base set.
    async fn roles_of(&self, email: &str) -> PortResult<RoleSet>;

    /// Idempotent role grant by email. Returns whether a record matched.
    async fn grant_role(&self, email: &str, role: Role) -> PortResult<bool>;

    /// Idempotent role grant by record id; `NotFound` if the id is absent.
    async fn grant_role_by_id(&self, id: &str, role: Role) -> PortResult<()>;

    async fn list_all(&self) -> PortResult<Vec<User>>;

    async fn delete(&self, id: &str) -> PortResult<()>;

    async fn count(&self) -> PortResult<u64>;
}

/// Lessons, their embedded comments, and engagement state.
#[async_trait]
pub trait LessonStore: Send + Sync {
    async fn insert(&self, draft: LessonDraft) -> PortResult<Lesson>;

    async fn find(&self, id: &str) -> PortResult<Lesson>;

    async fn list_all(&self) -> PortResult<Vec<Lesson>>;

    /// The creator's lessons, newest first.
    async fn list_by_creator(&self, email: &str) -> PortResult<Vec<Lesson>>;

    /// Lessons whose favorites set contains the given user.
    async fn list_favorited_by(&self, user_id: &str) -> PortResult<Vec<Lesson>>;

    /// Featured lessons, newest first.
    async fn list_featured(&self) -> PortResult<Vec<Lesson>>;

    /// Most-favorited lessons, highest count first.
    async fn list_most_saved(&self, limit: i64) -> PortResult<Vec<Lesson>>;

    /// Admin listing with optional category/access/flagged filters,
    /// newest first.
    async fn list_filtered(&self, filter: LessonFilter) -> PortResult<Vec<Lesson>>;

    /// Applies only the provided fields; returns the updated lesson.
    async fn update_fields(&self, id: &str, update: LessonUpdate) -> PortResult<Lesson>;

    async fn delete(&self, id: &str) -> PortResult<()>;

    /// Atomically toggles the user's like membership together with its
    /// counter. Each direction is a single conditional update, so two
    /// racing duplicates cannot drift the counter.
    async fn toggle_like(&self, id: &str, user_id: &str) -> PortResult<ToggleOutcome>;

    /// Same contract as [`Self::toggle_like`], for the favorites set.
    async fn toggle_favorite(&self, id: &str, user_id: &str) -> PortResult<ToggleOutcome>;

    /// One-directional removal from favorites. Returns whether the user was
    /// actually a member (the counter only moves when they were).
    async fn remove_favorite(&self, id: &str, user_id: &str) -> PortResult<bool>;

    /// Appends a comment; the store assigns the comment id.
    async fn push_comment(&self, id: &str, draft: CommentDraft) -> PortResult<Comment>;

    async fn increment_views(&self, id: &str) -> PortResult<()>;

    async fn set_featured(&self, id: &str, value: bool) -> PortResult<()>;

    async fn set_reviewed(&self, id: &str) -> PortResult<()>;

    async fn set_reported(&self, id: &str, value: bool) -> PortResult<()>;

    async fn count_by_creator(&self, email: &str) -> PortResult<u64>;

    async fn count_by_access(&self, level: AccessLevel) -> PortResult<u64>;

    async fn count_flagged(&self) -> PortResult<u64>;

    async fn count_favorited_by(&self, user_id: &str) -> PortResult<u64>;

    async fn count_created_since(&self, since: DateTime<Utc>) -> PortResult<u64>;

    /// Creators ranked by lesson count, descending.
    async fn top_contributors(&self, limit: i64) -> PortResult<Vec<ContributorStat>>;

    /// The creator's lessons bucketed by ISO week of creation, ascending.
    async fn weekly_activity(&self, email: &str) -> PortResult<Vec<WeekActivity>>;

    /// The creator's newest lessons, projected to summaries.
    async fn recent_by_creator(&self, email: &str, limit: i64) -> PortResult<Vec<LessonSummary>>;
}

/// Reports filed against lessons and the moderation queue over them.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Files the report as `open`. The store assigns the id.
    async fn insert(&self, draft: ReportDraft) -> PortResult<Report>;

    async fn list_for_lesson(&self, lesson_id: &str) -> PortResult<Vec<Report>>;

    /// Open reports grouped by lesson, joined with the lesson summary.
    /// Reports whose lesson no longer exists are dropped from the listing.
    async fn moderation_queue(&self) -> PortResult<Vec<ReportedLesson>>;

    /// Removes every report for the lesson; returns how many went away.
    async fn delete_for_lesson(&self, lesson_id: &str) -> PortResult<u64>;

    /// Marks every report for the lesson `ignored`; returns how many changed.
    async fn ignore_for_lesson(&self, lesson_id: &str) -> PortResult<u64>;
}

//=========================================================================================
// Payments
//=========================================================================================

/// The external checkout provider, consumed through its hosted-session API.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a one-shot checkout session for the given amount (in cents)
    /// and buyer email.
    async fn create_checkout_session(
        &self,
        amount_cents: i64,
        buyer_email: &str,
    ) -> PortResult<CheckoutSession>;

    /// Re-queries the provider for the session's settled state. The caller
    /// must trust only this answer, never a client-reported status.
    async fn retrieve_checkout_session(&self, session_id: &str) -> PortResult<PaymentConfirmation>;
}
