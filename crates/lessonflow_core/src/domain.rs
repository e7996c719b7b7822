//! crates/lessonflow_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or HTTP framework; field
//! names serialize in the camelCase form the clients consume.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

//=========================================================================================
// Roles and Entitlements
//=========================================================================================

/// An accessor role. Roles are additive: `premium` and `admin` layer on top
/// of the base `user` role, never replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Premium,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Premium => "premium",
            Role::Admin => "admin",
        }
    }

    /// Parses a stored role tag. Unknown tags yield `None` and are dropped
    /// during normalization rather than failing the whole record.
    pub fn parse(tag: &str) -> Option<Role> {
        match tag {
            "user" => Some(Role::User),
            "premium" => Some(Role::Premium),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of roles attached to a user record.
///
/// Invariants: never empty, always contains [`Role::User`]. Construction and
/// deserialization both normalize towards that, so a record written by an
/// older deployment (a bare `"admin"` string instead of an array) still
/// loads as a well-formed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// The role set every user starts with: `{user}`.
    pub fn base() -> Self {
        let mut set = BTreeSet::new();
        set.insert(Role::User);
        RoleSet(set)
    }

    pub fn from_roles<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        let mut set: BTreeSet<Role> = roles.into_iter().collect();
        set.insert(Role::User);
        RoleSet(set)
    }

    /// Idempotent grant: adding a role the set already holds is a no-op.
    /// Returns whether the set changed.
    pub fn grant(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.contains(Role::Admin)
    }

    /// Premium-gated content is visible to premium members and admins.
    pub fn can_view_premium(&self) -> bool {
        self.contains(Role::Premium) || self.contains(Role::Admin)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        RoleSet::base()
    }
}

impl Serialize for RoleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(Role::as_str))
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Legacy records stored the role as a bare string; current ones as
        // an array of tags. Accept both and normalize.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Encoded {
            One(String),
            Many(Vec<String>),
        }

        let tags = match Encoded::deserialize(deserializer)? {
            Encoded::One(tag) => vec![tag],
            Encoded::Many(tags) => tags,
        };

        Ok(RoleSet::from_roles(
            tags.iter().filter_map(|t| Role::parse(t)),
        ))
    }
}

//=========================================================================================
// Users
//=========================================================================================

/// A registered user. Created on first sign-in; the role set is the source
/// of truth for every authorization decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(rename = "role")]
    pub roles: RoleSet,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "lastLoggedIn")]
    pub last_logged_in: DateTime<Utc>,
}

/// The profile a client reports on sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct NewUserProfile {
    pub name: String,
    pub email: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// The verified identity of a caller, produced by the token verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub email: String,
    pub uid: String,
}

//=========================================================================================
// Lessons
//=========================================================================================

/// Who may read a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    Premium,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Premium => "premium",
        }
    }
}

/// Denormalized author info embedded in each lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creator {
    pub name: String,
    pub email: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

/// A single comment, embedded in its parent lesson. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A user-posted life lesson with its engagement state.
///
/// Invariant: `likes_count == likes.len()` and
/// `favorites_count == favorites.len()` after any sequence of sequential
/// toggles; the store maintains both sides in a single atomic update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "fullDescription")]
    pub full_description: String,
    pub category: String,
    #[serde(rename = "emotionalTone")]
    pub emotional_tone: String,
    #[serde(rename = "accessLevel")]
    pub access_level: AccessLevel,
    pub creator: Creator,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub likes: Vec<String>,
    #[serde(rename = "likesCount")]
    pub likes_count: i64,
    pub favorites: Vec<String>,
    #[serde(rename = "favoritesCount")]
    pub favorites_count: i64,
    #[serde(rename = "viewsCount")]
    pub views_count: i64,
    pub comments: Vec<Comment>,
    #[serde(rename = "isFeatured")]
    pub is_featured: bool,
    #[serde(rename = "isReviewed")]
    pub is_reviewed: bool,
    #[serde(rename = "isReported")]
    pub is_reported: bool,
}

/// The content fields of a lesson about to be inserted. The store assigns
/// the id; engagement state starts zeroed.
#[derive(Debug, Clone)]
pub struct LessonDraft {
    pub title: String,
    pub description: String,
    pub full_description: String,
    pub category: String,
    pub emotional_tone: String,
    pub access_level: AccessLevel,
    pub creator: Creator,
    pub created_at: DateTime<Utc>,
}

impl LessonDraft {
    /// Materializes the draft into a full lesson under the given id.
    pub fn into_lesson(self, id: String) -> Lesson {
        Lesson {
            id,
            title: self.title,
            description: self.description,
            full_description: self.full_description,
            category: self.category,
            emotional_tone: self.emotional_tone,
            access_level: self.access_level,
            creator: self.creator,
            created_at: self.created_at,
            likes: Vec::new(),
            likes_count: 0,
            favorites: Vec::new(),
            favorites_count: 0,
            views_count: 0,
            comments: Vec::new(),
            is_featured: false,
            is_reviewed: false,
            is_reported: false,
        }
    }
}

/// Editable lesson fields; only the provided ones are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LessonUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "fullDescription")]
    pub full_description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "emotionalTone")]
    pub emotional_tone: Option<String>,
    #[serde(rename = "accessLevel")]
    pub access_level: Option<AccessLevel>,
}

/// Admin listing filter.
#[derive(Debug, Clone, Default)]
pub struct LessonFilter {
    pub category: Option<String>,
    pub access_level: Option<AccessLevel>,
    pub flagged_only: bool,
}

/// A comment not yet stored; the store assigns its id.
#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a membership toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

//=========================================================================================
// Reports and Moderation
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Open,
    Ignored,
}

/// A report filed against a lesson. Resolved only by admin action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "lessonId")]
    pub lesson_id: String,
    #[serde(rename = "reporterUserId")]
    pub reporter_user_id: String,
    #[serde(rename = "reporterEmail")]
    pub reporter_email: Option<String>,
    pub reason: String,
    pub status: ReportStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A report about to be filed; the store assigns the id and opens it.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub lesson_id: String,
    pub reporter_user_id: String,
    pub reporter_email: Option<String>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Condensed lesson fields shown in the moderation queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonBrief {
    pub title: String,
    pub category: String,
    #[serde(rename = "accessLevel")]
    pub access_level: AccessLevel,
    pub creator: Creator,
}

/// One row of the moderation queue: a lesson with open reports against it.
#[derive(Debug, Clone, Serialize)]
pub struct ReportedLesson {
    #[serde(rename = "lessonId")]
    pub lesson_id: String,
    #[serde(rename = "reportCount")]
    pub report_count: i64,
    pub lesson: LessonBrief,
}

//=========================================================================================
// Aggregate Stats
//=========================================================================================

/// Read-time lesson counts shown on the admin management page.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LessonStats {
    pub public: u64,
    pub premium: u64,
    pub flagged: u64,
}

/// One creator's lesson count, for the admin summary.
#[derive(Debug, Clone, Serialize)]
pub struct ContributorStat {
    pub email: String,
    pub count: i64,
}

/// A top contributor joined with their user profile.
#[derive(Debug, Clone, Serialize)]
pub struct TopContributor {
    pub email: String,
    pub name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(rename = "totalLessons")]
    pub total_lessons: i64,
}

/// Lessons created in one ISO week, e.g. `{week: "2025-W33", count: 4}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WeekActivity {
    pub week: String,
    pub count: i64,
}

/// Projected lesson fields for the user dashboard's recent list.
#[derive(Debug, Clone, Serialize)]
pub struct LessonSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(rename = "accessLevel")]
    pub access_level: AccessLevel,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Payments
//=========================================================================================

/// A checkout session freshly created at the payment provider.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// What the provider reports when a session is re-queried server-side.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub payment_status: PaymentStatus,
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_set_always_contains_user() {
        assert!(RoleSet::base().contains(Role::User));
        assert!(RoleSet::from_roles([Role::Admin]).contains(Role::User));
        assert!(!RoleSet::base().is_empty());
    }

    #[test]
    fn grant_is_idempotent() {
        let mut roles = RoleSet::base();
        assert!(roles.grant(Role::Premium));
        let snapshot = roles.clone();
        assert!(!roles.grant(Role::Premium));
        assert_eq!(roles, snapshot);
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn premium_visibility_by_role() {
        assert!(!RoleSet::base().can_view_premium());
        assert!(RoleSet::from_roles([Role::Premium]).can_view_premium());
        assert!(RoleSet::from_roles([Role::Admin]).can_view_premium());
    }

    #[test]
    fn deserializes_array_and_legacy_scalar() {
        let many: RoleSet = serde_json::from_str(r#"["user", "premium"]"#).unwrap();
        assert!(many.contains(Role::Premium));

        let legacy: RoleSet = serde_json::from_str(r#""admin""#).unwrap();
        assert!(legacy.is_admin());
        assert!(legacy.contains(Role::User));
    }

    #[test]
    fn unknown_role_tags_are_dropped() {
        let roles: RoleSet = serde_json::from_str(r#"["user", "superuser"]"#).unwrap();
        assert_eq!(roles.len(), 1);
        assert!(roles.contains(Role::User));
    }

    #[test]
    fn serializes_as_lowercase_array() {
        let roles = RoleSet::from_roles([Role::Admin, Role::Premium]);
        let json = serde_json::to_string(&roles).unwrap();
        assert_eq!(json, r#"["user","premium","admin"]"#);
    }

    #[test]
    fn lesson_json_uses_client_field_names() {
        let lesson = LessonDraft {
            title: "t".into(),
            description: "d".into(),
            full_description: "fd".into(),
            category: "c".into(),
            emotional_tone: "hopeful".into(),
            access_level: AccessLevel::Premium,
            creator: Creator {
                name: "a".into(),
                email: "a@x.com".into(),
                photo_url: None,
            },
            created_at: Utc::now(),
        }
        .into_lesson("65f0".into());

        let json = serde_json::to_value(&lesson).unwrap();
        assert_eq!(json["_id"], "65f0");
        assert_eq!(json["accessLevel"], "premium");
        assert_eq!(json["likesCount"], 0);
        assert_eq!(json["isReported"], false);
    }

    #[test]
    fn draft_materializes_with_zeroed_engagement() {
        let draft = LessonDraft {
            title: "t".into(),
            description: "d".into(),
            full_description: "fd".into(),
            category: "c".into(),
            emotional_tone: "hopeful".into(),
            access_level: AccessLevel::Public,
            creator: Creator {
                name: "a".into(),
                email: "a@x.com".into(),
                photo_url: None,
            },
            created_at: Utc::now(),
        };
        let lesson = draft.into_lesson("abc".into());
        assert_eq!(lesson.likes_count, 0);
        assert!(lesson.likes.is_empty());
        assert!(!lesson.is_reported);
    }
}

