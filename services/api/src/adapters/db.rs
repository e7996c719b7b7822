//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapters, which are the concrete
//! implementations of the store ports from the `core` crate. They handle all
//! interactions with MongoDB using the official `mongodb` driver.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};

use lessonflow_core::domain::{
    AccessLevel, Comment, CommentDraft, ContributorStat, Creator, Lesson, LessonBrief,
    LessonDraft, LessonFilter, LessonSummary, LessonUpdate, NewUserProfile, Report, ReportDraft,
    ReportStatus, ReportedLesson, Role, RoleSet, ToggleOutcome, User, WeekActivity,
};
use lessonflow_core::ports::{LessonStore, PortError, PortResult, ReportStore, UserStore};

const USERS_COLLECTION: &str = "users";
const LESSONS_COLLECTION: &str = "lessons";
const REPORTS_COLLECTION: &str = "reports";

/// Creates the indexes the adapters rely on. Run once at startup.
pub async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    db.run_command(
        doc! {
            "createIndexes": USERS_COLLECTION,
            "indexes": [
                { "name": "unique_email", "key": { "email": 1 }, "unique": true },
            ],
        },
        None,
    )
    .await?;

    db.run_command(
        doc! {
            "createIndexes": REPORTS_COLLECTION,
            "indexes": [
                { "name": "lesson_status", "key": { "lessonId": 1, "status": 1 } },
            ],
        },
        None,
    )
    .await?;

    Ok(())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_err)) if write_err.code == 11000
    )
}

/// Ids arrive as hex strings from URL paths. An unparsable id can never
/// match a stored document, so it reads as not-found rather than a 500.
fn parse_lesson_id(id: &str) -> PortResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| PortError::NotFound(format!("Lesson {} not found", id)))
}

fn parse_user_id(id: &str) -> PortResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| PortError::NotFound(format!("User {} not found", id)))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct UserRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    name: String,
    email: String,
    #[serde(rename = "photoURL", default)]
    photo_url: Option<String>,
    #[serde(rename = "role", default)]
    roles: RoleSet,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(rename = "lastLoggedIn", with = "chrono_datetime_as_bson_datetime")]
    last_logged_in: DateTime<Utc>,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id.to_hex(),
            name: self.name,
            email: self.email,
            photo_url: self.photo_url,
            roles: self.roles,
            created_at: self.created_at,
            last_logged_in: self.last_logged_in,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CommentRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "userName")]
    user_name: String,
    text: String,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl CommentRecord {
    fn to_domain(self) -> Comment {
        Comment {
            id: self.id.to_hex(),
            user_id: self.user_id,
            user_name: self.user_name,
            text: self.text,
            created_at: self.created_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct LessonRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    description: String,
    #[serde(rename = "fullDescription", default)]
    full_description: String,
    category: String,
    #[serde(rename = "emotionalTone", default)]
    emotional_tone: String,
    #[serde(rename = "accessLevel")]
    access_level: AccessLevel,
    creator: Creator,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    likes: Vec<String>,
    #[serde(rename = "likesCount", default)]
    likes_count: i64,
    #[serde(default)]
    favorites: Vec<String>,
    #[serde(rename = "favoritesCount", default)]
    favorites_count: i64,
    #[serde(rename = "viewsCount", default)]
    views_count: i64,
    #[serde(default)]
    comments: Vec<CommentRecord>,
    #[serde(rename = "isFeatured", default)]
    is_featured: bool,
    #[serde(rename = "isReviewed", default)]
    is_reviewed: bool,
    #[serde(rename = "isReported", default)]
    is_reported: bool,
}

impl LessonRecord {
    fn from_draft(draft: LessonDraft) -> Self {
        Self {
            id: ObjectId::new(),
            title: draft.title,
            description: draft.description,
            full_description: draft.full_description,
            category: draft.category,
            emotional_tone: draft.emotional_tone,
            access_level: draft.access_level,
            creator: draft.creator,
            created_at: draft.created_at,
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

    fn to_domain(self) -> Lesson {
        Lesson {
            id: self.id.to_hex(),
            title: self.title,
            description: self.description,
            full_description: self.full_description,
            category: self.category,
            emotional_tone: self.emotional_tone,
            access_level: self.access_level,
            creator: self.creator,
            created_at: self.created_at,
            likes: self.likes,
            likes_count: self.likes_count,
            favorites: self.favorites,
            favorites_count: self.favorites_count,
            views_count: self.views_count,
            comments: self.comments.into_iter().map(CommentRecord::to_domain).collect(),
            is_featured: self.is_featured,
            is_reviewed: self.is_reviewed,
            is_reported: self.is_reported,
        }
    }
}

#[derive(Deserialize)]
struct LessonSummaryRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    category: String,
    #[serde(rename = "accessLevel")]
    access_level: AccessLevel,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl LessonSummaryRecord {
    fn to_domain(self) -> LessonSummary {
        LessonSummary {
            id: self.id.to_hex(),
            title: self.title,
            category: self.category,
            access_level: self.access_level,
            created_at: self.created_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ReportRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(rename = "lessonId")]
    lesson_id: String,
    #[serde(rename = "reporterUserId")]
    reporter_user_id: String,
    #[serde(rename = "reporterEmail", default)]
    reporter_email: Option<String>,
    reason: String,
    status: ReportStatus,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl ReportRecord {
    fn from_draft(draft: ReportDraft) -> Self {
        Self {
            id: ObjectId::new(),
            lesson_id: draft.lesson_id,
            reporter_user_id: draft.reporter_user_id,
            reporter_email: draft.reporter_email,
            reason: draft.reason,
            status: ReportStatus::Open,
            created_at: draft.created_at,
        }
    }

    fn to_domain(self) -> Report {
        Report {
            id: self.id.to_hex(),
            lesson_id: self.lesson_id,
            reporter_user_id: self.reporter_user_id,
            reporter_email: self.reporter_email,
            reason: self.reason,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `UserStore` Adapter
//=========================================================================================

/// A MongoDB adapter that implements the `UserStore` port.
#[derive(Clone)]
pub struct MongoUserStore {
    coll: Collection<UserRecord>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            coll: db.collection(USERS_COLLECTION),
        }
    }

    /// Refreshes the login timestamp and rewrites the role field, which
    /// migrates any legacy scalar role to the array form.
    async fn touch_login(&self, record: UserRecord, now: DateTime<Utc>) -> PortResult<User> {
        let roles = bson::to_bson(&record.roles)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.coll
            .update_one(
                doc! { "_id": record.id },
                doc! { "$set": {
                    "lastLoggedIn": bson::DateTime::from_chrono(now),
                    "role": roles,
                } },
                None,
            )
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut user = record.to_domain();
        user.last_logged_in = now;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn upsert_on_login(&self, profile: NewUserProfile) -> PortResult<(User, bool)> {
        let now = Utc::now();

        if let Some(existing) = self
            .coll
            .find_one(doc! { "email": &profile.email }, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
        {
            let user = self.touch_login(existing, now).await?;
            return Ok((user, false));
        }

        let record = UserRecord {
            id: ObjectId::new(),
            name: profile.name,
            email: profile.email,
            photo_url: profile.photo_url,
            roles: RoleSet::base(),
            created_at: now,
            last_logged_in: now,
        };

        match self.coll.insert_one(&record, None).await {
            Ok(_) => Ok((record.to_domain(), true)),
            // Lost a first-sign-in race against the unique email index.
            Err(e) if is_duplicate_key(&e) => {
                let existing = self
                    .coll
                    .find_one(doc! { "email": &record.email }, None)
                    .await
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .ok_or_else(|| {
                        PortError::Unexpected("duplicate email vanished mid-upsert".to_string())
                    })?;
                let user = self.touch_login(existing, now).await?;
                Ok((user, false))
            }
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    async fn find_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let record = self
            .coll
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn roles_of(&self, email: &str) -> PortResult<RoleSet> {
        let record = self
            .coll
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(|r| r.roles).unwrap_or_default())
    }

    async fn grant_role(&self, email: &str, role: Role) -> PortResult<bool> {
        let result = self
            .coll
            .update_one(
                doc! { "email": email },
                doc! { "$addToSet": { "role": role.as_str() } },
                None,
            )
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(result.matched_count > 0)
    }

    async fn grant_role_by_id(&self, id: &str, role: Role) -> PortResult<()> {
        let oid = parse_user_id(id)?;
        let result = self
            .coll
            .update_one(
                doc! { "_id": oid },
                doc! { "$addToSet": { "role": role.as_str() } },
                None,
            )
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.matched_count == 0 {
            return Err(PortError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    async fn list_all(&self) -> PortResult<Vec<User>> {
        let records: Vec<UserRecord> = self
            .coll
            .find(None, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(UserRecord::to_domain).collect())
    }

    async fn delete(&self, id: &str) -> PortResult<()> {
        let oid = parse_user_id(id)?;
        let result = self
            .coll
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.deleted_count == 0 {
            return Err(PortError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    async fn count(&self) -> PortResult<u64> {
        self.coll
            .count_documents(None, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

//=========================================================================================
// `LessonStore` Adapter
//=========================================================================================

/// A MongoDB adapter that implements the `LessonStore` port.
#[derive(Clone)]
pub struct MongoLessonStore {
    coll: Collection<LessonRecord>,
}

impl MongoLessonStore {
    pub fn new(db: &Database) -> Self {
        Self {
            coll: db.collection(LESSONS_COLLECTION),
        }
    }

    async fn find_record(&self, oid: ObjectId, id: &str) -> PortResult<LessonRecord> {
        self.coll
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .ok_or_else(|| PortError::NotFound(format!("Lesson {} not found", id)))
    }

    async fn collect(
        &self,
        filter: impl Into<Option<Document>>,
        options: impl Into<Option<FindOptions>>,
    ) -> PortResult<Vec<Lesson>> {
        let records: Vec<LessonRecord> = self
            .coll
            .find(filter, options)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(LessonRecord::to_domain).collect())
    }

    /// Flips one engagement set in a fixed direction. The membership guard
    /// and the counter move in the same update, so concurrent duplicates
    /// cannot drift the counter away from the set length.
    async fn toggle_membership(
        &self,
        id: &str,
        field: &str,
        counter: &str,
        user_id: &str,
    ) -> PortResult<ToggleOutcome> {
        let oid = parse_lesson_id(id)?;

        let added = self
            .coll
            .update_one(
                doc! { "_id": oid, field: { "$ne": user_id } },
                doc! { "$addToSet": { field: user_id }, "$inc": { counter: 1 } },
                None,
            )
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if added.matched_count > 0 {
            return Ok(ToggleOutcome::Added);
        }

        let removed = self
            .coll
            .update_one(
                doc! { "_id": oid, field: user_id },
                doc! { "$pull": { field: user_id }, "$inc": { counter: -1 } },
                None,
            )
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if removed.matched_count > 0 {
            return Ok(ToggleOutcome::Removed);
        }

        Err(PortError::NotFound(format!("Lesson {} not found", id)))
    }

    async fn set_flag(&self, id: &str, field: &str, value: bool) -> PortResult<()> {
        let oid = parse_lesson_id(id)?;
        let result = self
            .coll
            .update_one(doc! { "_id": oid }, doc! { "$set": { field: value } }, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.matched_count == 0 {
            return Err(PortError::NotFound(format!("Lesson {} not found", id)));
        }
        Ok(())
    }

    async fn count_where(&self, filter: Document) -> PortResult<u64> {
        self.coll
            .count_documents(filter, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[async_trait]
impl LessonStore for MongoLessonStore {
    async fn insert(&self, draft: LessonDraft) -> PortResult<Lesson> {
        let record = LessonRecord::from_draft(draft);
        self.coll
            .insert_one(&record, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn find(&self, id: &str) -> PortResult<Lesson> {
        let oid = parse_lesson_id(id)?;
        Ok(self.find_record(oid, id).await?.to_domain())
    }

    async fn list_all(&self) -> PortResult<Vec<Lesson>> {
        self.collect(None, None).await
    }

    async fn list_by_creator(&self, email: &str) -> PortResult<Vec<Lesson>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        self.collect(doc! { "creator.email": email }, options).await
    }

    async fn list_favorited_by(&self, user_id: &str) -> PortResult<Vec<Lesson>> {
        self.collect(doc! { "favorites": user_id }, None).await
    }

    async fn list_featured(&self) -> PortResult<Vec<Lesson>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        self.collect(doc! { "isFeatured": true }, options).await
    }

    async fn list_most_saved(&self, limit: i64) -> PortResult<Vec<Lesson>> {
        let options = FindOptions::builder()
            .sort(doc! { "favoritesCount": -1 })
            .limit(limit)
            .build();
        self.collect(None, options).await
    }

    async fn list_filtered(&self, filter: LessonFilter) -> PortResult<Vec<Lesson>> {
        let mut query = Document::new();
        if let Some(category) = filter.category {
            query.insert("category", category);
        }
        if let Some(level) = filter.access_level {
            query.insert("accessLevel", level.as_str());
        }
        if filter.flagged_only {
            query.insert("isReported", true);
        }
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        self.collect(query, options).await
    }

    async fn update_fields(&self, id: &str, update: LessonUpdate) -> PortResult<Lesson> {
        let oid = parse_lesson_id(id)?;

        let mut set = Document::new();
        if let Some(title) = update.title {
            set.insert("title", title);
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(full_description) = update.full_description {
            set.insert("fullDescription", full_description);
        }
        if let Some(category) = update.category {
            set.insert("category", category);
        }
        if let Some(emotional_tone) = update.emotional_tone {
            set.insert("emotionalTone", emotional_tone);
        }
        if let Some(access_level) = update.access_level {
            set.insert("accessLevel", access_level.as_str());
        }

        if set.is_empty() {
            return Ok(self.find_record(oid, id).await?.to_domain());
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let record = self
            .coll
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set }, options)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .ok_or_else(|| PortError::NotFound(format!("Lesson {} not found", id)))?;
        Ok(record.to_domain())
    }

    async fn delete(&self, id: &str) -> PortResult<()> {
        let oid = parse_lesson_id(id)?;
        let result = self
            .coll
            .delete_one(doc! { "_id": oid }, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.deleted_count == 0 {
            return Err(PortError::NotFound(format!("Lesson {} not found", id)));
        }
        Ok(())
    }

    async fn toggle_like(&self, id: &str, user_id: &str) -> PortResult<ToggleOutcome> {
        self.toggle_membership(id, "likes", "likesCount", user_id).await
    }

    async fn toggle_favorite(&self, id: &str, user_id: &str) -> PortResult<ToggleOutcome> {
        self.toggle_membership(id, "favorites", "favoritesCount", user_id).await
    }

    async fn remove_favorite(&self, id: &str, user_id: &str) -> PortResult<bool> {
        let oid = parse_lesson_id(id)?;
        let result = self
            .coll
            .update_one(
                doc! { "_id": oid, "favorites": user_id },
                doc! { "$pull": { "favorites": user_id }, "$inc": { "favoritesCount": -1 } },
                None,
            )
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(result.matched_count > 0)
    }

    async fn push_comment(&self, id: &str, draft: CommentDraft) -> PortResult<Comment> {
        let oid = parse_lesson_id(id)?;
        let record = CommentRecord {
            id: ObjectId::new(),
            user_id: draft.user_id,
            user_name: draft.user_name,
            text: draft.text,
            created_at: draft.created_at,
        };
        let comment_doc =
            bson::to_document(&record).map_err(|e| PortError::Unexpected(e.to_string()))?;

        let result = self
            .coll
            .update_one(
                doc! { "_id": oid },
                doc! { "$push": { "comments": comment_doc } },
                None,
            )
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.matched_count == 0 {
            return Err(PortError::NotFound(format!("Lesson {} not found", id)));
        }
        Ok(record.to_domain())
    }

    async fn increment_views(&self, id: &str) -> PortResult<()> {
        let oid = parse_lesson_id(id)?;
        let result = self
            .coll
            .update_one(
                doc! { "_id": oid },
                doc! { "$inc": { "viewsCount": 1 } },
                None,
            )
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.matched_count == 0 {
            return Err(PortError::NotFound(format!("Lesson {} not found", id)));
        }
        Ok(())
    }

    async fn set_featured(&self, id: &str, value: bool) -> PortResult<()> {
        self.set_flag(id, "isFeatured", value).await
    }

    async fn set_reviewed(&self, id: &str) -> PortResult<()> {
        self.set_flag(id, "isReviewed", true).await
    }

    async fn set_reported(&self, id: &str, value: bool) -> PortResult<()> {
        self.set_flag(id, "isReported", value).await
    }

    async fn count_by_creator(&self, email: &str) -> PortResult<u64> {
        self.count_where(doc! { "creator.email": email }).await
    }

    async fn count_by_access(&self, level: AccessLevel) -> PortResult<u64> {
        self.count_where(doc! { "accessLevel": level.as_str() }).await
    }

    async fn count_flagged(&self) -> PortResult<u64> {
        self.count_where(doc! { "isReported": true }).await
    }

    async fn count_favorited_by(&self, user_id: &str) -> PortResult<u64> {
        self.count_where(doc! { "favorites": user_id }).await
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> PortResult<u64> {
        self.count_where(doc! { "createdAt": { "$gte": bson::DateTime::from_chrono(since) } })
            .await
    }

    async fn top_contributors(&self, limit: i64) -> PortResult<Vec<ContributorStat>> {
        #[derive(Deserialize)]
        struct Row {
            #[serde(rename = "_id")]
            email: Option<String>,
            count: i64,
        }

        let pipeline = vec![
            doc! { "$group": { "_id": "$creator.email", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1 } },
            doc! { "$limit": limit },
        ];
        let rows: Vec<Document> = self
            .coll
            .aggregate(pipeline, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut stats = Vec::with_capacity(rows.len());
        for row in rows {
            let row: Row =
                bson::from_document(row).map_err(|e| PortError::Unexpected(e.to_string()))?;
            if let Some(email) = row.email {
                stats.push(ContributorStat {
                    email,
                    count: row.count,
                });
            }
        }
        Ok(stats)
    }

    async fn weekly_activity(&self, email: &str) -> PortResult<Vec<WeekActivity>> {
        #[derive(Deserialize)]
        struct WeekKey {
            year: i64,
            week: i64,
        }
        #[derive(Deserialize)]
        struct Row {
            #[serde(rename = "_id")]
            key: WeekKey,
            count: i64,
        }

        let pipeline = vec![
            doc! { "$match": { "creator.email": email } },
            doc! { "$group": {
                "_id": {
                    "year": { "$isoWeekYear": "$createdAt" },
                    "week": { "$isoWeek": "$createdAt" },
                },
                "count": { "$sum": 1 },
            } },
            doc! { "$sort": { "_id.year": 1, "_id.week": 1 } },
        ];
        let rows: Vec<Document> = self
            .coll
            .aggregate(pipeline, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut activity = Vec::with_capacity(rows.len());
        for row in rows {
            let row: Row =
                bson::from_document(row).map_err(|e| PortError::Unexpected(e.to_string()))?;
            activity.push(WeekActivity {
                week: format!("{}-W{:02}", row.key.year, row.key.week),
                count: row.count,
            });
        }
        Ok(activity)
    }

    async fn recent_by_creator(&self, email: &str, limit: i64) -> PortResult<Vec<LessonSummary>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .limit(limit)
            .projection(doc! { "title": 1, "category": 1, "accessLevel": 1, "createdAt": 1 })
            .build();
        let records: Vec<LessonSummaryRecord> = self
            .coll
            .clone_with_type::<LessonSummaryRecord>()
            .find(doc! { "creator.email": email }, options)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(LessonSummaryRecord::to_domain).collect())
    }
}

//=========================================================================================
// `ReportStore` Adapter
//=========================================================================================

/// A MongoDB adapter that implements the `ReportStore` port.
#[derive(Clone)]
pub struct MongoReportStore {
    coll: Collection<ReportRecord>,
}

impl MongoReportStore {
    pub fn new(db: &Database) -> Self {
        Self {
            coll: db.collection(REPORTS_COLLECTION),
        }
    }
}

#[async_trait]
impl ReportStore for MongoReportStore {
    async fn insert(&self, draft: ReportDraft) -> PortResult<Report> {
        let record = ReportRecord::from_draft(draft);
        self.coll
            .insert_one(&record, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn list_for_lesson(&self, lesson_id: &str) -> PortResult<Vec<Report>> {
        let records: Vec<ReportRecord> = self
            .coll
            .find(doc! { "lessonId": lesson_id }, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(ReportRecord::to_domain).collect())
    }

    async fn moderation_queue(&self) -> PortResult<Vec<ReportedLesson>> {
        #[derive(Deserialize)]
        struct Row {
            #[serde(rename = "_id")]
            lesson_id: String,
            #[serde(rename = "reportCount")]
            report_count: i64,
            lesson: LessonBrief,
        }

        // Report lessonIds are hex strings; `$convert` with `onError: null`
        // keeps a malformed id from poisoning the whole pipeline. The
        // `$unwind` drops groups whose lesson no longer exists.
        let pipeline = vec![
            doc! { "$match": { "status": "open" } },
            doc! { "$group": { "_id": "$lessonId", "reportCount": { "$sum": 1 } } },
            doc! { "$lookup": {
                "from": LESSONS_COLLECTION,
                "let": { "lessonId": {
                    "$convert": { "input": "$_id", "to": "objectId", "onError": null }
                } },
                "pipeline": [
                    { "$match": { "$expr": { "$eq": ["$_id", "$$lessonId"] } } },
                    { "$project": { "title": 1, "category": 1, "accessLevel": 1, "creator": 1 } },
                ],
                "as": "lesson",
            } },
            doc! { "$unwind": "$lesson" },
            doc! { "$sort": { "reportCount": -1 } },
        ];
        let rows: Vec<Document> = self
            .coll
            .aggregate(pipeline, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut queue = Vec::with_capacity(rows.len());
        for row in rows {
            let row: Row =
                bson::from_document(row).map_err(|e| PortError::Unexpected(e.to_string()))?;
            queue.push(ReportedLesson {
                lesson_id: row.lesson_id,
                report_count: row.report_count,
                lesson: row.lesson,
            });
        }
        Ok(queue)
    }

    async fn delete_for_lesson(&self, lesson_id: &str) -> PortResult<u64> {
        let result = self
            .coll
            .delete_many(doc! { "lessonId": lesson_id }, None)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(result.deleted_count)
    }

    async fn ignore_for_lesson(&self, lesson_id: &str) -> PortResult<u64> {
        let result = self
            .coll
            .update_many(
                doc! { "lessonId": lesson_id },
                doc! { "$set": { "status": "ignored" } },
                None,
            )
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(result.modified_count)
    }
}
