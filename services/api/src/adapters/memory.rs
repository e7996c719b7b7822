//! services/api/src/adapters/memory.rs
//!
//! In-memory implementations of the store and gateway ports. The test suite
//! runs handlers against these; they mirror the observable behavior of the
//! MongoDB adapters, including the membership/counter coupling of toggles.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use tokio::sync::Mutex;

use lessonflow_core::domain::{
    AccessLevel, CallerIdentity, CheckoutSession, Comment, CommentDraft, ContributorStat, Lesson,
    LessonBrief, LessonDraft, LessonFilter, LessonSummary, LessonUpdate, NewUserProfile,
    PaymentConfirmation, PaymentStatus, Report, ReportDraft, ReportStatus, ReportedLesson, Role,
    RoleSet, ToggleOutcome, User, WeekActivity,
};
use lessonflow_core::ports::{
    LessonStore, PaymentGateway, PortError, PortResult, ReportStore, TokenVerifier, UserStore,
};

/// One store holding all three collections, so cross-collection reads
/// (the moderation queue) can join without a database.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    lessons: Mutex<Vec<Lesson>>,
    reports: Mutex<Vec<Report>>,
    counter: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{:024x}", n)
    }
}

fn lesson_not_found(id: &str) -> PortError {
    PortError::NotFound(format!("Lesson {} not found", id))
}

fn toggle(set: &mut Vec<String>, counter: &mut i64, user_id: &str) -> ToggleOutcome {
    if set.iter().any(|member| member == user_id) {
        set.retain(|member| member != user_id);
        *counter -= 1;
        ToggleOutcome::Removed
    } else {
        set.push(user_id.to_string());
        *counter += 1;
        ToggleOutcome::Added
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_on_login(&self, profile: NewUserProfile) -> PortResult<(User, bool)> {
        let now = Utc::now();
        let mut users = self.users.lock().await;
        if let Some(user) = users.iter_mut().find(|u| u.email == profile.email) {
            user.last_logged_in = now;
            return Ok((user.clone(), false));
        }
        let user = User {
            id: self.next_id(),
            name: profile.name,
            email: profile.email,
            photo_url: profile.photo_url,
            roles: RoleSet::base(),
            created_at: now,
            last_logged_in: now,
        };
        users.push(user.clone());
        Ok((user, true))
    }

    async fn find_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn roles_of(&self, email: &str) -> PortResult<RoleSet> {
        let users = self.users.lock().await;
        Ok(users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.roles.clone())
            .unwrap_or_default())
    }

    async fn grant_role(&self, email: &str, role: Role) -> PortResult<bool> {
        let mut users = self.users.lock().await;
        match users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.roles.grant(role);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn grant_role_by_id(&self, id: &str, role: Role) -> PortResult<()> {
        let mut users = self.users.lock().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))?;
        user.roles.grant(role);
        Ok(())
    }

    async fn list_all(&self) -> PortResult<Vec<User>> {
        Ok(self.users.lock().await.clone())
    }

    async fn delete(&self, id: &str) -> PortResult<()> {
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(PortError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    async fn count(&self) -> PortResult<u64> {
        Ok(self.users.lock().await.len() as u64)
    }
}

#[async_trait]
impl LessonStore for MemoryStore {
    async fn insert(&self, draft: LessonDraft) -> PortResult<Lesson> {
        let lesson = draft.into_lesson(self.next_id());
        self.lessons.lock().await.push(lesson.clone());
        Ok(lesson)
    }

    async fn find(&self, id: &str) -> PortResult<Lesson> {
        let lessons = self.lessons.lock().await;
        lessons
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| lesson_not_found(id))
    }

    async fn list_all(&self) -> PortResult<Vec<Lesson>> {
        Ok(self.lessons.lock().await.clone())
    }

    async fn list_by_creator(&self, email: &str) -> PortResult<Vec<Lesson>> {
        let lessons = self.lessons.lock().await;
        let mut found: Vec<Lesson> = lessons
            .iter()
            .filter(|l| l.creator.email == email)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn list_favorited_by(&self, user_id: &str) -> PortResult<Vec<Lesson>> {
        let lessons = self.lessons.lock().await;
        Ok(lessons
            .iter()
            .filter(|l| l.favorites.iter().any(|member| member == user_id))
            .cloned()
            .collect())
    }

    async fn list_featured(&self) -> PortResult<Vec<Lesson>> {
        let lessons = self.lessons.lock().await;
        let mut found: Vec<Lesson> = lessons.iter().filter(|l| l.is_featured).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn list_most_saved(&self, limit: i64) -> PortResult<Vec<Lesson>> {
        let lessons = self.lessons.lock().await;
        let mut all: Vec<Lesson> = lessons.clone();
        all.sort_by(|a, b| b.favorites_count.cmp(&a.favorites_count));
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn list_filtered(&self, filter: LessonFilter) -> PortResult<Vec<Lesson>> {
        let lessons = self.lessons.lock().await;
        let mut found: Vec<Lesson> = lessons
            .iter()
            .filter(|l| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |category| l.category == category)
                    && filter.access_level.map_or(true, |level| l.access_level == level)
                    && (!filter.flagged_only || l.is_reported)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update_fields(&self, id: &str, update: LessonUpdate) -> PortResult<Lesson> {
        let mut lessons = self.lessons.lock().await;
        let lesson = lessons
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| lesson_not_found(id))?;
        if let Some(title) = update.title {
            lesson.title = title;
        }
        if let Some(description) = update.description {
            lesson.description = description;
        }
        if let Some(full_description) = update.full_description {
            lesson.full_description = full_description;
        }
        if let Some(category) = update.category {
            lesson.category = category;
        }
        if let Some(emotional_tone) = update.emotional_tone {
            lesson.emotional_tone = emotional_tone;
        }
        if let Some(access_level) = update.access_level {
            lesson.access_level = access_level;
        }
        Ok(lesson.clone())
    }

    async fn delete(&self, id: &str) -> PortResult<()> {
        let mut lessons = self.lessons.lock().await;
        let before = lessons.len();
        lessons.retain(|l| l.id != id);
        if lessons.len() == before {
            return Err(lesson_not_found(id));
        }
        Ok(())
    }

    async fn toggle_like(&self, id: &str, user_id: &str) -> PortResult<ToggleOutcome> {
        let mut lessons = self.lessons.lock().await;
        let lesson = lessons
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| lesson_not_found(id))?;
        Ok(toggle(&mut lesson.likes, &mut lesson.likes_count, user_id))
    }

    async fn toggle_favorite(&self, id: &str, user_id: &str) -> PortResult<ToggleOutcome> {
        let mut lessons = self.lessons.lock().await;
        let lesson = lessons
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| lesson_not_found(id))?;
        Ok(toggle(&mut lesson.favorites, &mut lesson.favorites_count, user_id))
    }

    async fn remove_favorite(&self, id: &str, user_id: &str) -> PortResult<bool> {
        let mut lessons = self.lessons.lock().await;
        match lessons.iter_mut().find(|l| l.id == id) {
            Some(lesson) if lesson.favorites.iter().any(|member| member == user_id) => {
                lesson.favorites.retain(|member| member != user_id);
                lesson.favorites_count -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn push_comment(&self, id: &str, draft: CommentDraft) -> PortResult<Comment> {
        let comment = Comment {
            id: self.next_id(),
            user_id: draft.user_id,
            user_name: draft.user_name,
            text: draft.text,
            created_at: draft.created_at,
        };
        let mut lessons = self.lessons.lock().await;
        let lesson = lessons
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| lesson_not_found(id))?;
        lesson.comments.push(comment.clone());
        Ok(comment)
    }

    async fn increment_views(&self, id: &str) -> PortResult<()> {
        let mut lessons = self.lessons.lock().await;
        let lesson = lessons
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| lesson_not_found(id))?;
        lesson.views_count += 1;
        Ok(())
    }

    async fn set_featured(&self, id: &str, value: bool) -> PortResult<()> {
        let mut lessons = self.lessons.lock().await;
        let lesson = lessons
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| lesson_not_found(id))?;
        lesson.is_featured = value;
        Ok(())
    }

    async fn set_reviewed(&self, id: &str) -> PortResult<()> {
        let mut lessons = self.lessons.lock().await;
        let lesson = lessons
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| lesson_not_found(id))?;
        lesson.is_reviewed = true;
        Ok(())
    }

    async fn set_reported(&self, id: &str, value: bool) -> PortResult<()> {
        let mut lessons = self.lessons.lock().await;
        let lesson = lessons
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| lesson_not_found(id))?;
        lesson.is_reported = value;
        Ok(())
    }

    async fn count_by_creator(&self, email: &str) -> PortResult<u64> {
        let lessons = self.lessons.lock().await;
        Ok(lessons.iter().filter(|l| l.creator.email == email).count() as u64)
    }

    async fn count_by_access(&self, level: AccessLevel) -> PortResult<u64> {
        let lessons = self.lessons.lock().await;
        Ok(lessons.iter().filter(|l| l.access_level == level).count() as u64)
    }

    async fn count_flagged(&self) -> PortResult<u64> {
        let lessons = self.lessons.lock().await;
        Ok(lessons.iter().filter(|l| l.is_reported).count() as u64)
    }

    async fn count_favorited_by(&self, user_id: &str) -> PortResult<u64> {
        let lessons = self.lessons.lock().await;
        Ok(lessons
            .iter()
            .filter(|l| l.favorites.iter().any(|member| member == user_id))
            .count() as u64)
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> PortResult<u64> {
        let lessons = self.lessons.lock().await;
        Ok(lessons.iter().filter(|l| l.created_at >= since).count() as u64)
    }

    async fn top_contributors(&self, limit: i64) -> PortResult<Vec<ContributorStat>> {
        let lessons = self.lessons.lock().await;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for lesson in lessons.iter() {
            *counts.entry(lesson.creator.email.clone()).or_insert(0) += 1;
        }
        let mut stats: Vec<ContributorStat> = counts
            .into_iter()
            .map(|(email, count)| ContributorStat { email, count })
            .collect();
        stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.email.cmp(&b.email)));
        stats.truncate(limit as usize);
        Ok(stats)
    }

    async fn weekly_activity(&self, email: &str) -> PortResult<Vec<WeekActivity>> {
        let lessons = self.lessons.lock().await;
        let mut buckets: BTreeMap<(i32, u32), i64> = BTreeMap::new();
        for lesson in lessons.iter().filter(|l| l.creator.email == email) {
            let iso = lesson.created_at.iso_week();
            *buckets.entry((iso.year(), iso.week())).or_insert(0) += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|((year, week), count)| WeekActivity {
                week: format!("{}-W{:02}", year, week),
                count,
            })
            .collect())
    }

    async fn recent_by_creator(&self, email: &str, limit: i64) -> PortResult<Vec<LessonSummary>> {
        let lessons = self.lessons.lock().await;
        let mut found: Vec<Lesson> = lessons
            .iter()
            .filter(|l| l.creator.email == email)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found.truncate(limit as usize);
        Ok(found
            .into_iter()
            .map(|l| LessonSummary {
                id: l.id,
                title: l.title,
                category: l.category,
                access_level: l.access_level,
                created_at: l.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert(&self, draft: ReportDraft) -> PortResult<Report> {
        let report = Report {
            id: self.next_id(),
            lesson_id: draft.lesson_id,
            reporter_user_id: draft.reporter_user_id,
            reporter_email: draft.reporter_email,
            reason: draft.reason,
            status: ReportStatus::Open,
            created_at: draft.created_at,
        };
        self.reports.lock().await.push(report.clone());
        Ok(report)
    }

    async fn list_for_lesson(&self, lesson_id: &str) -> PortResult<Vec<Report>> {
        let reports = self.reports.lock().await;
        Ok(reports
            .iter()
            .filter(|r| r.lesson_id == lesson_id)
            .cloned()
            .collect())
    }

    async fn moderation_queue(&self) -> PortResult<Vec<ReportedLesson>> {
        let reports = self.reports.lock().await;
        let lessons = self.lessons.lock().await;

        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for report in reports.iter().filter(|r| r.status == ReportStatus::Open) {
            *counts.entry(report.lesson_id.clone()).or_insert(0) += 1;
        }

        // Groups whose lesson no longer exists are dropped, matching the
        // database join.
        let mut queue: Vec<ReportedLesson> = counts
            .into_iter()
            .filter_map(|(lesson_id, report_count)| {
                lessons.iter().find(|l| l.id == lesson_id).map(|lesson| ReportedLesson {
                    lesson_id,
                    report_count,
                    lesson: LessonBrief {
                        title: lesson.title.clone(),
                        category: lesson.category.clone(),
                        access_level: lesson.access_level,
                        creator: lesson.creator.clone(),
                    },
                })
            })
            .collect();
        queue.sort_by(|a, b| b.report_count.cmp(&a.report_count));
        Ok(queue)
    }

    async fn delete_for_lesson(&self, lesson_id: &str) -> PortResult<u64> {
        let mut reports = self.reports.lock().await;
        let before = reports.len();
        reports.retain(|r| r.lesson_id != lesson_id);
        Ok((before - reports.len()) as u64)
    }

    async fn ignore_for_lesson(&self, lesson_id: &str) -> PortResult<u64> {
        let mut reports = self.reports.lock().await;
        let mut changed = 0;
        for report in reports
            .iter_mut()
            .filter(|r| r.lesson_id == lesson_id && r.status == ReportStatus::Open)
        {
            report.status = ReportStatus::Ignored;
            changed += 1;
        }
        Ok(changed)
    }
}

//=========================================================================================
// Identity and Payment Test Doubles
//=========================================================================================

/// A verifier backed by a fixed token table.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, CallerIdentity>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, email: &str, uid: &str) -> Self {
        self.tokens.insert(
            token.to_string(),
            CallerIdentity {
                email: email.to_string(),
                uid: uid.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> PortResult<CallerIdentity> {
        self.tokens.get(token).cloned().ok_or(PortError::Unauthorized)
    }
}

/// What the stub gateway remembers about a created session.
#[derive(Debug, Clone)]
pub struct RecordedSession {
    pub id: String,
    pub amount_cents: i64,
    pub customer_email: String,
    pub payment_status: PaymentStatus,
}

/// A payment gateway whose sessions settle only when a test says so.
#[derive(Default)]
pub struct StubPaymentGateway {
    sessions: Mutex<Vec<RecordedSession>>,
    counter: AtomicU64,
}

impl StubPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an existing session as settled with the given status.
    pub async fn settle(&self, session_id: &str, status: PaymentStatus) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) {
            session.payment_status = status;
        }
    }

    /// The most recently created session, if any.
    pub async fn last_session(&self) -> Option<RecordedSession> {
        self.sessions.lock().await.last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for StubPaymentGateway {
    async fn create_checkout_session(
        &self,
        amount_cents: i64,
        buyer_email: &str,
    ) -> PortResult<CheckoutSession> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("cs_test_{}", n);
        self.sessions.lock().await.push(RecordedSession {
            id: id.clone(),
            amount_cents,
            customer_email: buyer_email.to_string(),
            payment_status: PaymentStatus::Unpaid,
        });
        Ok(CheckoutSession {
            url: format!("https://checkout.test/pay/{}", id),
            id,
        })
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> PortResult<PaymentConfirmation> {
        let sessions = self.sessions.lock().await;
        sessions
            .iter()
            .find(|s| s.id == session_id)
            .map(|s| PaymentConfirmation {
                payment_status: s.payment_status,
                customer_email: Some(s.customer_email.clone()),
            })
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lessonflow_core::domain::Creator;

    fn draft(title: &str, email: &str, level: AccessLevel) -> LessonDraft {
        LessonDraft {
            title: title.to_string(),
            description: "d".to_string(),
            full_description: "fd".to_string(),
            category: "resilience".to_string(),
            emotional_tone: "hopeful".to_string(),
            access_level: level,
            creator: Creator {
                name: "Author".to_string(),
                email: email.to_string(),
                photo_url: None,
            },
            created_at: Utc::now(),
        }
    }

    // `insert` exists on both stores, so seeding goes through qualified calls.
    async fn seed_lesson(store: &MemoryStore, d: LessonDraft) -> Lesson {
        LessonStore::insert(store, d).await.unwrap()
    }

    async fn seed_report(store: &MemoryStore, lesson_id: &str, reporter: &str) -> Report {
        ReportStore::insert(
            store,
            ReportDraft {
                lesson_id: lesson_id.to_string(),
                reporter_user_id: reporter.to_string(),
                reporter_email: None,
                reason: "spam".to_string(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn like_toggle_keeps_counter_equal_to_membership() {
        let store = MemoryStore::new();
        let lesson = seed_lesson(&store, draft("t", "a@x.com", AccessLevel::Public)).await;

        assert_eq!(
            store.toggle_like(&lesson.id, "u1").await.unwrap(),
            ToggleOutcome::Added
        );
        assert_eq!(
            store.toggle_like(&lesson.id, "u2").await.unwrap(),
            ToggleOutcome::Added
        );
        assert_eq!(
            store.toggle_like(&lesson.id, "u1").await.unwrap(),
            ToggleOutcome::Removed
        );

        let stored = store.find(&lesson.id).await.unwrap();
        assert_eq!(stored.likes, vec!["u2".to_string()]);
        assert_eq!(stored.likes_count, stored.likes.len() as i64);
    }

    #[tokio::test]
    async fn double_toggle_restores_prior_state() {
        let store = MemoryStore::new();
        let lesson = seed_lesson(&store, draft("t", "a@x.com", AccessLevel::Public)).await;

        store.toggle_favorite(&lesson.id, "u1").await.unwrap();
        store.toggle_favorite(&lesson.id, "u1").await.unwrap();

        let stored = store.find(&lesson.id).await.unwrap();
        assert!(stored.favorites.is_empty());
        assert_eq!(stored.favorites_count, 0);
    }

    #[tokio::test]
    async fn remove_favorite_only_moves_counter_for_members() {
        let store = MemoryStore::new();
        let lesson = seed_lesson(&store, draft("t", "a@x.com", AccessLevel::Public)).await;

        assert!(!store.remove_favorite(&lesson.id, "u1").await.unwrap());
        store.toggle_favorite(&lesson.id, "u1").await.unwrap();
        assert!(store.remove_favorite(&lesson.id, "u1").await.unwrap());
        assert!(!store.remove_favorite(&lesson.id, "u1").await.unwrap());

        let stored = store.find(&lesson.id).await.unwrap();
        assert_eq!(stored.favorites_count, 0);
    }

    #[tokio::test]
    async fn upsert_creates_once_then_refreshes_login() {
        let store = MemoryStore::new();
        let profile = NewUserProfile {
            name: "Ada".to_string(),
            email: "ada@x.com".to_string(),
            photo_url: None,
        };

        let (first, created) = store.upsert_on_login(profile.clone()).await.unwrap();
        assert!(created);

        let (second, created) = store.upsert_on_login(profile).await.unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.last_logged_in >= first.last_logged_in);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn moderation_queue_groups_open_reports_and_drops_orphans() {
        let store = MemoryStore::new();
        let kept = seed_lesson(&store, draft("kept", "a@x.com", AccessLevel::Public)).await;
        let gone = seed_lesson(&store, draft("gone", "a@x.com", AccessLevel::Public)).await;

        seed_report(&store, &kept.id, "u1").await;
        seed_report(&store, &kept.id, "u2").await;
        seed_report(&store, &gone.id, "u3").await;
        LessonStore::delete(&store, &gone.id).await.unwrap();

        let queue = store.moderation_queue().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].lesson_id, kept.id);
        assert_eq!(queue[0].report_count, 2);
        assert_eq!(queue[0].lesson.title, "kept");
    }

    #[tokio::test]
    async fn ignoring_reports_closes_only_open_ones() {
        let store = MemoryStore::new();
        let lesson = seed_lesson(&store, draft("t", "a@x.com", AccessLevel::Public)).await;
        seed_report(&store, &lesson.id, "u1").await;

        assert_eq!(store.ignore_for_lesson(&lesson.id).await.unwrap(), 1);
        assert_eq!(store.ignore_for_lesson(&lesson.id).await.unwrap(), 0);
        assert!(store.moderation_queue().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn weekly_activity_buckets_by_iso_week() {
        let store = MemoryStore::new();
        let mut first = draft("a", "a@x.com", AccessLevel::Public);
        first.created_at = Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap();
        let mut second = draft("b", "a@x.com", AccessLevel::Public);
        second.created_at = Utc.with_ymd_and_hms(2025, 1, 7, 12, 0, 0).unwrap();
        let mut third = draft("c", "a@x.com", AccessLevel::Public);
        third.created_at = Utc.with_ymd_and_hms(2025, 1, 13, 12, 0, 0).unwrap();

        for d in [first, second, third] {
            seed_lesson(&store, d).await;
        }

        let activity = store.weekly_activity("a@x.com").await.unwrap();
        assert_eq!(
            activity,
            vec![
                WeekActivity { week: "2025-W02".to_string(), count: 2 },
                WeekActivity { week: "2025-W03".to_string(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn top_contributors_ranks_by_lesson_count() {
        let store = MemoryStore::new();
        for email in ["a@x.com", "b@x.com", "a@x.com", "a@x.com", "b@x.com"] {
            seed_lesson(&store, draft("t", email, AccessLevel::Public)).await;
        }

        let stats = store.top_contributors(5).await.unwrap();
        assert_eq!(stats[0].email, "a@x.com");
        assert_eq!(stats[0].count, 3);
        assert_eq!(stats[1].email, "b@x.com");
        assert_eq!(stats[1].count, 2);
    }
}
