//! services/api/src/web/policy.rs
//!
//! Pure authorization checks shared by the lesson handlers. Kept free of
//! any extractor or store access so they can be tested directly.

use crate::error::ApiError;
use lessonflow_core::domain::{AccessLevel, CallerIdentity, Lesson, RoleSet};

/// Only the creator may mutate their lesson. Ownership is decided by the
/// verified email, never by anything the request body claims.
pub fn ensure_owner(lesson: &Lesson, caller: &CallerIdentity) -> Result<(), ApiError> {
    if lesson.creator.email == caller.email {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Premium lessons are readable by premium members and admins; public
/// lessons by anyone authenticated.
pub fn ensure_can_view(lesson: &Lesson, roles: &RoleSet) -> Result<(), ApiError> {
    if lesson.access_level == AccessLevel::Premium && !roles.can_view_premium() {
        Err(ApiError::UpgradeRequired)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lessonflow_core::domain::{Creator, LessonDraft, Role};

    fn lesson(creator_email: &str, level: AccessLevel) -> Lesson {
        LessonDraft {
            title: "t".to_string(),
            description: "d".to_string(),
            full_description: "fd".to_string(),
            category: "c".to_string(),
            emotional_tone: "calm".to_string(),
            access_level: level,
            creator: Creator {
                name: "Author".to_string(),
                email: creator_email.to_string(),
                photo_url: None,
            },
            created_at: Utc::now(),
        }
        .into_lesson("l1".to_string())
    }

    fn caller(email: &str) -> CallerIdentity {
        CallerIdentity {
            email: email.to_string(),
            uid: "uid".to_string(),
        }
    }

    #[test]
    fn owner_check_compares_verified_email() {
        let lesson = lesson("author@x.com", AccessLevel::Public);
        assert!(ensure_owner(&lesson, &caller("author@x.com")).is_ok());
        assert!(matches!(
            ensure_owner(&lesson, &caller("other@x.com")),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn premium_lessons_need_premium_or_admin() {
        let premium = lesson("author@x.com", AccessLevel::Premium);

        assert!(matches!(
            ensure_can_view(&premium, &RoleSet::base()),
            Err(ApiError::UpgradeRequired)
        ));
        assert!(ensure_can_view(&premium, &RoleSet::from_roles([Role::Premium])).is_ok());
        assert!(ensure_can_view(&premium, &RoleSet::from_roles([Role::Admin])).is_ok());
    }

    #[test]
    fn public_lessons_are_open_to_any_role() {
        let public = lesson("author@x.com", AccessLevel::Public);
        assert!(ensure_can_view(&public, &RoleSet::base()).is_ok());
    }
}
