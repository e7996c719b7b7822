//! services/api/src/entitlements.rs
//!
//! The premium grant flow. A checkout session only ever unlocks premium
//! after this module has re-queried the payment provider itself and seen
//! the session settled; a client-reported status is never enough.

use tracing::{info, warn};

use crate::error::ApiError;
use lessonflow_core::domain::{PaymentStatus, Role};
use lessonflow_core::ports::{PaymentGateway, UserStore};

/// Confirms the session against the provider and, when paid, grants the
/// buyer the premium role. Granting twice is a no-op, so replaying the
/// success redirect is harmless. Returns the buyer email.
pub async fn confirm_and_grant(
    payments: &dyn PaymentGateway,
    users: &dyn UserStore,
    session_id: &str,
) -> Result<String, ApiError> {
    let confirmation = payments
        .retrieve_checkout_session(session_id)
        .await
        .map_err(|e| ApiError::upstream("Payment verification failed", e))?;

    if confirmation.payment_status != PaymentStatus::Paid {
        warn!(
            "session {} reported {:?}, refusing premium grant",
            session_id, confirmation.payment_status
        );
        return Err(ApiError::Upstream("Payment verification failed".to_string()));
    }

    let email = match confirmation.customer_email {
        Some(email) => email,
        None => {
            warn!("session {} settled without a customer email", session_id);
            return Err(ApiError::Upstream("Payment verification failed".to_string()));
        }
    };

    let matched = users
        .grant_role(&email, Role::Premium)
        .await
        .map_err(|e| ApiError::upstream("Failed to activate premium", e))?;
    if matched {
        info!("premium activated for {}", email);
    } else {
        // Paid but no account: the user record appears on next sign-in,
        // so surface it loudly instead of failing the redirect.
        warn!("paid session {} has no user record for {}", session_id, email);
    }

    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryStore, StubPaymentGateway};
    use lessonflow_core::domain::NewUserProfile;

    async fn seeded_store(email: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .upsert_on_login(NewUserProfile {
                name: "Ada".to_string(),
                email: email.to_string(),
                photo_url: None,
            })
            .await
            .unwrap();
        store
    }

    async fn open_session(gateway: &StubPaymentGateway, email: &str) -> String {
        gateway
            .create_checkout_session(499 * 100, email)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn paid_session_grants_premium_idempotently() {
        let store = seeded_store("a@x.com").await;
        let gateway = StubPaymentGateway::new();
        let session_id = open_session(&gateway, "a@x.com").await;
        gateway.settle(&session_id, PaymentStatus::Paid).await;

        let email = confirm_and_grant(&gateway, &store, &session_id).await.unwrap();
        assert_eq!(email, "a@x.com");
        assert!(store.roles_of("a@x.com").await.unwrap().can_view_premium());

        // Replaying the redirect changes nothing.
        confirm_and_grant(&gateway, &store, &session_id).await.unwrap();
        let roles = store.roles_of("a@x.com").await.unwrap();
        assert!(roles.can_view_premium());
        assert_eq!(roles.len(), 2);
    }

    #[tokio::test]
    async fn unpaid_session_grants_nothing() {
        let store = seeded_store("a@x.com").await;
        let gateway = StubPaymentGateway::new();
        let session_id = open_session(&gateway, "a@x.com").await;

        let result = confirm_and_grant(&gateway, &store, &session_id).await;
        assert!(matches!(result, Err(ApiError::Upstream(_))));
        assert!(!store.roles_of("a@x.com").await.unwrap().can_view_premium());
    }

    #[tokio::test]
    async fn unknown_session_fails_verification() {
        let store = seeded_store("a@x.com").await;
        let gateway = StubPaymentGateway::new();

        let result = confirm_and_grant(&gateway, &store, "cs_missing").await;
        assert!(matches!(result, Err(ApiError::Upstream(_))));
    }

    #[tokio::test]
    async fn paid_session_for_unknown_user_still_succeeds() {
        let store = MemoryStore::new();
        let gateway = StubPaymentGateway::new();
        let session_id = open_session(&gateway, "ghost@x.com").await;
        gateway.settle(&session_id, PaymentStatus::Paid).await;

        let email = confirm_and_grant(&gateway, &store, &session_id).await.unwrap();
        assert_eq!(email, "ghost@x.com");
    }
}
