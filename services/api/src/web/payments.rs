//! services/api/src/web/payments.rs
//!
//! Checkout handlers. Session creation is open (the client has not
//! necessarily signed in to our API when it starts paying); the grant
//! itself only happens after `entitlements` re-verifies the session.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::entitlements;
use crate::error::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// Price in whole currency units; converted to cents for the provider.
    pub price: i64,
    #[serde(rename = "userEmail")]
    pub user_email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentSuccessRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[utoipa::path(
    post,
    path = "/create-checkout-session",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Hosted checkout URL", body = CheckoutResponse),
        (status = 500, description = "Payment provider rejected the session")
    )
)]
pub async fn create_checkout_session_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = app_state
        .payments
        .create_checkout_session(payload.price * 100, &payload.user_email)
        .await
        .map_err(|e| ApiError::upstream("Stripe Session Failed", e))?;
    Ok(Json(CheckoutResponse { url: session.url }))
}

#[utoipa::path(
    post,
    path = "/payment-success",
    request_body = PaymentSuccessRequest,
    responses(
        (status = 200, description = "Premium activated"),
        (status = 500, description = "Session not paid or could not be verified")
    )
)]
pub async fn payment_success_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<PaymentSuccessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    entitlements::confirm_and_grant(
        app_state.payments.as_ref(),
        app_state.users.as_ref(),
        &payload.session_id,
    )
    .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Premium Activated Successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::testutil::{payment_state, seed_user};
    use lessonflow_core::domain::{PaymentStatus, Role};

    #[tokio::test]
    async fn checkout_reports_the_hosted_url() {
        let (state, payments) = payment_state();
        let response = create_checkout_session_handler(
            State(state),
            Json(CheckoutRequest {
                price: 5,
                user_email: "a@x.com".to_string(),
            }),
        )
        .await;
        assert!(response.is_ok());

        let session = payments.last_session().await.expect("session registered");
        assert_eq!(session.amount_cents, 500);
        assert_eq!(session.customer_email, "a@x.com");
    }

    #[tokio::test]
    async fn success_redirect_grants_premium_only_when_paid() {
        let (state, payments) = payment_state();
        seed_user(&state, "Ada", "a@x.com", &[]).await;
        let session = state
            .payments
            .create_checkout_session(500, "a@x.com")
            .await
            .unwrap();

        // Unpaid session: refused, no role change.
        let refused = payment_success_handler(
            State(state.clone()),
            Json(PaymentSuccessRequest {
                session_id: session.id.clone(),
            }),
        )
        .await;
        assert!(refused.is_err());
        let roles = state.users.roles_of("a@x.com").await.unwrap();
        assert!(!roles.contains(Role::Premium));

        // Settled session: premium lands.
        payments.settle(&session.id, PaymentStatus::Paid).await;
        payment_success_handler(
            State(state.clone()),
            Json(PaymentSuccessRequest {
                session_id: session.id,
            }),
        )
        .await
        .expect("paid session activates premium");
        let roles = state.users.roles_of("a@x.com").await.unwrap();
        assert!(roles.contains(Role::Premium));
    }
}
