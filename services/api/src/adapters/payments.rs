//! services/api/src/adapters/payments.rs
//!
//! The Stripe Checkout adapter. Premium access is sold through one hosted
//! checkout session per buyer; the session is created here and re-queried
//! here after the redirect, so the grant never trusts a client-reported
//! payment state.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use lessonflow_core::domain::{CheckoutSession, PaymentConfirmation, PaymentStatus};
use lessonflow_core::ports::{PaymentGateway, PortError, PortResult};

const DEFAULT_BASE_URL: &str = "https://api.stripe.com/v1";
const PRODUCT_NAME: &str = "LessonFlow Premium Access";

/// A `PaymentGateway` backed by the Stripe Checkout Sessions API.
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
    client_origin: String,
}

impl StripeGateway {
    /// `client_origin` is where Stripe redirects the buyer afterwards.
    pub fn new(secret_key: String, client_origin: String) -> Self {
        Self::with_base_url(secret_key, client_origin, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(secret_key: String, client_origin: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            base_url,
            client_origin,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Stripe substitutes the literal `{CHECKOUT_SESSION_ID}` placeholder
    /// when redirecting, so it must survive into the final url untouched.
    fn success_url(&self) -> String {
        format!(
            "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
            self.client_origin
        )
    }

    fn cancel_url(&self) -> String {
        format!("{}/pricing", self.client_origin)
    }
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct RetrievedSession {
    payment_status: PaymentStatus,
    #[serde(default)]
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    customer_email: Option<String>,
}

#[derive(Deserialize)]
struct CustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        amount_cents: i64,
        buyer_email: &str,
    ) -> PortResult<CheckoutSession> {
        // Stripe takes nested params in bracket notation, form-encoded.
        let params = [
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][price_data][currency]", "usd".to_string()),
            (
                "line_items[0][price_data][unit_amount]",
                amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                PRODUCT_NAME.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("customer_email", buyer_email.to_string()),
            ("success_url", self.success_url()),
            ("cancel_url", self.cancel_url()),
        ];

        let response = self
            .http
            .post(self.endpoint("checkout/sessions"))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("checkout session creation failed: {} {}", status, body);
            return Err(PortError::Unexpected(format!(
                "payment provider answered {}",
                status
            )));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let url = session.url.ok_or_else(|| {
            PortError::Unexpected("checkout session carried no redirect url".to_string())
        })?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> PortResult<PaymentConfirmation> {
        let response = self
            .http
            .get(self.endpoint(&format!("checkout/sessions/{}", session_id)))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(format!(
                "Session {} not found",
                session_id
            )));
        }
        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "payment provider answered {}",
                response.status()
            )));
        }

        let session: RetrievedSession = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // The email typed into checkout lives under customer_details; the
        // one the session was created with is the fallback.
        let customer_email = session
            .customer_details
            .and_then(|details| details.email)
            .or(session.customer_email);

        Ok(PaymentConfirmation {
            payment_status: session.payment_status,
            customer_email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieved_session_decodes_paid_state() {
        let session: RetrievedSession = serde_json::from_str(
            r#"{
                "id": "cs_test_1",
                "object": "checkout.session",
                "payment_status": "paid",
                "customer_details": {"email": "ada@x.com", "name": "Ada"}
            }"#,
        )
        .unwrap();
        assert_eq!(session.payment_status, PaymentStatus::Paid);
        assert_eq!(
            session.customer_details.and_then(|d| d.email).as_deref(),
            Some("ada@x.com")
        );
    }

    #[test]
    fn retrieved_session_falls_back_to_creation_email() {
        let session: RetrievedSession = serde_json::from_str(
            r#"{"payment_status": "unpaid", "customer_email": "ada@x.com"}"#,
        )
        .unwrap();
        assert_eq!(session.payment_status, PaymentStatus::Unpaid);
        let email = session
            .customer_details
            .and_then(|d| d.email)
            .or(session.customer_email);
        assert_eq!(email.as_deref(), Some("ada@x.com"));
    }

    #[test]
    fn redirect_urls_point_back_at_the_client() {
        let gateway =
            StripeGateway::new("sk_test".to_string(), "http://localhost:5173".to_string());
        assert_eq!(
            gateway.success_url(),
            "http://localhost:5173/payment-success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(gateway.cancel_url(), "http://localhost:5173/pricing");
    }
}
