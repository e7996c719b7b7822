//! services/api/src/adapters/identity.rs
//!
//! Token verification against the Google Identity Toolkit. Clients sign in
//! with Firebase on the frontend and send the resulting ID token as a bearer
//! credential; this adapter exchanges it for the account's email and uid.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lessonflow_core::domain::CallerIdentity;
use lessonflow_core::ports::{PortError, PortResult, TokenVerifier};

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// A `TokenVerifier` backed by the `accounts:lookup` endpoint.
pub struct FirebaseTokenVerifier {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FirebaseTokenVerifier {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Points the verifier at a different endpoint, e.g. an emulator.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

#[derive(Serialize)]
struct LookupRequest<'a> {
    #[serde(rename = "idToken")]
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
struct LookupUser {
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> PortResult<CallerIdentity> {
        let url = format!(
            "{}/accounts:lookup?key={}",
            self.base_url.trim_end_matches('/'),
            self.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&LookupRequest { id_token: token })
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            // The provider answers 400 for malformed and expired tokens.
            debug!("token lookup rejected with status {}", status);
            return Err(PortError::Unauthorized);
        }
        if !status.is_success() {
            return Err(PortError::Unexpected(format!(
                "identity provider answered {}",
                status
            )));
        }

        let payload: LookupResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let user = payload.users.into_iter().next().ok_or(PortError::Unauthorized)?;
        let email = user.email.ok_or(PortError::Unauthorized)?;

        Ok(CallerIdentity {
            email,
            uid: user.local_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_response_decodes_account_fields() {
        let payload: LookupResponse = serde_json::from_str(
            r#"{"kind":"identitytoolkit#GetAccountInfoResponse","users":[
                {"localId":"uid-1","email":"ada@x.com","emailVerified":true}
            ]}"#,
        )
        .unwrap();
        let user = payload.users.into_iter().next().unwrap();
        assert_eq!(user.local_id, "uid-1");
        assert_eq!(user.email.as_deref(), Some("ada@x.com"));
    }

    #[test]
    fn empty_user_list_decodes_cleanly() {
        let payload: LookupResponse = serde_json::from_str(r#"{"kind":"x"}"#).unwrap();
        assert!(payload.users.is_empty());
    }
}
