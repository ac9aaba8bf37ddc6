//! Identity service client.
//!
//! Sessions and accounts are owned by an external identity service; this
//! client only resolves session tokens to identities, reads account display
//! names, and passes login through. Passwords never touch this crate.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("identity service returned status {status}: {message}")]
    Status { status: u16, message: String },
}

/// A resolved session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
}

/// An account as reported by the identity service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session: Session,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account: Account,
}

/// HTTP client for the external identity service.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl IdentityClient {
    /// Create an identity client from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.identity_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    /// Resolve a session token to a session.
    ///
    /// Callers decide what an empty `user_id` means; here it is just data.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the service rejects the token.
    pub async fn resolve_session(&self, session_id: &str) -> Result<Session, IdentityError> {
        let response: SessionResponse = self
            .call("readSession", &json!({ "sessionId": session_id }))
            .await?;
        Ok(response.session)
    }

    /// Read an account by user id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the account does not exist.
    pub async fn read_account(&self, user_id: &str) -> Result<Account, IdentityError> {
        let response: AccountResponse = self.call("read", &json!({ "id": user_id })).await?;
        Ok(response.account)
    }

    /// Log a user in, creating the account on first use.
    ///
    /// The whole sequence is delegated to the identity service: read the
    /// account by username, create it with a derived email when absent, then
    /// log in. The login payload is returned verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if account creation or login fails.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<serde_json::Value, IdentityError> {
        let existing: Result<AccountResponse, IdentityError> =
            self.call("read", &json!({ "username": username })).await;
        if existing.is_err() {
            let _: serde_json::Value = self
                .call(
                    "create",
                    &json!({
                        "username": username,
                        "email": format!("{username}@{username}.com"),
                        "password": password,
                    }),
                )
                .await?;
        }

        self.call(
            "login",
            &json!({
                "username": username,
                "password": password,
            }),
        )
        .await
    }

    async fn call<B: Serialize, R: DeserializeOwned>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<R, IdentityError> {
        let url = format!("{}/{operation}", self.base_url);
        debug!(url = %url, "identity service call");

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
