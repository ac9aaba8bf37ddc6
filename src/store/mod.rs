//! Record store client.
//!
//! All durable state lives in an external record store exposed over HTTP
//! (`create` / `read` / `update` endpoints, JSON bodies). Records are
//! deserialized into the typed structs in [`crate::feed::models`] right at
//! this boundary; nothing downstream touches untyped maps.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned status {status}: {message}")]
    Status { status: u16, message: String },
}

/// HTTP client for the external record store.
#[derive(Debug, Clone)]
pub struct RecordStore {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl RecordStore {
    /// Create a store client from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.store_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    /// Create a record in a collection. Returns the store's id for it (the
    /// record's own id field when the store echoes it back).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects it.
    pub async fn create<T: Serialize>(
        &self,
        collection: &str,
        record: &T,
    ) -> Result<String, StoreError> {
        let response: CreateResponse = self
            .call(
                "create",
                &json!({
                    "table": collection,
                    "record": record,
                }),
            )
            .await?;
        Ok(response.id)
    }

    /// Read records matching an id exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects it. A
    /// missing record is an empty vec, not an error.
    pub async fn read_by_id<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Vec<T>, StoreError> {
        let response: ReadResponse<T> = self
            .call(
                "read",
                &json!({
                    "table": collection,
                    "id": id,
                }),
            )
            .await?;
        Ok(response.records)
    }

    /// Read records matching a filter, ordered descending by `order_by`,
    /// capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects it.
    pub async fn read<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &Filter,
        order_by: &str,
        limit: u32,
    ) -> Result<Vec<T>, StoreError> {
        let mut body = json!({
            "table": collection,
            "order": "desc",
            "orderBy": order_by,
            "limit": limit,
        });
        if !filter.is_empty() {
            body["query"] = json!(filter.render());
        }

        let response: ReadResponse<T> = self.call("read", &body).await?;
        Ok(response.records)
    }

    /// Replace a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects it.
    pub async fn update<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
    ) -> Result<(), StoreError> {
        let _: serde_json::Value = self
            .call(
                "update",
                &json!({
                    "table": collection,
                    "id": id,
                    "record": record,
                }),
            )
            .await?;
        Ok(())
    }

    async fn call<B: Serialize, R: DeserializeOwned>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<R, StoreError> {
        let url = format!("{}/{operation}", self.base_url);
        debug!(url = %url, "record store call");

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct ReadResponse<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
}

/// Builder for the store's restricted filter grammar: `field OP literal`
/// clauses joined with `and`, string literals single-quoted.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<String>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `field >= value`
    #[must_use]
    pub fn ge(mut self, field: &str, value: i64) -> Self {
        self.clauses.push(format!("{field} >= {value}"));
        self
    }

    /// `field <= value`
    #[must_use]
    pub fn le(mut self, field: &str, value: i64) -> Self {
        self.clauses.push(format!("{field} <= {value}"));
        self
    }

    /// `field == 'value'`
    ///
    /// The grammar has no escape sequence, so embedded single quotes are
    /// dropped from the literal to keep the rendered clause well-formed.
    #[must_use]
    pub fn eq_str(mut self, field: &str, value: &str) -> Self {
        let literal: String = value.chars().filter(|c| *c != '\'').collect();
        self.clauses.push(format!("{field} == '{literal}'"));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Render the combined filter expression.
    #[must_use]
    pub fn render(&self) -> String {
        self.clauses.join(" and ")
    }
}
