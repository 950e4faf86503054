//! Remote key/value persistence.
//!
//! The dashboard keeps its durable state server-side behind
//! `GET/PUT /storage/{key}`. The store is modeled as a trait so engines can
//! be exercised against an in-memory double; [`HttpRemoteStore`] is the
//! wire implementation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::api::{self, read_envelope};
use crate::error::Result;

/// Storage key holding the authenticated session credential.
pub const SESSION_KEY: &str = "userSessionId";

/// Storage key holding the persisted selection sequence (JSON array).
pub const SELECTED_COURSES_KEY: &str = "userSelectedCourses";

/// Async key/value persistence interface.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// [`RemoteStore`] over the upstream `/storage` endpoints.
pub struct HttpRemoteStore {
    root: String,
    http: Client,
}

impl HttpRemoteStore {
    pub fn new(api_root: &str) -> Result<Self> {
        Ok(Self {
            root: api::normalize_root(api_root)?,
            http: Client::new(),
        })
    }

    fn key_url(&self, key: &str) -> String {
        format!("{}/storage/{key}", self.root)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let resp = self.http.get(self.key_url(key)).send().await?;

        // A key that was never written comes back as not-found.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let envelope = read_envelope(resp).await?;
        Ok(match envelope.data {
            Value::Null => None,
            Value::String(s) => Some(s),
            // The server may hand structured values back; re-serialize so
            // callers always see the stored text form.
            other => Some(other.to_string()),
        })
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let resp = self
            .http
            .put(self.key_url(key))
            .body(value.to_string())
            .send()
            .await?;
        api::expect_ok(resp).await
    }
}
