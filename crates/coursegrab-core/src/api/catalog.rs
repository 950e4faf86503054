//! Catalog endpoints: paginated course listing and per-course lessons.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::api::{self, read_envelope};
use crate::error::{Error, Result};
use crate::models::Lesson;

/// Read access to the remote course catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch one catalog page as raw entries.
    ///
    /// Entries are returned undecoded; per-entry validation and dedup are
    /// the sync engine's job. An allow-listed or advisory `error` value
    /// does not fail the fetch.
    async fn fetch_page(&self, session_id: &str, page: u32, count: u32) -> Result<Vec<Value>>;

    /// Fetch the lesson list for one course. May legitimately be empty
    /// (course without scheduled lessons).
    async fn fetch_lessons(&self, session_id: &str, course_id: &str) -> Result<Vec<Lesson>>;
}

/// [`CatalogApi`] over the upstream `/eas` endpoints.
pub struct CatalogClient {
    root: String,
    http: Client,
}

impl CatalogClient {
    pub fn new(api_root: &str) -> Result<Self> {
        Ok(Self {
            root: api::normalize_root(api_root)?,
            http: Client::new(),
        })
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn fetch_page(&self, session_id: &str, page: u32, count: u32) -> Result<Vec<Value>> {
        let resp = self
            .http
            .get(format!("{}/eas/courses", self.root))
            .query(&[
                ("count", count.to_string()),
                ("page", page.to_string()),
                ("session_id", session_id.to_string()),
            ])
            .send()
            .await?;

        let envelope = read_envelope(resp).await?;
        if let Some(msg) = envelope.advisory {
            tracing::warn!(page, "catalog page fetch advisory: {msg}");
        }

        match envelope.data {
            Value::Array(entries) => Ok(entries),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::DataFormat(format!(
                "catalog page {page}: expected an array of courses, got {other}"
            ))),
        }
    }

    async fn fetch_lessons(&self, session_id: &str, course_id: &str) -> Result<Vec<Lesson>> {
        let resp = self
            .http
            .get(format!("{}/eas/courses/{course_id}/lessons", self.root))
            .query(&[("session_id", session_id)])
            .send()
            .await?;

        let status = resp.status().as_u16();
        let envelope = read_envelope(resp).await?;

        // Unlike page fetches, an in-band error here means the detail is
        // unusable and the caller must not commit anything built from it.
        if let Some(message) = envelope.advisory {
            return Err(Error::Server { status, message });
        }

        match envelope.data {
            Value::Null => Ok(Vec::new()),
            data => Ok(serde_json::from_value(data).map_err(|e| {
                Error::DataFormat(format!("course {course_id}: bad lesson list: {e}"))
            })?),
        }
    }
}
