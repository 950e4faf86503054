//! Grabber endpoints: task submission, listing, status, and lifecycle
//! commands.
//!
//! Tasks are entirely server-owned. The client submits a draft, polls the
//! collection and per-task status, and issues start/cancel/remove commands;
//! it never mutates a task in place.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{self, expect_ok, read_envelope};
use crate::error::{Error, Result};
use crate::models::{id_string, CourseSummary, Task, TaskDraft, TaskStatus, MIN_GRAB_DELAY};

/// Remote task collection access and lifecycle commands.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Submit a new task; returns the server-assigned task id.
    async fn submit(&self, draft: &TaskDraft) -> Result<String>;

    /// Fetch all tasks, in server order.
    async fn list(&self) -> Result<Vec<Task>>;

    /// Fetch the lifecycle status of one task.
    async fn status(&self, task_id: &str) -> Result<TaskStatus>;

    async fn start(&self, task_id: &str) -> Result<()>;
    async fn cancel(&self, task_id: &str) -> Result<()>;
    async fn remove(&self, task_id: &str) -> Result<()>;
}

/// Encode a delay the way the service expects it: ISO-8601 `PT{n}S`.
pub fn format_grab_delay(delay: Duration) -> String {
    format!("PT{}S", delay.as_secs_f64())
}

/// Decode an ISO-8601 `PT{n}S` delay. Returns `None` for any other shape.
pub fn parse_grab_delay(text: &str) -> Option<Duration> {
    let secs: f64 = text.strip_prefix("PT")?.strip_suffix('S')?.parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

#[derive(Deserialize)]
struct TaskEntry {
    #[serde(deserialize_with = "id_string")]
    key: String,
    value: TaskBody,
}

#[derive(Deserialize)]
struct TaskBody {
    account: AccountWire,
    #[serde(default)]
    config: TaskConfigWire,
    #[serde(default)]
    courses: Vec<CourseSummary>,
}

#[derive(Deserialize)]
struct AccountWire {
    #[serde(default)]
    session_id: String,
}

#[derive(Deserialize)]
struct TaskConfigWire {
    #[serde(default)]
    delay: Option<String>,
    #[serde(default = "default_retry")]
    retry: bool,
    #[serde(default)]
    start_at: Option<DateTime<Utc>>,
}

// Retry defaults on whether the field or the whole config block is absent.
impl Default for TaskConfigWire {
    fn default() -> Self {
        Self {
            delay: None,
            retry: default_retry(),
            start_at: None,
        }
    }
}

fn default_retry() -> bool {
    true
}

/// Decode one `{key, value}` entry of the task collection.
fn task_from_entry(entry: Value) -> Result<Task> {
    let entry: TaskEntry = serde_json::from_value(entry)
        .map_err(|e| Error::DataFormat(format!("bad task entry: {e}")))?;

    let delay = match entry.value.config.delay.as_deref() {
        None => MIN_GRAB_DELAY,
        Some(text) => parse_grab_delay(text).unwrap_or_else(|| {
            tracing::warn!(task_id = %entry.key, delay = text, "unparseable task delay, assuming default");
            MIN_GRAB_DELAY
        }),
    };

    Ok(Task {
        id: entry.key,
        session_id: entry.value.account.session_id,
        courses: entry.value.courses,
        start_at: entry.value.config.start_at,
        delay,
        retry: entry.value.config.retry,
    })
}

/// [`TaskApi`] over the upstream `/grabber` endpoints.
pub struct TaskClient {
    root: String,
    http: Client,
}

impl TaskClient {
    pub fn new(api_root: &str) -> Result<Self> {
        Ok(Self {
            root: api::normalize_root(api_root)?,
            http: Client::new(),
        })
    }
}

#[async_trait]
impl TaskApi for TaskClient {
    async fn submit(&self, draft: &TaskDraft) -> Result<String> {
        if draft.session_id.trim().is_empty() {
            return Err(Error::Validation("session credential is empty".into()));
        }
        if draft.courses.is_empty() {
            return Err(Error::Validation(
                "cannot submit a task with an empty course list".into(),
            ));
        }
        if draft.delay < MIN_GRAB_DELAY {
            return Err(Error::Validation(format!(
                "grab delay must be at least {} seconds",
                MIN_GRAB_DELAY.as_secs_f64()
            )));
        }

        // The submission route wants numeric course ids even though every
        // other surface treats ids as strings.
        let courses = draft
            .courses
            .iter()
            .map(|c| {
                let id: i64 = c.id.trim().parse().map_err(|_| {
                    Error::Validation(format!("course id '{}' is not numeric", c.id))
                })?;
                Ok(json!({
                    "id": id,
                    "name": c.name,
                    "teacher": c.teacher,
                    "category": c.category,
                    "chosen": c.chosen,
                    "limit": c.limit,
                    "source": c.source,
                    "note": c.note,
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        let body = json!({
            "account": {"session_id": draft.session_id},
            "config": {
                "delay": format_grab_delay(draft.delay),
                "retry": draft.retry,
                "start_at": draft.start_at.to_rfc3339(),
            },
            "courses": courses,
        });

        let resp = self
            .http
            .post(format!("{}/grabber", self.root))
            .json(&body)
            .send()
            .await?;

        let envelope = read_envelope(resp).await?;
        match &envelope.data["task_id"] {
            Value::String(id) => Ok(id.clone()),
            Value::Number(id) => Ok(id.to_string()),
            _ => Err(Error::DataFormat(
                "task submission response carries no task_id".into(),
            )),
        }
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let resp = self
            .http
            .get(format!("{}/grabber/", self.root))
            .send()
            .await?;
        let envelope = read_envelope(resp).await?;

        let entries = match envelope.data {
            Value::Array(entries) => entries,
            Value::Null => Vec::new(),
            other => {
                return Err(Error::DataFormat(format!(
                    "expected an array of tasks, got {other}"
                )))
            }
        };

        // A single malformed entry degrades to a warning instead of hiding
        // the whole table.
        let mut tasks = Vec::with_capacity(entries.len());
        for entry in entries {
            match task_from_entry(entry) {
                Ok(task) => tasks.push(task),
                Err(e) => tracing::warn!("skipping malformed task entry: {e}"),
            }
        }
        Ok(tasks)
    }

    async fn status(&self, task_id: &str) -> Result<TaskStatus> {
        let resp = self
            .http
            .get(format!("{}/grabber/{task_id}/status", self.root))
            .send()
            .await?;
        let envelope = read_envelope(resp).await?;

        let code = envelope.data.as_i64().ok_or_else(|| {
            Error::DataFormat(format!("task {task_id}: status is not an integer"))
        })?;
        TaskStatus::from_code(code).ok_or_else(|| {
            Error::DataFormat(format!("task {task_id}: unknown status code {code}"))
        })
    }

    async fn start(&self, task_id: &str) -> Result<()> {
        let resp = self
            .http
            .get(format!("{}/grabber/{task_id}/start", self.root))
            .send()
            .await?;
        expect_ok(resp).await
    }

    async fn cancel(&self, task_id: &str) -> Result<()> {
        let resp = self
            .http
            .get(format!("{}/grabber/{task_id}/cancel", self.root))
            .send()
            .await?;
        expect_ok(resp).await
    }

    async fn remove(&self, task_id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(format!("{}/grabber/{task_id}", self.root))
            .send()
            .await?;
        expect_ok(resp).await
    }
}
