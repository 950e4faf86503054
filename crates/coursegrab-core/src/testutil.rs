//! In-memory doubles for the collaborator traits, shared across unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::catalog::CatalogApi;
use crate::api::grabber::TaskApi;
use crate::api::storage::RemoteStore;
use crate::error::{Error, Result};
use crate::models::{Lesson, Task, TaskDraft, TaskStatus};

/// [`RemoteStore`] backed by a hash map, with a put counter for asserting
/// when persistence happened (or must not have).
#[derive(Default)]
pub(crate) struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
    puts: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn preload(&self, key: &str, value: &str) {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn value_of(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// [`CatalogApi`] driven by scripted responses.
///
/// Page fetches pop from a queue (empty queue means an empty page); lesson
/// fetches look up a per-course script. Calls are recorded for assertions.
#[derive(Default)]
pub(crate) struct ScriptedCatalog {
    pages: Mutex<VecDeque<Result<Vec<Value>>>>,
    lessons: Mutex<HashMap<String, Result<Vec<Lesson>>>>,
    page_calls: Mutex<Vec<(String, u32, u32)>>,
}

impl ScriptedCatalog {
    pub fn push_page(&self, entries: Vec<Value>) {
        self.pages.lock().unwrap().push_back(Ok(entries));
    }

    pub fn push_page_error(&self, status: u16, message: &str) {
        self.pages.lock().unwrap().push_back(Err(Error::Server {
            status,
            message: message.to_string(),
        }));
    }

    pub fn script_lessons(&self, course_id: &str, lessons: Vec<Lesson>) {
        self.lessons
            .lock()
            .unwrap()
            .insert(course_id.to_string(), Ok(lessons));
    }

    pub fn script_lessons_failure(&self, course_id: &str) {
        self.lessons.lock().unwrap().insert(
            course_id.to_string(),
            Err(Error::Server {
                status: 500,
                message: "lesson lookup failed".to_string(),
            }),
        );
    }

    pub fn page_calls(&self) -> Vec<(String, u32, u32)> {
        self.page_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogApi for ScriptedCatalog {
    async fn fetch_page(&self, session_id: &str, page: u32, count: u32) -> Result<Vec<Value>> {
        self.page_calls
            .lock()
            .unwrap()
            .push((session_id.to_string(), page, count));
        match self.pages.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_lessons(&self, _session_id: &str, course_id: &str) -> Result<Vec<Lesson>> {
        match self.lessons.lock().unwrap().remove(course_id) {
            Some(result) => result,
            None => Ok(Vec::new()),
        }
    }
}

/// [`TaskApi`] driven by scripted tasks and statuses, recording commands.
#[derive(Default)]
pub(crate) struct ScriptedTasks {
    tasks: Mutex<Vec<Task>>,
    statuses: Mutex<HashMap<String, TaskStatus>>,
    failing_statuses: Mutex<Vec<String>>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedTasks {
    pub fn add_task(&self, task: Task, status: TaskStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(task.id.clone(), status);
        self.tasks.lock().unwrap().push(task);
    }

    pub fn fail_status_of(&self, task_id: &str) {
        self.failing_statuses.lock().unwrap().push(task_id.to_string());
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn list_count(&self) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.as_str() == "list")
            .count()
    }
}

#[async_trait]
impl TaskApi for ScriptedTasks {
    async fn submit(&self, _draft: &TaskDraft) -> Result<String> {
        self.commands.lock().unwrap().push("submit".to_string());
        Ok("task-new".to_string())
    }

    async fn list(&self) -> Result<Vec<Task>> {
        self.commands.lock().unwrap().push("list".to_string());
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn status(&self, task_id: &str) -> Result<TaskStatus> {
        if self.failing_statuses.lock().unwrap().iter().any(|id| id == task_id) {
            return Err(Error::Server {
                status: 500,
                message: format!("status of {task_id} unavailable"),
            });
        }
        self.statuses
            .lock()
            .unwrap()
            .get(task_id)
            .copied()
            .ok_or_else(|| Error::DataFormat(format!("no scripted status for {task_id}")))
    }

    async fn start(&self, task_id: &str) -> Result<()> {
        self.commands.lock().unwrap().push(format!("start:{task_id}"));
        Ok(())
    }

    async fn cancel(&self, task_id: &str) -> Result<()> {
        self.commands.lock().unwrap().push(format!("cancel:{task_id}"));
        Ok(())
    }

    async fn remove(&self, task_id: &str) -> Result<()> {
        self.commands.lock().unwrap().push(format!("remove:{task_id}"));
        Ok(())
    }
}

/// Build a minimal task for poll tests.
pub(crate) fn sample_task(id: &str) -> Task {
    Task {
        id: id.to_string(),
        session_id: "session".to_string(),
        courses: Vec::new(),
        start_at: None,
        delay: std::time::Duration::from_millis(500),
        retry: true,
    }
}
