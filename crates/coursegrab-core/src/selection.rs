//! The ordered, persisted selection of courses to grab.
//!
//! Position is priority: the grabber attempts courses in sequence order, so
//! every reordering operation persists the whole sequence, not a diff. The
//! persisted form is one JSON array under a fixed storage key.

use std::sync::Arc;

use crate::api::catalog::CatalogApi;
use crate::api::storage::{RemoteStore, SELECTED_COURSES_KEY};
use crate::error::{Error, Result};
use crate::models::{CourseSummary, LessonDetail, SelectedCourse};
use crate::session::require_session;

/// Owns the ordered selection sequence. One instance per dashboard; state
/// is never shared through globals.
pub struct SelectionListManager {
    catalog: Arc<dyn CatalogApi>,
    store: Arc<dyn RemoteStore>,
    courses: Vec<SelectedCourse>,
}

impl SelectionListManager {
    pub fn new(catalog: Arc<dyn CatalogApi>, store: Arc<dyn RemoteStore>) -> Self {
        Self {
            catalog,
            store,
            courses: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn courses(&self) -> &[SelectedCourse] {
        &self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.courses.iter().any(|c| c.id() == id)
    }

    /// Summary-only view of the selection, for task submission.
    pub fn summaries(&self) -> Vec<CourseSummary> {
        self.courses.iter().map(|c| c.course.clone()).collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the in-memory sequence with the persisted one.
    ///
    /// Corrupt persisted data (non-JSON, or JSON that is not an array of
    /// course records) resets to an empty selection with a logged warning;
    /// it is never surfaced as an error.
    pub async fn load(&mut self) -> Result<()> {
        self.courses = match self.store.get(SELECTED_COURSES_KEY).await? {
            None => Vec::new(),
            Some(text) => match serde_json::from_str::<Vec<SelectedCourse>>(&text) {
                Ok(courses) => courses,
                Err(e) => {
                    tracing::warn!("persisted selection is corrupt, resetting to empty: {e}");
                    Vec::new()
                }
            },
        };
        Ok(())
    }

    /// Select a course.
    ///
    /// Rejects an id that is already selected. Scheduling detail is
    /// resolved before anything is committed; a failed resolution aborts
    /// the add entirely, so no partial record is ever stored. A course with
    /// no scheduled lessons gets the unknown-schedule sentinel.
    ///
    /// The duplicate check is a point-in-time look at the in-memory
    /// sequence, not a transaction: two concurrent adds of the same id are
    /// not defended against here. The UI serializes user actions.
    pub async fn add(&mut self, summary: CourseSummary) -> Result<()> {
        if self.contains(&summary.id) {
            return Err(Error::Validation(format!(
                "course {} ({}) is already selected",
                summary.name, summary.id
            )));
        }

        let session = require_session(self.store.as_ref()).await?;
        let lessons = self.catalog.fetch_lessons(&session, &summary.id).await?;
        let detail = LessonDetail::from_lessons(&lessons);

        let previous = self.courses.clone();
        self.courses.push(SelectedCourse {
            course: summary,
            detail,
        });
        self.commit(previous).await
    }

    /// Remove a course by id. Returns whether a removal occurred; removing
    /// an absent id is a reported no-op, not an error.
    pub async fn remove(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };
        let previous = self.courses.clone();
        self.courses.remove(index);
        self.commit(previous).await?;
        Ok(true)
    }

    /// Swap a course with its predecessor. No-op when the course is first
    /// or absent.
    pub async fn move_up(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.index_of(id).filter(|&i| i > 0) else {
            return Ok(false);
        };
        let previous = self.courses.clone();
        self.courses.swap(index - 1, index);
        self.commit(previous).await?;
        Ok(true)
    }

    /// Relocate a course to the front, shifting the ones before it down one
    /// position each. No-op when the course is first or absent.
    pub async fn pin_to_top(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.index_of(id).filter(|&i| i > 0) else {
            return Ok(false);
        };
        let previous = self.courses.clone();
        let course = self.courses.remove(index);
        self.courses.insert(0, course);
        self.commit(previous).await?;
        Ok(true)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn index_of(&self, id: &str) -> Option<usize> {
        self.courses.iter().position(|c| c.id() == id)
    }

    /// Persist the whole sequence; on failure, restore `previous` so the
    /// in-memory order never diverges from the stored one.
    async fn commit(&mut self, previous: Vec<SelectedCourse>) -> Result<()> {
        let text = serde_json::to_string(&self.courses)?;
        match self.store.put(SELECTED_COURSES_KEY, &text).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.courses = previous;
                Err(e)
            }
        }
    }
}
