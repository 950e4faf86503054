//! Incremental catalog loading with client-side deduplication.
//!
//! The upstream pages are not stable: a page boundary can shift between
//! requests and an exhausted catalog keeps answering with the last page.
//! The engine therefore never trusts page membership -- it tracks every id
//! it has accepted and advances its cursor only when a fetch actually
//! produced something new.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::api::catalog::CatalogApi;
use crate::error::{Error, Result};
use crate::models::CourseSummary;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Outcome of one page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Previously unseen courses were appended; the cursor advanced to
    /// `page`.
    NewCourses { page: u32, count: usize },
    /// The page held nothing new -- a duplicate page or an exhausted
    /// catalog; the upstream response does not distinguish the two. The
    /// cursor is unchanged. Informational, not a failure.
    NoNewCourses { first_page: bool },
}

/// Owns the incremental page cursor, the dedup set, and the locally
/// materialized catalog sequence.
pub struct CatalogSyncEngine {
    client: Arc<dyn CatalogApi>,
    page_size: u32,
    cursor: u32,
    seen_ids: HashSet<String>,
    loaded: Vec<CourseSummary>,
}

impl CatalogSyncEngine {
    pub fn new(client: Arc<dyn CatalogApi>) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
            cursor: 0,
            seen_ids: HashSet::new(),
            loaded: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Last fully loaded page number; 0 before the first successful load.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// All courses loaded so far, in server order, each id exactly once.
    pub fn loaded(&self) -> &[CourseSummary] {
        &self.loaded
    }

    /// Case-insensitive substring match over name, id, teacher, and
    /// category of the loaded sequence. No network. An empty term returns
    /// everything, in loaded order.
    pub fn search(&self, term: &str) -> Vec<&CourseSummary> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.loaded.iter().collect();
        }
        self.loaded
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle)
                    || c.id.to_lowercase().contains(&needle)
                    || c.teacher.to_lowercase().contains(&needle)
                    || c.category.to_lowercase().contains(&needle)
            })
            .collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Drop everything and start over with a new page size.
    ///
    /// Must also be called when the login session changes; loaded pages
    /// from one session are meaningless under another.
    pub fn reset(&mut self, page_size: u32) -> Result<()> {
        if page_size == 0 {
            return Err(Error::Validation(
                "page size must be a positive integer".into(),
            ));
        }
        self.page_size = page_size;
        self.cursor = 0;
        self.seen_ids.clear();
        self.loaded.clear();
        Ok(())
    }

    /// Fetch page `cursor + 1` and merge it into the loaded sequence.
    ///
    /// The cursor advances only when at least one new course was accepted,
    /// so a duplicate page can be retried harmlessly. A fetch failure
    /// mutates nothing.
    pub async fn load_next_page(&mut self, session_id: &str) -> Result<PageOutcome> {
        if session_id.trim().is_empty() {
            return Err(Error::Validation("session credential is empty".into()));
        }

        let page = self.cursor + 1;
        let entries = self
            .client
            .fetch_page(session_id, page, self.page_size)
            .await?;

        let count = self.ingest(&entries);
        if count > 0 {
            self.cursor = page;
            Ok(PageOutcome::NewCourses { page, count })
        } else {
            Ok(PageOutcome::NoNewCourses {
                first_page: page == 1,
            })
        }
    }

    /// Merge raw page entries, skipping duplicates and entries without a
    /// usable id. Returns the number of courses accepted.
    fn ingest(&mut self, entries: &[Value]) -> usize {
        let mut count = 0;
        for entry in entries {
            let course: CourseSummary = match serde_json::from_value(entry.clone()) {
                Ok(course) => course,
                Err(e) => {
                    tracing::warn!("skipping catalog entry without usable id: {e}");
                    continue;
                }
            };
            if self.seen_ids.insert(course.id.clone()) {
                self.loaded.push(course);
                count += 1;
            }
        }
        count
    }
}
