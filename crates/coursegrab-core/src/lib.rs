//! # coursegrab Core Library
//!
//! Client-side state synchronization for a course-enrollment grabbing
//! dashboard. The upstream service owns the catalog, the task queue, and
//! durable storage; this library reconciles them against local,
//! user-editable state over a poll-only JSON API.
//!
//! ## Architecture
//!
//! - **Catalog sync**: incremental, deduplicated page loading with
//!   client-side search over the loaded set
//! - **Selection**: an ordered, remotely persisted list of courses to
//!   grab, with reordering operations
//! - **Polling**: one-shot task-table refreshes plus a cancellable
//!   recurring refresh with an independent sub-second progress indicator
//! - **API**: thin `reqwest` clients behind traits so every engine can be
//!   driven against in-memory doubles
//!
//! ## Key Components
//!
//! - [`CatalogSyncEngine`]: page cursor, dedup set, loaded sequence
//! - [`SelectionListManager`]: the persisted selection
//! - [`TaskPollEngine`]: refresh assembly and the auto-refresh timer pair
//! - [`RemoteStore`]: key/value persistence interface

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod poll;
pub mod selection;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use api::catalog::{CatalogApi, CatalogClient};
pub use api::grabber::{TaskApi, TaskClient};
pub use api::storage::{HttpRemoteStore, RemoteStore, SELECTED_COURSES_KEY, SESSION_KEY};
pub use catalog::{CatalogSyncEngine, PageOutcome, DEFAULT_PAGE_SIZE};
pub use config::Config;
pub use error::{Error, Result};
pub use models::{
    CourseSummary, Lesson, LessonDetail, SelectedCourse, SessionBound, SessionRange, Task,
    TaskDraft, TaskStatus, MIN_GRAB_DELAY,
};
pub use poll::{CycleProgress, RefreshListener, TaskPollEngine, TaskRow};
pub use selection::SelectionListManager;
