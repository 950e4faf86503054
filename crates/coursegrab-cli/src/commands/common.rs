//! Helpers shared by the CLI commands.

use std::error::Error;
use std::sync::Arc;

use coursegrab_core::{
    CatalogClient, Config, CourseSummary, HttpRemoteStore, SelectedCourse, TaskClient, TaskRow,
    TaskStatus,
};

pub type CliResult = Result<(), Box<dyn Error>>;

/// Build the HTTP collaborators from the configuration.
pub fn clients(
    config: &Config,
) -> Result<(Arc<HttpRemoteStore>, Arc<CatalogClient>, Arc<TaskClient>), Box<dyn Error>> {
    Ok((
        Arc::new(HttpRemoteStore::new(&config.api_root)?),
        Arc::new(CatalogClient::new(&config.api_root)?),
        Arc::new(TaskClient::new(&config.api_root)?),
    ))
}

/// Compress a normalized week list into ranges: `[1,2,3,5]` -> `"1-3, 5"`.
pub fn format_weeks(weeks: &[u32]) -> String {
    if weeks.is_empty() {
        return "?".to_string();
    }
    let mut parts: Vec<String> = Vec::new();
    let mut start = weeks[0];
    let mut prev = weeks[0];
    for &week in &weeks[1..] {
        if week != prev + 1 {
            parts.push(range_part(start, prev));
            start = week;
        }
        prev = week;
    }
    parts.push(range_part(start, prev));
    parts.join(", ")
}

fn range_part(start: u32, end: u32) -> String {
    if start == end {
        format!("{start}")
    } else {
        format!("{start}-{end}")
    }
}

pub fn print_course(course: &CourseSummary) {
    println!(
        "{:<12} {:<32} {:<12} {:<12} {}/{}",
        course.id, course.name, course.teacher, course.category, course.chosen, course.limit
    );
}

pub fn print_selected(index: usize, selected: &SelectedCourse) {
    let detail = &selected.detail;
    println!(
        "{:>2}. {} ({}) -- {} -- weeks {}, day {}, periods {}-{}",
        index + 1,
        selected.course.name,
        selected.course.id,
        selected.course.teacher,
        format_weeks(&detail.weeks),
        detail.day.map_or("?".to_string(), |d| d.to_string()),
        detail.sessions.start,
        detail.sessions.end,
    );
}

pub fn status_text(status: Option<TaskStatus>) -> &'static str {
    match status {
        Some(status) => status.label(),
        None => "unknown",
    }
}

pub fn print_task_row(row: &TaskRow) {
    let task = &row.task;
    let start = task
        .start_at
        .map_or("-".to_string(), |at| at.to_rfc3339());
    println!(
        "{:<12} {:<9} start {:<25} delay {:>5.1}s retry {:<5} courses {}",
        task.id,
        status_text(row.status),
        start,
        task.delay.as_secs_f64(),
        task.retry,
        task.courses
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
}
