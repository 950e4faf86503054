//! Grab task commands.

use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use clap::Subcommand;
use coursegrab_core::{
    session, Config, RefreshListener, SelectionListManager, TaskDraft, TaskPollEngine,
};
use std::sync::Arc;

use super::common::{clients, print_task_row, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Fetch and print the task table once
    List,
    /// Submit the current selection as a new grab task
    Submit {
        /// Start time, local, `YYYY-MM-DD HH:MM:SS`
        start_at: String,
        /// Delay between enrollment attempts, in seconds
        #[arg(long, default_value_t = 0.5)]
        delay: f64,
        /// Do not retry failed attempts
        #[arg(long)]
        no_retry: bool,
    },
    /// Start a task
    Start { id: String },
    /// Stop a task
    Stop { id: String },
    /// Remove a task
    Remove { id: String },
    /// Keep the task table refreshed until interrupted
    Watch {
        /// Refresh interval in seconds (defaults to the configured value)
        #[arg(long)]
        interval: Option<f64>,
    },
}

pub async fn run(config: &Config, action: TaskAction) -> CliResult {
    let (store, catalog, tasks) = clients(config)?;
    let mut engine = TaskPollEngine::new(tasks);

    match action {
        TaskAction::List => {
            for row in engine.refresh_once().await? {
                print_task_row(&row);
            }
        }
        TaskAction::Submit {
            start_at,
            delay,
            no_retry,
        } => {
            let start_at = parse_local_time(&start_at)?;
            let credential = session::require_session(store.as_ref()).await?;

            let mut selection = SelectionListManager::new(catalog, store.clone());
            selection.load().await?;

            let mut draft = TaskDraft::new(credential, start_at, selection.summaries());
            draft.delay = Duration::from_secs_f64(delay);
            draft.retry = !no_retry;

            let task_id = engine.submit(&draft).await?;
            println!("task {task_id} submitted");
        }
        TaskAction::Start { id } => {
            for row in engine.start_task(&id).await? {
                print_task_row(&row);
            }
        }
        TaskAction::Stop { id } => {
            for row in engine.stop_task(&id).await? {
                print_task_row(&row);
            }
        }
        TaskAction::Remove { id } => {
            for row in engine.remove_task(&id).await? {
                print_task_row(&row);
            }
        }
        TaskAction::Watch { interval } => {
            for row in engine.refresh_once().await? {
                print_task_row(&row);
            }

            let listener: RefreshListener = Arc::new(|result| match result {
                Ok(rows) => {
                    println!("---");
                    for row in &rows {
                        print_task_row(row);
                    }
                }
                Err(e) => eprintln!("refresh failed: {e}"),
            });
            engine.start_auto_refresh(interval.unwrap_or(config.refresh_secs), listener)?;

            tokio::signal::ctrl_c().await?;
            engine.stop_auto_refresh();
        }
    }
    Ok(())
}

/// Parse a local `YYYY-MM-DD HH:MM:SS` timestamp into UTC.
fn parse_local_time(text: &str) -> Result<chrono::DateTime<Utc>, Box<dyn std::error::Error>> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|_| format!("start time must be `YYYY-MM-DD HH:MM:SS`, got '{text}'"))?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("'{text}' is not a valid local time"))?;
    Ok(local.with_timezone(&Utc))
}
