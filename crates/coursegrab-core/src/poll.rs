//! Task polling: one-shot refresh assembly and the auto-refresh timer pair.
//!
//! The engine is either idle (no timers) or polling (exactly one refresh
//! timer plus one progress timer). The progress timer runs at 100 ms and is
//! deliberately decoupled from the refresh interval so the indicator stays
//! smooth regardless of how long a refresh takes; each completed refresh
//! resets it for the next cycle.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::api::grabber::TaskApi;
use crate::error::{Error, Result};
use crate::models::{Task, TaskDraft, TaskStatus};

/// Progress timer period: ten ticks per second.
const PROGRESS_TICK: Duration = Duration::from_millis(100);

/// One task-table row: a task plus its independently fetched status.
/// `None` means the status fetch failed and the row degraded to unknown.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub task: Task,
    pub status: Option<TaskStatus>,
}

/// Receives the result of every auto-refresh cycle.
pub type RefreshListener = Arc<dyn Fn(Result<Vec<TaskRow>>) + Send + Sync>;

/// Progress through the current refresh cycle, shared with whatever renders
/// the indicator.
#[derive(Debug, Default)]
pub struct CycleProgress {
    ticks: AtomicU32,
    total: AtomicU32,
}

impl CycleProgress {
    fn arm(&self, total: u32) {
        self.total.store(total, Ordering::SeqCst);
        self.ticks.store(0, Ordering::SeqCst);
    }

    /// Advance one tick, saturating at the cycle total.
    fn tick(&self) {
        let total = self.total.load(Ordering::SeqCst);
        let ticks = self.ticks.load(Ordering::SeqCst);
        if ticks < total {
            self.ticks.store(ticks + 1, Ordering::SeqCst);
        }
    }

    fn reset_ticks(&self) {
        self.ticks.store(0, Ordering::SeqCst);
    }

    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// 0.0 .. 100.0 progress within the current cycle.
    pub fn percentage(&self) -> f64 {
        let total = self.total.load(Ordering::SeqCst);
        if total == 0 {
            return 0.0;
        }
        (self.ticks.load(Ordering::SeqCst) as f64 / total as f64 * 100.0).min(100.0)
    }
}

struct TimerPair {
    refresh: JoinHandle<()>,
    progress: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
}

/// Coordinates one-shot refreshes and the optional recurring refresh.
pub struct TaskPollEngine {
    client: Arc<dyn TaskApi>,
    timers: Option<TimerPair>,
    progress: Arc<CycleProgress>,
}

impl TaskPollEngine {
    pub fn new(client: Arc<dyn TaskApi>) -> Self {
        Self {
            client,
            timers: None,
            progress: Arc::new(CycleProgress::default()),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_polling(&self) -> bool {
        self.timers.is_some()
    }

    /// Shared handle to the cycle progress indicator.
    pub fn progress(&self) -> Arc<CycleProgress> {
        self.progress.clone()
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Fetch the task collection and each task's status.
    ///
    /// Valid whether or not auto-refresh is running and does not interact
    /// with it. A failed status fetch degrades that single row to unknown
    /// instead of aborting the refresh; rows come back in server order.
    pub async fn refresh_once(&self) -> Result<Vec<TaskRow>> {
        assemble_rows(self.client.as_ref()).await
    }

    /// Arm the refresh/progress timer pair.
    ///
    /// Rejects non-finite intervals and anything under one second. If a
    /// pair is already running it is fully stopped first -- there is never
    /// more than one live pair, so restarting cannot double the progress
    /// speed or leak a timer.
    pub fn start_auto_refresh(
        &mut self,
        interval_secs: f64,
        listener: RefreshListener,
    ) -> Result<()> {
        if !interval_secs.is_finite() {
            return Err(Error::Validation(
                "refresh interval must be a number".into(),
            ));
        }
        if interval_secs < 1.0 {
            return Err(Error::Validation(
                "refresh interval must be at least 1 second".into(),
            ));
        }

        self.stop_auto_refresh();
        self.progress.arm((interval_secs * 10.0).round() as u32);

        let cancelled = Arc::new(AtomicBool::new(false));

        let progress = self.progress.clone();
        let flag = cancelled.clone();
        let progress_handle = tokio::spawn(async move {
            let mut ticker = time::interval(PROGRESS_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // the immediate tick; the cycle starts at zero
            loop {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                progress.tick();
            }
        });

        let client = self.client.clone();
        let progress = self.progress.clone();
        let flag = cancelled.clone();
        let refresh_handle = tokio::spawn(async move {
            let mut ticker = time::interval(Duration::from_secs_f64(interval_secs));
            // A refresh that overruns its interval delays the next cycle
            // instead of firing a burst to catch up; at most one fetch is
            // in flight.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                let result = assemble_rows(client.as_ref()).await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                progress.reset_ticks();
                listener(result);
            }
        });

        self.timers = Some(TimerPair {
            refresh: refresh_handle,
            progress: progress_handle,
            cancelled,
        });
        Ok(())
    }

    /// Cancel both timers and reset the progress indicator.
    ///
    /// Safe no-op when idle. The cancellation flag is set before the tasks
    /// are aborted and checked before every listener delivery, so no
    /// refresh or progress callback lands after this returns -- including
    /// one already scheduled for the current tick.
    pub fn stop_auto_refresh(&mut self) {
        if let Some(pair) = self.timers.take() {
            pair.cancelled.store(true, Ordering::SeqCst);
            pair.refresh.abort();
            pair.progress.abort();
        }
        self.progress.reset_ticks();
    }

    // ── Task commands ────────────────────────────────────────────────

    /// Submit a new task; returns the server-assigned id.
    pub async fn submit(&self, draft: &TaskDraft) -> Result<String> {
        self.client.submit(draft).await
    }

    /// Start a task, then refresh so the caller sees the new state.
    pub async fn start_task(&self, task_id: &str) -> Result<Vec<TaskRow>> {
        self.client.start(task_id).await?;
        self.refresh_once().await
    }

    /// Stop a task, then refresh.
    pub async fn stop_task(&self, task_id: &str) -> Result<Vec<TaskRow>> {
        self.client.cancel(task_id).await?;
        self.refresh_once().await
    }

    /// Remove a task, then refresh.
    pub async fn remove_task(&self, task_id: &str) -> Result<Vec<TaskRow>> {
        self.client.remove(task_id).await?;
        self.refresh_once().await
    }
}

impl Drop for TaskPollEngine {
    fn drop(&mut self) {
        self.stop_auto_refresh();
    }
}

async fn assemble_rows(client: &dyn TaskApi) -> Result<Vec<TaskRow>> {
    let tasks = client.list().await?;
    let mut rows = Vec::with_capacity(tasks.len());
    for task in tasks {
        let status = match client.status(&task.id).await {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::warn!(task_id = %task.id, "status fetch failed, degrading row: {e}");
                None
            }
        };
        rows.push(TaskRow { task, status });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sample_task, ScriptedTasks};
    use std::sync::atomic::AtomicUsize;

    fn engine() -> (TaskPollEngine, Arc<ScriptedTasks>) {
        let client = Arc::new(ScriptedTasks::default());
        (TaskPollEngine::new(client.clone()), client)
    }

    fn counting_listener() -> (RefreshListener, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let listener: RefreshListener = Arc::new(move |_result| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (listener, count)
    }

    #[test]
    fn test_cycle_progress_saturates() {
        let progress = CycleProgress::default();
        progress.arm(10);
        for _ in 0..25 {
            progress.tick();
        }
        assert_eq!(progress.ticks(), 10);
        assert_eq!(progress.percentage(), 100.0);
    }

    #[test]
    fn test_unarmed_progress_is_zero() {
        let progress = CycleProgress::default();
        assert_eq!(progress.percentage(), 0.0);
    }

    #[tokio::test]
    async fn test_rejects_bad_intervals() {
        let (mut engine, _client) = engine();
        let (listener, _count) = counting_listener();

        for bad in [0.0, 0.5, 0.99, -3.0, f64::NAN, f64::INFINITY] {
            assert!(
                engine.start_auto_refresh(bad, listener.clone()).is_err(),
                "interval {bad} should be rejected"
            );
            assert!(!engine.is_polling());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_refresh_fires_each_interval() {
        let (mut engine, client) = engine();
        client.add_task(sample_task("t1"), TaskStatus::Waiting);
        let (listener, count) = counting_listener();

        engine.start_auto_refresh(2.0, listener).unwrap();
        assert!(engine.is_polling());

        time::sleep(Duration::from_millis(2_050)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        engine.stop_auto_refresh();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_first_tick_suppresses_callback() {
        let (mut engine, _client) = engine();
        let (listener, count) = counting_listener();

        engine.start_auto_refresh(5.0, listener).unwrap();
        engine.stop_auto_refresh();
        assert!(!engine.is_polling());

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(engine.progress().ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_timer_pair() {
        let (mut engine, _client) = engine();
        let (first_listener, first_count) = counting_listener();
        let (second_listener, second_count) = counting_listener();

        engine.start_auto_refresh(1.0, first_listener).unwrap();
        engine.start_auto_refresh(1.0, second_listener).unwrap();

        time::sleep(Duration::from_millis(3_050)).await;

        // The first pair was fully stopped: only the second listener runs,
        // at single speed.
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 3);

        engine.stop_auto_refresh();
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_advances_and_resets_each_cycle() {
        let (mut engine, _client) = engine();
        let (listener, count) = counting_listener();

        engine.start_auto_refresh(1.0, listener).unwrap();
        let progress = engine.progress();

        time::sleep(Duration::from_millis(550)).await;
        assert_eq!(progress.ticks(), 5);
        assert_eq!(progress.percentage(), 50.0);

        // Past the interval boundary the refresh has fired and reset the
        // indicator for the next cycle. The progress tick scheduled for the
        // boundary instant may land on either side of the reset.
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(progress.ticks() <= 1);

        engine.stop_auto_refresh();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle_is_a_no_op() {
        let (mut engine, _client) = engine();
        engine.stop_auto_refresh();
        engine.stop_auto_refresh();
        assert!(!engine.is_polling());
    }

    #[tokio::test]
    async fn test_refresh_once_degrades_failed_status_rows() {
        let (engine, client) = engine();
        client.add_task(sample_task("t1"), TaskStatus::Running);
        client.add_task(sample_task("t2"), TaskStatus::Idle);
        client.fail_status_of("t2");

        let rows = engine.refresh_once().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].task.id, "t1");
        assert_eq!(rows[0].status, Some(TaskStatus::Running));
        assert_eq!(rows[1].task.id, "t2");
        assert_eq!(rows[1].status, None);
    }

    #[tokio::test]
    async fn test_commands_trigger_refresh() {
        let (engine, client) = engine();
        client.add_task(sample_task("t1"), TaskStatus::Idle);

        let rows = engine.start_task("t1").await.unwrap();
        assert_eq!(rows.len(), 1);

        engine.stop_task("t1").await.unwrap();
        engine.remove_task("t1").await.unwrap();

        let commands = client.commands();
        assert!(commands.contains(&"start:t1".to_string()));
        assert!(commands.contains(&"cancel:t1".to_string()));
        assert!(commands.contains(&"remove:t1".to_string()));
        assert_eq!(client.list_count(), 3);
    }
}
