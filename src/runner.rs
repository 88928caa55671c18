//! Continuous task runner.
//!
//! Drives one [`Agent`] against a FIFO task queue on a single background
//! tokio task. Each tick pops at most one task, executes it, records the
//! outcome and then sleeps for the configured interval.
//!
//! # Lifecycle
//! `Idle -> Running -> Idle`. `start()` is a no-op while running. The worker
//! returns to idle on its own once the iteration cap is reached; `stop()`
//! cancels cooperatively and waits a bounded time for the worker to exit.
//! A worker still finishing its task after `stop()` timed out is awaited by
//! the next `start()`, so at most one worker ever executes tasks.
//! The iteration count survives restarts until `reset_iterations()`.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::agents::AgentRef;
use crate::config::{Config, DEFAULT_HISTORY_CAPACITY};

/// Called with `(task, result)` after every successful task.
pub type ResultCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Time between ticks
    pub interval: Duration,
    /// Stop after this many attempted tasks (None = run until stopped)
    pub max_iterations: Option<u64>,
    /// Results kept before the oldest is evicted
    pub history_capacity: usize,
    /// How long `stop()` waits for the worker to exit
    pub stop_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_iterations: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            stop_timeout: Duration::from_secs(5),
        }
    }
}

impl RunnerConfig {
    /// Defaults with the history capacity taken from `Config`.
    pub fn from_config(config: &Config) -> Self {
        Self::default().with_history_capacity(config.history_capacity)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }
}

/// Outcome of one executed task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskOutcome {
    #[serde(rename = "result")]
    Success(String),
    #[serde(rename = "error")]
    Failure(String),
}

/// Recorded outcome of one task. Never modified after it is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub timestamp: DateTime<Utc>,
    pub task: String,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
    /// Iteration count at the time the task was attempted
    pub iteration: u64,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Success(_))
    }

    pub fn result(&self) -> Option<&str> {
        match &self.outcome {
            TaskOutcome::Success(result) => Some(result),
            TaskOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            TaskOutcome::Failure(error) => Some(error),
            TaskOutcome::Success(_) => None,
        }
    }
}

/// Point-in-time snapshot of a runner.
#[derive(Debug, Clone, Serialize)]
pub struct RunnerStatus {
    pub agent_name: String,
    pub is_running: bool,
    pub iteration_count: u64,
    pub tasks_pending: usize,
    pub results_count: usize,
    pub max_iterations: Option<u64>,
    /// Tick interval in seconds
    pub interval: f64,
}

struct Shared {
    agent: AgentRef,
    config: RunnerConfig,
    queue: Mutex<VecDeque<String>>,
    history: RwLock<VecDeque<TaskResult>>,
    callback: RwLock<Option<ResultCallback>>,
    running: AtomicBool,
    iterations: AtomicU64,
    /// Bumped on every start so a stale worker cannot clear `running`
    epoch: AtomicU64,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Background loop executing queued tasks against one agent.
pub struct ContinuousTaskRunner {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl ContinuousTaskRunner {
    pub fn new(agent: AgentRef, config: RunnerConfig) -> Self {
        let capacity = config.history_capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                agent,
                config: RunnerConfig {
                    history_capacity: capacity,
                    ..config
                },
                queue: Mutex::new(VecDeque::new()),
                history: RwLock::new(VecDeque::with_capacity(capacity.min(64))),
                callback: RwLock::new(None),
                running: AtomicBool::new(false),
                iterations: AtomicU64::new(0),
                epoch: AtomicU64::new(0),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Queue a task behind any already pending ones.
    pub async fn add_task(&self, task: impl Into<String>) {
        self.shared.queue.lock().await.push_back(task.into());
    }

    /// Tasks not yet picked up, oldest first.
    pub async fn pending_tasks(&self) -> Vec<String> {
        self.shared.queue.lock().await.iter().cloned().collect()
    }

    pub async fn set_result_callback<F>(&self, callback: F)
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        *self.shared.callback.write().await = Some(Arc::new(callback));
    }

    pub async fn clear_result_callback(&self) {
        *self.shared.callback.write().await = None;
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn iteration_count(&self) -> u64 {
        self.shared.iterations.load(Ordering::SeqCst)
    }

    /// Start a fresh iteration cycle on the next `start()`.
    pub fn reset_iterations(&self) {
        self.shared.iterations.store(0, Ordering::SeqCst);
    }

    /// Spawn the worker. No-op if it is already running.
    ///
    /// If a previous worker outlived its `stop()` timeout, this waits for it
    /// to finish its in-flight task first. Must be called from within a
    /// tokio runtime.
    pub async fn start(&self) {
        let mut worker = self.worker.lock().await;
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }

        // Bump before draining so the old worker cannot clear `running`.
        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = worker.take() {
            previous.cancel.cancel();
            if !previous.handle.is_finished() {
                tracing::info!(
                    "Waiting for previous worker of '{}' to finish its current task",
                    self.shared.agent.name()
                );
            }
            if let Err(e) = previous.handle.await {
                tracing::error!(
                    "Previous task runner worker for '{}' failed: {}",
                    self.shared.agent.name(),
                    e
                );
            }
        }

        let cancel = CancellationToken::new();
        let shared = Arc::clone(&self.shared);
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            run_loop(&shared, &token).await;
            if shared.epoch.load(Ordering::SeqCst) == epoch {
                shared.running.store(false, Ordering::SeqCst);
            }
        });

        tracing::info!(
            "Started task runner for agent '{}' (interval {:?}, max iterations {:?})",
            self.shared.agent.name(),
            self.shared.config.interval,
            self.shared.config.max_iterations
        );
        *worker = Some(Worker { cancel, handle });
    }

    /// Signal the worker to exit and wait up to the stop timeout.
    ///
    /// A task already executing is allowed to finish; if it outlasts the
    /// timeout the worker is kept so the next `start()` can await it. Safe to
    /// call repeatedly or on a runner that never started.
    pub async fn stop(&self) {
        let mut slot = self.worker.lock().await;
        self.shared.running.store(false, Ordering::SeqCst);

        let Some(Worker { cancel, mut handle }) = slot.take() else {
            return;
        };
        cancel.cancel();

        let exited = tokio::time::timeout(self.shared.config.stop_timeout, &mut handle).await;
        match exited {
            Ok(Ok(())) => {
                tracing::info!("Stopped task runner for agent '{}'", self.shared.agent.name());
            }
            Ok(Err(e)) => {
                tracing::error!("Task runner worker for '{}' failed: {}", self.shared.agent.name(), e);
            }
            Err(_) => {
                tracing::warn!(
                    "Task runner for '{}' did not exit within {:?}; leaving it to finish its current task",
                    self.shared.agent.name(),
                    self.shared.config.stop_timeout
                );
                *slot = Some(Worker { cancel, handle });
            }
        }
    }

    /// Recorded results, oldest first.
    pub async fn results(&self) -> Vec<TaskResult> {
        self.shared.history.read().await.iter().cloned().collect()
    }

    pub async fn status(&self) -> RunnerStatus {
        RunnerStatus {
            agent_name: self.shared.agent.name().to_string(),
            is_running: self.is_running(),
            iteration_count: self.iteration_count(),
            tasks_pending: self.shared.queue.lock().await.len(),
            results_count: self.shared.history.read().await.len(),
            max_iterations: self.shared.config.max_iterations,
            interval: self.shared.config.interval.as_secs_f64(),
        }
    }
}

async fn run_loop(shared: &Shared, cancel: &CancellationToken) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        if let Some(max) = shared.config.max_iterations {
            if shared.iterations.load(Ordering::SeqCst) >= max {
                tracing::info!(
                    "Task runner for '{}' reached {} iterations",
                    shared.agent.name(),
                    max
                );
                break;
            }
        }

        let next = shared.queue.lock().await.pop_front();
        if let Some(task) = next {
            run_task(shared, task).await;
            shared.iterations.fetch_add(1, Ordering::SeqCst);
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(shared.config.interval) => {}
        }
    }
}

async fn run_task(shared: &Shared, task: String) {
    let iteration = shared.iterations.load(Ordering::SeqCst);
    tracing::debug!("Executing task {} for '{}': {}", iteration, shared.agent.name(), task);

    let outcome = match AssertUnwindSafe(shared.agent.execute(&task))
        .catch_unwind()
        .await
    {
        Ok(Ok(result)) => TaskOutcome::Success(result),
        Ok(Err(e)) => {
            tracing::warn!("Task '{}' failed: {}", task, e);
            TaskOutcome::Failure(e.to_string())
        }
        Err(_) => {
            tracing::error!("Agent '{}' panicked on task '{}'", shared.agent.name(), task);
            TaskOutcome::Failure("agent panicked while executing task".to_string())
        }
    };

    let callback_result = match &outcome {
        TaskOutcome::Success(result) => Some(result.clone()),
        TaskOutcome::Failure(_) => None,
    };

    {
        let mut history = shared.history.write().await;
        if history.len() >= shared.config.history_capacity {
            history.pop_front();
        }
        history.push_back(TaskResult {
            timestamp: Utc::now(),
            task: task.clone(),
            outcome,
            iteration,
        });
    }

    let Some(result) = callback_result else {
        return;
    };
    let callback = shared.callback.read().await.clone();
    if let Some(callback) = callback {
        if std::panic::catch_unwind(AssertUnwindSafe(|| callback(&task, &result))).is_err() {
            tracing::error!("Result callback panicked for task '{}'", task);
        }
    }
}
