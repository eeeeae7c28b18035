//! The worker execution engine - runs the pull/compute/report loop.

use std::time::Duration;

use async_trait::async_trait;
use paral_core::{TaskAssignment, TaskId, TaskReport};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Where a worker pulls tasks from and reports results to.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Fetch one dispatchable task, if any.
    async fn fetch_task(&self) -> anyhow::Result<Option<TaskAssignment>>;

    /// Report the outcome of a task.
    async fn report(&self, report: TaskReport) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: TaskSource + ?Sized> TaskSource for std::sync::Arc<T> {
    async fn fetch_task(&self) -> anyhow::Result<Option<TaskAssignment>> {
        (**self).fetch_task().await
    }

    async fn report(&self, report: TaskReport) -> anyhow::Result<()> {
        (**self).report(report).await
    }
}

/// Configuration for the execution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delay before polling again when idle or after a transport error
    pub poll_interval: Duration,
    /// Max tasks to execute before stopping (None = infinite)
    pub max_cycles: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_cycles: None,
        }
    }
}

/// Result of a single execution cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleResult {
    /// Task computed and reported as completed
    Completed {
        /// Executed task
        task_id: TaskId,
        /// Computed value
        result: f64,
    },
    /// Task computed and reported as failed
    Failed {
        /// Executed task
        task_id: TaskId,
        /// Why the computation failed
        reason: String,
    },
    /// No task was available
    Idle,
}

/// A single worker.
///
/// Runs the loop:
/// ```text
/// Fetch Task → Hold operation_time → Compute → Report
/// ```
pub struct ExecutionEngine<S: TaskSource> {
    source: S,
    config: EngineConfig,
    worker: usize,
    cycles_run: usize,
}

impl<S: TaskSource> ExecutionEngine<S> {
    /// Create a new execution engine.
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: EngineConfig::default(),
            worker: 0,
            cycles_run: 0,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the worker number used in logs.
    pub fn with_worker_id(mut self, worker: usize) -> Self {
        self.worker = worker;
        self
    }

    /// Run one execution cycle.
    pub async fn run_cycle(&mut self) -> anyhow::Result<CycleResult> {
        let Some(task) = self.source.fetch_task().await? else {
            return Ok(CycleResult::Idle);
        };

        debug!(worker = self.worker, task_id = %task.id, "executing {} {} {}", task.arg1, task.operation, task.arg2);
        tokio::time::sleep(task.operation_time).await;

        let (report, outcome) = match task.operation.apply(task.arg1, task.arg2) {
            Ok(result) => (
                TaskReport::completed(task.id, result),
                CycleResult::Completed { task_id: task.id, result },
            ),
            Err(e) => {
                warn!(worker = self.worker, task_id = %task.id, "task failed: {}", e);
                (
                    TaskReport::failed(task.id, e.to_string()),
                    CycleResult::Failed { task_id: task.id, reason: e.to_string() },
                )
            }
        };

        self.source.report(report).await?;
        self.cycles_run += 1;
        Ok(outcome)
    }

    /// Run until `max_cycles` tasks were executed or `shutdown` flips to true.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let worker = self.worker;
        info!(worker, "worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Some(max) = self.config.max_cycles {
                if self.cycles_run >= max {
                    info!(worker, "Reached max cycles ({})", max);
                    break;
                }
            }

            let idle = tokio::select! {
                _ = shutdown.changed() => break,
                cycle = self.run_cycle() => match cycle {
                    Ok(CycleResult::Idle) => true,
                    Ok(_) => false,
                    Err(e) => {
                        error!(worker, "Cycle error: {:#}", e);
                        true
                    }
                },
            };

            if idle {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
            }
        }

        info!(worker, cycles = self.cycles_run, "worker stopped");
        Ok(())
    }

    /// Tasks executed so far.
    pub fn cycles(&self) -> usize {
        self.cycles_run
    }

    /// Get a reference to the task source.
    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paral_core::{ExpressionId, Operation, ReportStatus};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockSource {
        queue: Mutex<VecDeque<TaskAssignment>>,
        reports: Mutex<Vec<TaskReport>>,
    }

    impl MockSource {
        fn with(tasks: Vec<TaskAssignment>) -> Self {
            Self { queue: Mutex::new(tasks.into()), reports: Mutex::default() }
        }
    }

    #[async_trait]
    impl TaskSource for MockSource {
        async fn fetch_task(&self) -> anyhow::Result<Option<TaskAssignment>> {
            Ok(self.queue.lock().unwrap().pop_front())
        }

        async fn report(&self, report: TaskReport) -> anyhow::Result<()> {
            self.reports.lock().unwrap().push(report);
            Ok(())
        }
    }

    fn assignment(operation: Operation, arg1: f64, arg2: f64) -> TaskAssignment {
        TaskAssignment {
            id: TaskId::new(),
            expression_id: ExpressionId::new(),
            operation,
            arg1,
            arg2,
            operation_time: Duration::ZERO,
        }
    }

    fn fast() -> EngineConfig {
        EngineConfig { poll_interval: Duration::from_millis(1), max_cycles: None }
    }

    #[tokio::test]
    async fn test_idle_when_no_task() {
        let mut engine = ExecutionEngine::new(MockSource::default());
        assert_eq!(engine.run_cycle().await.unwrap(), CycleResult::Idle);
        assert_eq!(engine.cycles(), 0);
    }

    #[tokio::test]
    async fn test_computes_and_reports() {
        let task = assignment(Operation::Subtract, 10.0, 4.0);
        let mut engine = ExecutionEngine::new(MockSource::with(vec![task.clone()]));

        assert_eq!(
            engine.run_cycle().await.unwrap(),
            CycleResult::Completed { task_id: task.id, result: 6.0 }
        );
        let reports = engine.source().reports.lock().unwrap().clone();
        assert_eq!(reports, vec![TaskReport::completed(task.id, 6.0)]);
    }

    #[tokio::test]
    async fn test_division_by_zero_reports_error() {
        let task = assignment(Operation::Divide, 1.0, 0.0);
        let mut engine = ExecutionEngine::new(MockSource::with(vec![task.clone()]));

        let cycle = engine.run_cycle().await.unwrap();
        assert!(matches!(cycle, CycleResult::Failed { task_id, .. } if task_id == task.id));

        let reports = engine.source().reports.lock().unwrap().clone();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, ReportStatus::Error);
        assert_eq!(reports[0].error.as_deref(), Some("division by zero"));
    }

    #[tokio::test]
    async fn test_run_stops_after_max_cycles() {
        let tasks = vec![
            assignment(Operation::Add, 1.0, 1.0),
            assignment(Operation::Add, 2.0, 2.0),
            assignment(Operation::Add, 3.0, 3.0),
        ];
        let mut engine = ExecutionEngine::new(MockSource::with(tasks))
            .with_config(EngineConfig { max_cycles: Some(2), ..fast() });

        let (_tx, rx) = watch::channel(false);
        engine.run(rx).await.unwrap();

        assert_eq!(engine.cycles(), 2);
        assert_eq!(engine.source().queue.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut engine = ExecutionEngine::new(MockSource::default()).with_config(fast());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            engine.run(rx).await.unwrap();
            engine.cycles()
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        assert_eq!(handle.await.unwrap(), 0);
    }
}
