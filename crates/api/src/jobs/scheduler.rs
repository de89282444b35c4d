//! Periodic background jobs.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Period between two runs of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    Seconds(u64),
    Minutes(u64),
}

impl JobFrequency {
    pub fn duration(&self) -> Duration {
        match *self {
            JobFrequency::Seconds(secs) => Duration::from_secs(secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(mins * 60),
        }
    }
}

/// A unit of background work run on a fixed period.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Label used in logs and the `job` metric tag.
    fn name(&self) -> &'static str;

    fn frequency(&self) -> JobFrequency;

    /// Whether the first execution happens immediately instead of after one period.
    fn run_on_start(&self) -> bool {
        false
    }

    /// One execution. A failure is logged and counted; the job keeps its schedule.
    async fn execute(&self) -> Result<(), String>;
}

/// Runs every registered job on its own task until shut down.
///
/// Runs of one job never overlap: a run is awaited inside the loop and ticks
/// missed while it overran are delayed, not replayed.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    stop: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            stop: watch::Sender::new(false),
            tasks: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");
        for job in &self.jobs {
            let task = tokio::spawn(run_job(Arc::clone(job), self.stop.subscribe()));
            self.tasks.push(task);
        }
    }

    /// Signals every job to stop and waits up to `grace` for running executions.
    pub async fn shutdown(self, grace: Duration) {
        info!(grace = ?grace, "Stopping job scheduler");
        self.stop.send_replace(true);

        let tasks = self.tasks;
        let joined = tokio::time::timeout(grace, async move {
            for task in tasks {
                if let Err(e) = task.await {
                    warn!(error = %e, "Job task panicked");
                }
            }
        })
        .await;

        match joined {
            Ok(()) => info!("All jobs stopped"),
            Err(_) => warn!(grace = ?grace, "Jobs still running after grace period"),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_job(job: Arc<dyn Job>, mut stop: watch::Receiver<bool>) {
    let name = job.name();
    let frequency = job.frequency();
    let mut ticks = tokio::time::interval(frequency.duration());
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    if !job.run_on_start() {
        // Consume the immediate first tick.
        ticks.tick().await;
    }
    info!(job = name, frequency = ?frequency, "Job scheduled");

    loop {
        tokio::select! {
            biased;
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    info!(job = name, "Job stopped");
                    return;
                }
            }
            _ = ticks.tick() => run_once(job.as_ref()).await,
        }
    }
}

async fn run_once(job: &dyn Job) {
    let name = job.name();
    let started = Instant::now();
    let result = job.execute().await;
    let elapsed = started.elapsed();
    metrics::histogram!("job_duration_seconds", "job" => name).record(elapsed.as_secs_f64());

    let elapsed_ms = elapsed.as_millis() as u64;
    match result {
        Ok(()) => info!(job = name, elapsed_ms, "Job run finished"),
        Err(e) => {
            metrics::counter!("job_failures_total", "job" => name).increment(1);
            error!(job = name, elapsed_ms, error = %e, "Job run failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestJob {
        run_count: Arc<AtomicUsize>,
        should_fail: bool,
        on_start: bool,
    }

    #[async_trait::async_trait]
    impl Job for TestJob {
        fn name(&self) -> &'static str {
            "test_job"
        }

        fn frequency(&self) -> JobFrequency {
            JobFrequency::Seconds(3600)
        }

        fn run_on_start(&self) -> bool {
            self.on_start
        }

        async fn execute(&self) -> Result<(), String> {
            self.run_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err("Test failure".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn job(run_count: &Arc<AtomicUsize>, on_start: bool, should_fail: bool) -> TestJob {
        TestJob {
            run_count: Arc::clone(run_count),
            should_fail,
            on_start,
        }
    }

    #[test]
    fn test_job_frequency_duration() {
        assert_eq!(
            JobFrequency::Seconds(30).duration(),
            Duration::from_secs(30)
        );
        assert_eq!(JobFrequency::Minutes(15).duration(), Duration::from_secs(900));
    }

    #[test]
    fn test_scheduler_register() {
        let mut scheduler = JobScheduler::default();
        assert!(scheduler.jobs.is_empty());
        scheduler.register(job(&Arc::new(AtomicUsize::new(0)), false, false));
        assert_eq!(scheduler.jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_run_on_start_executes_immediately() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.register(job(&run_count, true, false));
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.shutdown(Duration::from_secs(2)).await;

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_tick_skipped_without_run_on_start() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.register(job(&run_count, false, false));
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.shutdown(Duration::from_secs(2)).await;

        assert_eq!(run_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_job_keeps_scheduler_alive() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.register(job(&run_count, true, true));
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.shutdown(Duration::from_secs(2)).await;

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_every_job() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let mut scheduler = JobScheduler::new();
        scheduler.register(job(&run_count, true, false));
        scheduler.register(job(&run_count, false, false));
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let tasks: Vec<_> = scheduler.tasks.iter().map(|t| t.abort_handle()).collect();
        scheduler.shutdown(Duration::from_secs(2)).await;
        assert!(tasks.iter().all(|t| t.is_finished()));
    }
}
