use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::{Result, SchedulerError};
use crate::schedule::{compute_next_run, validate};
use crate::types::{JobInfo, Schedule, SchedulerStatus};

/// Work attached to a job. Built once at registration; every firing calls it
/// for a fresh future.
pub type JobHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct Job {
    name: String,
    schedule: Schedule,
    handler: JobHandler,
    next_run: Option<DateTime<Utc>>,
    last_run: Option<DateTime<Utc>>,
    run_count: u32,
    /// Set while a spawned run has not finished. Gives single-flight: a job
    /// whose previous run is still going is skipped, never stacked.
    in_flight: Arc<AtomicBool>,
}

struct Inner {
    jobs: Mutex<HashMap<String, Job>>,
    running: AtomicBool,
    grace: std::time::Duration,
    /// Handles of spawned runs, drained (with the grace period) at shutdown
    /// so an in-flight delivery is not abandoned mid-send.
    spawned: Mutex<Vec<JoinHandle<()>>>,
}

/// Table of named recurring jobs plus the engine loop that drives them.
/// Cloning shares the table; management calls work while the loop runs.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// `grace` bounds how long shutdown waits for in-flight job runs.
    pub fn new(grace: std::time::Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: Mutex::new(HashMap::new()),
                running: AtomicBool::new(false),
                grace,
                spawned: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a recurring job under a caller-chosen id.
    pub fn add_job<F>(&self, id: &str, name: &str, schedule: Schedule, handler: F) -> Result<()>
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        validate(&schedule)?;
        let mut jobs = self.inner.jobs.lock().unwrap();
        if jobs.contains_key(id) {
            return Err(SchedulerError::DuplicateJob { id: id.to_string() });
        }
        let next = compute_next_run(&schedule, Utc::now());
        jobs.insert(
            id.to_string(),
            Job {
                name: name.to_string(),
                schedule,
                handler: Arc::new(handler),
                next_run: next,
                last_run: None,
                run_count: 0,
                in_flight: Arc::new(AtomicBool::new(false)),
            },
        );
        info!(job_id = %id, %name, "job added");
        Ok(())
    }

    /// Cancel a job by id. Returns `JobNotFound` if no entry is removed.
    /// An in-flight run is allowed to finish; it just never reschedules.
    pub fn cancel(&self, id: &str) -> Result<()> {
        let mut jobs = self.inner.jobs.lock().unwrap();
        if jobs.remove(id).is_none() {
            return Err(SchedulerError::JobNotFound { id: id.to_string() });
        }
        info!(job_id = %id, "job cancelled");
        Ok(())
    }

    /// Liveness snapshot for the admin/reporting surface.
    pub fn status(&self) -> SchedulerStatus {
        let jobs = self.inner.jobs.lock().unwrap();
        let mut infos: Vec<JobInfo> = jobs
            .iter()
            .map(|(id, job)| JobInfo {
                id: id.clone(),
                name: job.name.clone(),
                schedule: job.schedule,
                next_run: job.next_run,
                last_run: job.last_run,
                run_count: job.run_count,
                in_flight: job.in_flight.load(Ordering::SeqCst),
            })
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        SchedulerStatus {
            running: self.inner.running.load(Ordering::SeqCst),
            jobs: infos,
        }
    }

    /// Engine loop. Polls every second until `shutdown` broadcasts `true`,
    /// then waits up to the grace period for in-flight runs.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");
        self.inner.running.store(true, Ordering::SeqCst);

        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick(),
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }

        self.drain().await;
        self.inner.running.store(false, Ordering::SeqCst);
    }

    /// Spawn every job whose next_run has arrived.
    fn tick(&self) {
        let now = Utc::now();

        // Collect due work under the lock, spawn outside it.
        let mut due: Vec<(String, JobHandler, Arc<AtomicBool>)> = Vec::new();
        {
            let mut jobs = self.inner.jobs.lock().unwrap();
            for (id, job) in jobs.iter_mut() {
                let fire = matches!(job.next_run, Some(at) if at <= now);
                if !fire {
                    continue;
                }
                // The window advances whether or not we fire; a skipped
                // window is gone, not queued.
                job.next_run = compute_next_run(&job.schedule, now);

                if job.in_flight.load(Ordering::SeqCst) {
                    warn!(job_id = %id, name = %job.name, "previous run still in flight — window skipped");
                    continue;
                }

                job.last_run = Some(now);
                job.run_count += 1;
                job.in_flight.store(true, Ordering::SeqCst);
                due.push((id.clone(), Arc::clone(&job.handler), Arc::clone(&job.in_flight)));
            }
        }

        let mut spawned = self.inner.spawned.lock().unwrap();
        spawned.retain(|h| !h.is_finished());
        for (id, handler, in_flight) in due {
            info!(job_id = %id, "executing job");
            spawned.push(tokio::spawn(async move {
                handler().await;
                in_flight.store(false, Ordering::SeqCst);
            }));
        }
    }

    /// Wait for in-flight runs, bounded by the grace period.
    async fn drain(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.inner.spawned.lock().unwrap());
        if handles.is_empty() {
            return;
        }
        let drain = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    error!("job task panicked: {e}");
                }
            }
        };
        if tokio::time::timeout(self.inner.grace, drain).await.is_err() {
            warn!(
                grace_secs = self.inner.grace.as_secs(),
                "grace period elapsed — abandoning in-flight jobs"
            );
        }
    }
}
