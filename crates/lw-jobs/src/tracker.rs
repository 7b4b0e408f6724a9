//! Job registry and state machine.
//!
//! `pending -> running -> {complete | error}`. Terminal states absorb every
//! later update, `current` never decreases and `total` is fixed once set.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::Stream;
use lw_schemas::Progress;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::channel::progress_stream;

// ---------------------------------------------------------------------------
// Ids / status / errors
// ---------------------------------------------------------------------------

/// Opaque random job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = JobError;

    /// A malformed id can never name a job, so it parses to `NotFound`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(JobId)
            .map_err(|_| JobError::NotFound(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Complete,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Complete => "complete",
            JobStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(String),
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot<T> {
    pub job_id: JobId,
    pub status: JobStatus,
    pub current: usize,
    pub total: usize,
    /// Most recent status lines, oldest first.
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    total_fixed: bool,
}

impl<T> JobSnapshot<T> {
    fn pending(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            current: 0,
            total: 0,
            details: Vec::new(),
            result: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
            total_fixed: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn push_detail(&mut self, line: String, capacity: usize) {
        self.details.push(line);
        if self.details.len() > capacity {
            let excess = self.details.len() - capacity;
            self.details.drain(..excess);
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

type Slots<T> = HashMap<JobId, Arc<watch::Sender<JobSnapshot<T>>>>;

/// Shared job store. Cloning shares the same map.
pub struct JobRegistry<T> {
    slots: Arc<RwLock<Slots<T>>>,
}

impl<T> Clone for JobRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<T> Default for JobRegistry<T> {
    fn default() -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T> JobRegistry<T> {
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Handle (the single writer)
// ---------------------------------------------------------------------------

/// Write side of one job. Given to the worker; also a [`Progress`] sink.
pub struct JobHandle<T> {
    tx: Arc<watch::Sender<JobSnapshot<T>>>,
    detail_capacity: usize,
}

impl<T> Clone for JobHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
            detail_capacity: self.detail_capacity,
        }
    }
}

impl<T> JobHandle<T> {
    pub fn id(&self) -> JobId {
        self.tx.borrow().job_id
    }

    pub fn snapshot(&self) -> JobSnapshot<T>
    where
        T: Clone,
    {
        self.tx.borrow().clone()
    }

    /// Apply `f` unless the job is terminal. Observers are only woken when
    /// something was applied.
    fn update(&self, f: impl FnOnce(&mut JobSnapshot<T>)) {
        self.tx.send_if_modified(|snap| {
            if snap.is_terminal() {
                return false;
            }
            f(snap);
            true
        });
    }

    pub fn mark_running(&self) {
        self.update(|s| {
            if s.status == JobStatus::Pending {
                s.status = JobStatus::Running;
            }
        });
    }

    pub fn complete(&self, result: T) {
        self.update(|s| {
            s.status = JobStatus::Complete;
            s.result = Some(result);
            s.finished_at = Some(Utc::now());
        });
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        let cap = self.detail_capacity;
        self.update(|s| {
            s.status = JobStatus::Error;
            s.push_detail(message.clone(), cap);
            s.error = Some(message);
            s.finished_at = Some(Utc::now());
        });
    }
}

impl<T: Send + Sync> Progress for JobHandle<T> {
    fn begin(&mut self, total: usize) {
        self.update(|s| {
            if !s.total_fixed {
                s.total = total;
                s.total_fixed = true;
            }
        });
    }

    fn log(&mut self, msg: &str) {
        let cap = self.detail_capacity;
        self.update(|s| s.push_detail(msg.to_string(), cap));
    }

    fn item_done(&mut self, detail: &str) {
        let cap = self.detail_capacity;
        self.update(|s| {
            if !s.total_fixed || s.current < s.total {
                s.current += 1;
            }
            s.push_detail(detail.to_string(), cap);
        });
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

pub struct JobTracker<T> {
    registry: JobRegistry<T>,
    detail_capacity: usize,
}

impl<T> Clone for JobTracker<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            detail_capacity: self.detail_capacity,
        }
    }
}

impl<T> JobTracker<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(detail_capacity: usize) -> Self {
        Self::with_registry(JobRegistry::default(), detail_capacity)
    }

    pub fn with_registry(registry: JobRegistry<T>, detail_capacity: usize) -> Self {
        Self {
            registry,
            detail_capacity: detail_capacity.max(1),
        }
    }

    pub fn registry(&self) -> &JobRegistry<T> {
        &self.registry
    }

    /// Register a pending job without starting any work.
    pub async fn create(&self) -> JobHandle<T> {
        let id = JobId::new_random();
        let (tx, _rx) = watch::channel(JobSnapshot::pending(id));
        let tx = Arc::new(tx);
        self.registry.slots.write().await.insert(id, Arc::clone(&tx));
        JobHandle {
            tx,
            detail_capacity: self.detail_capacity,
        }
    }

    /// Register a job and run `work` on its own task. Returns at once.
    ///
    /// The job completes with the work's value or fails with its error
    /// text. A panicking worker fails the job too.
    pub async fn submit<F, Fut, E>(&self, work: F) -> JobId
    where
        F: FnOnce(JobHandle<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let handle = self.create().await;
        let id = handle.id();
        let finisher = handle.clone();
        info!(job_id = %id, "job submitted");

        tokio::spawn(async move {
            finisher.mark_running();
            match tokio::spawn(work(handle)).await {
                Ok(Ok(value)) => {
                    finisher.complete(value);
                    info!(job_id = %id, "job complete");
                }
                Ok(Err(e)) => {
                    warn!(job_id = %id, error = %e, "job failed");
                    finisher.fail(e.to_string());
                }
                Err(join) => {
                    warn!(job_id = %id, error = %join, "job worker aborted");
                    finisher.fail(format!("worker aborted: {join}"));
                }
            }
        });
        id
    }

    pub async fn get_state(&self, id: JobId) -> Result<JobSnapshot<T>, JobError> {
        let slots = self.registry.slots.read().await;
        let tx = slots.get(&id).ok_or_else(|| JobError::NotFound(id.to_string()))?;
        let snap = tx.borrow().clone();
        Ok(snap)
    }

    pub async fn subscribe(&self, id: JobId) -> Result<watch::Receiver<JobSnapshot<T>>, JobError> {
        let slots = self.registry.slots.read().await;
        slots
            .get(&id)
            .map(|tx| tx.subscribe())
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    /// Snapshots of a job up to and including its terminal one.
    pub async fn watch(
        &self,
        id: JobId,
    ) -> Result<impl Stream<Item = JobSnapshot<T>> + Send + 'static, JobError> {
        Ok(progress_stream(self.subscribe(id).await?))
    }

    /// Drop terminal jobs that finished more than `retention` before `now`.
    pub async fn sweep_expired_at(&self, now: DateTime<Utc>, retention: Duration) -> usize {
        let retention =
            chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::weeks(5200));
        let mut slots = self.registry.slots.write().await;
        let before = slots.len();
        slots.retain(|_, tx| {
            let snap = tx.borrow();
            let expired = snap.is_terminal()
                && snap
                    .finished_at
                    .is_some_and(|done| now.signed_duration_since(done) > retention);
            !expired
        });
        before - slots.len()
    }

    pub async fn sweep_expired(&self, retention: Duration) -> usize {
        self.sweep_expired_at(Utc::now(), retention).await
    }
}

/// Periodically remove finished jobs older than `retention`.
pub fn spawn_sweeper<T>(tracker: JobTracker<T>, every: Duration, retention: Duration) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        loop {
            tick.tick().await;
            let removed = tracker.sweep_expired(retention).await;
            if removed > 0 {
                debug!(removed, "expired jobs swept");
            }
        }
    })
}
