//! Fixed-capacity background executor for moderation jobs.
//!
//! Jobs enter through an unbounded intake queue and are pulled by a
//! fixed set of worker tasks, so at most `workers` moderation runs are
//! in flight at once. Every outcome is multiplexed onto a single
//! completion channel consumed by the coordinator.
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::model::{Entity, Job, JobKind};
use crate::moderate::{self, ModerationError};
use crate::predict::{CountryService, ToxicityService};

/// Worker count used when the configuration does not override it.
pub const DEFAULT_WORKERS: usize = 10;

/// Services and policy shared by every worker.
#[derive(Clone)]
pub struct PoolDeps {
    pub toxicity: Arc<dyn ToxicityService>,
    pub country: Arc<dyn CountryService>,
    pub toxicity_threshold: f64,
}

#[derive(Debug)]
pub enum CompletionError {
    /// Content decision: the draft was rejected by policy.
    Rejected { reason: String },
    /// Operational failure; the job is dropped, not requeued.
    Failed { error: anyhow::Error },
}

/// One entry of the completion stream. Carries enough of the original
/// draft (owner, kind, user-facing summary) to notify on rejection
/// without touching the entity again.
#[derive(Debug)]
pub struct Completion {
    pub job_id: Uuid,
    pub job_kind: JobKind,
    pub credential: String,
    pub user_id: i64,
    pub entity_kind: &'static str,
    pub summary: String,
    pub outcome: Result<Entity, CompletionError>,
}

/// Handle to the running pool. Constructed explicitly at bootstrap and
/// injected where submission is needed; dropping it (or calling
/// `shutdown`) closes the intake queue and lets workers drain.
pub struct TaskPool {
    tx: mpsc::UnboundedSender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskPool {
    /// Spawn `workers` worker tasks over a shared intake queue. Returns
    /// the pool handle and the single completion stream.
    pub fn spawn(workers: usize, deps: PoolDeps) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let (done_tx, done_rx) = mpsc::unbounded_channel::<Completion>();
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers)
            .map(|worker_id| {
                let rx = Arc::clone(&rx);
                let done_tx = done_tx.clone();
                let deps = deps.clone();
                tokio::spawn(async move {
                    loop {
                        // Hold the queue lock only while dequeuing.
                        let job = { rx.lock().await.recv().await };
                        let Some(job) = job else {
                            debug!(worker_id, "intake queue closed; worker exiting");
                            break;
                        };
                        let completion = run_job(&deps, job).await;
                        if done_tx.send(completion).is_err() {
                            // Completion consumer is gone; nothing left to do.
                            break;
                        }
                    }
                })
            })
            .collect();

        info!(workers, "moderation pool started");
        (
            Self {
                tx,
                workers: handles,
            },
            done_rx,
        )
    }

    /// Enqueue a job. Never waits for execution; the queue is unbounded,
    /// so sustained overload grows the backlog rather than failing.
    pub fn submit(&self, job: Job) -> Result<()> {
        self.tx
            .send(job)
            .map_err(|_| anyhow!("moderation pool is shut down"))
    }

    /// Stop accepting jobs and wait for in-flight work to drain.
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.await;
        }
        info!("moderation pool drained");
    }
}

#[instrument(skip_all, fields(job_id = %job.job_id, kind = job.job_kind.as_str()))]
async fn run_job(deps: &PoolDeps, job: Job) -> Completion {
    let Job {
        job_id,
        credential,
        job_kind,
        entity,
        ..
    } = job;
    let user_id = entity.user_id();
    let entity_kind = entity.kind_str();
    let summary = entity.summary().to_string();

    let verdict = match entity {
        Entity::Post(post) => {
            moderate::moderate_post(
                deps.toxicity.as_ref(),
                deps.country.as_ref(),
                &credential,
                deps.toxicity_threshold,
                post,
            )
            .await
        }
        Entity::Comment(comment) => {
            moderate::moderate_comment(
                deps.toxicity.as_ref(),
                &credential,
                deps.toxicity_threshold,
                comment,
            )
            .await
        }
    };

    let outcome = match verdict {
        Ok(entity) => Ok(entity),
        Err(ModerationError::Rejected(reason)) => Err(CompletionError::Rejected { reason }),
        Err(ModerationError::Upstream(error)) => Err(CompletionError::Failed { error }),
    };

    Completion {
        job_id,
        job_kind,
        credential,
        user_id,
        entity_kind,
        summary,
        outcome,
    }
}
