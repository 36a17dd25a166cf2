// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Asynchronous durable-store reconciliation.
//!
//! Fast-path mutations return as soon as the counter store is updated;
//! the matching durable writes are queued here and applied by a single
//! background worker with patient retry. The queue is bounded: when it
//! is full the job is dropped and counted, never blocking the request
//! path. Durable writes are idempotent, so at-least-once delivery with
//! occasional loss is the contract (the counter store remains the
//! serving truth either way).
//!
//! Shutdown closes the queue and drains every job already accepted.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::metrics;
use crate::resilience::retry::{retry, RetryConfig};
use crate::store::traits::{DurableStore, SampledView, StoreError};

/// One unit of durable catch-up work.
#[derive(Debug, Clone)]
pub enum ReconcileJob {
    LikeCreate { user_id: String, video_id: String },
    LikeDelete { user_id: String, video_id: String },
    CommentLikeCreate { user_id: String, comment_id: String },
    CommentLikeDelete { user_id: String, comment_id: String },
    SampledView(SampledView),
}

impl ReconcileJob {
    /// Stable job name for logs and metric labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileJob::LikeCreate { .. } => "like_create",
            ReconcileJob::LikeDelete { .. } => "like_delete",
            ReconcileJob::CommentLikeCreate { .. } => "comment_like_create",
            ReconcileJob::CommentLikeDelete { .. } => "comment_like_delete",
            ReconcileJob::SampledView(_) => "sampled_view",
        }
    }
}

pub struct Reconciler {
    tx: Mutex<Option<mpsc::Sender<ReconcileJob>>>,
    rx: Mutex<Option<mpsc::Receiver<ReconcileJob>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    durable: Arc<dyn DurableStore>,
    queue_size: usize,
}

impl Reconciler {
    pub fn new(durable: Arc<dyn DurableStore>, queue_size: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_size.max(1));
        Self {
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
            handle: Mutex::new(None),
            durable,
            queue_size: queue_size.max(1),
        }
    }

    /// Enqueue a job without blocking. Returns false when the job was
    /// dropped (queue full or worker shut down).
    pub fn dispatch(&self, job: ReconcileJob) -> bool {
        let kind = job.kind();
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            warn!(job = kind, "Reconcile job dropped: worker shut down");
            metrics::record_reconcile_dropped(kind);
            return false;
        };

        match tx.try_send(job) {
            Ok(()) => {
                metrics::set_reconcile_queue_depth(self.queue_size - tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(job = kind, "Reconcile job dropped: queue full");
                metrics::record_reconcile_dropped(kind);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(job = kind, "Reconcile job dropped: worker shut down");
                metrics::record_reconcile_dropped(kind);
                false
            }
        }
    }

    /// Start the background worker. Idempotent; only the first call
    /// spawns.
    pub fn spawn(&self) {
        let Some(mut rx) = self.rx.lock().take() else {
            warn!("Reconcile worker already started");
            return;
        };

        let durable = self.durable.clone();
        let handle = tokio::spawn(async move {
            info!("Reconcile worker started");
            while let Some(job) = rx.recv().await {
                process_job(&durable, job).await;
            }
            info!("Reconcile worker drained and stopped");
        });
        *self.handle.lock() = Some(handle);
    }

    /// Close the queue and wait for the worker to drain every accepted
    /// job. Jobs already in the queue are never cancelled.
    pub async fn shutdown(&self) {
        drop(self.tx.lock().take());
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Reconcile worker panicked");
            }
        }
    }
}

async fn process_job(durable: &Arc<dyn DurableStore>, job: ReconcileJob) {
    let kind = job.kind();
    let start = Instant::now();

    let result = retry(kind, &RetryConfig::reconcile(), || apply_job(durable, &job)).await;

    metrics::record_reconcile_latency(kind, start.elapsed());
    match result {
        Ok(()) => {
            debug!(job = kind, "Reconcile job applied");
            metrics::record_reconcile(kind, "success");
        }
        Err(e) => {
            // Retries exhausted. The fast-path counters are still
            // serving; the durable store catches up on the next toggle
            // or stays behind for analytics-only rows.
            error!(job = kind, error = %e, "Reconcile job failed permanently");
            metrics::record_reconcile(kind, "failure");
        }
    }
}

async fn apply_job(
    durable: &Arc<dyn DurableStore>,
    job: &ReconcileJob,
) -> Result<(), StoreError> {
    // The authoritative count moves only when a row actually changed:
    // duplicate jobs for one pair are no-ops end to end, so replays can
    // never drive the count away from the row count.
    match job {
        ReconcileJob::LikeCreate { user_id, video_id } => {
            if durable.create_like(user_id, video_id).await? {
                durable.adjust_video_likes(video_id, 1).await?;
            }
            Ok(())
        }
        ReconcileJob::LikeDelete { user_id, video_id } => {
            if durable.delete_like(user_id, video_id).await? {
                durable.adjust_video_likes(video_id, -1).await?;
            }
            Ok(())
        }
        ReconcileJob::CommentLikeCreate {
            user_id,
            comment_id,
        } => {
            if durable.create_comment_like(user_id, comment_id).await? {
                durable.adjust_comment_likes(comment_id, 1).await?;
            }
            Ok(())
        }
        ReconcileJob::CommentLikeDelete {
            user_id,
            comment_id,
        } => {
            if durable.delete_comment_like(user_id, comment_id).await? {
                durable.adjust_comment_likes(comment_id, -1).await?;
            }
            Ok(())
        }
        ReconcileJob::SampledView(view) => durable.create_sampled_view(view).await,
    }
}
