// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dispatch worker: claim one job, print it, report the outcome, repeat.
//
// Delivery to the printer is at-least-once.  All requested copies of a job
// are sent within one claim; a failure on copy N fails the whole job, and
// the retry sends every copy again, so copies 1..N may come out twice.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tracing::{debug, error, info, warn};

use etikett_core::error::{EtikettError, Result};
use etikett_core::settings::LabelSettings;
use etikett_core::types::{Job, JobId};

use crate::output::LabelOutput;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::store::JobStore;

/// Default wait between polls of an empty queue.
pub const DEFAULT_IDLE_POLL: Duration = Duration::from_secs(1);

/// Default number of tries for writing a job's outcome back to the store.
pub const DEFAULT_REPORT_ATTEMPTS: u32 = 5;

/// Delay before the second try; doubles on each further try.
pub const DEFAULT_REPORT_BACKOFF: Duration = Duration::from_millis(200);

/// Result of processing one claimed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Every copy was sent and the job is `Done`.
    Completed(JobId),
    /// The dispatch failed; the job is `Pending` again.
    Retrying { job_id: JobId, attempts: u32 },
    /// The dispatch failed for the last time; the job is `Failed`.
    Exhausted { job_id: JobId, attempts: u32 },
    /// The outcome could not be written back after every try.  The job
    /// stays `Processing` until the stale reaper returns it to the queue.
    Unrecorded(JobId),
    /// The claim was handed to another worker while this one was printing;
    /// the result was discarded and the current holder reports instead.
    Superseded(JobId),
}

impl JobOutcome {
    pub fn job_id(&self) -> JobId {
        match self {
            Self::Completed(id) | Self::Unrecorded(id) | Self::Superseded(id) => *id,
            Self::Retrying { job_id, .. } | Self::Exhausted { job_id, .. } => *job_id,
        }
    }

    /// Whether the worker should take its post-failure pause.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Completed(_))
    }
}

/// One member of the worker pool.
pub struct DispatchWorker {
    index: usize,
    store: JobStore,
    output: Arc<dyn LabelOutput>,
    policy: RetryPolicy,
    idle_poll: Duration,
    report_attempts: u32,
    report_backoff: Duration,
    wake: Arc<Notify>,
}

impl DispatchWorker {
    pub fn new(index: usize, store: JobStore, output: Arc<dyn LabelOutput>, policy: RetryPolicy) -> Self {
        Self {
            index,
            store,
            output,
            policy,
            idle_poll: DEFAULT_IDLE_POLL,
            report_attempts: DEFAULT_REPORT_ATTEMPTS,
            report_backoff: DEFAULT_REPORT_BACKOFF,
            wake: Arc::new(Notify::new()),
        }
    }

    /// How long to wait on an empty queue before polling again.
    pub fn with_idle_poll(mut self, idle_poll: Duration) -> Self {
        self.idle_poll = idle_poll;
        self
    }

    /// How often, and how patiently, to retry writing an outcome back when
    /// the store errors.
    pub fn with_report_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.report_attempts = attempts.max(1);
        self.report_backoff = backoff;
        self
    }

    /// Wake early from an idle wait when this is notified.
    pub fn with_wake(mut self, wake: Arc<Notify>) -> Self {
        self.wake = wake;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Run until `shutdown` flips to `true` (or its sender goes away).
    ///
    /// A job in flight is always finished before the worker checks for
    /// shutdown again.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(worker = self.index, output = self.output.name(), "dispatch worker started");

        while !*shutdown.borrow() {
            let (pause, wakeable) = match self.run_once().await {
                None => (self.idle_poll, true),
                Some(outcome) if outcome.is_failure() => (self.policy.failure_pause, false),
                Some(_) => continue,
            };

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(pause) => {}
                _ = self.wake.notified(), if wakeable => {
                    debug!(worker = self.index, "woken by enqueue");
                }
            }
        }

        info!(worker = self.index, "dispatch worker stopped");
    }

    /// Claim and process at most one job.
    ///
    /// Returns `None` when nothing was claimed.  A store error during the
    /// claim is logged and also reported as `None`.
    pub async fn run_once(&self) -> Option<JobOutcome> {
        let job = match self.store.blocking(|s| s.claim_next()).await {
            Ok(Some(job)) => job,
            Ok(None) => return None,
            Err(e) => {
                error!(worker = self.index, error = %e, "claim failed, treating queue as empty");
                return None;
            }
        };

        info!(worker = self.index, job_id = %job.id, attempts = job.attempts, "job claimed");

        let outcome = match self.dispatch(&job).await {
            Ok(()) => self.report_success(job).await,
            Err(e) => {
                warn!(worker = self.index, job_id = %job.id, error = %e, "dispatch failed");
                self.report_failure(job).await
            }
        };
        Some(outcome)
    }

    /// Send every requested copy of the job to the output.
    async fn dispatch(&self, job: &Job) -> Result<()> {
        let settings = LabelSettings::from_metadata(&job.metadata)?;
        for copy in 1..=settings.quantity {
            self.output
                .render_and_send(&job.label, &job.content, &settings)
                .await?;
            debug!(worker = self.index, job_id = %job.id, copy, of = settings.quantity, "copy sent");
        }
        Ok(())
    }

    /// Write an outcome back, retrying store errors with a doubling delay.
    ///
    /// `NotClaimed` is final: the claim is gone and retrying cannot bring it
    /// back.
    async fn record<T, F>(&self, job_id: JobId, op: F) -> Result<T>
    where
        F: Fn(&JobStore) -> Result<T> + Clone + Send + 'static,
        T: Send + 'static,
    {
        let mut delay = self.report_backoff;
        let mut tries = 1;
        loop {
            match self.store.blocking(op.clone()).await {
                Err(e) if tries < self.report_attempts && !matches!(e, EtikettError::NotClaimed(_)) => {
                    warn!(
                        worker = self.index,
                        job_id = %job_id,
                        error = %e,
                        tries,
                        "store write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    tries += 1;
                }
                result => return result,
            }
        }
    }

    fn unreported(&self, job_id: JobId, e: EtikettError, what: &str) -> JobOutcome {
        match e {
            EtikettError::NotClaimed(_) => {
                warn!(worker = self.index, job_id = %job_id, "claim superseded, {what} discarded");
                JobOutcome::Superseded(job_id)
            }
            e => {
                error!(worker = self.index, job_id = %job_id, error = %e, "could not record {what}");
                JobOutcome::Unrecorded(job_id)
            }
        }
    }

    async fn report_success(&self, job: Job) -> JobOutcome {
        let job_id = job.id;
        match self.record(job_id, move |s| s.complete(&job)).await {
            Ok(()) => JobOutcome::Completed(job_id),
            Err(e) => self.unreported(job_id, e, "completion"),
        }
    }

    async fn report_failure(&self, job: Job) -> JobOutcome {
        let job_id = job.id;
        let policy = self.policy;
        match self.record(job_id, move |s| s.fail(&job, &policy)).await {
            Ok(RetryDecision::Retry { attempts }) => {
                warn!(
                    worker = self.index,
                    job_id = %job_id,
                    attempts,
                    max = policy.max_attempts,
                    "job returned to queue"
                );
                JobOutcome::Retrying { job_id, attempts }
            }
            Ok(RetryDecision::Exhausted { attempts }) => {
                let e = EtikettError::Exhausted { job_id, attempts };
                error!(worker = self.index, job_id = %job_id, error = %e, "job failed");
                JobOutcome::Exhausted { job_id, attempts }
            }
            Err(e) => self.unreported(job_id, e, "failure"),
        }
    }
}
