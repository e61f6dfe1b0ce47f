// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Durable print job store backed by SQLite.
//
// The store is the single writer of job status and attempt counts.  Every
// operation opens its own connection to the database file, so several
// workers (or several processes) contend through SQLite's own locking rather
// than through an in-process mutex.  The claim runs inside an EXCLUSIVE
// transaction covering the SELECT and the UPDATE, which is what guarantees
// that two workers never walk away with the same job.
//
// Timestamps are stored as RFC 3339 UTC strings with a fixed microsecond
// width, so lexicographic order in SQL equals chronological order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::{debug, info, instrument, warn};

use etikett_core::error::{EtikettError, Result};
use etikett_core::types::{Job, JobId, JobStatus, Metadata, NewJob, StatusCounts};

use crate::retry::{RetryDecision, RetryPolicy};

/// SQLite schema for the jobs table.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        label TEXT NOT NULL DEFAULT '',
        content TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK(status IN ('pending', 'processing', 'done', 'failed')),
        attempts INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        claimed_at TEXT,
        metadata TEXT NOT NULL DEFAULT '{}'
    );
    CREATE INDEX IF NOT EXISTS jobs_claim_order ON jobs (status, created_at, id);
"#;

/// Column list shared by every SELECT; order must match `row_to_job`.
const JOB_COLUMNS: &str = "id, label, content, status, attempts, created_at, claimed_at, metadata";

/// Default SQLite busy timeout.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Convert a `rusqlite::Error` into an `EtikettError::Database` with context.
fn db_err(op: &'static str) -> impl Fn(rusqlite::Error) -> EtikettError {
    move |e| EtikettError::Database(format!("{op}: {e}"))
}

/// Format a timestamp for storage.
fn to_db_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Persistent job store backed by a SQLite database file.
///
/// Cheap to clone: a clone only copies the path and settings.  All methods
/// are synchronous because `rusqlite` does not support async natively.  In
/// an async context, wrap calls in `tokio::task::spawn_blocking`.
#[derive(Debug, Clone)]
pub struct JobStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl JobStore {
    /// Open (or create) the job database at the given path.
    ///
    /// Switches the file to WAL journal mode so status reads do not block
    /// on a worker's claim, and creates the `jobs` table if it does not
    /// exist.  Failure here is fatal for the service.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout,
        };

        let conn = store.connect()?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(db_err("WAL pragma"))?;
        debug!(journal_mode = %mode, "journal mode set");
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;

        info!("job store opened");
        Ok(store)
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a store operation on Tokio's blocking thread pool.
    pub async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&JobStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| EtikettError::Database(format!("store task: {e}")))?
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(db_err("open"))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(db_err("busy timeout"))?;
        Ok(conn)
    }

    /// Insert a new `Pending` job with zero attempts, stamped with the
    /// current time.  The job is claimable as soon as this returns.
    #[instrument(skip(self, job), fields(label = %job.label))]
    pub fn enqueue(&self, job: &NewJob) -> Result<JobId> {
        self.insert_at(job, Utc::now())
    }

    fn insert_at(&self, job: &NewJob, created_at: DateTime<Utc>) -> Result<JobId> {
        if job.content.is_empty() {
            return Err(EtikettError::Validation("Missing content field.".into()));
        }
        let metadata_json = serde_json::to_string(&job.metadata)?;

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO jobs (label, content, status, attempts, created_at, metadata)
             VALUES (?1, ?2, 'pending', 0, ?3, ?4)",
            params![job.label, job.content, to_db_time(created_at), metadata_json],
        )
        .map_err(db_err("insert job"))?;

        let id = JobId(conn.last_insert_rowid());
        info!(job_id = %id, "job enqueued");
        Ok(id)
    }

    /// Atomically take the oldest `Pending` job (ties broken by id) and mark
    /// it `Processing`.
    ///
    /// Returns `None` when nothing is pending.  On any error the transaction
    /// is rolled back and no job changes state.
    #[instrument(skip(self))]
    pub fn claim_next(&self) -> Result<Option<Job>> {
        self.claim_next_at(Utc::now())
    }

    fn claim_next_at(&self, now: DateTime<Utc>) -> Result<Option<Job>> {
        // Match the stored precision so the returned job equals a re-read.
        let now = now.trunc_subsecs(6);
        let mut conn = self.connect()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Exclusive)
            .map_err(db_err("claim begin"))?;

        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE status = 'pending'
             ORDER BY created_at ASC, id ASC LIMIT 1"
        );
        let candidate = tx
            .query_row(&sql, [], row_to_job)
            .optional()
            .map_err(db_err("claim select"))?;

        let Some(mut job) = candidate else {
            tx.commit().map_err(db_err("claim commit"))?;
            debug!("no pending job");
            return Ok(None);
        };

        tx.execute(
            "UPDATE jobs SET status = 'processing', claimed_at = ?1 WHERE id = ?2",
            params![to_db_time(now), job.id.0],
        )
        .map_err(db_err("claim update"))?;
        tx.commit().map_err(db_err("claim commit"))?;

        job.status = JobStatus::Processing;
        job.claimed_at = Some(now);
        debug!(job_id = %job.id, attempts = job.attempts, "job claimed");
        Ok(Some(job))
    }

    /// Mark a claimed job `Done`.
    ///
    /// `claim` is the job as returned by [`JobStore::claim_next`].  Fails with
    /// `NotClaimed` if the row is no longer `Processing` under that same
    /// claim, for example after the stale reaper handed it to another worker.
    #[instrument(skip(self, claim), fields(job_id = %claim.id))]
    pub fn complete(&self, claim: &Job) -> Result<()> {
        let conn = self.connect()?;
        let rows = conn
            .execute(
                "UPDATE jobs SET status = 'done'
                 WHERE id = ?1 AND status = 'processing' AND claimed_at = ?2",
                params![claim.id.0, claim.claimed_at.map(to_db_time)],
            )
            .map_err(db_err("complete"))?;

        if rows == 0 {
            return Err(EtikettError::NotClaimed(claim.id));
        }
        info!(job_id = %claim.id, "job completed");
        Ok(())
    }

    /// Record a failed attempt on a claimed job and apply the retry policy.
    ///
    /// The decision is taken from `claim.attempts`, the count the worker saw
    /// when it claimed the job.  The stored count never decreases, even if
    /// a caller passes a stale value.  Same claim check as `complete`.
    #[instrument(skip(self, claim, policy), fields(job_id = %claim.id))]
    pub fn fail(&self, claim: &Job, policy: &RetryPolicy) -> Result<RetryDecision> {
        let decision = policy.decide(claim.attempts);

        let conn = self.connect()?;
        let rows = conn
            .execute(
                "UPDATE jobs SET status = ?1, attempts = MAX(attempts, ?2)
                 WHERE id = ?3 AND status = 'processing' AND claimed_at = ?4",
                params![
                    decision.status().as_str(),
                    decision.attempts(),
                    claim.id.0,
                    claim.claimed_at.map(to_db_time)
                ],
            )
            .map_err(db_err("fail"))?;

        if rows == 0 {
            return Err(EtikettError::NotClaimed(claim.id));
        }

        debug!(job_id = %claim.id, status = %decision.status(), attempts = decision.attempts(), "failure recorded");
        Ok(decision)
    }

    /// Count jobs per status.  Not transactional; counts may lag.
    #[instrument(skip(self))]
    pub fn count_by_status(&self) -> Result<StatusCounts> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT status, COUNT(*) FROM jobs GROUP BY status")
            .map_err(db_err("prepare count"))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(db_err("query count"))?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, count) = row.map_err(db_err("count row"))?;
            counts.set(status.parse()?, count.max(0) as u64);
        }
        Ok(counts)
    }

    /// Delete `Done` and `Failed` jobs created before `threshold`.
    ///
    /// `Pending` and `Processing` rows are never touched, however old.
    /// Returns the number of rows removed.
    #[instrument(skip(self))]
    pub fn purge_older_than(&self, threshold: DateTime<Utc>) -> Result<usize> {
        let conn = self.connect()?;
        let removed = conn
            .execute(
                "DELETE FROM jobs WHERE status IN ('done', 'failed') AND created_at < ?1",
                params![to_db_time(threshold)],
            )
            .map_err(db_err("purge"))?;

        info!(count = removed, "terminal jobs purged");
        Ok(removed)
    }

    /// Return `Processing` jobs claimed before `older_than` to `Pending`.
    ///
    /// Used to recover claims abandoned by a worker that died mid-job.  The
    /// attempt count is left as it was.  Returns the number of rows requeued.
    #[instrument(skip(self))]
    pub fn requeue_stale(&self, older_than: DateTime<Utc>) -> Result<usize> {
        let conn = self.connect()?;
        let requeued = conn
            .execute(
                "UPDATE jobs SET status = 'pending', claimed_at = NULL
                 WHERE status = 'processing' AND (claimed_at IS NULL OR claimed_at < ?1)",
                params![to_db_time(older_than)],
            )
            .map_err(db_err("requeue stale"))?;

        if requeued > 0 {
            warn!(count = requeued, "stale claims returned to the queue");
        }
        Ok(requeued)
    }

    /// Retrieve a single job by id.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub fn get_job(&self, job_id: JobId) -> Result<Option<Job>> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
            params![job_id.0],
            row_to_job,
        )
        .optional()
        .map_err(db_err("get job"))
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn conversion_err<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_db_time(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(column, e))
}

/// Map a SQLite row to a `Job`.
///
/// Column indices must match `JOB_COLUMNS`.
fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let status_str: String = row.get(3)?;
    let created_at_str: String = row.get(5)?;
    let claimed_at_str: Option<String> = row.get(6)?;
    let metadata_json: String = row.get(7)?;

    let status: JobStatus = status_str.parse().map_err(|e| conversion_err(3, e))?;
    let created_at = parse_db_time(5, &created_at_str)?;
    let claimed_at = claimed_at_str
        .as_deref()
        .map(|raw| parse_db_time(6, raw))
        .transpose()?;
    let metadata: Metadata =
        serde_json::from_str(&metadata_json).map_err(|e| conversion_err(7, e))?;

    Ok(Job {
        id: JobId(row.get(0)?),
        label: row.get(1)?,
        content: row.get(2)?,
        status,
        attempts: row.get(4)?,
        created_at,
        claimed_at,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as TimeDelta;
    use serde_json::json;

    fn test_store() -> (tempfile::TempDir, JobStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JobStore::open(dir.path().join("jobs.db"), DEFAULT_BUSY_TIMEOUT).expect("open store");
        (dir, store)
    }

    fn new_job(content: &str) -> NewJob {
        NewJob::new("label", content, Metadata::new()).expect("valid job")
    }

    fn base_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-10T08:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn enqueue_assigns_increasing_ids() {
        let (_dir, store) = test_store();
        let a = store.enqueue(&new_job("1")).unwrap();
        let b = store.enqueue(&new_job("2")).unwrap();
        assert!(b > a);
    }

    #[test]
    fn enqueued_job_starts_pending_with_zero_attempts() {
        let (_dir, store) = test_store();
        let id = store.enqueue(&new_job("123")).unwrap();
        let job = store.get_job(id).unwrap().expect("stored");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempts, 0);
        assert!(job.claimed_at.is_none());
    }

    #[test]
    fn empty_content_never_reaches_the_table() {
        let (_dir, store) = test_store();
        let job = NewJob {
            label: "A".into(),
            content: String::new(),
            metadata: Metadata::new(),
        };
        assert!(matches!(store.enqueue(&job), Err(EtikettError::Validation(_))));
        assert_eq!(store.count_by_status().unwrap(), StatusCounts::default());
    }

    #[test]
    fn metadata_round_trips() {
        let (_dir, store) = test_store();
        let mut metadata = Metadata::new();
        metadata.insert("quantity".into(), json!(3));
        metadata.insert("deviceAddress".into(), json!("10.1.1.1:9100"));
        let id = store
            .enqueue(&NewJob::new("", "ABC", metadata.clone()).unwrap())
            .unwrap();

        let job = store.get_job(id).unwrap().expect("stored");
        assert_eq!(job.metadata, metadata);
        assert_eq!(job.label, "");
    }

    #[test]
    fn claim_on_empty_store_returns_none() {
        let (_dir, store) = test_store();
        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn claim_takes_oldest_created_first() {
        let (_dir, store) = test_store();
        let newer = store.insert_at(&new_job("newer"), base_time()).unwrap();
        let older = store
            .insert_at(&new_job("older"), base_time() - TimeDelta::minutes(5))
            .unwrap();

        assert_eq!(store.claim_next().unwrap().unwrap().id, older);
        assert_eq!(store.claim_next().unwrap().unwrap().id, newer);
        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn claim_breaks_timestamp_ties_by_id() {
        let (_dir, store) = test_store();
        let first = store.insert_at(&new_job("a"), base_time()).unwrap();
        let second = store.insert_at(&new_job("b"), base_time()).unwrap();

        assert_eq!(store.claim_next().unwrap().unwrap().id, first);
        assert_eq!(store.claim_next().unwrap().unwrap().id, second);
    }

    #[test]
    fn claim_marks_job_processing() {
        let (_dir, store) = test_store();
        let id = store.enqueue(&new_job("123")).unwrap();
        let claimed = store.claim_next().unwrap().expect("claimed");
        assert_eq!(claimed.id, id);
        assert_eq!(claimed.status, JobStatus::Processing);
        assert!(claimed.claimed_at.is_some());

        let stored = store.get_job(id).unwrap().expect("stored");
        assert_eq!(stored.status, JobStatus::Processing);
        assert_eq!(stored.claimed_at, claimed.claimed_at);
    }

    #[test]
    fn complete_moves_claimed_job_to_done() {
        let (_dir, store) = test_store();
        let id = store.enqueue(&new_job("123")).unwrap();
        let claim = store.claim_next().unwrap().unwrap();
        store.complete(&claim).unwrap();

        let job = store.get_job(id).unwrap().expect("stored");
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.attempts, 0);
    }

    #[test]
    fn complete_requires_a_claim() {
        let (_dir, store) = test_store();
        let id = store.enqueue(&new_job("123")).unwrap();
        let unclaimed = store.get_job(id).unwrap().unwrap();
        assert!(matches!(store.complete(&unclaimed), Err(EtikettError::NotClaimed(_))));

        let mut missing = unclaimed.clone();
        missing.id = JobId(999);
        missing.claimed_at = Some(Utc::now());
        assert!(matches!(store.complete(&missing), Err(EtikettError::NotClaimed(_))));
    }

    #[test]
    fn superseded_claim_cannot_report() {
        let (_dir, store) = test_store();
        let id = store.enqueue(&new_job("123")).unwrap();
        let first = store
            .claim_next_at(Utc::now() - TimeDelta::minutes(20))
            .unwrap()
            .unwrap();

        assert_eq!(store.requeue_stale(Utc::now() - TimeDelta::minutes(10)).unwrap(), 1);
        let second = store.claim_next().unwrap().unwrap();
        assert_eq!(second.id, id);
        assert_ne!(second.claimed_at, first.claimed_at);

        // The first holder's late reports are rejected and leave the row alone.
        assert!(matches!(store.complete(&first), Err(EtikettError::NotClaimed(_))));
        assert!(matches!(
            store.fail(&first, &RetryPolicy::default()),
            Err(EtikettError::NotClaimed(_))
        ));
        let stored = store.get_job(id).unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Processing);
        assert_eq!(stored.attempts, 0);

        // The current holder still owns it.
        store.complete(&second).unwrap();
        assert_eq!(store.get_job(id).unwrap().unwrap().status, JobStatus::Done);
    }

    #[test]
    fn fail_below_ceiling_returns_job_to_pending() {
        let (_dir, store) = test_store();
        let policy = RetryPolicy::default();
        let id = store.enqueue(&new_job("456")).unwrap();
        let job = store.claim_next().unwrap().unwrap();

        let decision = store.fail(&job, &policy).unwrap();
        assert_eq!(decision, RetryDecision::Retry { attempts: 1 });

        let stored = store.get_job(id).unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Pending);
        assert_eq!(stored.attempts, 1);
    }

    #[test]
    fn fail_at_ceiling_is_terminal_and_never_reclaimed() {
        let (_dir, store) = test_store();
        let policy = RetryPolicy::default();
        let id = store.enqueue(&new_job("456")).unwrap();

        for _ in 0..policy.max_attempts {
            let job = store.claim_next().unwrap().expect("still claimable");
            store.fail(&job, &policy).unwrap();
        }

        let stored = store.get_job(id).unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.attempts, policy.max_attempts);
        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn stale_attempt_count_never_lowers_the_stored_one() {
        let (_dir, store) = test_store();
        let policy = RetryPolicy {
            max_attempts: 10,
            ..Default::default()
        };
        let id = store.enqueue(&new_job("1")).unwrap();
        for _ in 0..3 {
            let job = store.claim_next().unwrap().unwrap();
            store.fail(&job, &policy).unwrap();
        }
        let mut outdated = store.claim_next().unwrap().unwrap();
        outdated.attempts = 0;
        store.fail(&outdated, &policy).unwrap();
        assert_eq!(store.get_job(id).unwrap().unwrap().attempts, 3);
    }

    #[test]
    fn retried_job_is_reclaimed_ahead_of_newer_arrivals() {
        let (_dir, store) = test_store();
        let policy = RetryPolicy::default();
        let old = store
            .insert_at(&new_job("old"), base_time() - TimeDelta::hours(1))
            .unwrap();
        let job = store.claim_next().unwrap().unwrap();
        store.insert_at(&new_job("new"), base_time()).unwrap();

        store.fail(&job, &policy).unwrap();
        assert_eq!(store.claim_next().unwrap().unwrap().id, old);
    }

    #[test]
    fn fail_requires_a_claim() {
        let (_dir, store) = test_store();
        let id = store.enqueue(&new_job("1")).unwrap();
        let unclaimed = store.get_job(id).unwrap().unwrap();
        let result = store.fail(&unclaimed, &RetryPolicy::default());
        assert!(matches!(result, Err(EtikettError::NotClaimed(_))));
        assert_eq!(store.get_job(id).unwrap().unwrap().attempts, 0);
    }

    #[test]
    fn count_by_status_reports_every_state() {
        let (_dir, store) = test_store();
        let policy = RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        };
        for content in ["1", "2", "3", "4", "5"] {
            store.enqueue(&new_job(content)).unwrap();
        }
        let done = store.claim_next().unwrap().unwrap();
        store.complete(&done).unwrap();
        let failed = store.claim_next().unwrap().unwrap();
        store.fail(&failed, &policy).unwrap();
        store.claim_next().unwrap().unwrap();

        let counts = store.count_by_status().unwrap();
        assert_eq!(
            counts,
            StatusCounts {
                pending: 2,
                processing: 1,
                done: 1,
                failed: 1,
            }
        );
    }

    #[test]
    fn purge_removes_only_old_terminal_jobs() {
        let (_dir, store) = test_store();
        let exhaust_now = RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        };
        let old = base_time() - TimeDelta::days(30);

        let old_done = store.insert_at(&new_job("done"), old).unwrap();
        let old_failed = store
            .insert_at(&new_job("failed"), old + TimeDelta::seconds(1))
            .unwrap();
        let old_processing = store
            .insert_at(&new_job("processing"), old + TimeDelta::seconds(2))
            .unwrap();
        let recent_done = store.insert_at(&new_job("recent"), base_time()).unwrap();

        // Claims come out in creation order.
        let claim = store.claim_next().unwrap().unwrap();
        assert_eq!(claim.id, old_done);
        store.complete(&claim).unwrap();
        let claim = store.claim_next().unwrap().unwrap();
        assert_eq!(claim.id, old_failed);
        store.fail(&claim, &exhaust_now).unwrap();
        store.claim_next().unwrap();
        let claim = store.claim_next().unwrap().unwrap();
        assert_eq!(claim.id, recent_done);
        store.complete(&claim).unwrap();

        let old_pending = store
            .insert_at(&new_job("pending"), old + TimeDelta::seconds(3))
            .unwrap();

        let removed = store.purge_older_than(base_time() - TimeDelta::days(7)).unwrap();
        assert_eq!(removed, 2);

        assert!(store.get_job(old_done).unwrap().is_none());
        assert!(store.get_job(old_failed).unwrap().is_none());
        assert_eq!(
            store.get_job(old_processing).unwrap().unwrap().status,
            JobStatus::Processing
        );
        assert_eq!(
            store.get_job(old_pending).unwrap().unwrap().status,
            JobStatus::Pending
        );
        assert_eq!(
            store.get_job(recent_done).unwrap().unwrap().status,
            JobStatus::Done
        );
    }

    #[test]
    fn requeue_stale_resets_old_claims_only() {
        let (_dir, store) = test_store();
        let stale = store.insert_at(&new_job("stale"), base_time()).unwrap();
        let fresh = store
            .insert_at(&new_job("fresh"), base_time() + TimeDelta::seconds(1))
            .unwrap();

        store.claim_next_at(base_time() - TimeDelta::hours(1)).unwrap();
        store.claim_next_at(Utc::now()).unwrap();

        let requeued = store.requeue_stale(Utc::now() - TimeDelta::minutes(10)).unwrap();
        assert_eq!(requeued, 1);

        let stale_job = store.get_job(stale).unwrap().unwrap();
        assert_eq!(stale_job.status, JobStatus::Pending);
        assert!(stale_job.claimed_at.is_none());
        assert_eq!(stale_job.attempts, 0);
        assert_eq!(
            store.get_job(fresh).unwrap().unwrap().status,
            JobStatus::Processing
        );
    }

    #[test]
    fn jobs_survive_reopening_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.db");
        let id = {
            let store = JobStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
            store.enqueue(&new_job("persisted")).unwrap()
        };

        let reopened = JobStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        let job = reopened.get_job(id).unwrap().expect("still there");
        assert_eq!(job.content, "persisted");
    }

    #[test]
    fn schema_rejects_unknown_status() {
        let (_dir, store) = test_store();
        let conn = store.connect().unwrap();
        let result = conn.execute(
            "INSERT INTO jobs (content, status, created_at) VALUES ('x', 'queued', '2026-01-01T00:00:00.000000Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn get_missing_job_returns_none() {
        let (_dir, store) = test_store();
        assert!(store.get_job(JobId(42)).unwrap().is_none());
    }
}
