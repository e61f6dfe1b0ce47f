// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Etikett Queue: the durable job store and the dispatch engine that drains
// it.  A fixed pool of workers claims jobs from a shared SQLite table, hands
// each one to a label output (network or local device), and reports the
// outcome back through the retry policy.  Two background loops keep the
// table tidy: the retention sweeper purges old terminal jobs and the stale
// reaper returns orphaned claims to the queue.

pub mod engine;
pub mod output;
pub mod pool;
pub mod reaper;
pub mod retry;
pub mod status;
pub mod store;
pub mod sweeper;
pub mod worker;

pub use engine::{QueueClient, QueueEngine};
pub use output::{LabelOutput, output_from_config};
pub use pool::WorkerPool;
pub use reaper::StaleReaper;
pub use retry::{RetryDecision, RetryPolicy};
pub use status::{StatusAggregator, StatusReport};
pub use store::JobStore;
pub use sweeper::RetentionSweeper;
pub use worker::{DispatchWorker, JobOutcome};
