//! lw-jobs
//!
//! Background jobs with observable progress.
//!
//! A job is one async unit of work spawned on the tokio runtime. Its state
//! lives in a `watch` channel owned by the [`JobTracker`]: the worker writes
//! through a [`JobHandle`], observers read snapshots with
//! [`JobTracker::get_state`] or follow them with [`JobTracker::watch`].

pub mod channel;
pub mod tracker;

pub use channel::progress_stream;
pub use tracker::{
    spawn_sweeper, JobError, JobHandle, JobId, JobRegistry, JobSnapshot, JobStatus, JobTracker,
};
