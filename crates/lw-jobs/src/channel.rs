//! Observation side of a job: a stream of snapshots that ends after the
//! terminal one.
//!
//! Built on `watch`, so a slow reader may skip intermediate snapshots but
//! always sees the latest state, and every reader sees the terminal one.

use futures_util::stream::{self, Stream};
use tokio::sync::watch;

use crate::tracker::JobSnapshot;

/// Current snapshot first, then each change, up to and including the
/// terminal snapshot. Also ends if the job is dropped from the registry.
pub fn progress_stream<T>(
    rx: watch::Receiver<JobSnapshot<T>>,
) -> impl Stream<Item = JobSnapshot<T>> + Send + 'static
where
    T: Clone + Send + Sync + 'static,
{
    stream::unfold(Some((rx, true)), |state| async move {
        let (mut rx, first) = state?;
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let snap = rx.borrow_and_update().clone();
        let next = if snap.is_terminal() {
            None
        } else {
            Some((rx, false))
        };
        Some((snap, next))
    })
}
