//! Job lifecycle through the public tracker API: submission, observation,
//! terminal outcomes and retention.

use std::time::Duration;

use futures_util::StreamExt;
use lw_jobs::{JobError, JobHandle, JobId, JobRegistry, JobStatus, JobTracker};
use lw_schemas::Progress;
use tokio::sync::oneshot;

async fn count_to(mut job: JobHandle<String>, n: usize) -> Result<String, String> {
    job.begin(n);
    for i in 0..n {
        tokio::time::sleep(Duration::from_millis(5)).await;
        job.item_done(&format!("step {i}"));
    }
    Ok(format!("counted {n}"))
}

#[tokio::test]
async fn submit_returns_before_work_finishes() {
    let tracker: JobTracker<String> = JobTracker::new(10);
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let id = tracker
        .submit(move |_job| async move {
            let _ = release_rx.await;
            Ok::<_, String>("done".to_string())
        })
        .await;

    let snap = tracker.get_state(id).await.unwrap();
    assert!(!snap.is_terminal());
    assert_eq!(snap.job_id, id);

    release_tx.send(()).unwrap();
    let last = tracker.watch(id).await.unwrap().collect::<Vec<_>>().await;
    let last = last.last().unwrap();
    assert_eq!(last.status, JobStatus::Complete);
    assert_eq!(last.result.as_deref(), Some("done"));
}

#[tokio::test]
async fn progress_is_monotonic_and_stops_at_terminal() {
    let tracker: JobTracker<String> = JobTracker::new(10);
    let (start_tx, start_rx) = oneshot::channel::<()>();

    let id = tracker
        .submit(move |job| async move {
            let _ = start_rx.await;
            count_to(job, 5).await
        })
        .await;

    let stream = tracker.watch(id).await.unwrap();
    start_tx.send(()).unwrap();
    let snaps: Vec<_> = stream.collect().await;

    assert!(!snaps.is_empty());
    for pair in snaps.windows(2) {
        assert!(pair[1].current >= pair[0].current, "current went backwards");
        if pair[0].total > 0 {
            assert_eq!(pair[1].total, pair[0].total, "total changed after being set");
        }
    }
    let (terminal, before) = snaps.split_last().unwrap();
    assert_eq!(terminal.status, JobStatus::Complete);
    assert_eq!(terminal.current, 5);
    assert_eq!(terminal.total, 5);
    assert!(before.iter().all(|s| !s.is_terminal()), "nothing after terminal");
}

#[tokio::test]
async fn concurrent_subscribers_see_same_outcome() {
    let tracker: JobTracker<String> = JobTracker::new(10);
    let (start_tx, start_rx) = oneshot::channel::<()>();
    let id = tracker
        .submit(move |job| async move {
            let _ = start_rx.await;
            count_to(job, 3).await
        })
        .await;

    let a = tracker.watch(id).await.unwrap();
    let b = tracker.watch(id).await.unwrap();
    start_tx.send(()).unwrap();

    let (a, b) = tokio::join!(a.collect::<Vec<_>>(), b.collect::<Vec<_>>());
    let (ta, tb) = (a.last().unwrap(), b.last().unwrap());
    assert_eq!(ta.status, JobStatus::Complete);
    assert_eq!(ta.result, tb.result);
    assert_eq!(ta.status, tb.status);
}

#[tokio::test]
async fn worker_error_becomes_job_error() {
    let tracker: JobTracker<String> = JobTracker::new(10);
    let id = tracker
        .submit(|mut job| async move {
            job.log("Fetching slate");
            Err::<String, _>("slate source unavailable: http status 503")
        })
        .await;

    let snaps: Vec<_> = tracker.watch(id).await.unwrap().collect().await;
    let last = snaps.last().unwrap();
    assert_eq!(last.status, JobStatus::Error);
    assert_eq!(last.result, None);
    assert_eq!(
        last.error.as_deref(),
        Some("slate source unavailable: http status 503")
    );
    assert_eq!(
        last.details.last().map(String::as_str),
        Some("slate source unavailable: http status 503")
    );
}

#[tokio::test]
async fn panicking_worker_fails_the_job() {
    let tracker: JobTracker<String> = JobTracker::new(10);
    let id = tracker
        .submit(|_job| async move {
            if true {
                panic!("boom");
            }
            Ok::<String, String>(String::new())
        })
        .await;

    let snaps: Vec<_> = tracker.watch(id).await.unwrap().collect().await;
    let last = snaps.last().unwrap();
    assert_eq!(last.status, JobStatus::Error);
    assert!(last.error.as_deref().unwrap().starts_with("worker aborted"));
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let tracker: JobTracker<String> = JobTracker::new(10);
    let id = JobId::new_random();

    assert_eq!(
        tracker.get_state(id).await.unwrap_err(),
        JobError::NotFound(id.to_string())
    );
    assert!(tracker.watch(id).await.is_err());
}

#[tokio::test]
async fn registry_is_shared_and_swept() {
    let registry: JobRegistry<String> = JobRegistry::default();
    let writer = JobTracker::with_registry(registry.clone(), 10);
    let reader = JobTracker::with_registry(registry.clone(), 10);

    let done = writer.create().await;
    done.complete("ok".to_string());
    let running = writer.create().await;
    running.mark_running();

    assert_eq!(reader.get_state(done.id()).await.unwrap().status, JobStatus::Complete);
    assert_eq!(registry.len().await, 2);

    // still inside the retention window
    assert_eq!(reader.sweep_expired(Duration::from_secs(600)).await, 0);

    let later = chrono::Utc::now() + chrono::Duration::seconds(601);
    assert_eq!(reader.sweep_expired_at(later, Duration::from_secs(600)).await, 1);
    assert!(reader.get_state(done.id()).await.is_err());
    assert_eq!(
        reader.get_state(running.id()).await.unwrap().status,
        JobStatus::Running
    );
}
