//! HTTP route handlers for lw-daemon.
//!
//! All handlers are `pub(crate)` so they can be unit-tested from this crate's
//! test modules. The router is assembled in `build_router` which is the only
//! public symbol.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use futures_util::stream::{Stream, StreamExt};
use lw_jobs::{JobId, JobSnapshot};
use lw_schemas::{ComparisonPayload, NullProgress};
use tracing::{info, warn};

use crate::api_types::{HealthResponse, SlateQuery, SubmitResponse};
use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/slate", get(slate))
        .route("/api/progress/:job_id", get(progress))
        .route("/api/jobs/:job_id", get(job_state))
        .route("/api/player/:name", get(player))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /api/slate
// ---------------------------------------------------------------------------

/// Submits a reconciliation job and answers 202 with its id. With
/// `mode=sync` the run happens inline and the payload is the response.
pub(crate) async fn slate(
    State(st): State<Arc<AppState>>,
    Query(q): Query<SlateQuery>,
) -> Result<Response, ApiError> {
    let match_url = q.match_url().map(str::to_string);

    if q.is_sync() {
        info!(match_url = ?match_url, "slate/sync");
        let payload = st
            .engine
            .run_slate(&mut NullProgress, match_url.as_deref())
            .await?;
        return Ok((StatusCode::OK, Json(payload)).into_response());
    }

    let engine = st.engine.clone();
    let job_id = st
        .tracker
        .submit(move |mut job| async move {
            engine.run_slate(&mut job, match_url.as_deref()).await
        })
        .await;

    info!(job_id = %job_id, "slate/submit");
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id: job_id.to_string(),
        }),
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// GET /api/progress/:job_id  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn progress(
    State(st): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    let id: JobId = job_id.parse()?;
    let snapshots = st.tracker.watch(id).await?;

    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let events = snapshots_to_sse(snapshots);
    Ok((headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response())
}

/// One event per snapshot, named after the job status. The stream ends
/// with the terminal snapshot, which closes the response.
fn snapshots_to_sse(
    snapshots: impl Stream<Item = JobSnapshot<ComparisonPayload>> + Send + 'static,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    snapshots.filter_map(|snap| async move {
        match serde_json::to_string(&snap) {
            Ok(data) => Some(Ok(Event::default().event(snap.status.as_str()).data(data))),
            Err(e) => {
                warn!(job_id = %snap.job_id, error = %e, "snapshot not serializable");
                None
            }
        }
    })
}

// ---------------------------------------------------------------------------
// GET /api/jobs/:job_id
// ---------------------------------------------------------------------------

pub(crate) async fn job_state(
    State(st): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobSnapshot<ComparisonPayload>>, ApiError> {
    let id: JobId = job_id.parse()?;
    Ok(Json(st.tracker.get_state(id).await?))
}

// ---------------------------------------------------------------------------
// GET /api/player/:name
// ---------------------------------------------------------------------------

pub(crate) async fn player(
    State(st): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let name = name.trim();
    info!(player = name, "player/report");
    let report = st.engine.player_report(name).await?;
    Ok((StatusCode::OK, Json(report)).into_response())
}
