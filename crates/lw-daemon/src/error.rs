use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lw_jobs::JobError;
use lw_reconcile::{EngineError, ResolveError};
use thiserror::Error;

use crate::api_types::ErrorResponse;

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    JobNotFound(String),

    #[error("{0}")]
    PlayerNotFound(String),

    /// An upstream site failed in a way the caller cannot fix.
    #[error("{0}")]
    Upstream(String),
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::NotFound(_) => ApiError::JobNotFound(e.to_string()),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::PlayerNotFound => ApiError::PlayerNotFound(e.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::JobNotFound(_) => (StatusCode::NOT_FOUND, "JOB_NOT_FOUND"),
            ApiError::PlayerNotFound(_) => (StatusCode::NOT_FOUND, "PLAYER_NOT_FOUND"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_sources::SourceError;

    #[test]
    fn resolve_errors_map_to_status() {
        let nf: ApiError = ResolveError::PlayerNotFound.into();
        assert_eq!(nf.into_response().status(), StatusCode::NOT_FOUND);

        let timeout = ResolveError::ProfileFetchFailed(SourceError::Timeout {
            url: "https://www.vlr.gg/player/1/x".into(),
        });
        let up: ApiError = timeout.into();
        assert_eq!(up.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn job_not_found_is_404() {
        let e: ApiError = JobError::NotFound("abc".into()).into();
        assert_eq!(e.to_string(), "job not found: abc");
        assert_eq!(e.into_response().status(), StatusCode::NOT_FOUND);
    }
}
