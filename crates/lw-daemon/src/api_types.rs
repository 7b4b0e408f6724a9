//! Request and response types for the lw-daemon HTTP endpoints.
//!
//! Comparison payloads and job snapshots are serialized straight from
//! `lw-schemas` / `lw-jobs`; only the envelopes specific to HTTP live here.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// /api/slate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlateQuery {
    /// `sync` runs the reconciliation inline; anything else submits a job.
    pub mode: Option<String>,
    /// Pin the run to one match page instead of discovering matches.
    pub match_url: Option<String>,
}

impl SlateQuery {
    pub fn is_sync(&self) -> bool {
        self.mode
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("sync"))
    }

    pub fn match_url(&self) -> Option<&str> {
        self.match_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Returned with 202 when a slate job is submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
