//! Shared daemon state.
//!
//! Everything here is cheap to clone; handlers receive it as
//! `State<Arc<AppState>>`.

use lw_jobs::JobTracker;
use lw_reconcile::Engine;
use lw_schemas::ComparisonPayload;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            service: "lw-daemon",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Jobs produce a comparison payload (or the no-active-slate message).
pub type SlateTracker = JobTracker<ComparisonPayload>;

#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub engine: Engine,
    pub tracker: SlateTracker,
}

impl AppState {
    pub fn new(engine: Engine, tracker: SlateTracker) -> Self {
        Self {
            build: BuildInfo::default(),
            engine,
            tracker,
        }
    }
}
