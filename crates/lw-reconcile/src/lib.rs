//! lw-reconcile
//!
//! Slate reconciliation core.
//!
//! - `matcher`: name and team matching, profile resolution
//! - `aggregate`: match records and rolling averages (pure)
//! - `agents`: per-agent tables with a combined row (pure)
//! - `group`: arranging comparison rows by match
//! - `engine`: per-player orchestration over both sources
//!
//! The engine never fails a slate because of one player. Only a failed
//! slate fetch is fatal.

pub mod agents;
pub mod aggregate;
pub mod engine;
pub mod group;
pub mod matcher;

pub use agents::{overall_row, with_overall, AGENT_TIMESPANS, OVERALL};
pub use aggregate::{averages, build_records, rolling_average, EARLY_MAPS, WINDOWS};
pub use engine::{DiscoveredMatch, Engine, EngineConfig, EngineError};
pub use group::group_rows;
pub use matcher::{assign_side, clean_team_name, ResolveError, Side, DEFAULT_SIDE};
