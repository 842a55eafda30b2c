//! Persistence contract for run records.
//!
//! The engine never calls the store itself: [`crate::simulation::Simulation`]
//! returns a [`crate::simulation::StepOutcome`] and the caller persists it.
//! Implementations live out of crate (the DuckDB store in `hearth-storage`).

use thiserror::Error;

use crate::network::NetworkStats;
use crate::planner::DailyMetrics;
use crate::simulation::SimulationLogEntry;

/// Opaque run identifier issued by the store.
pub type RunId = i64;

/// Lifecycle status of a stored run. The engine never mutates status;
/// callers move runs between states themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Paused,
    Completed,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    /// Parse a stored status label, defaulting unknown labels to `Paused`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label {
            "running" => Self::Running,
            "completed" => Self::Completed,
            _ => Self::Paused,
        }
    }
}

/// A run row loaded back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRun {
    pub scenario: String,
    pub status: RunStatus,
    pub current_day: u64,
    /// Canonical JSON rendering of `SimulationState`.
    pub state_json: String,
}

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
#[error("run store error: {0}")]
pub struct StoreError(pub String);

/// Keyed store for run state, metrics, events, and network snapshots.
pub trait RunStore {
    /// Insert a new run and return its id.
    fn insert_run(
        &mut self,
        scenario: &str,
        seed: u32,
        state_json: &str,
    ) -> Result<RunId, StoreError>;

    /// Load a run previously inserted.
    fn load_run(&mut self, run_id: RunId) -> Result<StoredRun, StoreError>;

    /// Replace the stored state and current day of a run.
    fn patch_run_state(
        &mut self,
        run_id: RunId,
        state_json: &str,
        day: u64,
    ) -> Result<(), StoreError>;

    /// Append one day's aggregate metrics.
    fn append_daily_metrics(
        &mut self,
        run_id: RunId,
        day: u64,
        metrics: &DailyMetrics,
    ) -> Result<(), StoreError>;

    /// Append the day's event log entries.
    fn append_events(
        &mut self,
        run_id: RunId,
        entries: &[SimulationLogEntry],
    ) -> Result<(), StoreError>;

    /// Append a network snapshot with its serialized edge list.
    fn append_network_snapshot(
        &mut self,
        run_id: RunId,
        day: u64,
        stats: &NetworkStats,
        edges_json: &str,
    ) -> Result<(), StoreError>;
}
