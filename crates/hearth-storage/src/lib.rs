//! DuckDB-backed persistence for Hearth runs.
//!
//! Implements the `hearth-core` [`RunStore`] contract over four tables:
//! `runs`, `daily_metrics`, `events`, and `network_snapshots`. State is
//! stored as the canonical `SimulationState` JSON, so a run can resume from
//! the database alone.

use duckdb::{params, Connection};
use thiserror::Error;
use tracing::debug;

use hearth_core::{
    DailyMetrics, NetworkStats, RunId, RunStatus, RunStore, SimulationLogEntry, StoreError,
    StoredRun,
};

/// Storage error wrapper.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("duckdb error: {0}")]
    DuckDb(#[from] duckdb::Error),
    #[error("unknown run {0}")]
    UnknownRun(RunId),
}

impl From<StorageError> for StoreError {
    fn from(error: StorageError) -> Self {
        StoreError(error.to_string())
    }
}

/// DuckDB-backed run store.
pub struct RunStorage {
    conn: Connection,
}

impl RunStorage {
    /// Open or create a database at the provided path.
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let mut storage = Self { conn };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// In-memory database, used by tests and `--storage-path :memory:`.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let mut storage = Self { conn };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn initialize_schema(&mut self) -> Result<(), StorageError> {
        self.conn.execute(
            "create table if not exists runs (
                run_id bigint primary key,
                scenario text,
                seed bigint,
                status text,
                current_day bigint,
                state_json text
            )",
            [],
        )?;
        self.conn.execute(
            "create table if not exists daily_metrics (
                run_id bigint,
                day bigint,
                cooperation_rate double,
                energy_balance double,
                risk_incidents bigint,
                inequality_index double,
                assortativity double,
                reciprocity double,
                primary key (run_id, day)
            )",
            [],
        )?;
        self.conn.execute(
            "create table if not exists events (
                run_id bigint,
                seq bigint,
                day bigint,
                agent_id text,
                kind text,
                summary text,
                detail text,
                primary key (run_id, seq)
            )",
            [],
        )?;
        self.conn.execute(
            "create table if not exists network_snapshots (
                run_id bigint,
                day bigint,
                reciprocity double,
                assortativity double,
                clustering double,
                edges_json text,
                primary key (run_id, day)
            )",
            [],
        )?;
        Ok(())
    }

    fn next_run_id(&mut self) -> Result<RunId, StorageError> {
        let id: i64 = self
            .conn
            .query_row("select coalesce(max(run_id), 0) + 1 from runs", [], |row| {
                row.get(0)
            })?;
        Ok(id)
    }

    fn next_event_seq(&mut self, run_id: RunId) -> Result<i64, StorageError> {
        let seq: i64 = self.conn.query_row(
            "select coalesce(max(seq), 0) + 1 from events where run_id = ?",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// Update a run's status label.
    pub fn set_run_status(
        &mut self,
        run_id: RunId,
        status: RunStatus,
    ) -> Result<(), StorageError> {
        let changed = self.conn.execute(
            "update runs set status = ? where run_id = ?",
            params![status.as_str(), run_id],
        )?;
        if changed == 0 {
            return Err(StorageError::UnknownRun(run_id));
        }
        Ok(())
    }

    /// Metrics rows recorded for a run, ordered by day.
    pub fn metrics_for_run(
        &mut self,
        run_id: RunId,
    ) -> Result<Vec<(u64, DailyMetrics)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "select day, cooperation_rate, energy_balance, risk_incidents,
                    inequality_index, assortativity, reciprocity
             from daily_metrics where run_id = ? order by day asc",
        )?;
        let mut rows = stmt.query(params![run_id])?;
        let mut metrics = Vec::new();
        while let Some(row) = rows.next()? {
            metrics.push((
                row.get::<_, i64>(0)? as u64,
                DailyMetrics {
                    cooperation_rate: row.get(1)?,
                    energy_balance: row.get(2)?,
                    risk_incidents: row.get::<_, i64>(3)? as u64,
                    inequality_index: row.get(4)?,
                    assortativity: row.get(5)?,
                    reciprocity: row.get(6)?,
                },
            ));
        }
        Ok(metrics)
    }

    /// Number of event rows recorded for a run.
    pub fn event_count(&mut self, run_id: RunId) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            "select count(*) from events where run_id = ?",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Latest stored network snapshot for a run, if any.
    pub fn latest_network_snapshot(
        &mut self,
        run_id: RunId,
    ) -> Result<Option<(u64, NetworkStats, String)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "select day, reciprocity, assortativity, clustering, edges_json
             from network_snapshots where run_id = ? order by day desc limit 1",
        )?;
        let mut rows = stmt.query(params![run_id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        Ok(Some((
            row.get::<_, i64>(0)? as u64,
            NetworkStats {
                reciprocity: row.get(1)?,
                assortativity: row.get(2)?,
                clustering: row.get(3)?,
            },
            row.get(4)?,
        )))
    }
}

impl RunStore for RunStorage {
    fn insert_run(
        &mut self,
        scenario: &str,
        seed: u32,
        state_json: &str,
    ) -> Result<RunId, StoreError> {
        let run_id = self.next_run_id()?;
        self.conn
            .execute(
                "insert into runs (run_id, scenario, seed, status, current_day, state_json)
                 values (?, ?, ?, ?, ?, ?)",
                params![
                    run_id,
                    scenario,
                    i64::from(seed),
                    RunStatus::Running.as_str(),
                    0_i64,
                    state_json
                ],
            )
            .map_err(StorageError::from)?;
        debug!(run_id, scenario, "inserted run");
        Ok(run_id)
    }

    fn load_run(&mut self, run_id: RunId) -> Result<StoredRun, StoreError> {
        let mut stmt = self
            .conn
            .prepare("select scenario, status, current_day, state_json from runs where run_id = ?")
            .map_err(StorageError::from)?;
        let mut rows = stmt.query(params![run_id]).map_err(StorageError::from)?;
        let Some(row) = rows.next().map_err(StorageError::from)? else {
            return Err(StorageError::UnknownRun(run_id).into());
        };
        let status: String = row.get(1).map_err(StorageError::from)?;
        Ok(StoredRun {
            scenario: row.get(0).map_err(StorageError::from)?,
            status: RunStatus::parse(&status),
            current_day: row.get::<_, i64>(2).map_err(StorageError::from)? as u64,
            state_json: row.get(3).map_err(StorageError::from)?,
        })
    }

    fn patch_run_state(
        &mut self,
        run_id: RunId,
        state_json: &str,
        day: u64,
    ) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute(
                "update runs set state_json = ?, current_day = ? where run_id = ?",
                params![state_json, day as i64, run_id],
            )
            .map_err(StorageError::from)?;
        if changed == 0 {
            return Err(StorageError::UnknownRun(run_id).into());
        }
        Ok(())
    }

    fn append_daily_metrics(
        &mut self,
        run_id: RunId,
        day: u64,
        metrics: &DailyMetrics,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "insert or replace into daily_metrics (
                    run_id, day, cooperation_rate, energy_balance, risk_incidents,
                    inequality_index, assortativity, reciprocity
                 ) values (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    run_id,
                    day as i64,
                    metrics.cooperation_rate,
                    metrics.energy_balance,
                    metrics.risk_incidents as i64,
                    metrics.inequality_index,
                    metrics.assortativity,
                    metrics.reciprocity
                ],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn append_events(
        &mut self,
        run_id: RunId,
        entries: &[SimulationLogEntry],
    ) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut seq = self.next_event_seq(run_id)?;
        let tx = self.conn.transaction().map_err(StorageError::from)?;
        {
            let mut stmt = tx
                .prepare(
                    "insert into events (run_id, seq, day, agent_id, kind, summary, detail)
                     values (?, ?, ?, ?, ?, ?, ?)",
                )
                .map_err(StorageError::from)?;
            for entry in entries {
                stmt.execute(params![
                    run_id,
                    seq,
                    entry.day as i64,
                    entry.agent_id,
                    entry.kind.as_str(),
                    entry.summary,
                    entry.detail.to_string()
                ])
                .map_err(StorageError::from)?;
                seq += 1;
            }
        }
        tx.commit().map_err(StorageError::from)?;
        Ok(())
    }

    fn append_network_snapshot(
        &mut self,
        run_id: RunId,
        day: u64,
        stats: &NetworkStats,
        edges_json: &str,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "insert or replace into network_snapshots (
                    run_id, day, reciprocity, assortativity, clustering, edges_json
                 ) values (?, ?, ?, ?, ?, ?)",
                params![
                    run_id,
                    day as i64,
                    stats.reciprocity,
                    stats.assortativity,
                    stats.clustering,
                    edges_json
                ],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }
}
