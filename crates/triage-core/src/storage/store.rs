use crate::model::{normalize_ids, RunDraft, TestRun, TriageDecision};
use anyhow::Context;
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Append-only log of runs. Single writer: callers serialize inserts
/// (one pipeline invocation at a time); reads may run concurrently.
#[derive(Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

/// Narrow projection of a run, sufficient for flaky statistics.
#[derive(Debug, Clone)]
pub struct FlakyWindowRow {
    pub id: i64,
    pub all_tests: Vec<String>,
    pub failed_tests: HashSet<String>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    /// Atomically assign the next id and write the full record. The id
    /// lists are normalized to sorted, deduplicated form so that
    /// serialization is reproducible regardless of input ordering.
    /// A failure here means the run is not recorded.
    pub fn insert_run(&self, draft: &RunDraft) -> anyhow::Result<i64> {
        let all_tests = normalize_ids(draft.all_tests.clone());
        let failed_tests = normalize_ids(draft.failed_tests.clone());
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO runs(created_at, ok, return_code, raw_output, triage_json, all_tests_json, failed_tests_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                draft.created_at,
                draft.ok,
                draft.return_code,
                draft.raw_output,
                serde_json::to_string(&draft.triage)?,
                serde_json::to_string(&all_tests)?,
                serde_json::to_string(&failed_tests)?,
            ],
        )
        .context("failed to insert run")?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_run(&self, id: i64) -> anyhow::Result<Option<TestRun>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, created_at, ok, return_code, raw_output, triage_json, all_tests_json, failed_tests_json
             FROM runs WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(run_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Most recent runs first.
    pub fn list_recent(&self, limit: u32) -> anyhow::Result<Vec<TestRun>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, created_at, ok, return_code, raw_output, triage_json, all_tests_json, failed_tests_json
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;
        let mut rows = stmt.query(params![limit])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(run_from_row(row)?);
        }
        Ok(out)
    }

    /// The `window` most recent runs, projected down to what the flaky
    /// detector needs.
    pub fn recent_for_flaky(&self, window: u32) -> anyhow::Result<Vec<FlakyWindowRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, all_tests_json, failed_tests_json
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;
        let mut rows = stmt.query(params![window])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let all_json: String = row.get(1)?;
            let failed_json: String = row.get(2)?;
            out.push(FlakyWindowRow {
                id: row.get(0)?,
                all_tests: serde_json::from_str(&all_json)?,
                failed_tests: serde_json::from_str(&failed_json)?,
            });
        }
        Ok(out)
    }
}

fn run_from_row(row: &Row<'_>) -> anyhow::Result<TestRun> {
    let triage_json: String = row.get(5)?;
    let all_json: String = row.get(6)?;
    let failed_json: String = row.get(7)?;
    let triage: TriageDecision = serde_json::from_str(&triage_json)?;
    Ok(TestRun {
        id: row.get(0)?,
        created_at: row.get(1)?,
        ok: row.get(2)?,
        return_code: row.get(3)?,
        raw_output: row.get(4)?,
        all_tests: serde_json::from_str(&all_json)?,
        failed_tests: serde_json::from_str(&failed_json)?,
        triage,
    })
}
