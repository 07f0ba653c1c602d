use crate::errors::ServerError;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<RunStatus> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CleaningRun {
    pub id: i64,
    pub status: RunStatus,
    pub output_format: String,
    pub output_file_name: String,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    pub listings_seen: Option<i64>,
    pub listings_failed: Option<i64>,
    pub high_season: Option<i64>,
    pub high_season_reviews: Option<i64>,
    pub error_message: Option<String>,
}

/// Counters recorded when a run finishes successfully.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunCompletion {
    pub listings_seen: usize,
    pub listings_failed: usize,
    pub high_season: Option<u8>,
    pub high_season_reviews: usize,
}

const RUN_COLUMNS: &str = "id, status, output_format, output_file_name, started_at, finished_at, \
     listings_seen, listings_failed, high_season, high_season_reviews, error_message";

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<CleaningRun> {
    let status: String = row.get(1)?;
    Ok(CleaningRun {
        id: row.get(0)?,
        // Rows are only written through this module, so unknown values mean a broken run.
        status: RunStatus::parse(&status).unwrap_or(RunStatus::Failed),
        output_format: row.get(2)?,
        output_file_name: row.get(3)?,
        started_at: row.get(4)?,
        finished_at: row.get(5)?,
        listings_seen: row.get(6)?,
        listings_failed: row.get(7)?,
        high_season: row.get(8)?,
        high_season_reviews: row.get(9)?,
        error_message: row.get(10)?,
    })
}

pub fn start_run(
    conn: &Connection,
    output_format: &str,
    output_file_name: &str,
    now: NaiveDateTime,
) -> Result<i64, ServerError> {
    conn.execute(
        "INSERT INTO cleaning_runs (status, output_format, output_file_name, started_at) VALUES (?, ?, ?, ?)",
        params![RunStatus::Running.as_str(), output_format, output_file_name, now],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(conn.last_insert_rowid())
}

pub fn complete_run(
    conn: &Connection,
    run_id: i64,
    now: NaiveDateTime,
    completion: &RunCompletion,
) -> Result<(), ServerError> {
    conn.execute(
        "UPDATE cleaning_runs SET status = ?, finished_at = ?, listings_seen = ?, listings_failed = ?, high_season = ?, high_season_reviews = ? WHERE id = ?",
        params![
            RunStatus::Completed.as_str(),
            now,
            completion.listings_seen,
            completion.listings_failed,
            completion.high_season,
            completion.high_season_reviews,
            run_id
        ],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(())
}

pub fn fail_run(
    conn: &Connection,
    run_id: i64,
    now: NaiveDateTime,
    error: &str,
) -> Result<(), ServerError> {
    conn.execute(
        "UPDATE cleaning_runs SET status = ?, finished_at = ?, error_message = ? WHERE id = ?",
        params![RunStatus::Failed.as_str(), now, error, run_id],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(())
}

pub fn get_run(conn: &Connection, run_id: i64) -> Result<Option<CleaningRun>, ServerError> {
    conn.query_row(
        &format!("SELECT {RUN_COLUMNS} FROM cleaning_runs WHERE id = ?"),
        params![run_id],
        run_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(e.to_string()))
}

pub fn get_recent_runs(conn: &Connection) -> Result<Vec<CleaningRun>, ServerError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM cleaning_runs ORDER BY id DESC LIMIT 20"
        ))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map([], run_from_row)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(runs)
}
