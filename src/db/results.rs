use crate::cleaning::{CleaningOutcome, OutputRow, OutputTable};
use crate::errors::ServerError;
use chrono::NaiveDateTime;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// A skipped listing as stored for the run page.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFailure {
    pub position: i64,
    pub listing_name: String,
    pub error: String,
}

/// Display fields are stored with whatever type the source gave them.
fn sql_value(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(other) => SqlValue::Text(other.to_string()),
    }
}

/// Persists the whole outcome of a run in one transaction: the ordered table as
/// JSON, one flattened row per listing, and the skipped listings.
pub fn save_run_results(
    conn: &mut Connection,
    run_id: i64,
    outcome: &CleaningOutcome,
    now: NaiveDateTime,
) -> Result<(), ServerError> {
    let rows_json = serde_json::to_string(outcome.table.rows())
        .map_err(|e| ServerError::DbError(format!("Serialize rows failed: {e}")))?;

    let tx = conn
        .transaction()
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    tx.execute(
        "INSERT INTO run_outputs (run_id, rows_json, created_at) VALUES (?, ?, ?)",
        params![run_id, rows_json, now],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;

    {
        let mut insert_row = tx
            .prepare(
                "INSERT INTO listing_quality (
                    run_id, position, listing_name, category, reason, bedrooms,
                    total_reviews, total_months, missing_months, avg_reviews_per_month,
                    high_season_reviews, high_season, high_season_insights,
                    number_of_guests, url, location, stars
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        for (idx, row) in outcome.table.rows().iter().enumerate() {
            insert_row
                .execute(params![
                    run_id,
                    idx + 1,
                    row.listing_name,
                    row.tier.label(),
                    row.reason,
                    row.bedrooms,
                    row.total_reviews,
                    row.total_months,
                    row.missing_months,
                    row.avg_reviews_per_month,
                    row.high_season_reviews,
                    row.high_season,
                    row.high_season_insights,
                    sql_value(row.number_of_guests.as_ref()),
                    sql_value(row.url.as_ref()),
                    sql_value(row.location.as_ref()),
                    sql_value(row.stars.as_ref())
                ])
                .map_err(|e| ServerError::DbError(e.to_string()))?;
        }

        let mut insert_failure = tx
            .prepare(
                "INSERT INTO listing_failures (run_id, position, listing_name, error) VALUES (?, ?, ?, ?)",
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        for failure in &outcome.failures {
            insert_failure
                .execute(params![
                    run_id,
                    failure.position,
                    failure.listing,
                    failure.error.to_string()
                ])
                .map_err(|e| ServerError::DbError(e.to_string()))?;
        }
    }

    tx.commit()
        .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(())
}

/// Rebuilds the ordered output table of a run. `None` when the run produced no output.
pub fn load_run_table(conn: &Connection, run_id: i64) -> Result<Option<OutputTable>, ServerError> {
    let rows_json: Option<String> = conn
        .query_row(
            "SELECT rows_json FROM run_outputs WHERE run_id = ?",
            params![run_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let Some(rows_json) = rows_json else {
        return Ok(None);
    };

    let rows: Vec<OutputRow> = serde_json::from_str(&rows_json)
        .map_err(|e| ServerError::DbError(format!("Stored rows are corrupt: {e}")))?;
    Ok(Some(OutputTable::from_rows(rows)))
}

pub fn load_run_failures(conn: &Connection, run_id: i64) -> Result<Vec<StoredFailure>, ServerError> {
    let mut stmt = conn
        .prepare(
            "SELECT position, listing_name, error FROM listing_failures WHERE run_id = ? ORDER BY position",
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![run_id], |row| {
            Ok(StoredFailure {
                position: row.get(0)?,
                listing_name: row.get(1)?,
                error: row.get(2)?,
            })
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut failures = Vec::new();
    for r in rows {
        failures.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(failures)
}

/// Listing count per category label, best category first.
pub fn count_by_category(conn: &Connection, run_id: i64) -> Result<Vec<(String, i64)>, ServerError> {
    let mut stmt = conn
        .prepare(
            "SELECT category, COUNT(*) FROM listing_quality WHERE run_id = ?
             GROUP BY category ORDER BY MIN(position)",
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut counts = Vec::new();
    for r in rows {
        counts.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(counts)
}
